//! Pointer discovery ports

use serde::{Deserialize, Serialize};

/// Facts about the executable image the module was lifted from
pub trait ExecutableInfo: Send + Sync {
    /// `address` lies inside a mapped segment
    fn is_mapped_address(&self, address: u64) -> bool;
}

/// No image information: nothing is mapped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecutable;

impl ExecutableInfo for NoExecutable {
    fn is_mapped_address(&self, _address: u64) -> bool {
        false
    }
}

/// Half-open range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappedRange {
    pub start: u64,
    pub end: u64,
}

impl MappedRange {
    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.end
    }
}

/// Sorted set of mapped ranges
#[derive(Debug, Clone, Default)]
pub struct MappedRanges {
    ranges: Vec<MappedRange>,
}

impl MappedRanges {
    pub fn new(ranges: impl IntoIterator<Item = MappedRange>) -> Self {
        let mut ranges: Vec<MappedRange> = ranges.into_iter().filter(|r| r.start < r.end).collect();
        ranges.sort_unstable();
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MappedRange] {
        &self.ranges
    }
}

impl ExecutableInfo for MappedRanges {
    fn is_mapped_address(&self, address: u64) -> bool {
        // only ranges starting at or before `address` can contain it
        let upper = self.ranges.partition_point(|r| r.start <= address);
        self.ranges[..upper]
            .iter()
            .rev()
            .any(|r| r.contains(address))
    }
}
