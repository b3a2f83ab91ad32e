//! Shared macros for the codebase

/// Declares a dense `u32` id newtype.
///
/// Ids are plain indices into the owning table (module values, arena slots,
/// ...). They order by creation, which is what every deterministic dump in
/// this crate sorts by.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

/// Per-node tracing, compiled out unless the `trace` feature is enabled
#[cfg(not(feature = "trace"))]
macro_rules! node_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "trace")]
macro_rules! node_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) };
}
