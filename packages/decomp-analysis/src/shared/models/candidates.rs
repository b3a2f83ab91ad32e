//! Candidate pointer values
//!
//! Pointer discovery only classifies values in this set. A decompiler gets
//! it from an earlier pass (argument recovery, memory access lifting, ...).

use super::ids::{FunctionId, ValueId};
use super::ir::{BinaryOp, Module, ValueDef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidatePointers {
    values: BTreeSet<ValueId>,
}

impl CandidatePointers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every argument, global, and add/sub result of the module.
    ///
    /// Used when no better provider is available; over-approximating the set
    /// only produces extra roots, never wrong derivations.
    pub fn heuristic(module: &Module) -> Self {
        let values = module
            .value_ids()
            .filter(|&id| {
                matches!(
                    module.value_def(id),
                    Some(ValueDef::Argument { .. })
                        | Some(ValueDef::Global { .. })
                        | Some(ValueDef::Binary {
                            op: BinaryOp::Add | BinaryOp::Sub,
                            ..
                        })
                )
            })
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, value: ValueId) -> bool {
        self.values.insert(value)
    }

    #[inline]
    pub fn contains(&self, value: ValueId) -> bool {
        self.values.contains(&value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Candidates in value order
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.values.iter().copied()
    }

    /// Candidates local to `function`, in value order
    pub fn in_function<'a>(
        &'a self,
        module: &'a Module,
        function: FunctionId,
    ) -> impl Iterator<Item = ValueId> + 'a {
        self.iter()
            .filter(move |&v| module.owning_function(v) == Some(function))
    }
}

impl FromIterator<ValueId> for CandidatePointers {
    fn from_iter<I: IntoIterator<Item = ValueId>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<ValueId> for CandidatePointers {
    fn extend<I: IntoIterator<Item = ValueId>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}
