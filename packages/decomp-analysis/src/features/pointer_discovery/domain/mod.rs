//! Pointer discovery domain types

pub mod object_address;
pub mod ordering_key;

pub use object_address::{AddressId, AddressKind, ObjectAddress, RootOrigin, UnificationSetId};
pub use ordering_key::{KeyStep, OrderingKey};

use serde::Serialize;

/// A final unification set: members in ordering-key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquivalenceClass {
    pub set: UnificationSetId,
    pub members: Vec<AddressId>,
}
