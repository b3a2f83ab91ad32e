//! Pointer / object-address discovery
//!
//! Rebuilds, for every candidate pointer value, the chain of address
//! arithmetic it derives from, and groups the resulting nodes into
//! unification sets that denote one underlying allocation.
//!
//! Layout:
//! - `domain`: address nodes, ordering keys, equivalence classes
//! - `infrastructure`: arena, unification index, hierarchy builder
//! - `ports`: executable image facts
//! - `application`: discovery driver and report

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{DiscoveryReport, DiscoveryStats, PointerDiscovery};
pub use domain::{
    AddressId, AddressKind, EquivalenceClass, ObjectAddress, OrderingKey, RootOrigin,
    UnificationSetId,
};
pub use infrastructure::{AddressArena, ObjectAddressHierarchy, UnificationIndex};
pub use ports::{ExecutableInfo, MappedRange, MappedRanges, NoExecutable};
