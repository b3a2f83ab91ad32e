pub mod arena;
pub mod hierarchy_builder;
pub mod union_find;

pub use arena::{AddressArena, ArenaStats};
pub use hierarchy_builder::{DiscoveryScope, ObjectAddressHierarchy};
pub use union_find::UnificationIndex;
