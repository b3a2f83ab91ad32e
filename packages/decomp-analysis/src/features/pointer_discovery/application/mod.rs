pub mod discovery;
pub mod report;

pub use discovery::{DiscoveryStats, PointerDiscovery};
pub use report::{AddressEntry, DiscoveryReport, FunctionAddresses};
