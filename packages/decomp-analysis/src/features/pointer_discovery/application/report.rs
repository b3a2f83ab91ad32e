//! Machine-readable discovery report

use super::discovery::{DiscoveryStats, PointerDiscovery};
use crate::features::pointer_discovery::domain::{AddressId, AddressKind};
use crate::shared::models::{Module, ValueId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AddressEntry {
    pub id: AddressId,
    pub value: ValueId,
    /// Rendered derivation, e.g. `(%arg0 + 8)`
    pub address: String,
    pub root: String,
    pub kind: AddressKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionAddresses {
    pub function: String,
    pub addresses: Vec<AddressEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub module: String,
    pub functions: Vec<FunctionAddresses>,
    /// Globals and constants discovered outside any function
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub module_addresses: Vec<AddressEntry>,
    /// Equivalence classes as rendered addresses, in deterministic order
    pub classes: Vec<Vec<String>>,
    pub stats: DiscoveryStats,
}

impl DiscoveryReport {
    pub fn build(discovery: &PointerDiscovery, module: &Module) -> Self {
        let functions = module
            .function_ids()
            .map(|f| FunctionAddresses {
                function: module.function_name(f),
                addresses: entries(discovery, module, discovery.addresses_in_function(f)),
            })
            .collect();

        let classes = discovery
            .equivalence_classes()
            .into_iter()
            .map(|class| {
                class
                    .members
                    .iter()
                    .map(|&id| discovery.display_address(module, id))
                    .collect()
            })
            .collect();

        Self {
            module: module.name.clone(),
            functions,
            module_addresses: entries(discovery, module, discovery.module_addresses()),
            classes,
            stats: discovery.stats(),
        }
    }
}

fn entries(discovery: &PointerDiscovery, module: &Module, ids: &[AddressId]) -> Vec<AddressEntry> {
    ids.iter()
        .map(|&id| {
            let node = discovery.address(id);
            AddressEntry {
                id,
                value: node.value,
                address: discovery.display_address(module, id),
                root: discovery.display_address(module, discovery.get_root(id)),
                kind: node.kind.clone(),
            }
        })
        .collect()
}
