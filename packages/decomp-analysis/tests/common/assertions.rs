//! Custom assertions for test verification
//!
//! Domain-specific checks over ModRef tables and discovered addresses.

use decomp_analysis::features::pointer_discovery::PointerDiscovery;
use decomp_analysis::features::reg_modref::{ModRefEffect, RegisterModRefAnalysis};
use decomp_analysis::shared::models::{FunctionId, Module, ValueId};

/// Assert the effect of one register in a function's table
pub fn assert_effect(
    analysis: &RegisterModRefAnalysis,
    module: &Module,
    function: FunctionId,
    register: &str,
    expected: ModRefEffect,
) {
    let actual = analysis.effect_of(function, register);
    assert_eq!(
        actual,
        expected,
        "{} in '{}': expected {}, got {}. Table:\n{}",
        register,
        module.function_name(function),
        expected,
        actual,
        analysis.render_function(module, function)
    );
}

/// Assert that the table of `function` has exactly `expected` entries
pub fn assert_table_len(
    analysis: &RegisterModRefAnalysis,
    module: &Module,
    function: FunctionId,
    expected: usize,
) {
    let actual = analysis.table(function).map_or(0, |t| t.len());
    assert_eq!(
        actual,
        expected,
        "Expected {} entries for '{}', got:\n{}",
        expected,
        module.function_name(function),
        analysis.render_function(module, function)
    );
}

/// Assert that two discovered values share a unification set
pub fn assert_unified(discovery: &PointerDiscovery, module: &Module, a: ValueId, b: ValueId) {
    let (Some(na), Some(nb)) = (discovery.lookup(a), discovery.lookup(b)) else {
        panic!(
            "{} or {} has no address",
            module.display_value(a),
            module.display_value(b)
        );
    };
    assert!(
        discovery.same_set(na, nb),
        "Expected {} and {} in one set",
        discovery.display_address(module, na),
        discovery.display_address(module, nb)
    );
}

/// Assert that two discovered values are in different unification sets
pub fn assert_not_unified(discovery: &PointerDiscovery, module: &Module, a: ValueId, b: ValueId) {
    let (Some(na), Some(nb)) = (discovery.lookup(a), discovery.lookup(b)) else {
        panic!(
            "{} or {} has no address",
            module.display_value(a),
            module.display_value(b)
        );
    };
    assert!(
        !discovery.same_set(na, nb),
        "Expected {} and {} in different sets",
        discovery.display_address(module, na),
        discovery.display_address(module, nb)
    );
}

/// Equivalence classes as rendered addresses, in class order
pub fn rendered_classes(discovery: &PointerDiscovery, module: &Module) -> Vec<Vec<String>> {
    discovery
        .equivalence_classes()
        .iter()
        .map(|class| {
            class
                .members
                .iter()
                .map(|&m| discovery.display_address(module, m))
                .collect()
        })
        .collect()
}
