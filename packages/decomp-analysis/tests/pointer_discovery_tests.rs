//! Integration tests for pointer discovery
//!
//! Offset chains, default unification, explicit unions, roots from globals
//! and mapped constants, and order independence of the final classes.

mod common;

use common::*;
use decomp_analysis::config::{DiscoveryConfig, Preset};
use decomp_analysis::features::pointer_discovery::{
    AddressKind, MappedRange, MappedRanges, NoExecutable, PointerDiscovery, RootOrigin,
};
use decomp_analysis::shared::models::{
    BinaryOp, CandidatePointers, Function, FunctionId, Module, ModuleBuilder, Value, ValueDef,
    ValueId,
};
use pretty_assertions::assert_eq;

fn discovery() -> PointerDiscovery {
    PointerDiscovery::new(DiscoveryConfig::default())
}

#[test]
fn test_field_then_element_share_a_set() {
    let chain = chain_module(&[ChainStep::Constant(8), ChainStep::Scaled(4)]);
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &chain.module, &chain.candidates);

    let field = chain.values[0];
    let element = chain.values[1];
    assert_unified(&d, &chain.module, chain.root, field);
    assert_unified(&d, &chain.module, field, element);

    let element_node = d.lookup(element).unwrap();
    assert_eq!(
        d.display_address(&chain.module, element_node),
        "((%arg0 + 8) + %arg1*4)"
    );
    match d.address(element_node).kind {
        AddressKind::VariableOffset { parent, stride, .. } => {
            assert_eq!(parent, d.lookup(field).unwrap());
            assert_eq!(stride, 4);
        }
        ref other => panic!("expected a variable offset, got {:?}", other),
    }
    assert_eq!(d.stats().classes, 1);
}

#[test]
fn test_every_depth_has_the_same_root() {
    let steps: Vec<ChainStep> = (1..=12)
        .map(|k| match k % 4 {
            0 => ChainStep::Constant(k * 8),
            1 => ChainStep::Minus(k),
            2 => ChainStep::Scaled(16),
            _ => ChainStep::Shifted(3),
        })
        .collect();
    let chain = chain_module(&steps);
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &chain.module, &chain.candidates);

    let root = d.lookup(chain.root).unwrap();
    assert!(d.address(root).is_root());
    for (depth, &value) in chain.values.iter().enumerate() {
        let node = d.lookup(value).unwrap();
        assert_eq!(d.get_root(node), root);
        assert_eq!(d.ordering_key(node).depth(), depth + 1);
        assert!(d.same_set(root, node));
    }
    let stats = d.stats();
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.max_depth, steps.len());
}

#[test]
fn test_separate_objects_stay_apart() {
    let objects = two_objects_module();
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    assert_not_unified(&d, &objects.module, objects.p, objects.q);
    assert_eq!(
        rendered_classes(&d, &objects.module),
        vec![
            vec!["%p", "(%p + 8)", "((%p + 8) + %i*4)"],
            vec!["%i"],
            vec!["%q", "(%q - 8)", "(%q + 16)"],
        ]
    );
}

#[test]
fn test_union_merges_whole_classes() {
    let objects = two_objects_module();
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    d.union_values(objects.p, objects.q).unwrap();
    assert_eq!(
        rendered_classes(&d, &objects.module),
        vec![
            vec!["%p", "(%p + 8)", "((%p + 8) + %i*4)", "%q", "(%q - 8)", "(%q + 16)"],
            vec!["%i"],
        ]
    );

    // every member of either side now agrees on the set
    let set = d.set_of(d.lookup(objects.p).unwrap());
    for &id in d.addresses_in_function(objects.second) {
        assert_eq!(d.set_of(id), set);
    }
    assert_eq!(d.stats().unions, 1);
}

#[test]
fn test_union_is_transitive() {
    let mut b = ModuleBuilder::new("three");
    let f = b.function("f");
    let a = b.argument(f);
    let m = b.argument(f);
    let z = b.argument(f);
    let module = b.build().unwrap();
    let candidates = CandidatePointers::heuristic(&module);

    let mut d = discovery();
    d.analyze_module(&NoExecutable, &module, &candidates);
    d.union_values(a, m).unwrap();
    d.union_values(m, z).unwrap();

    assert_unified(&d, &module, a, z);
    assert_eq!(d.equivalence_classes().len(), 1);
    assert_eq!(d.equivalence_classes()[0].members.len(), 3);
}

#[test]
fn test_union_of_undiscovered_value() {
    let mut b = ModuleBuilder::new("m");
    let f = b.function("f");
    let p = b.argument(f);
    let hidden = b.opaque(f);
    let module = b.build().unwrap();
    let candidates = CandidatePointers::heuristic(&module);

    let mut d = discovery();
    d.analyze_module(&NoExecutable, &module, &candidates);
    assert!(d.union_values(p, hidden).is_none());
    assert_eq!(d.stats().unions, 0);
}

#[test]
fn test_classes_independent_of_function_order() {
    let objects = two_objects_module();

    let mut forward = discovery();
    forward.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    let mut backward = discovery();
    for function in [objects.second, objects.first] {
        backward.analyze_function(&NoExecutable, &objects.module, &objects.candidates, function);
    }

    assert_eq!(
        rendered_classes(&forward, &objects.module),
        rendered_classes(&backward, &objects.module)
    );
}

#[test]
fn test_classes_independent_of_query_order() {
    let objects = two_objects_module();
    let mut in_order = discovery();
    in_order.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    // outermost values first, so ancestors are created on the way down
    let mut shuffled = discovery();
    let mut values: Vec<_> = objects.candidates.iter().collect();
    values.reverse();
    for value in values {
        shuffled.address_of(&NoExecutable, &objects.module, &objects.candidates, value);
    }

    assert_eq!(
        rendered_classes(&in_order, &objects.module),
        rendered_classes(&shuffled, &objects.module)
    );
    assert_eq!(in_order.stats().roots, shuffled.stats().roots);
}

#[test]
fn test_address_lists_follow_discovery_order() {
    let objects = two_objects_module();
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    assert_eq!(
        d.render_function_addresses(&objects.module, objects.second),
        "second\n0: %q [root]\n1: (%q + 16) [constant_offset]\n2: (%q - 8) [constant_offset]\n\n"
    );
    let sequences: Vec<u32> = d
        .addresses_in_function(objects.first)
        .iter()
        .map(|&id| d.address(id).sequence)
        .collect();
    assert_eq!(sequences, (0..sequences.len() as u32).collect::<Vec<_>>());
}

#[test]
fn test_argument_lookup() {
    let objects = two_objects_module();
    let mut d = discovery();
    d.analyze_module(&NoExecutable, &objects.module, &objects.candidates);

    let p = d.address_of_argument(&objects.module, objects.p).unwrap();
    assert_eq!(
        d.address(p).kind,
        AddressKind::Root {
            origin: RootOrigin::Argument { index: 0 }
        }
    );
    assert_eq!(d.address(p).function, Some(objects.first));
}

#[test]
fn test_global_root() {
    let mut b = ModuleBuilder::new("globals");
    let f = b.function("f");
    let table = b.global("table");
    let eight = b.constant(8);
    let entry = b.add(f, table, eight);
    let module = b.build().unwrap();
    let candidates = CandidatePointers::heuristic(&module);

    let mut d = discovery();
    d.analyze_module(&NoExecutable, &module, &candidates);

    let node = d.lookup(entry).unwrap();
    assert_eq!(d.display_address(&module, node), "(@table + 8)");
    let root = d.get_root(node);
    assert_eq!(
        d.address(root).kind,
        AddressKind::Root {
            origin: RootOrigin::Global {
                name: "table".to_string()
            }
        }
    );
}

#[test]
fn test_mapped_constant_roots() {
    let mut b = ModuleBuilder::new("image");
    let f = b.function("f");
    let inside = b.constant(0x40_1000);
    let outside = b.constant(0x90_0000);
    let four = b.constant(4);
    let a = b.add(f, inside, four);
    let c = b.add(f, outside, four);
    let module = b.build().unwrap();
    let candidates: CandidatePointers = [inside, outside, a, c].into_iter().collect();
    let image = MappedRanges::new([MappedRange {
        start: 0x40_0000,
        end: 0x50_0000,
    }]);

    let mut d = PointerDiscovery::new(DiscoveryConfig::from_preset(Preset::Thorough));
    d.analyze_module(&image, &module, &candidates);

    let inside_root = d.get_root(d.lookup(a).unwrap());
    assert_eq!(
        d.address(inside_root).kind,
        AddressKind::Root {
            origin: RootOrigin::MappedConstant { address: 0x40_1000 }
        }
    );
    let outside_root = d.get_root(d.lookup(c).unwrap());
    assert_eq!(
        d.address(outside_root).kind,
        AddressKind::Root {
            origin: RootOrigin::Opaque
        }
    );

    // disabled by default
    let mut plain = discovery();
    plain.analyze_module(&image, &module, &candidates);
    let root = plain.get_root(plain.lookup(a).unwrap());
    assert_eq!(
        plain.address(root).kind,
        AddressKind::Root {
            origin: RootOrigin::Opaque
        }
    );
}

/// Hand-built module whose values skip `Module::validate`
fn unvalidated(values: Vec<ValueDef>) -> Module {
    Module {
        name: "unvalidated".to_string(),
        functions: vec![Function {
            name: "f".to_string(),
            arguments: Vec::new(),
            body: Vec::new(),
        }],
        values: values
            .into_iter()
            .map(|def| Value { name: None, def })
            .collect(),
        call_sites: Vec::new(),
    }
}

fn add(lhs: usize, rhs: usize) -> ValueDef {
    ValueDef::Binary {
        function: FunctionId::new(0),
        op: BinaryOp::Add,
        lhs: ValueId::new(lhs),
        rhs: ValueId::new(rhs),
    }
}

#[test]
fn test_self_derived_value_becomes_a_root() {
    // %1 = %1 + 8
    let module = unvalidated(vec![ValueDef::Constant { value: 8 }, add(1, 0)]);
    assert!(module.validate().is_err());
    let looped = ValueId::new(1);
    let candidates: CandidatePointers = [looped].into_iter().collect();

    let mut d = discovery();
    let stats = d.analyze_module(&NoExecutable, &module, &candidates);

    let node = d.lookup(looped).unwrap();
    assert_eq!(
        d.address(node).kind,
        AddressKind::Root {
            origin: RootOrigin::Opaque
        }
    );
    assert_eq!(stats.roots, 1);
    assert_eq!(d.addresses_in_function(FunctionId::new(0)), &[node]);
}

#[test]
fn test_mutually_derived_values_terminate() {
    // %1 = %2 + 8, %2 = %1 + 8
    let module = unvalidated(vec![ValueDef::Constant { value: 8 }, add(2, 0), add(1, 0)]);
    let (a, b) = (ValueId::new(1), ValueId::new(2));
    let candidates: CandidatePointers = [a, b].into_iter().collect();

    let mut d = discovery();
    d.analyze_module(&NoExecutable, &module, &candidates);

    let (na, nb) = (d.lookup(a).unwrap(), d.lookup(b).unwrap());
    assert!(d.address(na).is_root());
    assert_eq!(d.get_root(nb), na);
    assert_unified(&d, &module, a, b);
}
