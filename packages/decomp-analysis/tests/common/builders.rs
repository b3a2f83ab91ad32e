//! Test data builders
//!
//! Small modules for the documented scenarios, and generators for the
//! property tests (random call graphs, random offset chains).

use decomp_analysis::shared::models::{
    CandidatePointers, FunctionId, Module, ModuleBuilder, ValueId,
};
use std::collections::BTreeSet;

/// Raw operand spellings used by generated bodies, paired with their
/// canonical register
pub const RAW_REGISTERS: [(&str, &str); 8] = [
    ("rax", "rax"),
    ("eax", "rax"),
    ("rbx", "rbx"),
    ("bx", "rbx"),
    ("rcx", "rcx"),
    ("cl", "rcx"),
    ("rdx", "rdx"),
    ("dh", "rdx"),
];

/// `read_write` writes `eax` and reads `rbx`
pub fn read_write_module() -> (Module, FunctionId) {
    let mut b = ModuleBuilder::new("read_write");
    let f = b.function("read_write");
    b.write_register(f, "eax");
    b.read_register(f, "rbx");
    (b.build().unwrap(), f)
}

/// `f` ↔ `g` mutually recursive; `g` writes `rax` and reads `rcx`, `f`
/// touches nothing itself. `main` calls `f`.
pub struct MutualRecursion {
    pub module: Module,
    pub main: FunctionId,
    pub f: FunctionId,
    pub g: FunctionId,
}

pub fn mutual_recursion_module() -> MutualRecursion {
    let mut b = ModuleBuilder::new("mutual");
    let main = b.function("main");
    let f = b.function("f");
    let g = b.function("g");
    b.call(main, f);
    b.call(f, g);
    b.write_register(g, "eax");
    b.read_register(g, "rcx");
    b.call(g, f);
    MutualRecursion {
        module: b.build().unwrap(),
        main,
        f,
        g,
    }
}

/// One generated instruction: `(kind, operand)` with kind 0 = read,
/// 1 = write, 2 = call. The operand indexes `RAW_REGISTERS` or, for calls,
/// the function list (modulo its length).
pub type GeneratedBody = Vec<(u8, usize)>;

pub fn generated_module(bodies: &[GeneratedBody]) -> Module {
    let mut b = ModuleBuilder::new("generated");
    let functions: Vec<FunctionId> = (0..bodies.len())
        .map(|i| b.function(format!("fn{}", i)))
        .collect();
    for (caller, body) in functions.iter().zip(bodies) {
        for &(kind, operand) in body {
            match kind % 3 {
                0 => b.read_register(*caller, RAW_REGISTERS[operand % 8].0),
                1 => b.write_register(*caller, RAW_REGISTERS[operand % 8].0),
                _ => {
                    b.call(*caller, functions[operand % functions.len()]);
                }
            }
        }
    }
    b.build().unwrap()
}

/// Registers each function may write / read through any call path,
/// computed by plain reachability
pub fn reachable_effects(bodies: &[GeneratedBody]) -> Vec<(BTreeSet<&'static str>, BTreeSet<&'static str>)> {
    let n = bodies.len();
    let callees: Vec<Vec<usize>> = bodies
        .iter()
        .map(|body| {
            body.iter()
                .filter(|(kind, _)| kind % 3 == 2)
                .map(|&(_, operand)| operand % n)
                .collect()
        })
        .collect();

    (0..n)
        .map(|start| {
            let mut writes = BTreeSet::new();
            let mut reads = BTreeSet::new();
            let mut seen = vec![false; n];
            let mut stack = vec![start];
            while let Some(f) = stack.pop() {
                if std::mem::replace(&mut seen[f], true) {
                    continue;
                }
                for &(kind, operand) in &bodies[f] {
                    match kind % 3 {
                        0 => {
                            reads.insert(RAW_REGISTERS[operand % 8].1);
                        }
                        1 => {
                            writes.insert(RAW_REGISTERS[operand % 8].1);
                        }
                        _ => {}
                    }
                }
                stack.extend(callees[f].iter().copied());
            }
            (writes, reads)
        })
        .collect()
}

/// Functions that sit on a call cycle (including self calls)
pub fn functions_on_cycles(bodies: &[GeneratedBody]) -> BTreeSet<usize> {
    let n = bodies.len();
    let reaches = |from: usize, to: usize| {
        let mut seen = vec![false; n];
        let mut stack: Vec<usize> = bodies[from]
            .iter()
            .filter(|(kind, _)| kind % 3 == 2)
            .map(|&(_, operand)| operand % n)
            .collect();
        while let Some(f) = stack.pop() {
            if f == to {
                return true;
            }
            if std::mem::replace(&mut seen[f], true) {
                continue;
            }
            stack.extend(
                bodies[f]
                    .iter()
                    .filter(|(kind, _)| kind % 3 == 2)
                    .map(|&(_, operand)| operand % n),
            );
        }
        false
    };
    (0..n).filter(|&f| reaches(f, f)).collect()
}

/// Functions from which some call cycle is reachable (including the
/// functions on a cycle)
pub fn functions_reaching_cycles(bodies: &[GeneratedBody]) -> BTreeSet<usize> {
    let n = bodies.len();
    let cyclic = functions_on_cycles(bodies);
    (0..n)
        .filter(|&start| {
            let mut seen = vec![false; n];
            let mut stack = vec![start];
            while let Some(f) = stack.pop() {
                if cyclic.contains(&f) {
                    return true;
                }
                if std::mem::replace(&mut seen[f], true) {
                    continue;
                }
                stack.extend(
                    bodies[f]
                        .iter()
                        .filter(|(kind, _)| kind % 3 == 2)
                        .map(|&(_, operand)| operand % n),
                );
            }
            false
        })
        .collect()
}

/// One derivation step of a generated pointer chain
#[derive(Debug, Clone, Copy)]
pub enum ChainStep {
    /// `p + c`
    Constant(i64),
    /// `p - c`
    Minus(i64),
    /// `p + i * stride` with a fresh argument `i`
    Scaled(i64),
    /// `p + (i << shift)`
    Shifted(i64),
}

pub struct Chain {
    pub module: Module,
    pub function: FunctionId,
    pub root: ValueId,
    /// Derived values, outermost last
    pub values: Vec<ValueId>,
    pub candidates: CandidatePointers,
}

/// `root = arg0`, then one derived candidate per step
pub fn chain_module(steps: &[ChainStep]) -> Chain {
    let mut b = ModuleBuilder::new("chain");
    let f = b.function("chain");
    let root = b.argument(f);
    let mut values = Vec::new();
    let mut current = root;
    for step in steps {
        current = match *step {
            ChainStep::Constant(c) => {
                let k = b.constant(c);
                b.add(f, current, k)
            }
            ChainStep::Minus(c) => {
                let k = b.constant(c);
                b.sub(f, current, k)
            }
            ChainStep::Scaled(stride) => {
                let i = b.argument(f);
                let k = b.constant(stride);
                let scaled = b.mul(f, i, k);
                b.add(f, current, scaled)
            }
            ChainStep::Shifted(shift) => {
                let i = b.argument(f);
                let k = b.constant(shift);
                let shifted = b.shl(f, i, k);
                b.add(f, current, shifted)
            }
        };
        values.push(current);
    }
    let candidates = std::iter::once(root).chain(values.iter().copied()).collect();
    Chain {
        module: b.build().unwrap(),
        function: f,
        root,
        values,
        candidates,
    }
}

/// Two functions over one struct layout: `first(p)` touches `p+8` and
/// `p+8+4*i`, `second(q)` touches `q+16` and `q-8`
pub struct TwoObjects {
    pub module: Module,
    pub first: FunctionId,
    pub second: FunctionId,
    pub p: ValueId,
    pub q: ValueId,
    pub candidates: CandidatePointers,
}

pub fn two_objects_module() -> TwoObjects {
    let mut b = ModuleBuilder::new("objects");
    let first = b.function("first");
    let second = b.function("second");

    let p = b.argument(first);
    let i = b.argument(first);
    b.name(p, "p");
    b.name(i, "i");
    let eight = b.constant(8);
    let four = b.constant(4);
    let field = b.add(first, p, eight);
    let scaled = b.mul(first, i, four);
    b.add(first, field, scaled);

    let q = b.argument(second);
    b.name(q, "q");
    let sixteen = b.constant(16);
    b.add(second, q, sixteen);
    b.sub(second, q, eight);

    let module = b.build().unwrap();
    let candidates = CandidatePointers::heuristic(&module);
    TwoObjects {
        module,
        first,
        second,
        p,
        q,
        candidates,
    }
}
