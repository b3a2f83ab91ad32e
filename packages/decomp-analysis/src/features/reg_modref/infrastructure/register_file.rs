//! Data-driven register files
//!
//! A register file lists the full-width registers of an architecture and the
//! narrower views that alias them. Every view resolves to the full register
//! containing it, which is the key used in ModRef tables.

use crate::config::Architecture;
use crate::features::reg_modref::domain::RegisterId;
use crate::features::reg_modref::ports::RegisterNaming;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct RegisterInfo {
    name: String,
    bits: u16,
    container: Option<RegisterId>,
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    architecture: String,
    registers: Vec<RegisterInfo>,
    by_name: FxHashMap<String, RegisterId>,
}

impl RegisterFile {
    pub fn new(architecture: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            registers: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    pub fn for_architecture(architecture: Architecture) -> Self {
        match architecture {
            Architecture::X86_64 => Self::x86_64(),
            Architecture::Aarch64 => Self::aarch64(),
        }
    }

    /// Add a full-width register
    pub fn add_register(&mut self, name: &str, bits: u16) -> RegisterId {
        self.insert(name, bits, None)
    }

    /// Add a narrower register aliasing part of `container`
    pub fn add_view(&mut self, name: &str, bits: u16, container: RegisterId) -> RegisterId {
        let outer = &self.registers[container.index()];
        assert!(
            bits < outer.bits,
            "view {} ({} bits) must be narrower than {} ({} bits)",
            name,
            bits,
            outer.name,
            outer.bits
        );
        self.insert(name, bits, Some(container))
    }

    /// Additional spelling for an existing register
    pub fn add_alias(&mut self, alias: &str, register: RegisterId) {
        let previous = self.by_name.insert(alias.to_ascii_lowercase(), register);
        assert!(previous.is_none(), "duplicate register name {}", alias);
    }

    fn insert(&mut self, name: &str, bits: u16, container: Option<RegisterId>) -> RegisterId {
        let id = RegisterId::new(self.registers.len());
        self.add_alias(name, id);
        self.registers.push(RegisterInfo {
            name: name.to_ascii_lowercase(),
            bits,
            container,
        });
        id
    }

    /// Case-insensitive lookup of a raw operand name
    pub fn canonicalize(&self, raw: &str) -> Option<RegisterId> {
        self.by_name
            .get(raw)
            .or_else(|| self.by_name.get(&raw.to_ascii_lowercase()))
            .copied()
    }

    pub fn largest_overlapping_register(&self, register: RegisterId) -> RegisterId {
        let mut current = register;
        while let Some(outer) = self.registers[current.index()].container {
            current = outer;
        }
        current
    }

    pub fn name(&self, register: RegisterId) -> &str {
        &self.registers[register.index()].name
    }

    pub fn bits(&self, register: RegisterId) -> u16 {
        self.registers[register.index()].bits
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Full-width registers in canonical order
    pub fn full_registers(&self) -> impl Iterator<Item = RegisterId> + '_ {
        self.registers
            .iter()
            .enumerate()
            .filter(|(_, info)| info.container.is_none())
            .map(|(i, _)| RegisterId::new(i))
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn x86_64() -> Self {
        let mut file = Self::new("x86_64");

        let legacy = ["rax", "rbx", "rcx", "rdx"];
        let pointer = ["rsi", "rdi", "rbp", "rsp"];
        let full: Vec<RegisterId> = legacy
            .iter()
            .chain(pointer.iter())
            .map(|name| file.add_register(name, 64))
            .collect();
        let extended: Vec<RegisterId> = (8..16)
            .map(|n| file.add_register(&format!("r{}", n), 64))
            .collect();
        let rip = file.add_register("rip", 64);
        let rflags = file.add_register("rflags", 64);

        // rax: eax, ax, al, ah
        for (name, &reg) in legacy.iter().zip(&full[..4]) {
            let letter = &name[1..2];
            file.add_view(&format!("e{}x", letter), 32, reg);
            file.add_view(&format!("{}x", letter), 16, reg);
            file.add_view(&format!("{}l", letter), 8, reg);
            file.add_view(&format!("{}h", letter), 8, reg);
        }
        // rsi: esi, si, sil
        for (name, &reg) in pointer.iter().zip(&full[4..]) {
            let stem = &name[1..];
            file.add_view(&format!("e{}", stem), 32, reg);
            file.add_view(stem, 16, reg);
            file.add_view(&format!("{}l", stem), 8, reg);
        }
        // r8: r8d, r8w, r8b
        for (n, &reg) in (8..16).zip(&extended) {
            file.add_view(&format!("r{}d", n), 32, reg);
            file.add_view(&format!("r{}w", n), 16, reg);
            file.add_view(&format!("r{}b", n), 8, reg);
        }
        file.add_view("eip", 32, rip);
        file.add_view("ip", 16, rip);
        file.add_view("eflags", 32, rflags);
        file.add_view("flags", 16, rflags);

        file
    }

    pub fn aarch64() -> Self {
        let mut file = Self::new("aarch64");

        let x: Vec<RegisterId> = (0..31)
            .map(|n| file.add_register(&format!("x{}", n), 64))
            .collect();
        let sp = file.add_register("sp", 64);
        file.add_register("pc", 64);
        file.add_register("nzcv", 64);

        for (n, &reg) in x.iter().enumerate() {
            file.add_view(&format!("w{}", n), 32, reg);
        }
        file.add_view("wsp", 32, sp);
        file.add_alias("fp", x[29]);
        file.add_alias("lr", x[30]);

        file
    }
}

impl RegisterNaming for RegisterFile {
    fn canonicalize(&self, raw: &str) -> Option<RegisterId> {
        RegisterFile::canonicalize(self, raw)
    }

    fn largest_overlapping_register(&self, register: RegisterId) -> RegisterId {
        RegisterFile::largest_overlapping_register(self, register)
    }

    fn register_name(&self, register: RegisterId) -> &str {
        self.name(register)
    }

    fn table_keys(&self) -> Vec<RegisterId> {
        self.full_registers().collect()
    }
}
