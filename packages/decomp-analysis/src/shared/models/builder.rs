//! Module builder
//!
//! Convenience construction of [`Module`]s for lifters, fixtures and tests.
//! Misuse (e.g. a foreign function id) is remembered and reported by
//! [`ModuleBuilder::build`] instead of panicking mid-construction.

use super::ids::{CallSiteId, FunctionId, ValueId};
use super::ir::{BinaryOp, CallSite, CallTarget, Function, Instruction, Module, Value, ValueDef};
use crate::errors::{AnalysisError, Result};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
    error: Option<AnalysisError>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module::new(name),
            error: None,
        }
    }

    /// Add an empty function
    pub fn function(&mut self, name: impl Into<String>) -> FunctionId {
        let id = FunctionId::new(self.module.functions.len());
        self.module.functions.push(Function {
            name: name.into(),
            arguments: Vec::new(),
            body: Vec::new(),
        });
        id
    }

    /// Append the next formal parameter of `function`
    pub fn argument(&mut self, function: FunctionId) -> ValueId {
        let index = self
            .module
            .function(function)
            .map(|f| f.arguments.len())
            .unwrap_or(0);
        let id = self.push_value(ValueDef::Argument { function, index });
        match self.module.functions.get_mut(function.index()) {
            Some(f) => f.arguments.push(id),
            None => self.record(AnalysisError::UnknownFunction(function)),
        }
        id
    }

    pub fn global(&mut self, name: impl Into<String>) -> ValueId {
        self.push_value(ValueDef::Global { name: name.into() })
    }

    pub fn constant(&mut self, value: i64) -> ValueId {
        self.push_value(ValueDef::Constant { value })
    }

    pub fn binary(
        &mut self,
        function: FunctionId,
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    ) -> ValueId {
        self.push_value(ValueDef::Binary {
            function,
            op,
            lhs,
            rhs,
        })
    }

    pub fn add(&mut self, function: FunctionId, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(function, BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, function: FunctionId, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(function, BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, function: FunctionId, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(function, BinaryOp::Mul, lhs, rhs)
    }

    pub fn shl(&mut self, function: FunctionId, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(function, BinaryOp::Shl, lhs, rhs)
    }

    /// A function-local value with no modelled structure
    pub fn opaque(&mut self, function: FunctionId) -> ValueId {
        self.push_value(ValueDef::Opaque { function })
    }

    /// Attach a display name to a value
    pub fn name(&mut self, value: ValueId, name: impl Into<String>) -> ValueId {
        match self.module.values.get_mut(value.index()) {
            Some(v) => v.name = Some(name.into()),
            None => self.record(AnalysisError::UnknownValue(value)),
        }
        value
    }

    pub fn read_register(&mut self, function: FunctionId, register: impl Into<String>) {
        self.push_instruction(
            function,
            Instruction::ReadRegister {
                register: register.into(),
            },
        );
    }

    pub fn write_register(&mut self, function: FunctionId, register: impl Into<String>) {
        self.push_instruction(
            function,
            Instruction::WriteRegister {
                register: register.into(),
            },
        );
    }

    /// Direct call from `caller` to `callee`
    pub fn call(&mut self, caller: FunctionId, callee: FunctionId) -> CallSiteId {
        self.push_call(caller, CallTarget::Direct { function: callee })
    }

    /// Call through `target`, a value with no statically known callee
    pub fn call_indirect(&mut self, caller: FunctionId, target: ValueId) -> CallSiteId {
        self.push_call(caller, CallTarget::Indirect { value: target })
    }

    /// Validate and return the module
    pub fn build(self) -> Result<Module> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.module.validate()?;
        Ok(self.module)
    }

    fn push_value(&mut self, def: ValueDef) -> ValueId {
        let id = ValueId::new(self.module.values.len());
        self.module.values.push(Value { name: None, def });
        id
    }

    fn push_call(&mut self, caller: FunctionId, target: CallTarget) -> CallSiteId {
        let site = CallSiteId::new(self.module.call_sites.len());
        self.module.call_sites.push(CallSite { caller, target });
        self.push_instruction(caller, Instruction::Call { site });
        site
    }

    fn push_instruction(&mut self, function: FunctionId, inst: Instruction) {
        match self.module.functions.get_mut(function.index()) {
            Some(f) => f.body.push(inst),
            None => self.record(AnalysisError::UnknownFunction(function)),
        }
    }

    fn record(&mut self, err: AnalysisError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
