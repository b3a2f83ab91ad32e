//! Lifted IR model
//!
//! Only the structure the two analyses look at is modelled:
//! - register reads/writes and call sites (register ModRef)
//! - pointer arithmetic operand structure (pointer discovery)
//!
//! Everything else a lifter produces (loads, stores, flags, ...) is an
//! `Opaque` value.

use super::ids::{CallSiteId, FunctionId, ValueId};
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators relevant to address arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Shl,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Shl => "shl",
        };
        f.write_str(s)
    }
}

/// How a value is defined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueDef {
    /// Formal parameter `index` of `function`
    Argument { function: FunctionId, index: usize },

    /// Module-level symbol; `symbol` in JSON, `name` is the display name
    Global {
        #[serde(rename = "symbol")]
        name: String,
    },

    /// Compile-time integer constant
    Constant { value: i64 },

    /// `lhs op rhs`, computed inside `function`
    Binary {
        function: FunctionId,
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },

    /// Any other function-local value (load result, call result, ...)
    Opaque { function: FunctionId },
}

impl ValueDef {
    /// Function the value is local to; `None` for globals and constants
    pub fn function(&self) -> Option<FunctionId> {
        match self {
            ValueDef::Argument { function, .. }
            | ValueDef::Binary { function, .. }
            | ValueDef::Opaque { function } => Some(*function),
            ValueDef::Global { .. } | ValueDef::Constant { .. } => None,
        }
    }

    pub fn as_constant(&self) -> Option<i64> {
        match self {
            ValueDef::Constant { value } => Some(*value),
            _ => None,
        }
    }
}

/// Entry of the module value table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub def: ValueDef,
}

/// Register-level instruction effects plus calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Reads a raw register operand (e.g. `eax`)
    ReadRegister { register: String },

    /// Writes a raw register operand
    WriteRegister { register: String },

    /// Call through the given call site
    Call { site: CallSiteId },
}

/// Statically known or unknown callee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    Direct { function: FunctionId },
    /// Called through a value; the callee cannot be resolved statically
    Indirect { value: ValueId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: FunctionId,
    pub target: CallTarget,
}

impl CallSite {
    pub fn direct_callee(&self) -> Option<FunctionId> {
        match self.target {
            CallTarget::Direct { function } => Some(function),
            CallTarget::Indirect { .. } => None,
        }
    }
}

/// A location queried against a call site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryLocation {
    /// Raw register operand name
    Register(String),
    /// Memory addressed by a value
    Value(ValueId),
}

impl MemoryLocation {
    pub fn register(name: impl Into<String>) -> Self {
        MemoryLocation::Register(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    #[serde(default)]
    pub arguments: Vec<ValueId>,

    #[serde(default)]
    pub body: Vec<Instruction>,
}

impl Function {
    /// Call sites in body order
    pub fn call_sites(&self) -> impl Iterator<Item = CallSiteId> + '_ {
        self.body.iter().filter_map(|inst| match inst {
            Instruction::Call { site } => Some(*site),
            _ => None,
        })
    }
}

/// A lifted module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,

    #[serde(default)]
    pub functions: Vec<Function>,

    #[serde(default)]
    pub values: Vec<Value>,

    #[serde(default)]
    pub call_sites: Vec<CallSite>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    /// All functions with their ids, in module order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId::new(i), f))
    }

    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> {
        (0..self.functions.len()).map(FunctionId::new)
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FunctionId::new)
    }

    /// Function name, or its id when the id is dangling
    pub fn function_name(&self, id: FunctionId) -> String {
        self.function(id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    pub fn value_def(&self, id: ValueId) -> Option<&ValueDef> {
        self.value(id).map(|v| &v.def)
    }

    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> {
        (0..self.values.len()).map(ValueId::new)
    }

    /// Function a value is local to
    pub fn owning_function(&self, id: ValueId) -> Option<FunctionId> {
        self.value_def(id).and_then(ValueDef::function)
    }

    pub fn call_site(&self, id: CallSiteId) -> Option<&CallSite> {
        self.call_sites.get(id.index())
    }

    pub fn call_sites(&self) -> impl Iterator<Item = (CallSiteId, &CallSite)> {
        self.call_sites
            .iter()
            .enumerate()
            .map(|(i, cs)| (CallSiteId::new(i), cs))
    }

    /// Short textual form of a value for dumps
    pub fn display_value(&self, id: ValueId) -> String {
        let Some(value) = self.value(id) else {
            return format!("%{}", id);
        };
        if let Some(name) = &value.name {
            return format!("%{}", name);
        }
        match &value.def {
            ValueDef::Argument { index, .. } => format!("%arg{}", index),
            ValueDef::Global { name } => format!("@{}", name),
            ValueDef::Constant { value } => value.to_string(),
            ValueDef::Binary { .. } | ValueDef::Opaque { .. } => format!("%{}", id.0),
        }
    }

    /// Checks every cross reference in the module
    pub fn validate(&self) -> Result<()> {
        for (index, value) in self.values.iter().enumerate() {
            let id = ValueId::new(index);
            match &value.def {
                ValueDef::Argument {
                    function,
                    index: arg_index,
                } => {
                    let func = self
                        .function(*function)
                        .ok_or(AnalysisError::UnknownFunction(*function))?;
                    if func.arguments.get(*arg_index) != Some(&id) {
                        return Err(AnalysisError::malformed(format!(
                            "{} claims to be argument {} of '{}'",
                            id, arg_index, func.name
                        )));
                    }
                }
                ValueDef::Binary {
                    function, lhs, rhs, ..
                } => {
                    self.function(*function)
                        .ok_or(AnalysisError::UnknownFunction(*function))?;
                    for operand in [*lhs, *rhs] {
                        let def = self
                            .value_def(operand)
                            .ok_or(AnalysisError::UnknownValue(operand))?;
                        if let Some(owner) = def.function() {
                            if owner != *function {
                                return Err(AnalysisError::malformed(format!(
                                    "{} in {} uses {} local to {}",
                                    id, function, operand, owner
                                )));
                            }
                        }
                    }
                    // operands must precede their use so that derivation chains are finite
                    if lhs.index() >= index || rhs.index() >= index {
                        return Err(AnalysisError::malformed(format!(
                            "{} uses an operand defined after it",
                            id
                        )));
                    }
                }
                ValueDef::Opaque { function } => {
                    self.function(*function)
                        .ok_or(AnalysisError::UnknownFunction(*function))?;
                }
                ValueDef::Global { .. } | ValueDef::Constant { .. } => {}
            }
        }

        for (fid, func) in self.functions() {
            for (arg_index, arg) in func.arguments.iter().enumerate() {
                match self.value_def(*arg) {
                    Some(ValueDef::Argument { function, index })
                        if *function == fid && *index == arg_index => {}
                    Some(_) => {
                        return Err(AnalysisError::malformed(format!(
                            "argument {} of '{}' is not an argument value",
                            arg_index, func.name
                        )))
                    }
                    None => return Err(AnalysisError::UnknownValue(*arg)),
                }
            }
            for site in func.call_sites() {
                let call = self
                    .call_site(site)
                    .ok_or(AnalysisError::UnknownCallSite(site))?;
                if call.caller != fid {
                    return Err(AnalysisError::malformed(format!(
                        "{} is used in '{}' but belongs to {}",
                        site, func.name, call.caller
                    )));
                }
            }
        }

        for (_, call) in self.call_sites() {
            self.function(call.caller)
                .ok_or(AnalysisError::UnknownFunction(call.caller))?;
            match call.target {
                CallTarget::Direct { function } => {
                    self.function(function)
                        .ok_or(AnalysisError::UnknownFunction(function))?;
                }
                CallTarget::Indirect { value } => {
                    self.value(value).ok_or(AnalysisError::UnknownValue(value))?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_forward_operand() {
        let mut module = Module::new("m");
        module.functions.push(Function {
            name: "f".into(),
            arguments: vec![],
            body: vec![],
        });
        module.values.push(Value {
            name: None,
            def: ValueDef::Binary {
                function: FunctionId(0),
                op: BinaryOp::Add,
                lhs: ValueId(1),
                rhs: ValueId(1),
            },
        });
        module.values.push(Value {
            name: None,
            def: ValueDef::Constant { value: 4 },
        });

        assert!(matches!(
            module.validate(),
            Err(AnalysisError::MalformedModule(_))
        ));
    }

    #[test]
    fn test_validate_rejects_dangling_callee() {
        let mut module = Module::new("m");
        module.functions.push(Function {
            name: "f".into(),
            arguments: vec![],
            body: vec![Instruction::Call {
                site: CallSiteId(0),
            }],
        });
        module.call_sites.push(CallSite {
            caller: FunctionId(0),
            target: CallTarget::Direct {
                function: FunctionId(9),
            },
        });

        assert!(matches!(
            module.validate(),
            Err(AnalysisError::UnknownFunction(FunctionId(9)))
        ));
    }

    #[test]
    fn test_value_json_shape() {
        let value = Value {
            name: Some("base".into()),
            def: ValueDef::Argument {
                function: FunctionId(0),
                index: 0,
            },
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"{"name":"base","kind":"argument","function":0,"index":0}"#
        );
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
