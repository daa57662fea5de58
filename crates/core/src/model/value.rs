use serde::{Deserialize, Serialize};

use super::Type;

/// What an operand refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "value", rename_all = "snake_case")]
pub enum ValueKind {
    /// SSA result of an earlier instruction.
    Local { name: String },
    /// Formal parameter by position.
    Argument { index: u32 },
    Constant { int: i64 },
    Null,
    Undef,
    /// Global storage. `constant` globals are read-only (string literals, tables).
    Global {
        name: String,
        #[serde(default)]
        constant: bool,
    },
    /// Address of a function.
    Function { name: String },
}

/// Typed operand, e.g. `{"value": "local", "name": "c", "ty": "i8*"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    #[serde(flatten)]
    pub kind: ValueKind,
    #[serde(default)]
    pub ty: Type,
}

impl Value {
    pub fn new(kind: ValueKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn local(name: impl Into<String>, ty: Type) -> Self {
        Self::new(ValueKind::Local { name: name.into() }, ty)
    }

    pub fn argument(index: u32, ty: Type) -> Self {
        Self::new(ValueKind::Argument { index }, ty)
    }

    pub fn const_int(value: i64, ty: Type) -> Self {
        Self::new(ValueKind::Constant { int: value }, ty)
    }

    pub fn i32(value: i64) -> Self {
        Self::const_int(value, Type::scalar("i32"))
    }

    pub fn i64(value: i64) -> Self {
        Self::const_int(value, Type::scalar("i64"))
    }

    pub fn global(name: impl Into<String>, ty: Type) -> Self {
        Self::new(ValueKind::Global { name: name.into(), constant: false }, ty)
    }

    pub fn constant_global(name: impl Into<String>, ty: Type) -> Self {
        Self::new(ValueKind::Global { name: name.into(), constant: true }, ty)
    }

    /// Integer payload when this is a constant.
    pub fn as_const_int(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Constant { int } => Some(int),
            _ => None,
        }
    }

    pub fn is_const_zero(&self) -> bool {
        self.as_const_int() == Some(0)
    }

    /// Name of the referenced global if it is writable storage.
    pub fn mutable_global(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Global { name, constant: false } => Some(name),
            _ => None,
        }
    }
}
