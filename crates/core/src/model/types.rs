use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static type of an IR value.
///
/// Types are written in IR dumps using their LLVM-style display signature
/// (`i8*`, `%struct.JNINativeInterface_**`, `[5 x i8]`) and parsed into this
/// structured form on load. A signature that does not parse is kept verbatim
/// as [`Type::Malformed`] so the rest of the dump still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Type {
    /// Pointer to another type.
    Pointer(Box<Type>),
    /// Named aggregate, stored without the leading `%` (e.g. `struct.Point`).
    Struct(String),
    /// Fixed-length array `[N x T]`.
    Array(u64, Box<Type>),
    /// Any other leaf type (`i32`, `double`, `void`, function types).
    Scalar(String),
    /// No type information was provided.
    #[default]
    Unknown,
    /// Signature text that could not be parsed.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("empty type signature")]
    Empty,
    #[error("malformed array type '{0}'")]
    MalformedArray(String),
}

impl Type {
    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer(Box::new(pointee))
    }

    pub fn named_struct(name: impl Into<String>) -> Self {
        Type::Struct(name.into())
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Type::Scalar(name.into())
    }

    pub fn array(len: u64, element: Type) -> Self {
        Type::Array(len, Box::new(element))
    }

    /// Pointee of a pointer type, `None` for everything else.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Type::Malformed(_))
    }

    /// Rendered display signature, as an LLVM type printer would produce it.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Pointer(inner) => write!(f, "{inner}*"),
            Type::Struct(name) if name.starts_with('{') => f.write_str(name),
            Type::Struct(name) => write!(f, "%{name}"),
            Type::Array(len, element) => write!(f, "[{len} x {element}]"),
            Type::Scalar(name) => f.write_str(name),
            Type::Unknown => f.write_str("?"),
            Type::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for Type {
    type Err = TypeParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(TypeParseError::Empty);
        }
        if s == "?" {
            return Ok(Type::Unknown);
        }
        if let Some(inner) = s.strip_suffix('*') {
            return Ok(Type::pointer_to(inner.parse()?));
        }
        if let Some(body) = s.strip_prefix('[') {
            let body = body
                .strip_suffix(']')
                .ok_or_else(|| TypeParseError::MalformedArray(s.to_string()))?;
            let (len, element) = body
                .split_once(" x ")
                .ok_or_else(|| TypeParseError::MalformedArray(s.to_string()))?;
            let len: u64 =
                len.trim().parse().map_err(|_| TypeParseError::MalformedArray(s.to_string()))?;
            return Ok(Type::array(len, element.parse()?));
        }
        if let Some(name) = s.strip_prefix('%') {
            return Ok(Type::Struct(name.to_string()));
        }
        // Literal struct bodies like `{ i32, i8* }` are aggregates too.
        if s.starts_with('{') && s.ends_with('}') {
            return Ok(Type::Struct(s.to_string()));
        }
        Ok(Type::Scalar(s.to_string()))
    }
}

impl From<String> for Type {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(ty) => ty,
            Err(TypeParseError::Empty) => Type::Unknown,
            Err(_) => Type::Malformed(value),
        }
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}
