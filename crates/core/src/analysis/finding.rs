use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a predicate fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    /// Function lacks `readonly`/`readnone`.
    WritesMemory,
    /// Operand refers to writable global storage.
    MutableGlobal { global: String },
    MayThrow,
    NoReturn,
    /// Call into the managed runtime.
    BoundaryCall,
    /// Non-zero offset from a pointer that does not reach a struct.
    PointerArithmetic { base_type: String },
    ReinterpretCast { cast: String },
    AllocatorCall { symbol: String },
    NativeInterfaceSlot { slot: u32, operation: String },
    /// Call back into a function already on the traversal path, under the
    /// conservative cycle policy.
    RecursiveCall { callee: String },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::WritesMemory => f.write_str("function may write memory"),
            Reason::MutableGlobal { global } => write!(f, "uses mutable global @{global}"),
            Reason::MayThrow => f.write_str("instruction may throw"),
            Reason::NoReturn => f.write_str("instruction does not return"),
            Reason::BoundaryCall => f.write_str("calls into the managed runtime"),
            Reason::PointerArithmetic { base_type } => {
                write!(f, "pointer arithmetic on {base_type}")
            }
            Reason::ReinterpretCast { cast } => write!(f, "{cast} cast"),
            Reason::AllocatorCall { symbol } => write!(f, "calls {symbol}"),
            Reason::NativeInterfaceSlot { slot, operation } => {
                write!(f, "JNI {operation} (slot {slot})")
            }
            Reason::RecursiveCall { callee } => {
                write!(f, "recursive call to {callee} assumed positive")
            }
        }
    }
}

/// Where and why a predicate fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Function whose body (or attributes) triggered the predicate.
    pub function: String,
    /// Instruction position in that function; `None` for function-level facts.
    pub instruction: Option<usize>,
    pub reason: Reason,
    /// Call chain from the analyzed entry down to `function`, inclusive.
    pub call_path: Vec<String>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instruction {
            Some(index) => write!(f, "{} in {}#{}", self.reason, self.function, index)?,
            None => write!(f, "{} in {}", self.reason, self.function)?,
        }
        if self.call_path.len() > 1 {
            write!(f, " via {}", self.call_path.join(" -> "))?;
        }
        Ok(())
    }
}
