use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::{Type, Value};

/// Cast sub-kinds, named after their LLVM opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastKind {
    IntToPtr,
    PtrToInt,
    BitCast,
    AddrSpaceCast,
    Trunc,
    ZExt,
    SExt,
    FpTrunc,
    FpExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
}

impl CastKind {
    /// Casts that move a value between the integer and pointer domains.
    pub fn is_reinterpretation(self) -> bool {
        matches!(self, CastKind::IntToPtr | CastKind::PtrToInt)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CastKind::IntToPtr => "inttoptr",
            CastKind::PtrToInt => "ptrtoint",
            CastKind::BitCast => "bitcast",
            CastKind::AddrSpaceCast => "addrspacecast",
            CastKind::Trunc => "trunc",
            CastKind::ZExt => "zext",
            CastKind::SExt => "sext",
            CastKind::FpTrunc => "fptrunc",
            CastKind::FpExt => "fpext",
            CastKind::FpToUi => "fptoui",
            CastKind::FpToSi => "fptosi",
            CastKind::UiToFp => "uitofp",
            CastKind::SiToFp => "sitofp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    Alloca,
    Load,
    Store,
    Fence,
    AtomicRmw,
    CmpXchg,
}

/// Opcode-specific payload of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstKind {
    /// Arithmetic, comparisons, terminators and anything else the audit does
    /// not need to distinguish.
    Generic {
        opcode: String,
        #[serde(default)]
        operands: Vec<Value>,
    },
    Memory {
        kind: MemoryOp,
        #[serde(default)]
        operands: Vec<Value>,
    },
    /// Direct or indirect call. `callee` is `None` when the target is unknown
    /// (function pointers, calls left behind in dead code).
    Call {
        #[serde(default)]
        callee: Option<String>,
        #[serde(default)]
        args: Vec<Value>,
    },
    /// `getelementptr`: derives a pointer from `base` and `indices`.
    AddressOf {
        base: Value,
        #[serde(default)]
        indices: Vec<Value>,
    },
    Cast {
        kind: CastKind,
        value: Value,
        to: Type,
    },
    /// An instruction the dump did not describe in a known shape: an opcode
    /// outside the ones above, or an entry that could not be read at all
    /// (`opcode` is then `None`). Its operands are still visible to the checks.
    Unsupported {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opcode: Option<String>,
        #[serde(default)]
        operands: Vec<Value>,
    },
}

/// One IR instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawInstruction")]
pub struct Instruction {
    #[serde(flatten)]
    pub kind: InstKind,
    /// The instruction may unwind into its caller.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub may_throw: bool,
    /// Control never comes back from this instruction (`unreachable`, calls to
    /// `noreturn` functions).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_return: bool,
}

/// Wire form of an instruction. Shapes that do not match a known opcode are
/// kept as [`InstKind::Unsupported`] instead of failing the whole dump.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInstruction {
    Known(KnownInstruction),
    Opaque(OpaqueInstruction),
    Unreadable(IgnoredAny),
}

#[derive(Deserialize)]
struct KnownInstruction {
    #[serde(flatten)]
    kind: InstKind,
    #[serde(default)]
    may_throw: bool,
    #[serde(default)]
    no_return: bool,
}

#[derive(Deserialize)]
struct OpaqueInstruction {
    op: String,
    #[serde(default)]
    operands: Vec<Value>,
    #[serde(default)]
    may_throw: bool,
    #[serde(default)]
    no_return: bool,
}

impl From<RawInstruction> for Instruction {
    fn from(raw: RawInstruction) -> Self {
        match raw {
            RawInstruction::Known(KnownInstruction { kind, may_throw, no_return }) => {
                Instruction { kind, may_throw, no_return }
            }
            RawInstruction::Opaque(OpaqueInstruction { op, operands, may_throw, no_return }) => {
                let kind = InstKind::Unsupported { opcode: Some(op), operands };
                Instruction { kind, may_throw, no_return }
            }
            RawInstruction::Unreadable(_) => {
                Instruction::new(InstKind::Unsupported { opcode: None, operands: Vec::new() })
            }
        }
    }
}

impl Instruction {
    pub fn new(kind: InstKind) -> Self {
        Self { kind, may_throw: false, no_return: false }
    }

    pub fn generic(opcode: impl Into<String>, operands: Vec<Value>) -> Self {
        Self::new(InstKind::Generic { opcode: opcode.into(), operands })
    }

    pub fn memory(kind: MemoryOp, operands: Vec<Value>) -> Self {
        Self::new(InstKind::Memory { kind, operands })
    }

    pub fn call(callee: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(InstKind::Call { callee: Some(callee.into()), args })
    }

    pub fn indirect_call(args: Vec<Value>) -> Self {
        Self::new(InstKind::Call { callee: None, args })
    }

    pub fn address_of(base: Value, indices: Vec<Value>) -> Self {
        Self::new(InstKind::AddressOf { base, indices })
    }

    pub fn cast(kind: CastKind, value: Value, to: Type) -> Self {
        Self::new(InstKind::Cast { kind, value, to })
    }

    pub fn throwing(mut self) -> Self {
        self.may_throw = true;
        self
    }

    pub fn diverging(mut self) -> Self {
        self.no_return = true;
        self
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, InstKind::Unsupported { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, InstKind::Call { .. })
    }

    /// Named callee of a call instruction.
    pub fn callee(&self) -> Option<&str> {
        match &self.kind {
            InstKind::Call { callee, .. } => callee.as_deref(),
            _ => None,
        }
    }

    /// First argument of a call instruction.
    pub fn first_arg(&self) -> Option<&Value> {
        match &self.kind {
            InstKind::Call { args, .. } => args.first(),
            _ => None,
        }
    }

    /// Every value the instruction reads, in operand order.
    pub fn operands(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.kind {
            InstKind::Generic { operands, .. }
            | InstKind::Memory { operands, .. }
            | InstKind::Unsupported { operands, .. } => Box::new(operands.iter()),
            InstKind::Call { args, .. } => Box::new(args.iter()),
            InstKind::AddressOf { base, indices } => {
                Box::new(std::iter::once(base).chain(indices.iter()))
            }
            InstKind::Cast { value, .. } => Box::new(std::iter::once(value)),
        }
    }

    /// True for address computations whose indices are all the constant zero,
    /// i.e. the result aliases the base pointer.
    pub fn has_all_zero_indices(&self) -> bool {
        match &self.kind {
            InstKind::AddressOf { indices, .. } => indices.iter().all(Value::is_const_zero),
            _ => false,
        }
    }
}
