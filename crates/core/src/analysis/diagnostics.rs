//! Structural checks on the IR before it is audited.
//!
//! Problems are reported per function and never stop the audit: the predicates
//! already treat every shape listed here as "no match".

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::runtime_ops::{slot_access, SlotAccess};
use crate::model::{InstKind, Program, Type};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The name was listed more than once; later copies were dropped.
    DuplicateFunction,
    /// Called but never listed; treated as an external declaration.
    ImplicitDeclaration,
    /// An operand carries no type information.
    MissingType { operand: usize },
    /// A type signature that could not be parsed; kept verbatim.
    MalformedType { signature: String },
    /// Instruction in an unknown shape, kept as opaque. `opcode` is absent when
    /// the entry could not be read at all.
    UnknownOpcode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opcode: Option<String>,
    },
    /// Address computation whose base is not a pointer.
    NonPointerBase { base_type: String },
    /// Native-interface access without a usable constant slot index.
    MalformedInterfaceSlot,
}

/// One problem found in one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<usize>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instruction {
            Some(index) => write!(f, "{}#{}: ", self.function, index)?,
            None => write!(f, "{}: ", self.function)?,
        }
        match &self.kind {
            DiagnosticKind::DuplicateFunction => f.write_str("duplicate definition ignored"),
            DiagnosticKind::ImplicitDeclaration => {
                f.write_str("called but not listed; treated as an external declaration")
            }
            DiagnosticKind::MissingType { operand } => {
                write!(f, "operand {operand} has no type information")
            }
            DiagnosticKind::MalformedType { signature } => {
                write!(f, "unparseable type signature '{signature}'")
            }
            DiagnosticKind::UnknownOpcode { opcode: Some(opcode) } => {
                write!(f, "instruction '{opcode}' not understood; treated as opaque")
            }
            DiagnosticKind::UnknownOpcode { opcode: None } => {
                f.write_str("unreadable instruction; treated as opaque")
            }
            DiagnosticKind::NonPointerBase { base_type } => {
                write!(f, "address computation on non-pointer base {base_type}")
            }
            DiagnosticKind::MalformedInterfaceSlot => {
                f.write_str("native interface access without a constant slot index")
            }
        }
    }
}

/// Collect diagnostics for the whole program.
pub fn validate(program: &Program) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for name in program.duplicate_names() {
        out.push(Diagnostic {
            function: name.clone(),
            instruction: None,
            kind: DiagnosticKind::DuplicateFunction,
        });
    }
    for name in program.implicit_declarations() {
        out.push(Diagnostic {
            function: name.clone(),
            instruction: None,
            kind: DiagnosticKind::ImplicitDeclaration,
        });
    }

    for function in program.functions() {
        for (index, inst) in function.instructions().iter().enumerate() {
            let mut push = |kind| {
                let function = function.name.clone();
                out.push(Diagnostic { function, instruction: Some(index), kind })
            };
            if let InstKind::Unsupported { opcode, .. } = &inst.kind {
                push(DiagnosticKind::UnknownOpcode { opcode: opcode.clone() });
            }
            for (operand, value) in inst.operands().enumerate() {
                match &value.ty {
                    Type::Unknown => push(DiagnosticKind::MissingType { operand }),
                    Type::Malformed(raw) => {
                        push(DiagnosticKind::MalformedType { signature: raw.clone() })
                    }
                    _ => {}
                }
            }
            if let InstKind::Cast { to: Type::Malformed(raw), .. } = &inst.kind {
                push(DiagnosticKind::MalformedType { signature: raw.clone() });
            }
            if let InstKind::AddressOf { base, .. } = &inst.kind {
                let ty = &base.ty;
                if !ty.is_pointer() && !ty.is_unknown() && !ty.is_malformed() {
                    push(DiagnosticKind::NonPointerBase { base_type: ty.signature() });
                }
            }
            if slot_access(inst) == SlotAccess::Malformed {
                push(DiagnosticKind::MalformedInterfaceSlot);
            }
        }
    }

    for diagnostic in &out {
        warn!(%diagnostic, "IR diagnostic");
    }
    out
}

/// Diagnostics that concern one function.
pub fn for_function<'d>(diagnostics: &'d [Diagnostic], name: &str) -> Vec<&'d Diagnostic> {
    diagnostics.iter().filter(|d| d.function == name).collect()
}
