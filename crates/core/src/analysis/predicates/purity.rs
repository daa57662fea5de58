use crate::analysis::finding::Reason;
use crate::analysis::predicates::PredicateKind;
use crate::analysis::traversal::Predicate;
use crate::model::{Function, Instruction};

/// Fires on anything that makes a function observably impure.
///
/// A positive result means *impure*; callers flip it for the `is_pure` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Purity;

impl Predicate for Purity {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Purity
    }

    fn check_function(&self, function: &Function) -> Option<Reason> {
        (!function.only_reads_memory()).then_some(Reason::WritesMemory)
    }

    fn check_instruction(&self, inst: &Instruction) -> Option<Reason> {
        if let Some(global) = inst.operands().find_map(|v| v.mutable_global()) {
            return Some(Reason::MutableGlobal { global: global.to_string() });
        }
        if inst.may_throw {
            return Some(Reason::MayThrow);
        }
        if inst.no_return {
            return Some(Reason::NoReturn);
        }
        None
    }

    /// The runtime may do anything on our behalf.
    fn boundary_call(&self, _call: &Instruction) -> Option<Reason> {
        Some(Reason::BoundaryCall)
    }
}
