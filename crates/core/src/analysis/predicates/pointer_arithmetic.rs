use crate::analysis::aggregate::points_to_aggregate;
use crate::analysis::finding::Reason;
use crate::analysis::predicates::PredicateKind;
use crate::analysis::traversal::Predicate;
use crate::model::{InstKind, Instruction};

/// Fires on address computations that offset a raw scalar pointer.
///
/// Zero-offset computations and computations whose base reaches a struct are
/// field accesses, not arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerArithmetic;

impl Predicate for PointerArithmetic {
    fn kind(&self) -> PredicateKind {
        PredicateKind::PointerArithmetic
    }

    fn check_instruction(&self, inst: &Instruction) -> Option<Reason> {
        let InstKind::AddressOf { base, .. } = &inst.kind else {
            return None;
        };
        // A non-pointer base is malformed IR and is reported by validation.
        if !base.ty.is_pointer() || inst.has_all_zero_indices() || points_to_aggregate(&base.ty) {
            return None;
        }
        Some(Reason::PointerArithmetic { base_type: base.ty.signature() })
    }

    fn boundary_call(&self, _call: &Instruction) -> Option<Reason> {
        None
    }
}
