use crate::analysis::finding::Reason;
use crate::analysis::predicates::PredicateKind;
use crate::analysis::traversal::Predicate;
use crate::model::{InstKind, Instruction};

/// Fires on `inttoptr` and `ptrtoint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCasts;

impl Predicate for TypeCasts {
    fn kind(&self) -> PredicateKind {
        PredicateKind::TypeCasts
    }

    fn check_instruction(&self, inst: &Instruction) -> Option<Reason> {
        match &inst.kind {
            InstKind::Cast { kind, .. } if kind.is_reinterpretation() => {
                Some(Reason::ReinterpretCast { cast: kind.mnemonic().to_string() })
            }
            _ => None,
        }
    }

    fn boundary_call(&self, _call: &Instruction) -> Option<Reason> {
        None
    }
}
