use crate::analysis::finding::Reason;
use crate::analysis::predicates::PredicateKind;
use crate::analysis::runtime_ops::{allocator, native_memory_slot};
use crate::analysis::traversal::Predicate;
use crate::model::Instruction;

/// Fires on platform allocator calls and on JNI memory-management slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicMemory;

impl Predicate for DynamicMemory {
    fn kind(&self) -> PredicateKind {
        PredicateKind::DynamicMemory
    }

    fn check_instruction(&self, inst: &Instruction) -> Option<Reason> {
        if let Some(op) = native_memory_slot(inst) {
            return Some(Reason::NativeInterfaceSlot {
                slot: op.slot,
                operation: op.name.to_string(),
            });
        }
        let symbol = allocator(inst.callee()?)?;
        Some(Reason::AllocatorCall { symbol: symbol.symbol.to_string() })
    }

    /// Memory handed out by the runtime itself is the runtime's business; only
    /// the slot lookups above are flagged.
    fn boundary_call(&self, _call: &Instruction) -> Option<Reason> {
        None
    }
}
