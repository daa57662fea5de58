//! Interprocedural soundness checks over the IR.
//!
//! - `boundary`: which calls cross into the managed runtime.
//! - `aggregate`: whether a pointer reaches a struct.
//! - `runtime_ops`: JNI memory-management slots and platform allocators.
//! - `traversal`: the call-graph walk every predicate runs on.
//! - `predicates`: purity, pointer arithmetic, type casts, dynamic memory.
//! - `diagnostics`: structural problems in the input IR.

pub mod aggregate;
pub mod boundary;
pub mod diagnostics;
pub mod finding;
pub mod predicates;
pub mod runtime_ops;
pub mod traversal;

pub use diagnostics::{validate, Diagnostic, DiagnosticKind};
pub use finding::{Finding, Reason};
pub use predicates::PredicateKind;
pub use traversal::{analyze, CyclePolicy, Predicate, Traversal};
