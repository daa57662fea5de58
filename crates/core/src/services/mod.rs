//! Services that run audits and route their output.

pub mod audit;
pub mod sinks;

pub use audit::{
    audit_function, boundary_entries, run_audit, run_predicate, AnalysisRecord, AuditError,
    AuditMode, AuditOptions, AuditReport, AuditRunner, FunctionAudit, PredicateResult,
    ProgramSource,
};
pub use sinks::{log_file_name, AuditSink, LogDirSink, MemorySink, NullSink, COMBINED_LOG};
