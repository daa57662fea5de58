//! ffi-audit-core
//!
//! Core library for auditing native functions that a managed runtime calls
//! across a JNI boundary.
//!
//! This crate defines the IR consumed by the audit (model), the interprocedural
//! predicates (analysis), the entry driver and its output sinks (services), and
//! the audit workspace with its run history (db).
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends.

pub mod model;
pub mod analysis;
pub mod services;
pub mod db;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
