//! Audit workspace layout, configuration and run history.
//!
//! - `AuditConfig`: serializable settings stored at `.ffi-audit/config.json`.
//! - `AuditLayout`: computed paths under an audit root.
//! - `AuditDb`: SQLite store of runs, verdicts, findings and diagnostics.
//! - `AuditContext`: all of the above opened for one root.

mod audit_db;
mod config;
mod context;
mod layout;
mod models;
mod util;

pub use audit_db::{AuditDb, DbError, DbResult, CURRENT_SCHEMA_VERSION};
pub use config::{AnalysisSettings, AuditConfig, DbConfig, LogSettings};
pub use context::AuditContext;
pub use layout::AuditLayout;
pub use models::{AuditRun, AuditRunRecord, AuditRunStatus, StoredFinding, StoredRecord};
pub use util::{load_config, open_audit_db};
