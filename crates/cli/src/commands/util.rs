use std::path::Path;

use anyhow::Result;
use ffi_audit_core::db::AuditContext;

use crate::canonicalize_or_current;

/// Open the audit workspace rooted at `root` (config plus database).
pub fn open_context(root: &str) -> Result<AuditContext> {
    let root_path = canonicalize_or_current(root)?;
    AuditContext::from_root(root_path)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Render a stored tri-state flag: `1`, `0`, or `-` when the analysis did not run.
pub fn tri_flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "1",
        Some(false) => "0",
        None => "-",
    }
}
