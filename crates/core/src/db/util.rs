use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::{AuditConfig, AuditDb, AuditLayout};

/// Load the config JSON from disk for a given layout.
pub fn load_config(layout: &AuditLayout) -> Result<AuditConfig> {
    let config_json = std::fs::read_to_string(&layout.config_path).with_context(|| {
        format!("Failed to read audit config at {}", layout.config_path.display())
    })?;
    let config: AuditConfig =
        serde_json::from_str(&config_json).context("Failed to parse audit config JSON")?;
    Ok(config)
}

/// Resolve the DB path (respecting relative/absolute config) and open an AuditDb.
pub fn open_audit_db(layout: &AuditLayout) -> Result<(AuditConfig, PathBuf, AuditDb)> {
    let config = load_config(layout)?;
    let db_path = layout.resolve(&config.db.path);
    let db = AuditDb::open(&db_path)
        .with_context(|| format!("Failed to open audit database at {}", db_path.display()))?;
    Ok((config, db_path, db))
}
