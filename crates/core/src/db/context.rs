use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::db::{open_audit_db, AuditConfig, AuditDb, AuditLayout};

/// Layout, config and an open database for one audit root.
#[derive(Debug)]
pub struct AuditContext {
    pub layout: AuditLayout,
    pub config: AuditConfig,
    pub db_path: PathBuf,
    pub db: AuditDb,
}

impl AuditContext {
    /// Load the config and open the database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = AuditLayout::new(root);
        let (config, db_path, db) = open_audit_db(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Directory the text logs go to.
    pub fn logs_dir(&self) -> PathBuf {
        self.layout.resolve(&self.config.logs.dir)
    }
}
