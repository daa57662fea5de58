use std::path::{Path, PathBuf};

/// Logical layout of an audit workspace on disk.
///
/// Derived from a chosen root path. It does *not* perform any IO itself; the
/// CLI creates directories and files based on it.
#[derive(Debug, Clone)]
pub struct AuditLayout {
    pub root: PathBuf,
    /// Directory for internal metadata (.ffi-audit).
    pub meta_dir: PathBuf,
    /// Path to the config file (JSON).
    pub config_path: PathBuf,
    /// Default path of the run-history database.
    pub db_path: PathBuf,
    /// Default directory for the text logs.
    pub logs_dir: PathBuf,
}

impl AuditLayout {
    /// Compute the default layout for an audit rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".ffi-audit");
        let config_path = meta_dir.join("config.json");
        let db_path = meta_dir.join("audit.db");
        let logs_dir = root.join("logs");

        Self { root, meta_dir, config_path, db_path, logs_dir }
    }

    /// Database path suitable for storing in `AuditConfig`, relative to `root`
    /// when possible.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// Resolve a configured path against the root; absolute paths pass through.
    pub fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
