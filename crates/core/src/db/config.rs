use serde::{Deserialize, Serialize};

use crate::analysis::CyclePolicy;

/// Database location, relative to the audit root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Defaults applied by `analyze` when the command line leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Name prefix that marks a defined function as a boundary entry.
    #[serde(default = "default_entry_prefix")]
    pub entry_prefix: String,
    #[serde(default)]
    pub cycle_policy: CyclePolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self { entry_prefix: default_entry_prefix(), cycle_policy: CyclePolicy::default() }
    }
}

fn default_entry_prefix() -> String {
    "Java_".to_string()
}

/// Where the append-only text logs are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log directory, relative to the audit root unless absolute.
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { dir: default_log_dir() }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Serializable configuration of an audit workspace.
///
/// Lives at `.ffi-audit/config.json` in the audit root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Human-friendly name, usually the library being audited.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version of this config format.
    pub config_version: String,
    pub db: DbConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub logs: LogSettings,
}

impl AuditConfig {
    /// Create a configuration with default analysis and log settings.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            analysis: AnalysisSettings::default(),
            logs: LogSettings::default(),
        }
    }
}
