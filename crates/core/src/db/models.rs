use serde::{Deserialize, Serialize};

use crate::analysis::{Finding, PredicateKind};

/// Outcome of an audit run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditRunStatus {
    /// Every entry was audited and the IR raised no diagnostics.
    Succeeded,
    /// Every entry was audited, but the IR had structural problems.
    Degraded,
}

impl AuditRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditRunStatus::Succeeded => "succeeded",
            AuditRunStatus::Degraded => "degraded",
        }
    }
}

/// Bookkeeping for one `analyze` invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRunRecord {
    /// Module name from the IR dump, if it carried one.
    pub module: Option<String>,
    /// IR dump path as given on the command line.
    pub program_path: String,
    /// SHA-256 of the IR dump contents.
    pub program_hash: Option<String>,
    /// `all` for combined runs, otherwise the single analysis name.
    pub analysis: String,
    pub cycle_policy: String,
    pub entry_prefix: String,
    /// Number of boundary entries audited.
    pub entries: i64,
    pub status: AuditRunStatus,
    pub started_at: String,
    pub finished_at: String,
}

/// A persisted run together with its row id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRun {
    pub id: i64,
    #[serde(flatten)]
    pub record: AuditRunRecord,
}

/// Per-entry verdicts as stored. Single-analysis runs fill one column only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRecord {
    pub function: String,
    pub is_pure: Option<bool>,
    pub has_pointer_arithmetic: Option<bool>,
    pub has_type_casts: Option<bool>,
    pub has_dynamic_memory: Option<bool>,
}

impl StoredRecord {
    pub fn new(function: impl Into<String>) -> Self {
        Self { function: function.into(), ..Self::default() }
    }

    /// Record one predicate outcome, already flipped to the stored polarity.
    pub fn set(&mut self, kind: PredicateKind, fired: bool) {
        match kind {
            PredicateKind::Purity => self.is_pure = Some(!fired),
            PredicateKind::PointerArithmetic => self.has_pointer_arithmetic = Some(fired),
            PredicateKind::TypeCasts => self.has_type_casts = Some(fired),
            PredicateKind::DynamicMemory => self.has_dynamic_memory = Some(fired),
        }
    }
}

/// Why one predicate fired for one entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFinding {
    /// Boundary entry the traversal started from.
    pub entry: String,
    pub predicate: PredicateKind,
    pub finding: Finding,
}
