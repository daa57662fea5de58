//! Entry driver: finds boundary entries and runs the predicates on each.
//!
//! Every predicate run gets its own traversal, so nothing learned while
//! auditing one entry (or one predicate) leaks into another.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{
    analyze, validate, CyclePolicy, Diagnostic, Finding, PredicateKind, Traversal,
};
use crate::db::{
    AnalysisSettings, AuditContext, AuditRunRecord, AuditRunStatus, DbError, StoredFinding,
    StoredRecord,
};
use crate::model::{Function, Program};
use crate::services::sinks::AuditSink;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write audit log: {0}")]
    Sink(#[from] std::io::Error),
    #[error("Failed to persist audit run: {0}")]
    Db(#[from] DbError),
}

/// Knobs shared by every entry of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    /// Defined functions whose name starts with this are boundary entries.
    pub entry_prefix: String,
    pub cycle_policy: CyclePolicy,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AnalysisSettings::default().into()
    }
}

impl From<AnalysisSettings> for AuditOptions {
    fn from(settings: AnalysisSettings) -> Self {
        Self { entry_prefix: settings.entry_prefix, cycle_policy: settings.cycle_policy }
    }
}

/// Which predicates a run evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// All four predicates, one combined row per entry.
    All,
    /// One predicate, one sentence per entry.
    Only(PredicateKind),
}

impl AuditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditMode::All => "all",
            AuditMode::Only(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for AuditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(AuditMode::All);
        }
        s.parse().map(AuditMode::Only)
    }
}

/// Functions with a body whose name starts with `prefix`, in program order.
pub fn boundary_entries<'p>(program: &'p Program, prefix: &str) -> Vec<&'p Function> {
    program
        .functions()
        .iter()
        .filter(|f| !f.is_declaration() && f.name.starts_with(prefix))
        .collect()
}

/// Combined verdict for one boundary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub function: String,
    pub is_pure: bool,
    pub has_pointer_arithmetic: bool,
    pub has_type_casts: bool,
    pub has_dynamic_memory: bool,
}

impl AnalysisRecord {
    /// `<name> <pure> <ptr> <cast> <dyn>`, flags as `1`/`0`.
    pub fn to_log_row(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.function,
            flag(self.is_pure),
            flag(self.has_pointer_arithmetic),
            flag(self.has_type_casts),
            flag(self.has_dynamic_memory)
        )
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl From<&AnalysisRecord> for StoredRecord {
    fn from(record: &AnalysisRecord) -> Self {
        StoredRecord {
            function: record.function.clone(),
            is_pure: Some(record.is_pure),
            has_pointer_arithmetic: Some(record.has_pointer_arithmetic),
            has_type_casts: Some(record.has_type_casts),
            has_dynamic_memory: Some(record.has_dynamic_memory),
        }
    }
}

/// Outcome of one predicate on one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateResult {
    pub kind: PredicateKind,
    pub function: String,
    #[serde(flatten)]
    pub traversal: Traversal,
}

impl PredicateResult {
    /// Whether the property was found. For purity this means *impure*.
    pub fn fired(&self) -> bool {
        self.traversal.fired()
    }

    pub fn finding(&self) -> Option<&Finding> {
        self.traversal.finding.as_ref()
    }

    /// Line written to the per-analysis log.
    pub fn sentence(&self) -> String {
        self.kind.sentence(&self.function, self.fired())
    }
}

/// All four predicates on one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionAudit {
    pub record: AnalysisRecord,
    /// One result per predicate, in [`PredicateKind::ALL`] order.
    pub results: Vec<PredicateResult>,
}

impl FunctionAudit {
    pub fn findings(&self) -> impl Iterator<Item = (PredicateKind, &Finding)> + '_ {
        self.results.iter().filter_map(|r| r.finding().map(|f| (r.kind, f)))
    }
}

/// Run one predicate from `entry` with fresh traversal state.
pub fn run_predicate(
    program: &Program,
    entry: &Function,
    kind: PredicateKind,
    options: &AuditOptions,
) -> PredicateResult {
    let predicate = kind.predicate();
    let traversal = analyze(program, entry, predicate.as_ref(), options.cycle_policy);
    PredicateResult { kind, function: entry.name.clone(), traversal }
}

/// Run all four predicates on `entry`.
pub fn audit_function(
    program: &Program,
    entry: &Function,
    options: &AuditOptions,
) -> FunctionAudit {
    let results: Vec<PredicateResult> = PredicateKind::ALL
        .iter()
        .map(|&kind| run_predicate(program, entry, kind, options))
        .collect();
    let fired = |kind: PredicateKind| results.iter().any(|r| r.kind == kind && r.fired());
    let record = AnalysisRecord {
        function: entry.name.clone(),
        is_pure: !fired(PredicateKind::Purity),
        has_pointer_arithmetic: fired(PredicateKind::PointerArithmetic),
        has_type_casts: fired(PredicateKind::TypeCasts),
        has_dynamic_memory: fired(PredicateKind::DynamicMemory),
    };
    debug!(row = %record.to_log_row(), "entry audited");
    FunctionAudit { record, results }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub module: Option<String>,
    pub mode: AuditMode,
    pub options: AuditOptions,
    /// Filled in `All` mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audits: Vec<FunctionAudit>,
    /// Filled in `Only` mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PredicateResult>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AuditReport {
    /// Number of boundary entries audited.
    pub fn entries(&self) -> usize {
        match self.mode {
            AuditMode::All => self.audits.len(),
            AuditMode::Only(_) => self.results.len(),
        }
    }

    pub fn status(&self) -> AuditRunStatus {
        if self.diagnostics.is_empty() {
            AuditRunStatus::Succeeded
        } else {
            AuditRunStatus::Degraded
        }
    }

    pub fn stored_records(&self) -> Vec<StoredRecord> {
        let mut out: Vec<StoredRecord> =
            self.audits.iter().map(|a| StoredRecord::from(&a.record)).collect();
        for result in &self.results {
            let mut record = StoredRecord::new(result.function.clone());
            record.set(result.kind, result.fired());
            out.push(record);
        }
        out
    }

    pub fn stored_findings(&self) -> Vec<StoredFinding> {
        let combined = self.audits.iter().flat_map(|a| a.results.iter());
        combined
            .chain(self.results.iter())
            .filter_map(|r| {
                r.finding().map(|finding| StoredFinding {
                    entry: r.function.clone(),
                    predicate: r.kind,
                    finding: finding.clone(),
                })
            })
            .collect()
    }
}

/// Audit every boundary entry of `program`, feeding `sink` as entries finish.
pub fn run_audit(
    program: &Program,
    mode: AuditMode,
    options: &AuditOptions,
    sink: &mut dyn AuditSink,
) -> Result<AuditReport, AuditError> {
    let diagnostics = validate(program);
    let entries = boundary_entries(program, &options.entry_prefix);
    info!(
        module = program.module().unwrap_or("<unnamed>"),
        entries = entries.len(),
        mode = mode.as_str(),
        "starting audit"
    );

    let mut report = AuditReport {
        module: program.module().map(str::to_string),
        mode,
        options: options.clone(),
        audits: Vec::new(),
        results: Vec::new(),
        diagnostics,
    };
    for entry in entries {
        match mode {
            AuditMode::All => {
                let audit = audit_function(program, entry, options);
                sink.combined(&audit)?;
                report.audits.push(audit);
            }
            AuditMode::Only(kind) => {
                let result = run_predicate(program, entry, kind, options);
                sink.single(&result)?;
                report.results.push(result);
            }
        }
    }
    Ok(report)
}

/// Identity of the IR dump a persisted run was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSource {
    pub path: String,
    pub hash: Option<String>,
}

/// Ties an audit root to a run: audits, then records the run in the database.
pub struct AuditRunner<'a> {
    pub ctx: &'a AuditContext,
}

impl<'a> AuditRunner<'a> {
    pub fn run(
        &self,
        program: &Program,
        source: &ProgramSource,
        mode: AuditMode,
        options: &AuditOptions,
        sink: &mut dyn AuditSink,
    ) -> Result<(i64, AuditReport), AuditError> {
        let started_at = Utc::now().to_rfc3339();
        let report = run_audit(program, mode, options, sink)?;
        let finished_at = Utc::now().to_rfc3339();

        let record = AuditRunRecord {
            module: report.module.clone(),
            program_path: source.path.clone(),
            program_hash: source.hash.clone(),
            analysis: mode.as_str().to_string(),
            cycle_policy: options.cycle_policy.as_str().to_string(),
            entry_prefix: options.entry_prefix.clone(),
            entries: report.entries() as i64,
            status: report.status(),
            started_at,
            finished_at,
        };
        let run_id = self.ctx.db.insert_run_with_children(
            &record,
            &report.stored_records(),
            &report.stored_findings(),
            &report.diagnostics,
        )?;
        info!(run_id, status = record.status.as_str(), entries = record.entries, "run stored");

        Ok((run_id, report))
    }
}
