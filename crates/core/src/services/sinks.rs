//! Destinations for per-entry audit output.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::analysis::PredicateKind;
use crate::services::audit::{AnalysisRecord, FunctionAudit, PredicateResult};

/// Combined-mode log file.
pub const COMBINED_LOG: &str = "AllLog.txt";

/// Log file a single-analysis run appends to.
pub fn log_file_name(kind: PredicateKind) -> &'static str {
    match kind {
        PredicateKind::Purity => "FunctionalPurityLog.txt",
        PredicateKind::PointerArithmetic => "PointerArithmeticLog.txt",
        PredicateKind::TypeCasts => "TypeCastsLog.txt",
        PredicateKind::DynamicMemory => "DynamicMemoryLog.txt",
    }
}

/// Receives results as soon as each entry is audited.
pub trait AuditSink {
    fn combined(&mut self, audit: &FunctionAudit) -> io::Result<()>;
    fn single(&mut self, result: &PredicateResult) -> io::Result<()>;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn combined(&mut self, _audit: &FunctionAudit) -> io::Result<()> {
        Ok(())
    }

    fn single(&mut self, _result: &PredicateResult) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps the latest outcome per function in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: BTreeMap<String, AnalysisRecord>,
    /// Single-mode verdicts: predicate -> function -> fired.
    pub verdicts: BTreeMap<PredicateKind, BTreeMap<String, bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, function: &str) -> Option<&AnalysisRecord> {
        self.records.get(function)
    }

    pub fn verdict(&self, kind: PredicateKind, function: &str) -> Option<bool> {
        self.verdicts.get(&kind).and_then(|m| m.get(function)).copied()
    }
}

impl AuditSink for MemorySink {
    fn combined(&mut self, audit: &FunctionAudit) -> io::Result<()> {
        self.records.insert(audit.record.function.clone(), audit.record.clone());
        Ok(())
    }

    fn single(&mut self, result: &PredicateResult) -> io::Result<()> {
        let verdicts = self.verdicts.entry(result.kind).or_default();
        verdicts.insert(result.function.clone(), result.fired());
        Ok(())
    }
}

/// Appends text lines to the fixed log files inside one directory.
///
/// Files are opened in append mode on first use, so repeated runs accumulate.
#[derive(Debug)]
pub struct LogDirSink {
    dir: PathBuf,
    files: HashMap<&'static str, File>,
}

impl LogDirSink {
    /// Create the directory if needed. No file is touched until a line is written.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, files: HashMap::new() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append_line(&mut self, file_name: &'static str, line: &str) -> io::Result<()> {
        let file = match self.files.entry(file_name) {
            std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
            std::collections::hash_map::Entry::Vacant(slot) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.dir.join(file_name))?;
                slot.insert(file)
            }
        };
        writeln!(file, "{line}")
    }
}

impl AuditSink for LogDirSink {
    fn combined(&mut self, audit: &FunctionAudit) -> io::Result<()> {
        self.append_line(COMBINED_LOG, &audit.record.to_log_row())
    }

    fn single(&mut self, result: &PredicateResult) -> io::Result<()> {
        self.append_line(log_file_name(result.kind), &result.sentence())
    }
}
