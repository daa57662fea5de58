use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::analysis::{Diagnostic, DiagnosticKind, Finding, PredicateKind, Reason};
use crate::db::{AuditRun, AuditRunRecord, AuditRunStatus, StoredFinding, StoredRecord};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for audit database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Structured columns (reasons, diagnostic kinds) are stored as JSON.
    #[error("Failed to encode or decode stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed audit run history.
///
/// A thin wrapper around `rusqlite::Connection` that:
/// - opens/creates the DB file,
/// - applies schema migrations,
/// - stores runs with their per-entry verdicts, findings and diagnostics.
#[derive(Debug)]
pub struct AuditDb {
    conn: Connection,
}

impl AuditDb {
    /// Open (or create) an audit database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a run record and return its row id.
    pub fn insert_run(&self, record: &AuditRunRecord) -> DbResult<i64> {
        write_run(&self.conn, record)
    }

    /// Insert a run together with its verdicts, findings and diagnostics.
    ///
    /// Everything lands in one transaction: either the whole run is stored or
    /// nothing is.
    pub fn insert_run_with_children(
        &self,
        record: &AuditRunRecord,
        records: &[StoredRecord],
        findings: &[StoredFinding],
        diagnostics: &[Diagnostic],
    ) -> DbResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let run_id = write_run(&tx, record)?;
        write_records(&tx, run_id, records)?;
        write_findings(&tx, run_id, findings)?;
        write_diagnostics(&tx, run_id, diagnostics)?;
        tx.commit()?;
        Ok(run_id)
    }

    /// List runs, oldest first, optionally filtered by IR dump path.
    pub fn list_runs(&self, program_path: Option<&str>) -> DbResult<Vec<AuditRun>> {
        let mut stmt = if program_path.is_some() {
            self.conn.prepare(
                r#"
                SELECT id, module, program_path, program_hash, analysis, cycle_policy, entry_prefix, entries, status, started_at, finished_at
                FROM audit_runs
                WHERE program_path = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT id, module, program_path, program_hash, analysis, cycle_policy, entry_prefix, entries, status, started_at, finished_at
                FROM audit_runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(path) = program_path {
            stmt.query_map(params![path], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Load a single run by id.
    pub fn load_run(&self, id: i64) -> DbResult<Option<AuditRun>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, module, program_path, program_hash, analysis, cycle_policy, entry_prefix, entries, status, started_at, finished_at
            FROM audit_runs
            WHERE id = ?1
            "#,
        )?;
        let mut rows = stmt.query_map(params![id], map_run)?;
        let run = rows.next().transpose()?;
        Ok(run)
    }

    /// Most recent run id for an IR dump path.
    pub fn latest_run_id(&self, program_path: &str) -> DbResult<Option<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM audit_runs
            WHERE program_path = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )?;
        let mut rows = stmt.query(params![program_path])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Persist per-entry verdicts for a run.
    pub fn insert_records(&self, run_id: i64, records: &[StoredRecord]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_records(&tx, run_id, records)?;
        tx.commit()?;
        Ok(())
    }

    /// Per-entry verdicts of a run, in audit order.
    pub fn load_records(&self, run_id: i64) -> DbResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT function, is_pure, has_pointer_arithmetic, has_type_casts, has_dynamic_memory
            FROM audit_records
            WHERE run_id = ?1
            ORDER BY idx
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(StoredRecord {
                function: row.get(0)?,
                is_pure: row.get(1)?,
                has_pointer_arithmetic: row.get(2)?,
                has_type_casts: row.get(3)?,
                has_dynamic_memory: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Persist the findings behind positive verdicts.
    pub fn insert_findings(&self, run_id: i64, findings: &[StoredFinding]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_findings(&tx, run_id, findings)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_findings(&self, run_id: i64) -> DbResult<Vec<StoredFinding>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT entry, predicate, function, instruction, reason, call_path
            FROM audit_findings
            WHERE run_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (entry, predicate, function, instruction, reason, call_path) = row?;
            let predicate: PredicateKind =
                predicate.parse().map_err(|_| rusqlite::Error::InvalidQuery)?;
            let reason: Reason = serde_json::from_str(&reason)?;
            let call_path: Vec<String> = serde_json::from_str(&call_path)?;
            out.push(StoredFinding {
                entry,
                predicate,
                finding: Finding {
                    function,
                    instruction: instruction.map(|i| i as usize),
                    reason,
                    call_path,
                },
            });
        }
        Ok(out)
    }

    /// Persist IR diagnostics raised while loading the program of a run.
    pub fn insert_diagnostics(&self, run_id: i64, diagnostics: &[Diagnostic]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_diagnostics(&tx, run_id, diagnostics)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_diagnostics(&self, run_id: i64) -> DbResult<Vec<Diagnostic>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT function, instruction, kind
            FROM audit_diagnostics
            WHERE run_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (function, instruction, kind) = row?;
            let kind: DiagnosticKind = serde_json::from_str(&kind)?;
            out.push(Diagnostic { function, instruction: instruction.map(|i| i as usize), kind });
        }
        Ok(out)
    }
}

fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditRun> {
    Ok(AuditRun {
        id: row.get(0)?,
        record: AuditRunRecord {
            module: row.get(1)?,
            program_path: row.get(2)?,
            program_hash: row.get(3)?,
            analysis: row.get(4)?,
            cycle_policy: row.get(5)?,
            entry_prefix: row.get(6)?,
            entries: row.get(7)?,
            status: {
                let s: String = row.get(8)?;
                parse_status(&s)?
            },
            started_at: row.get(9)?,
            finished_at: row.get(10)?,
        },
    })
}

fn parse_status(s: &str) -> rusqlite::Result<AuditRunStatus> {
    match s.to_lowercase().as_str() {
        "succeeded" => Ok(AuditRunStatus::Succeeded),
        "degraded" => Ok(AuditRunStatus::Degraded),
        _ => Err(rusqlite::Error::InvalidQuery),
    }
}

fn write_run(conn: &Connection, record: &AuditRunRecord) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO audit_runs (module, program_path, program_hash, analysis, cycle_policy, entry_prefix, entries, status, started_at, finished_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            record.module,
            record.program_path,
            record.program_hash,
            record.analysis,
            record.cycle_policy,
            record.entry_prefix,
            record.entries,
            record.status.as_str(),
            record.started_at,
            record.finished_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn write_records(conn: &Connection, run_id: i64, records: &[StoredRecord]) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT OR REPLACE INTO audit_records (run_id, idx, function, is_pure, has_pointer_arithmetic, has_type_casts, has_dynamic_memory)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;
    for (idx, r) in records.iter().enumerate() {
        stmt.execute(params![
            run_id,
            idx as i64,
            r.function,
            r.is_pure,
            r.has_pointer_arithmetic,
            r.has_type_casts,
            r.has_dynamic_memory
        ])?;
    }
    Ok(())
}

fn write_findings(conn: &Connection, run_id: i64, findings: &[StoredFinding]) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO audit_findings (run_id, entry, predicate, function, instruction, reason, call_path)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;
    for f in findings {
        stmt.execute(params![
            run_id,
            f.entry,
            f.predicate.as_str(),
            f.finding.function,
            f.finding.instruction.map(|i| i as i64),
            serde_json::to_string(&f.finding.reason)?,
            serde_json::to_string(&f.finding.call_path)?
        ])?;
    }
    Ok(())
}

fn write_diagnostics(conn: &Connection, run_id: i64, diagnostics: &[Diagnostic]) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO audit_diagnostics (run_id, function, instruction, kind, message)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;
    for d in diagnostics {
        stmt.execute(params![
            run_id,
            d.function,
            d.instruction.map(|i| i as i64),
            serde_json::to_string(&d.kind)?,
            d.to_string()
        ])?;
    }
    Ok(())
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: audit_runs, audit_records
/// - 2: audit_findings, audit_diagnostics
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS audit_runs (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                module        TEXT,
                program_path  TEXT NOT NULL,
                program_hash  TEXT,
                analysis      TEXT NOT NULL,
                cycle_policy  TEXT NOT NULL,
                entry_prefix  TEXT NOT NULL,
                entries       INTEGER NOT NULL,
                status        TEXT NOT NULL,
                started_at    TEXT NOT NULL,
                finished_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit_records (
                run_id                  INTEGER NOT NULL,
                idx                     INTEGER NOT NULL,
                function                TEXT NOT NULL,
                is_pure                 INTEGER,
                has_pointer_arithmetic  INTEGER,
                has_type_casts          INTEGER,
                has_dynamic_memory      INTEGER,
                PRIMARY KEY (run_id, idx)
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS audit_findings (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id       INTEGER NOT NULL,
                entry        TEXT NOT NULL,
                predicate    TEXT NOT NULL,
                function     TEXT NOT NULL,
                instruction  INTEGER,
                reason       TEXT NOT NULL,
                call_path    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit_diagnostics (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id       INTEGER NOT NULL,
                function     TEXT NOT NULL,
                instruction  INTEGER,
                kind         TEXT NOT NULL,
                message      TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
