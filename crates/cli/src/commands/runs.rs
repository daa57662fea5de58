use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::commands::{open_context, tri_flag};
use ffi_audit_core::analysis::Diagnostic;
use ffi_audit_core::db::{AuditRun, StoredFinding, StoredRecord};

#[derive(Serialize)]
pub struct RunDetail {
    #[serde(flatten)]
    pub run: AuditRun,
    pub records: Vec<StoredRecord>,
    pub findings: Vec<StoredFinding>,
    pub diagnostics: Vec<Diagnostic>,
}

/// List persisted audit runs, optionally only those of one IR dump.
pub fn runs_command(root: &str, program: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runs = ctx.db.list_runs(program).context("Failed to list audit runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No audit runs recorded.");
        return Ok(());
    }
    println!("Audit runs:");
    for run in &runs {
        let r = &run.record;
        println!(
            "- #{} [{}] {} analysis={} entries={} cycle_policy={} at {}",
            run.id,
            r.status.as_str(),
            r.program_path,
            r.analysis,
            r.entries,
            r.cycle_policy,
            r.finished_at
        );
    }
    Ok(())
}

/// Show one run with its stored verdicts, findings and diagnostics.
pub fn show_run_command(root: &str, id: i64, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let run = ctx
        .db
        .load_run(id)
        .context("Failed to load audit run")?
        .ok_or_else(|| anyhow!("Audit run {} not found", id))?;
    let detail = RunDetail {
        records: ctx.db.load_records(id).context("Failed to load audit records")?,
        findings: ctx.db.load_findings(id).context("Failed to load audit findings")?,
        diagnostics: ctx.db.load_diagnostics(id).context("Failed to load audit diagnostics")?,
        run,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let r = &detail.run.record;
    println!("Audit run #{}", detail.run.id);
    println!("  Status: {}", r.status.as_str());
    println!("  Program: {}", r.program_path);
    if let Some(module) = &r.module {
        println!("  Module: {}", module);
    }
    if let Some(hash) = &r.program_hash {
        println!("  SHA-256: {}", hash);
    }
    println!("  Analysis: {}", r.analysis);
    println!("  Cycle policy: {}", r.cycle_policy);
    println!("  Entry prefix: {}", r.entry_prefix);
    println!("  Started: {}", r.started_at);
    println!("  Finished: {}", r.finished_at);
    println!();
    println!("function pure ptr cast dyn");
    for rec in &detail.records {
        println!(
            "{} {} {} {} {}",
            rec.function,
            tri_flag(rec.is_pure),
            tri_flag(rec.has_pointer_arithmetic),
            tri_flag(rec.has_type_casts),
            tri_flag(rec.has_dynamic_memory)
        );
    }
    if !detail.findings.is_empty() {
        println!();
        println!("Findings:");
        for f in &detail.findings {
            println!("- {} {}: {}", f.entry, f.predicate, f.finding);
        }
    }
    if !detail.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for d in &detail.diagnostics {
            println!("- {}", d);
        }
    }
    Ok(())
}
