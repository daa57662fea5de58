use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::commands::open_context;
use crate::{program_digest, resolve_program_path};
use ffi_audit_core::analysis::CyclePolicy;
use ffi_audit_core::model::Program;
use ffi_audit_core::services::{
    AuditMode, AuditOptions, AuditReport, AuditRunner, AuditSink, LogDirSink, NullSink,
    ProgramSource,
};

/// Arguments of `ffi-audit analyze`, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub root: String,
    pub program: String,
    /// `all` or a single analysis name; defaults to `all`.
    pub analysis: Option<String>,
    /// Overrides the configured cycle policy.
    pub cycle_policy: Option<String>,
    /// Overrides the configured entry prefix.
    pub entry_prefix: Option<String>,
    pub json: bool,
    /// Skip the append-only text logs.
    pub no_log: bool,
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    run_id: i64,
    program: &'a str,
    program_hash: Option<&'a str>,
    #[serde(flatten)]
    report: &'a AuditReport,
}

/// Audit every boundary entry of an IR dump and record the run.
pub fn analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let ctx = open_context(&args.root)?;

    let mode: AuditMode = match &args.analysis {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        None => AuditMode::All,
    };
    let mut options = AuditOptions::from(ctx.config.analysis.clone());
    if let Some(raw) = &args.cycle_policy {
        options.cycle_policy = raw.parse::<CyclePolicy>().map_err(anyhow::Error::msg)?;
    }
    if let Some(prefix) = &args.entry_prefix {
        options.entry_prefix = prefix.clone();
    }

    let program_path = resolve_program_path(&ctx.layout.root, &args.program);
    let program = Program::load(&program_path)?;
    let source = ProgramSource {
        path: args.program.clone(),
        hash: Some(program_digest(&program_path)?),
    };

    let mut log_sink;
    let mut null_sink = NullSink;
    let sink: &mut dyn AuditSink = if args.no_log {
        &mut null_sink
    } else {
        let dir = ctx.logs_dir();
        log_sink = LogDirSink::new(&dir)
            .with_context(|| format!("Failed to create logs dir: {}", dir.display()))?;
        &mut log_sink
    };

    let runner = AuditRunner { ctx: &ctx };
    let (run_id, report) = runner
        .run(&program, &source, mode, &options, sink)
        .with_context(|| format!("Failed to audit {}", args.program))?;
    info!(run_id, program = %args.program, "analyze finished");

    if args.json {
        let output = AnalyzeOutput {
            run_id,
            program: &source.path,
            program_hash: source.hash.as_deref(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Audit run {} ({})", run_id, report.status().as_str());
    println!("  Program: {}", source.path);
    if let Some(module) = &report.module {
        println!("  Module: {}", module);
    }
    println!("  Analysis: {}", mode);
    println!("  Cycle policy: {}", options.cycle_policy.as_str());
    println!("  Entries: {}", report.entries());
    if report.entries() == 0 {
        println!("  (no functions with prefix '{}')", options.entry_prefix);
    }
    match mode {
        AuditMode::All => {
            println!();
            println!("function pure ptr cast dyn");
            for audit in &report.audits {
                println!("{}", audit.record.to_log_row());
                for (kind, finding) in audit.findings() {
                    println!("    {}: {}", kind, finding);
                }
            }
        }
        AuditMode::Only(_) => {
            println!();
            for result in &report.results {
                println!("{}", result.sentence());
                if let Some(finding) = result.finding() {
                    println!("    {}", finding);
                }
            }
        }
    }
    if !report.diagnostics.is_empty() {
        println!();
        println!("Diagnostics ({}):", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("- {}", diagnostic);
        }
    }

    Ok(())
}
