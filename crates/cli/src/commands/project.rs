use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::commands::{open_context, print_dir_status};
use crate::{canonicalize_or_current, infer_audit_name};
use ffi_audit_core::db::{AnalysisSettings, AuditConfig, AuditDb, AuditLayout};

#[derive(Serialize)]
pub struct AuditInfoSnapshot {
    pub name: String,
    pub description: Option<String>,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub logs_dir: String,
    pub analysis: AnalysisSettings,
    pub runs: usize,
}

/// Initialize a new audit workspace at `root`.
pub fn init_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = AuditLayout::new(&root_path);

    let audit_name = match name {
        Some(n) => n,
        None => infer_audit_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.logs_dir)
        .with_context(|| format!("Failed to create logs dir: {}", layout.logs_dir.display()))?;

    let config = AuditConfig::new(&audit_name, layout.db_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.config_path, json).with_context(|| {
        format!("Failed to write audit config: {}", layout.config_path.display())
    })?;

    // Create the database up front so later commands can rely on it.
    AuditDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize audit database at {}", layout.db_path.display())
    })?;

    println!("Initialized ffi-audit workspace:");
    println!("  Name: {}", audit_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Logs dir: {}", layout.logs_dir.display());
    println!("  Entry prefix: {}", config.analysis.entry_prefix);

    Ok(())
}

/// Show configuration, paths and run count of an existing workspace.
pub fn info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runs = ctx.db.list_runs(None).context("Failed to list audit runs")?;
    let logs_dir = ctx.logs_dir();

    if json {
        let snapshot = AuditInfoSnapshot {
            name: ctx.config.name.clone(),
            description: ctx.config.description.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            db_path: ctx.db_path.display().to_string(),
            logs_dir: logs_dir.display().to_string(),
            analysis: ctx.config.analysis.clone(),
            runs: runs.len(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("ffi-audit Workspace Info");
    println!("========================");
    println!("Name: {}", ctx.config.name);
    if let Some(desc) = &ctx.config.description {
        println!("Description: {}", desc);
    }
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("DB path (config): {}", ctx.config.db.path);
    println!("Entry prefix: {}", ctx.config.analysis.entry_prefix);
    println!("Cycle policy: {}", ctx.config.analysis.cycle_policy.as_str());
    println!();
    println!("Directories:");
    print_dir_status("Meta dir (.ffi-audit)", &ctx.layout.meta_dir);
    print_dir_status("Logs dir", &logs_dir);
    println!();
    println!("Audit runs: {}", runs.len());

    Ok(())
}
