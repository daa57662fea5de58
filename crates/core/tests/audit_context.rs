use ffi_audit_core::analysis::CyclePolicy;
use ffi_audit_core::db::{load_config, AuditConfig, AuditContext, AuditLayout};

#[test]
fn audit_context_loads_config_and_db() {
    let temp = tempfile::tempdir().unwrap();
    let layout = AuditLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();

    let config = AuditConfig::new("CtxAudit", layout.db_path_relative_string());
    std::fs::write(&layout.config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let ctx = AuditContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.config, config);
    assert!(ctx.db_path.is_file());
    assert_eq!(ctx.logs_dir(), temp.path().join("logs"));
    ctx.db.list_runs(None).expect("list runs");
}

#[test]
fn layout_paths_live_under_the_root() {
    let layout = AuditLayout::new("/work/audit");
    assert_eq!(layout.config_path, std::path::Path::new("/work/audit/.ffi-audit/config.json"));
    let relative = std::path::Path::new(".ffi-audit").join("audit.db");
    assert_eq!(layout.db_path_relative_string(), relative.to_string_lossy());
    assert_eq!(layout.resolve("/abs/logs"), std::path::Path::new("/abs/logs"));
    assert_eq!(layout.resolve("out"), std::path::Path::new("/work/audit/out"));
}

#[test]
fn minimal_config_gets_default_analysis_settings() {
    let temp = tempfile::tempdir().unwrap();
    let layout = AuditLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(
        &layout.config_path,
        r#"{ "name": "min", "config_version": "0.1.0", "db": { "path": "history.db" } }"#,
    )
    .unwrap();

    let config = load_config(&layout).expect("load config");
    assert_eq!(config.analysis.entry_prefix, "Java_");
    assert_eq!(config.analysis.cycle_policy, CyclePolicy::AssumeClean);
    assert_eq!(config.logs.dir, "logs");

    let ctx = AuditContext::from_root(temp.path()).expect("context");
    assert_eq!(ctx.db_path, temp.path().join("history.db"));
}

#[test]
fn config_overrides_policy_and_prefix() {
    let json = r#"{
        "name": "strict",
        "config_version": "0.1.0",
        "db": { "path": ".ffi-audit/audit.db" },
        "analysis": { "entry_prefix": "JNI_", "cycle_policy": "assume_violation" },
        "logs": { "dir": "/var/log/ffi-audit" }
    }"#;
    let config: AuditConfig = serde_json::from_str(json).expect("parse");
    assert_eq!(config.analysis.entry_prefix, "JNI_");
    assert_eq!(config.analysis.cycle_policy, CyclePolicy::AssumeViolation);
    assert_eq!(config.logs.dir, "/var/log/ffi-audit");
}

#[test]
fn missing_config_is_reported_with_its_path() {
    let temp = tempfile::tempdir().unwrap();
    let err = AuditContext::from_root(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read audit config"));
}

#[test]
fn audit_runner_persists_run_records_and_findings() {
    use ffi_audit_core::analysis::PredicateKind;
    use ffi_audit_core::db::AuditRunStatus;
    use ffi_audit_core::model::{Function, Instruction, Program, Value};
    use ffi_audit_core::services::{AuditMode, AuditOptions, AuditRunner, NullSink, ProgramSource};

    let temp = tempfile::tempdir().unwrap();
    let layout = AuditLayout::new(temp.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    let config = AuditConfig::new("Runner", layout.db_path_relative_string());
    std::fs::write(&layout.config_path, serde_json::to_string(&config).unwrap()).unwrap();
    let ctx = AuditContext::from_root(temp.path()).unwrap();

    let program = Program::new(vec![
        Function::define("Java_a", vec![Instruction::call("malloc", vec![Value::i64(8)])]),
        Function::define("Java_b", vec![Instruction::generic("ret", vec![])]),
        Function::declare("malloc"),
    ]);
    let source = ProgramSource { path: "lib.json".into(), hash: Some("feed".into()) };
    let options = AuditOptions::from(config.analysis.clone());

    let runner = AuditRunner { ctx: &ctx };
    let mode = AuditMode::Only(PredicateKind::DynamicMemory);
    let (run_id, report) =
        runner.run(&program, &source, mode, &options, &mut NullSink).expect("run");
    assert_eq!(report.entries(), 2);

    let run = ctx.db.load_run(run_id).unwrap().expect("stored run");
    assert_eq!(run.record.analysis, "dynamic_memory");
    assert_eq!(run.record.program_hash.as_deref(), Some("feed"));
    assert_eq!(run.record.entries, 2);
    assert_eq!(run.record.status, AuditRunStatus::Succeeded);

    let records = ctx.db.load_records(run_id).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].function, "Java_a");
    assert_eq!(records[0].has_dynamic_memory, Some(true));
    assert_eq!(records[0].is_pure, None);
    assert_eq!(records[1].has_dynamic_memory, Some(false));

    let findings = ctx.db.load_findings(run_id).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].entry, "Java_a");
    assert_eq!(findings[0].predicate, PredicateKind::DynamicMemory);
    assert_eq!(ctx.db.latest_run_id("lib.json").unwrap(), Some(run_id));
}
