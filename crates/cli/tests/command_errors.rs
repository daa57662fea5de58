use assert_cmd::cargo::cargo_bin_cmd;
use ffi_audit::commands::{analyze_command, show_run_command, AnalyzeArgs};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn info_without_workspace_fails() {
    let temp = tempdir().unwrap();
    cargo_bin_cmd!("ffi-audit")
        .args(["info", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read audit config"));
}

#[test]
fn unknown_analysis_is_rejected() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    ffi_audit::commands::init_command(&root, None).unwrap();
    let program = temp.path().join("p.json");
    std::fs::write(&program, r#"{ "functions": [] }"#).unwrap();

    cargo_bin_cmd!("ffi-audit")
        .args(["analyze", "--root", root.as_str(), "--analysis", "bogus", "--program"])
        .arg(&program)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown analysis 'bogus'"));
}

#[test]
fn unknown_cycle_policy_is_rejected() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    ffi_audit::commands::init_command(&root, None).unwrap();
    let program = temp.path().join("p.json");
    std::fs::write(&program, r#"{ "functions": [] }"#).unwrap();

    let args = AnalyzeArgs {
        root: root.clone(),
        program: program.to_string_lossy().to_string(),
        cycle_policy: Some("optimistic".into()),
        ..AnalyzeArgs::default()
    };
    let err = analyze_command(&args).unwrap_err();
    assert!(err.to_string().contains("Unknown cycle policy 'optimistic'"));
}

#[test]
fn missing_or_malformed_program_fails() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    ffi_audit::commands::init_command(&root, None).unwrap();

    let missing = AnalyzeArgs {
        root: root.clone(),
        program: temp.path().join("nope.json").to_string_lossy().to_string(),
        no_log: true,
        ..AnalyzeArgs::default()
    };
    assert!(analyze_command(&missing).is_err());

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    cargo_bin_cmd!("ffi-audit")
        .args(["analyze", "--root", root.as_str(), "--program"])
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse IR dump JSON"));
}

#[test]
fn show_run_for_unknown_id_fails() {
    let temp = tempdir().unwrap();
    let root = temp.path().to_string_lossy().to_string();
    ffi_audit::commands::init_command(&root, Some("Errs".into())).unwrap();

    let err = show_run_command(&root, 42, false).unwrap_err();
    assert_eq!(err.to_string(), "Audit run 42 not found");
}
