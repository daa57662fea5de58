use std::fs;

use ffi_audit_core::analysis::{CyclePolicy, PredicateKind, Reason};
use ffi_audit_core::db::AuditRunStatus;
use ffi_audit_core::model::{CastKind, Function, FunctionAttr, Instruction, Program, Type, Value};
use ffi_audit_core::services::{
    audit_function, boundary_entries, log_file_name, run_audit, AuditMode, AuditOptions,
    LogDirSink, MemorySink, NullSink, COMBINED_LOG,
};
use tempfile::tempdir;

fn ty(sig: &str) -> Type {
    sig.parse().expect("type")
}

fn sample_program() -> Program {
    Program::new(vec![
        Function::define(
            "Java_pkg_Native_sum",
            vec![
                Instruction::address_of(Value::argument(0, ty("i32*")), vec![Value::i64(1)]),
                Instruction::generic("ret", vec![]),
            ],
        )
        .with_attr(FunctionAttr::ReadOnly),
        Function::define(
            "Java_pkg_Native_alloc",
            vec![
                Instruction::call("helper", vec![]),
                Instruction::cast(CastKind::PtrToInt, Value::argument(0, ty("i8*")), ty("i64")),
            ],
        ),
        Function::define("helper", vec![Instruction::call("malloc", vec![Value::i64(4)])]),
        Function::declare("Java_pkg_Native_declared"),
        Function::declare("malloc"),
    ])
}

#[test]
fn boundary_entries_are_defined_functions_with_the_prefix() {
    let program = sample_program();
    let names: Vec<&str> =
        boundary_entries(&program, "Java_").iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Java_pkg_Native_sum", "Java_pkg_Native_alloc"]);

    let custom: Vec<&str> =
        boundary_entries(&program, "help").iter().map(|f| f.name.as_str()).collect();
    assert_eq!(custom, ["helper"]);
    assert!(boundary_entries(&program, "Kotlin_").is_empty());
}

#[test]
fn combined_audit_flips_purity_and_keeps_the_findings() {
    let program = sample_program();
    let options = AuditOptions::default();

    let sum_fn = program.function("Java_pkg_Native_sum").expect("sum");
    let sum = audit_function(&program, sum_fn, &options);
    assert_eq!(sum.record.to_log_row(), "Java_pkg_Native_sum 1 1 0 0");
    assert_eq!(sum.results.len(), 4);
    assert_eq!(sum.findings().count(), 1);

    let alloc_fn = program.function("Java_pkg_Native_alloc").expect("alloc");
    let alloc = audit_function(&program, alloc_fn, &options);
    assert_eq!(alloc.record.to_log_row(), "Java_pkg_Native_alloc 0 0 1 1");
    let kinds: Vec<PredicateKind> = alloc.findings().map(|(kind, _)| kind).collect();
    assert_eq!(
        kinds,
        [PredicateKind::Purity, PredicateKind::TypeCasts, PredicateKind::DynamicMemory]
    );
    let (_, dynamic) = alloc
        .findings()
        .find(|(kind, _)| *kind == PredicateKind::DynamicMemory)
        .expect("dynamic finding");
    assert_eq!(dynamic.call_path, ["Java_pkg_Native_alloc", "helper"]);
}

#[test]
fn entries_do_not_share_traversal_state() {
    // Both entries reach the same allocating helper; the second must not treat
    // it as already explored.
    let program = Program::new(vec![
        Function::define("Java_first", vec![Instruction::call("shared", vec![])]),
        Function::define("Java_second", vec![Instruction::call("shared", vec![])]),
        Function::define("shared", vec![Instruction::call("free", vec![])]),
    ]);
    let mut sink = MemorySink::new();
    run_audit(&program, AuditMode::All, &AuditOptions::default(), &mut sink).expect("audit");
    assert!(sink.record("Java_first").expect("first").has_dynamic_memory);
    assert!(sink.record("Java_second").expect("second").has_dynamic_memory);
}

#[test]
fn single_mode_reports_one_predicate_per_entry() {
    let program = sample_program();
    let mut sink = MemorySink::new();
    let report = run_audit(
        &program,
        AuditMode::Only(PredicateKind::Purity),
        &AuditOptions::default(),
        &mut sink,
    )
    .expect("audit");

    assert!(report.audits.is_empty());
    let sentences: Vec<String> = report.results.iter().map(|r| r.sentence()).collect();
    assert_eq!(sentences, ["Java_pkg_Native_sum is pure", "Java_pkg_Native_alloc is impure"]);
    assert_eq!(sink.verdict(PredicateKind::Purity, "Java_pkg_Native_alloc"), Some(true));
    assert_eq!(sink.verdict(PredicateKind::TypeCasts, "Java_pkg_Native_alloc"), None);

    let stored = report.stored_records();
    assert_eq!(stored[0].is_pure, Some(true));
    assert_eq!(stored[0].has_type_casts, None);
    assert_eq!(stored[1].is_pure, Some(false));
}

#[test]
fn cycle_policy_option_reaches_every_predicate() {
    let program = Program::new(vec![
        Function::define("Java_loop", vec![Instruction::call("again", vec![])])
            .with_attr(FunctionAttr::ReadNone),
        Function::define("again", vec![Instruction::call("Java_loop", vec![])])
            .with_attr(FunctionAttr::ReadNone),
    ]);
    let entry = program.function("Java_loop").expect("entry");

    let clean = audit_function(&program, entry, &AuditOptions::default());
    assert_eq!(clean.record.to_log_row(), "Java_loop 1 0 0 0");

    let strict_options =
        AuditOptions { cycle_policy: CyclePolicy::AssumeViolation, ..AuditOptions::default() };
    let strict = audit_function(&program, entry, &strict_options);
    assert_eq!(strict.record.to_log_row(), "Java_loop 0 1 1 1");
    for (_, finding) in strict.findings() {
        assert_eq!(finding.reason, Reason::RecursiveCall { callee: "Java_loop".into() });
    }
}

#[test]
fn log_dir_sink_appends_across_runs() {
    let dir = tempdir().expect("tempdir");
    let logs = dir.path().join("logs");
    let program = sample_program();

    for _ in 0..2 {
        let mut sink = LogDirSink::new(&logs).expect("sink");
        run_audit(&program, AuditMode::All, &AuditOptions::default(), &mut sink).expect("audit");
    }
    let combined = fs::read_to_string(logs.join(COMBINED_LOG)).expect("read combined log");
    assert_eq!(
        combined,
        "Java_pkg_Native_sum 1 1 0 0\nJava_pkg_Native_alloc 0 0 1 1\n\
         Java_pkg_Native_sum 1 1 0 0\nJava_pkg_Native_alloc 0 0 1 1\n"
    );

    let mut sink = LogDirSink::new(&logs).expect("sink");
    run_audit(
        &program,
        AuditMode::Only(PredicateKind::PointerArithmetic),
        &AuditOptions::default(),
        &mut sink,
    )
    .expect("audit");
    let single = fs::read_to_string(logs.join("PointerArithmeticLog.txt")).expect("read log");
    assert_eq!(
        single,
        "Java_pkg_Native_sum has pointer arithmetic\n\
         Java_pkg_Native_alloc has no pointer arithmetic\n"
    );
    assert!(!logs.join(log_file_name(PredicateKind::Purity)).exists());
}

#[test]
fn log_file_names_are_fixed_per_analysis() {
    assert_eq!(log_file_name(PredicateKind::Purity), "FunctionalPurityLog.txt");
    assert_eq!(log_file_name(PredicateKind::PointerArithmetic), "PointerArithmeticLog.txt");
    assert_eq!(log_file_name(PredicateKind::TypeCasts), "TypeCastsLog.txt");
    assert_eq!(log_file_name(PredicateKind::DynamicMemory), "DynamicMemoryLog.txt");
    assert_eq!(COMBINED_LOG, "AllLog.txt");
}

#[test]
fn diagnostics_degrade_the_run_but_every_entry_gets_a_record() {
    let program = Program::new(vec![
        Function::define(
            "Java_untyped",
            vec![Instruction::address_of(Value::local("p", Type::Unknown), vec![Value::i64(2)])],
        ),
        Function::define("Java_ok", vec![Instruction::call("external", vec![])]),
    ]);
    let options = AuditOptions::default();
    let report = run_audit(&program, AuditMode::All, &options, &mut NullSink).expect("audit");
    assert_eq!(report.entries(), 2);
    assert_eq!(report.status(), AuditRunStatus::Degraded);
    let messages: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        messages,
        [
            "external: called but not listed; treated as an external declaration",
            "Java_untyped#0: operand 0 has no type information",
        ]
    );
}

#[test]
fn audit_mode_parses_all_or_a_single_analysis() {
    assert_eq!("all".parse::<AuditMode>(), Ok(AuditMode::All));
    assert_eq!("type-casts".parse::<AuditMode>(), Ok(AuditMode::Only(PredicateKind::TypeCasts)));
    assert!("everything".parse::<AuditMode>().is_err());
    assert_eq!(AuditMode::Only(PredicateKind::DynamicMemory).to_string(), "dynamic_memory");
}

#[test]
fn report_serializes_findings_for_json_output() {
    let program = sample_program();
    let options = AuditOptions::default();
    let report = run_audit(&program, AuditMode::All, &options, &mut NullSink).expect("audit");
    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["mode"], "all");
    assert_eq!(json["options"]["entry_prefix"], "Java_");
    assert_eq!(json["audits"][1]["record"]["has_dynamic_memory"], true);
    let finding = &json["audits"][1]["results"][3]["finding"];
    assert_eq!(finding["reason"]["reason"], "allocator_call");
    assert_eq!(finding["reason"]["symbol"], "malloc");
    assert!(json.get("results").is_none());
}
