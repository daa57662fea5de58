use std::path::PathBuf;

use ffi_audit_core::analysis::{DiagnosticKind, PredicateKind};
use ffi_audit_core::model::Program;
use ffi_audit_core::services::{run_audit, AuditMode, AuditOptions, MemorySink};

fn fixture(name: &str) -> Program {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    Program::load(&path).expect("load fixture")
}

#[test]
fn c_allocators_are_found_and_stack_buffers_are_not() {
    let program = fixture("dynamic_memory.json");
    let mut sink = MemorySink::new();
    let report = run_audit(
        &program,
        AuditMode::Only(PredicateKind::DynamicMemory),
        &AuditOptions::default(),
        &mut sink,
    )
    .expect("audit");

    assert_eq!(report.entries(), 5);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    for name in [
        "Java_test_DynamicMemory_malloc_1",
        "Java_test_DynamicMemory_calloc_1",
        "Java_test_DynamicMemory_realloc_1",
        "Java_test_DynamicMemory_free_1",
    ] {
        assert_eq!(sink.verdict(PredicateKind::DynamicMemory, name), Some(true), "{name}");
    }
    assert_eq!(
        sink.verdict(PredicateKind::DynamicMemory, "Java_test_DynamicMemory_static_0"),
        Some(false)
    );

    let sentences: Vec<String> = report.results.iter().map(|r| r.sentence()).collect();
    assert_eq!(
        sentences.last().map(String::as_str),
        Some("Java_test_DynamicMemory_static_0 has no dynamic memory allocation")
    );
}

#[test]
fn c_fixture_combined_rows() {
    let program = fixture("dynamic_memory.json");
    let mut sink = MemorySink::new();
    let report =
        run_audit(&program, AuditMode::All, &AuditOptions::default(), &mut sink).expect("audit");

    let rows: Vec<String> = report.audits.iter().map(|a| a.record.to_log_row()).collect();
    assert_eq!(
        rows,
        [
            "Java_test_DynamicMemory_malloc_1 0 1 0 1",
            "Java_test_DynamicMemory_calloc_1 0 1 0 1",
            "Java_test_DynamicMemory_realloc_1 0 0 0 1",
            "Java_test_DynamicMemory_free_1 0 1 0 1",
            "Java_test_DynamicMemory_static_0 0 1 0 0",
        ]
    );
    assert_eq!(sink.records.len(), 5);
}

#[test]
fn cxx_new_and_delete_forms_are_found() {
    let program = fixture("dynamic_memory_pp.yaml");
    let mut sink = MemorySink::new();
    let report = run_audit(
        &program,
        AuditMode::Only(PredicateKind::DynamicMemory),
        &AuditOptions::default(),
        &mut sink,
    )
    .expect("audit");

    for (name, symbol) in [
        ("Java_test_DynamicMemoryPP_new_1", "_Znwm"),
        ("Java_test_DynamicMemoryPP_delete_1", "_ZdlPv"),
        ("Java_test_DynamicMemoryPP_newArr_1", "_Znam"),
        ("Java_test_DynamicMemoryPP_deleteArr_1", "_ZdaPv"),
    ] {
        let result = report.results.iter().find(|r| r.function == name).expect("entry result");
        let finding = result.finding().expect("allocator found");
        assert_eq!(finding.reason.to_string(), format!("calls {symbol}"));
    }
    assert_eq!(
        sink.verdict(PredicateKind::DynamicMemory, "Java_test_DynamicMemoryPP_static_0"),
        Some(false)
    );

    // The operator symbols are only ever called, never listed.
    let implicit: Vec<&str> = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ImplicitDeclaration)
        .map(|d| d.function.as_str())
        .collect();
    assert_eq!(implicit, ["_Znwm", "_ZdlPv", "_Znam", "_ZdaPv"]);
}
