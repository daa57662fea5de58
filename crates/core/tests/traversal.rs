use ffi_audit_core::analysis::predicates::{DynamicMemory, Purity};
use ffi_audit_core::analysis::{analyze, CyclePolicy, Predicate, PredicateKind, Reason};
use ffi_audit_core::model::{Function, FunctionAttr, Instruction, Program, Value};

/// Fires on `generic` instructions with opcode `marker`.
struct Marker;

impl Predicate for Marker {
    fn kind(&self) -> PredicateKind {
        PredicateKind::TypeCasts
    }

    fn check_instruction(&self, inst: &Instruction) -> Option<Reason> {
        match &inst.kind {
            ffi_audit_core::model::InstKind::Generic { opcode, .. } if opcode == "marker" => {
                Some(Reason::ReinterpretCast { cast: "marker".into() })
            }
            _ => None,
        }
    }

    fn boundary_call(&self, _call: &Instruction) -> Option<Reason> {
        None
    }
}

fn call(name: &str) -> Instruction {
    Instruction::call(name, vec![])
}

fn ret() -> Instruction {
    Instruction::generic("ret", vec![])
}

fn pure_fn(name: &str, body: Vec<Instruction>) -> Function {
    Function::define(name, body).with_attr(FunctionAttr::ReadOnly)
}

fn mutual_recursion() -> Program {
    Program::new(vec![
        pure_fn("Java_a", vec![call("b"), ret()]),
        pure_fn("b", vec![call("Java_a"), ret()]),
    ])
}

#[test]
fn mutual_recursion_terminates_and_records_the_back_edge() {
    let program = mutual_recursion();
    let entry = program.function("Java_a").expect("entry");

    for kind in PredicateKind::ALL {
        let predicate = kind.predicate();
        let result = analyze(&program, entry, predicate.as_ref(), CyclePolicy::AssumeClean);
        assert!(!result.fired(), "{kind} should find nothing in a clean cycle");
        assert_eq!(result.visited, 2);
        assert_eq!(result.cycle_edges, vec![("b".to_string(), "Java_a".to_string())]);
    }
}

#[test]
fn conservative_policy_turns_the_back_edge_into_a_finding() {
    let program = mutual_recursion();
    let entry = program.function("Java_a").expect("entry");

    let result = analyze(&program, entry, &Marker, CyclePolicy::AssumeViolation);
    let finding = result.finding.expect("cycle is positive");
    assert_eq!(finding.reason, Reason::RecursiveCall { callee: "Java_a".into() });
    assert_eq!(finding.function, "b");
    assert_eq!(finding.instruction, Some(0));
    assert_eq!(finding.call_path, ["Java_a", "b"]);
}

#[test]
fn self_recursion_is_a_cycle_of_length_one() {
    let program = Program::new(vec![pure_fn("Java_self", vec![call("Java_self"), ret()])]);
    let entry = program.function("Java_self").expect("entry");

    let clean = analyze(&program, entry, &Marker, CyclePolicy::AssumeClean);
    assert!(!clean.fired());
    assert_eq!(clean.visited, 1);
    assert_eq!(clean.cycle_edges, vec![("Java_self".to_string(), "Java_self".to_string())]);

    let strict = analyze(&program, entry, &Marker, CyclePolicy::AssumeViolation);
    assert!(strict.fired());
}

/// The back-edge from `b` adds nothing, but the rest of `b` is still walked.
#[test]
fn evidence_behind_a_cycle_is_still_found() {
    let program = Program::new(vec![
        pure_fn("Java_a", vec![call("b"), ret()]),
        pure_fn("b", vec![call("Java_a"), call("c"), ret()]),
        pure_fn("c", vec![Instruction::generic("marker", vec![]), ret()]),
    ]);
    let entry = program.function("Java_a").expect("entry");

    let result = analyze(&program, entry, &Marker, CyclePolicy::AssumeClean);
    let finding = result.finding.expect("marker in c");
    assert_eq!(finding.function, "c");
    assert_eq!(finding.call_path, ["Java_a", "b", "c"]);
    assert_eq!(result.cycle_edges.len(), 1);
}

#[test]
fn shared_callees_are_explored_once() {
    let program = Program::new(vec![
        pure_fn("Java_top", vec![call("left"), call("right"), ret()]),
        pure_fn("left", vec![call("shared"), ret()]),
        pure_fn("right", vec![call("shared"), ret()]),
        pure_fn("shared", vec![ret()]),
    ]);
    let entry = program.function("Java_top").expect("entry");

    let result = analyze(&program, entry, &Purity, CyclePolicy::AssumeViolation);
    assert!(!result.fired(), "a diamond is not a cycle: {:?}", result.finding);
    assert_eq!(result.visited, 4);
    assert!(result.cycle_edges.is_empty());
}

#[test]
fn findings_point_at_the_instruction_that_fired() {
    let program = Program::new(vec![
        pure_fn("Java_entry", vec![ret(), call("helper"), ret()]),
        pure_fn(
            "helper",
            vec![ret(), ret(), Instruction::call("malloc", vec![Value::i64(16)])],
        ),
    ]);
    let entry = program.function("Java_entry").expect("entry");

    let result = analyze(&program, entry, &DynamicMemory, CyclePolicy::AssumeClean);
    let finding = result.finding.expect("malloc found");
    assert_eq!(finding.function, "helper");
    assert_eq!(finding.instruction, Some(2));
    assert_eq!(finding.reason, Reason::AllocatorCall { symbol: "malloc".into() });
    assert_eq!(finding.to_string(), "calls malloc in helper#2 via Java_entry -> helper");
}

#[test]
fn declarations_get_function_checks_but_no_instruction_evidence() {
    let program = Program::new(vec![
        pure_fn("Java_entry", vec![call("external"), ret()]),
        Function::declare("external").with_attr(FunctionAttr::ReadNone),
    ]);
    let entry = program.function("Java_entry").expect("entry");

    let purity = analyze(&program, entry, &Purity, CyclePolicy::AssumeClean);
    assert!(!purity.fired(), "readnone declaration keeps the caller pure");
    assert_eq!(purity.visited, 2);

    let writer = Program::new(vec![
        pure_fn("Java_entry", vec![call("external"), ret()]),
        Function::declare("external"),
    ]);
    let entry = writer.function("Java_entry").expect("entry");
    let purity = analyze(&writer, entry, &Purity, CyclePolicy::AssumeClean);
    let finding = purity.finding.expect("declaration may write");
    assert_eq!(finding.reason, Reason::WritesMemory);
    assert_eq!(finding.function, "external");
    assert_eq!(finding.instruction, None);
}

#[test]
fn unresolved_calls_are_skipped() {
    let program = Program::new(vec![pure_fn(
        "Java_fp",
        vec![Instruction::indirect_call(vec![Value::i32(0)]), ret()],
    )]);
    let entry = program.function("Java_fp").expect("entry");
    for kind in PredicateKind::ALL {
        let predicate = kind.predicate();
        let result = analyze(&program, entry, predicate.as_ref(), CyclePolicy::AssumeViolation);
        assert!(!result.fired(), "{kind} should ignore an unresolved call");
        assert_eq!(result.visited, 1);
    }
}

#[test]
fn repeated_walks_agree() {
    let program = Program::new(vec![
        pure_fn("Java_a", vec![call("b"), call("c"), ret()]),
        pure_fn("b", vec![call("Java_a"), ret()]),
        Function::define("c", vec![ret()]),
    ]);
    let entry = program.function("Java_a").expect("entry");
    for kind in PredicateKind::ALL {
        for policy in [CyclePolicy::AssumeClean, CyclePolicy::AssumeViolation] {
            let predicate = kind.predicate();
            let first = analyze(&program, entry, predicate.as_ref(), policy);
            let second = analyze(&program, entry, predicate.as_ref(), policy);
            assert_eq!(first, second, "{kind} under {policy:?}");
        }
    }
}

#[test]
fn cycle_policy_parses_from_cli_spelling() {
    assert_eq!("assume-clean".parse::<CyclePolicy>(), Ok(CyclePolicy::AssumeClean));
    assert_eq!("assume_violation".parse::<CyclePolicy>(), Ok(CyclePolicy::AssumeViolation));
    assert!("optimistic".parse::<CyclePolicy>().is_err());
    assert_eq!(CyclePolicy::default(), CyclePolicy::AssumeClean);
}
