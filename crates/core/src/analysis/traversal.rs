//! Interprocedural walk shared by all predicates.
//!
//! The walk is an explicit-stack depth-first search over resolved call edges,
//! starting at one entry function. Every function reached is first checked as a
//! whole (`Predicate::check_function`), then instruction by instruction; the
//! first positive check ends the walk.
//!
//! Each function carries one of two marks while the walk runs:
//! - on the current path: a call to it closes a cycle and is settled by the
//!   [`CyclePolicy`];
//! - fully explored: the walk already found nothing below it, so a second call
//!   adds nothing and is skipped.
//!
//! Marks belong to a single walk. Nothing is shared between entries or between
//! predicates.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::boundary::is_boundary_call;
use crate::analysis::finding::{Finding, Reason};
use crate::analysis::predicates::PredicateKind;
use crate::model::{Function, Instruction, Program};

/// Local tests and boundary policy of one predicate.
pub trait Predicate {
    fn kind(&self) -> PredicateKind;

    /// Facts about the function itself. Runs for declarations too.
    fn check_function(&self, _function: &Function) -> Option<Reason> {
        None
    }

    /// Facts about a single instruction of a defined function.
    fn check_instruction(&self, inst: &Instruction) -> Option<Reason>;

    /// What a call into the managed runtime implies. `None` means the call
    /// contributes nothing and is not descended into.
    fn boundary_call(&self, call: &Instruction) -> Option<Reason>;
}

/// How a call back into a function on the current path is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// The back-edge adds no evidence. Every function on the cycle is still
    /// explored through its first call, so no reachable instruction is missed.
    #[default]
    AssumeClean,
    /// The back-edge itself counts as a positive result.
    AssumeViolation,
}

impl CyclePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePolicy::AssumeClean => "assume_clean",
            CyclePolicy::AssumeViolation => "assume_violation",
        }
    }
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "assume_clean" => Ok(CyclePolicy::AssumeClean),
            "assume_violation" => Ok(CyclePolicy::AssumeViolation),
            other => Err(format!(
                "Unknown cycle policy '{other}'. Allowed: assume-clean, assume-violation"
            )),
        }
    }
}

/// Outcome of one walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Traversal {
    pub finding: Option<Finding>,
    /// Number of distinct functions entered.
    pub visited: usize,
    /// Call edges (caller, callee) that closed a cycle.
    pub cycle_edges: Vec<(String, String)>,
}

impl Traversal {
    pub fn fired(&self) -> bool {
        self.finding.is_some()
    }
}

/// Run `predicate` from `entry` over everything it transitively calls.
pub fn analyze(
    program: &Program,
    entry: &Function,
    predicate: &dyn Predicate,
    cycle_policy: CyclePolicy,
) -> Traversal {
    let mut walk = Walk {
        program,
        predicate,
        cycle_policy,
        marks: HashMap::new(),
        stack: Vec::new(),
        cycle_edges: Vec::new(),
    };
    let finding = walk.run(entry);
    debug!(
        entry = %entry.name,
        predicate = predicate.kind().as_str(),
        visited = walk.marks.len(),
        fired = finding.is_some(),
        "traversal finished"
    );
    Traversal { finding, visited: walk.marks.len(), cycle_edges: walk.cycle_edges }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Explored,
}

struct Frame<'p> {
    function: &'p Function,
    next: usize,
}

struct Walk<'p, 'a> {
    program: &'p Program,
    predicate: &'a dyn Predicate,
    cycle_policy: CyclePolicy,
    marks: HashMap<&'p str, Mark>,
    stack: Vec<Frame<'p>>,
    cycle_edges: Vec<(String, String)>,
}

impl<'p, 'a> Walk<'p, 'a> {
    fn run(&mut self, entry: &'p Function) -> Option<Finding> {
        if let Some(found) = self.enter(entry) {
            return Some(found);
        }

        while let Some(frame) = self.stack.last_mut() {
            let function = frame.function;
            let index = frame.next;
            let Some(inst) = function.instructions().get(index) else {
                self.marks.insert(function.name.as_str(), Mark::Explored);
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            if let Some(reason) = self.predicate.check_instruction(inst) {
                return Some(self.finding(Some(index), reason));
            }
            if !inst.is_call() {
                continue;
            }
            if is_boundary_call(inst) {
                if let Some(reason) = self.predicate.boundary_call(inst) {
                    return Some(self.finding(Some(index), reason));
                }
                continue;
            }
            let Some(callee) = self.program.resolve_callee(inst) else {
                continue;
            };
            match self.marks.get(callee.name.as_str()) {
                Some(Mark::Explored) => {}
                Some(Mark::OnPath) => {
                    self.cycle_edges.push((function.name.clone(), callee.name.clone()));
                    if self.cycle_policy == CyclePolicy::AssumeViolation {
                        let reason = Reason::RecursiveCall { callee: callee.name.clone() };
                        return Some(self.finding(Some(index), reason));
                    }
                }
                None => {
                    if let Some(found) = self.enter(callee) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Push `function` onto the path and apply the function-level check.
    fn enter(&mut self, function: &'p Function) -> Option<Finding> {
        self.marks.insert(function.name.as_str(), Mark::OnPath);
        self.stack.push(Frame { function, next: 0 });
        let reason = self.predicate.check_function(function)?;
        Some(self.finding(None, reason))
    }

    fn finding(&self, instruction: Option<usize>, reason: Reason) -> Finding {
        let call_path: Vec<String> =
            self.stack.iter().map(|frame| frame.function.name.clone()).collect();
        let function = call_path.last().cloned().unwrap_or_default();
        Finding { function, instruction, reason, call_path }
    }
}
