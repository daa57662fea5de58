//! IR model consumed by the audit: functions, instructions, values and types.
//!
//! The front end that produces the IR lives outside this crate. Programs reach
//! the audit as serialized IR dumps (JSON or YAML) or are assembled in code
//! through the constructors below. Once built, a `Program` is never mutated by
//! the analyses.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

mod inst;
mod types;
mod value;

pub use inst::{CastKind, InstKind, Instruction, MemoryOp};
pub use types::{Type, TypeParseError};
pub use value::{Value, ValueKind};

/// Function attributes the audit cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionAttr {
    /// May read but never writes memory.
    ReadOnly,
    /// Neither reads nor writes memory.
    ReadNone,
    NoUnwind,
    NoReturn,
}

/// A function definition or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub attrs: BTreeSet<FunctionAttr>,
    /// `None` for declarations (externals, library imports).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Instruction>>,
}

impl Function {
    /// A defined function with the given body.
    pub fn define(name: impl Into<String>, body: Vec<Instruction>) -> Self {
        Self { name: name.into(), attrs: BTreeSet::new(), body: Some(body) }
    }

    /// A body-less declaration.
    pub fn declare(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: BTreeSet::new(), body: None }
    }

    pub fn with_attr(mut self, attr: FunctionAttr) -> Self {
        self.attrs.insert(attr);
        self
    }

    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }

    pub fn has_attr(&self, attr: FunctionAttr) -> bool {
        self.attrs.contains(&attr)
    }

    /// Mirrors LLVM's `onlyReadsMemory`: `readonly` or `readnone`.
    pub fn only_reads_memory(&self) -> bool {
        self.has_attr(FunctionAttr::ReadOnly) || self.has_attr(FunctionAttr::ReadNone)
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.body.as_deref().unwrap_or(&[])
    }
}

/// On-disk shape of an IR dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub functions: Vec<Function>,
}

/// The set of functions available to the audit, keyed by name.
///
/// Enumeration order follows the order functions were supplied in. Callees that
/// are referenced but never listed get an implicit declaration, the same as an
/// external symbol would carry in the IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProgramFile", into = "ProgramFile")]
pub struct Program {
    module: Option<String>,
    functions: Vec<Function>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
    implicit: Vec<String>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self::with_module(None, functions)
    }

    pub fn with_module(module: Option<String>, functions: Vec<Function>) -> Self {
        let mut index = HashMap::new();
        let mut kept = Vec::with_capacity(functions.len());
        let mut duplicates = Vec::new();
        for function in functions {
            if index.contains_key(&function.name) {
                duplicates.push(function.name);
                continue;
            }
            index.insert(function.name.clone(), kept.len());
            kept.push(function);
        }

        let mut implicit = Vec::new();
        let referenced: Vec<String> = kept
            .iter()
            .flat_map(|f| f.instructions())
            .filter_map(|inst| inst.callee())
            .map(str::to_string)
            .collect();
        for name in referenced {
            if !index.contains_key(&name) {
                index.insert(name.clone(), kept.len());
                kept.push(Function::declare(name.clone()));
                implicit.push(name);
            }
        }

        Self { module, functions: kept, index, duplicates, implicit }
    }

    /// Load an IR dump, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read(path)
            .with_context(|| format!("Failed to read IR dump at {}", path.display()))?;
        let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
        let program = if is_yaml {
            serde_yaml::from_slice(&body).context("Failed to parse IR dump YAML")?
        } else {
            serde_json::from_slice(&body).context("Failed to parse IR dump JSON")?
        };
        Ok(program)
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.index.get(name).map(|&i| &self.functions[i])
    }

    /// Resolve the target of a call instruction; `None` for indirect calls and
    /// non-call instructions.
    pub fn resolve_callee(&self, inst: &Instruction) -> Option<&Function> {
        inst.callee().and_then(|name| self.function(name))
    }

    /// Names listed more than once in the input; only the first was kept.
    pub fn duplicate_names(&self) -> &[String] {
        &self.duplicates
    }

    /// Callees that had no entry of their own and were declared implicitly.
    pub fn implicit_declarations(&self) -> &[String] {
        &self.implicit
    }
}

impl From<ProgramFile> for Program {
    fn from(file: ProgramFile) -> Self {
        Program::with_module(file.module, file.functions)
    }
}

impl From<Program> for ProgramFile {
    fn from(program: Program) -> Self {
        let implicit: BTreeSet<&String> = program.implicit.iter().collect();
        let functions =
            program.functions.iter().filter(|f| !implicit.contains(&f.name)).cloned().collect();
        ProgramFile { module: program.module.clone(), functions }
    }
}
