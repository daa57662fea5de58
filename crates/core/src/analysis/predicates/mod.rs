//! The four audit predicates.
//!
//! Each predicate is a [`Predicate`] plugged into the shared traversal. A
//! positive traversal result means the property was found: impurity, pointer
//! arithmetic, a reinterpretation cast, or a dynamic memory operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::traversal::Predicate;

mod dynamic_memory;
mod pointer_arithmetic;
mod purity;
mod type_casts;

pub use dynamic_memory::DynamicMemory;
pub use pointer_arithmetic::PointerArithmetic;
pub use purity::Purity;
pub use type_casts::TypeCasts;

/// Identifies a predicate in configs, logs and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Purity,
    PointerArithmetic,
    TypeCasts,
    DynamicMemory,
}

impl PredicateKind {
    /// Fixed evaluation and output order.
    pub const ALL: [PredicateKind; 4] = [
        PredicateKind::Purity,
        PredicateKind::PointerArithmetic,
        PredicateKind::TypeCasts,
        PredicateKind::DynamicMemory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PredicateKind::Purity => "purity",
            PredicateKind::PointerArithmetic => "pointer_arithmetic",
            PredicateKind::TypeCasts => "type_casts",
            PredicateKind::DynamicMemory => "dynamic_memory",
        }
    }

    /// The predicate implementation for this kind.
    pub fn predicate(self) -> Box<dyn Predicate> {
        match self {
            PredicateKind::Purity => Box::new(Purity),
            PredicateKind::PointerArithmetic => Box::new(PointerArithmetic),
            PredicateKind::TypeCasts => Box::new(TypeCasts),
            PredicateKind::DynamicMemory => Box::new(DynamicMemory),
        }
    }

    /// Human-readable verdict for a function, as written to the per-analysis logs.
    pub fn sentence(self, function: &str, fired: bool) -> String {
        let verdict = match (self, fired) {
            (PredicateKind::Purity, true) => "is impure",
            (PredicateKind::Purity, false) => "is pure",
            (PredicateKind::PointerArithmetic, true) => "has pointer arithmetic",
            (PredicateKind::PointerArithmetic, false) => "has no pointer arithmetic",
            (PredicateKind::TypeCasts, true) => "has typecasts",
            (PredicateKind::TypeCasts, false) => "has no typecasts",
            (PredicateKind::DynamicMemory, true) => "has dynamic memory allocation",
            (PredicateKind::DynamicMemory, false) => "has no dynamic memory allocation",
        };
        format!("{function} {verdict}")
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredicateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "purity" => Ok(PredicateKind::Purity),
            "pointer_arithmetic" => Ok(PredicateKind::PointerArithmetic),
            "type_casts" => Ok(PredicateKind::TypeCasts),
            "dynamic_memory" => Ok(PredicateKind::DynamicMemory),
            other => Err(format!(
                "Unknown analysis '{other}'. Allowed: purity, pointer-arithmetic, type-casts, dynamic-memory"
            )),
        }
    }
}
