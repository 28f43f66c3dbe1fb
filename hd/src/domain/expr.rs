//! Query expression AST
//!
//! Closed set of node types with exhaustive matching. Expressions are always
//! produced internally - base expressions come from the registry, range terms
//! from the TIME strategy - and receive their identity through the canonical
//! module, so two trees that differ only cosmetically hash the same.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::window::canonical_ts;

/// Boolean query tree handed to a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Expr {
    /// Field compared against a single value.
    Term { field: String, value: Value },
    /// Field matching any of the listed values.
    In { field: String, values: Vec<Value> },
    /// Half-open range `[from, to)` over a date or numeric field.
    Range { field: String, from: Value, to: Value },
    /// Conjunction of operands.
    And { operands: Vec<Expr> },
    /// Disjunction of operands.
    Or { operands: Vec<Expr> },
    /// Negation.
    Not { operand: Box<Expr> },
    /// Constant truth value, the neutral base expression.
    Const { value: bool },
}

impl Expr {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Date range `[from, to)` in canonical timestamp form.
    pub fn date_range(field: impl Into<String>, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::Range {
            field: field.into(),
            from: Value::String(canonical_ts(from)),
            to: Value::String(canonical_ts(to)),
        }
    }

    pub fn and(operands: Vec<Expr>) -> Self {
        Self::And { operands }
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Self::Or { operands }
    }

    pub fn not(operand: Expr) -> Self {
        Self::Not {
            operand: Box::new(operand),
        }
    }

    /// Match-everything base expression.
    pub fn everything() -> Self {
        Self::Const { value: true }
    }

    /// JSON tree handed to the canonicalizer.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
