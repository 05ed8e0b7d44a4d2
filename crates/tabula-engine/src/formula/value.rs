//! Evaluated cell values.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::format::format_number;

/// Error categories a formula can evaluate to.
///
/// These are ordinary values: they flow through dependent formulas and are
/// never raised as faults by the sheet.
#[derive(Error, Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum FormulaError {
    /// Reference to a position outside the sheet.
    #[error("REF!")]
    Ref,
    /// Text that does not parse as a number used in arithmetic.
    #[error("#VALUE!")]
    Value,
    /// Arithmetic with a non-finite result (division by zero, overflow).
    #[error("#DIV/0!")]
    Div0,
}

/// The result of evaluating a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<FormulaError> for Value {
    fn from(e: FormulaError) -> Self {
        Value::Error(e)
    }
}

impl From<Result<f64, FormulaError>> for Value {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}
