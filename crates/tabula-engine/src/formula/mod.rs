//! Formula engine API.
//!
//! This module provides everything a sheet needs to evaluate arithmetic formulas:
//!
//! - [`Position`] - Cell addresses (A1 notation ↔ row/col indices)
//! - [`Value`], [`FormulaError`] - Evaluated results and error categories
//! - [`Formula`] - Parse, execute, list references, pretty-print
//! - [`format_number`] - Format numbers for display

mod ast;
mod eval;
mod format;
mod parser;
mod position;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::Formula;
pub use format::format_number;
pub use parser::{DEFAULT_MAX_DEPTH, FormulaParseError, ParseOptions, parse_expression};
pub use position::{MAX_COLS, MAX_ROWS, Position};
pub use value::{FormulaError, Value};
