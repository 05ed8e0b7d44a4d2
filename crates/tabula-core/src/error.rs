//! Error types for Tabula core.

use tabula_engine::formula::{FormulaParseError, Position};
use thiserror::Error;

/// Structural errors from sheet operations.
///
/// Any of these aborts the call and leaves the sheet unchanged. Formula
/// evaluation errors are not here: they are ordinary cell values.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Invalid position: {0}")]
    InvalidPosition(Position),

    #[error("Circular dependency detected at {0}")]
    CircularDependency(Position),

    #[error("Formula syntax error: {0}")]
    FormulaSyntax(#[from] FormulaParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
