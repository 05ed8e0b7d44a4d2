//! Error types for the tabula command front end

use tabula_core::SheetError;
use thiserror::Error;

/// Errors that can occur while running a command script
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Sheet {
        line: usize,
        #[source]
        source: SheetError,
    },
}

pub type Result<T> = std::result::Result<T, ScriptError>;
