//! tabula-core - Sheet model: cells, dependency graph, incremental value cache.

pub mod error;
pub mod sheet;

pub use error::{Result, SheetError};
pub use sheet::{Cell, CellView, Content, Sheet, Size};

pub use tabula_engine::formula::{FormulaError, ParseOptions, Position, Value};
