//! Sheet state and logic.

mod cell;
mod cycle;
mod eval;
mod graph;
mod io;
mod ops;
mod state;

pub use cell::{Cell, Content, ESCAPE_SIGN, FORMULA_SIGN};
pub use cycle::detect_cycle;
pub use graph::DependencyGraph;
pub use state::{CellView, Sheet, Size};
