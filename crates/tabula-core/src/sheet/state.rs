use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tabula_engine::formula::{ParseOptions, Position, Value};

use super::graph::DependencyGraph;
use super::{Cell, Content};
use crate::error::{Result, SheetError};

/// Dimensions of the printable area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

/// A sheet of cells with an incrementally maintained dependency graph.
///
/// The sheet exclusively owns its cells; they refer to each other only by
/// [`Position`]. Absent positions read as empty.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    pub(super) cells: HashMap<Position, Cell>,
    pub(super) graph: DependencyGraph,
    /// Smallest rectangle from A1 covering every materialized cell.
    pub(super) size: Size,
    pub(super) parse_options: ParseOptions,
}

/// Read-only view of a materialized cell.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    sheet: &'a Sheet,
    pos: Position,
    cell: &'a Cell,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sheet whose formulas are parsed with `options`.
    pub fn with_parse_options(options: ParseOptions) -> Self {
        Sheet {
            parse_options: options,
            ..Self::default()
        }
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    pub(super) fn check_position(pos: Position) -> Result<()> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(SheetError::InvalidPosition(pos))
        }
    }

    /// The cell at `pos`, or `None` if nothing is materialized there.
    pub fn cell(&self, pos: Position) -> Result<Option<CellView<'_>>> {
        Self::check_position(pos)?;
        Ok(self
            .cells
            .get(&pos)
            .map(|cell| CellView { sheet: self, pos, cell }))
    }

    pub fn printable_size(&self) -> Size {
        self.size
    }

    /// Number of materialized cells, placeholders included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Materialized positions in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.cells.keys().copied().collect();
        positions.sort();
        positions
    }

    /// Positions the cell at `pos` reads from.
    pub fn direct_dependencies(&self, pos: Position) -> Vec<Position> {
        self.graph.precedents(pos).collect()
    }

    /// Positions whose formulas read `pos`.
    pub fn dependents(&self, pos: Position) -> Vec<Position> {
        self.graph.dependents(pos).collect()
    }

    pub(super) fn extend_size(&mut self, pos: Position) {
        self.size.rows = self.size.rows.max(pos.row + 1);
        self.size.cols = self.size.cols.max(pos.col + 1);
    }

    /// Rescan every materialized cell for the printable area.
    pub(super) fn recompute_size(&mut self) {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        tracing::debug!(rows = size.rows, cols = size.cols, "printable area recomputed");
        self.size = size;
    }
}

impl<'a> CellView<'a> {
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Evaluated value; computed on first read and cached until something
    /// upstream changes.
    pub fn value(&self) -> Value {
        self.sheet.evaluate(self.pos, self.cell).clone()
    }

    pub fn text(&self) -> String {
        self.cell.text()
    }

    pub fn content(&self) -> &'a Content {
        self.cell.content()
    }

    pub fn referenced_cells(&self) -> &'a [Position] {
        self.cell.referenced_cells()
    }

    pub fn dependents(&self) -> Vec<Position> {
        self.sheet.dependents(self.pos)
    }

    pub fn is_cached(&self) -> bool {
        self.cell.is_cached()
    }
}

impl std::fmt::Debug for CellView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellView")
            .field("pos", &self.pos)
            .field("cell", self.cell)
            .finish()
    }
}
