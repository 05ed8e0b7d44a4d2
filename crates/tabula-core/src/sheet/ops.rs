use tabula_engine::formula::Position;
use tracing::{debug, trace};

use super::cycle::detect_cycle;
use super::{Cell, Sheet};
use crate::error::{Result, SheetError};

impl Sheet {
    /// Set cell contents from input text.
    ///
    /// The edit is all-or-nothing: on an invalid position, a formula syntax
    /// error or a circular reference the sheet is left exactly as it was.
    pub fn set_cell(&mut self, pos: Position, input: &str) -> Result<()> {
        Self::check_position(pos)?;

        if self.cells.get(&pos).is_some_and(|cell| cell.text() == input) {
            return Ok(());
        }

        let cell = Cell::from_input(input, &self.parse_options)?;
        let previous = self.cells.insert(pos, cell);

        let mut placeholders = Vec::new();
        if let Some(cycle) = detect_cycle(pos, &mut self.cells, &mut placeholders) {
            for placeholder in &placeholders {
                self.cells.remove(placeholder);
            }
            match previous {
                Some(old) => {
                    self.cells.insert(pos, old);
                }
                None => {
                    self.cells.remove(&pos);
                }
            }
            debug!(%pos, cycle_len = cycle.len(), "edit rejected: circular dependency");
            return Err(SheetError::CircularDependency(pos));
        }

        self.invalidate_from(pos);

        let refs = self.cells[&pos].referenced_cells().to_vec();
        self.graph.set_precedents(pos, &refs);

        for placeholder in placeholders {
            self.extend_size(placeholder);
        }
        self.extend_size(pos);

        Ok(())
    }

    /// Clear the specified cell.
    ///
    /// Cells that read `pos` keep their edges and see it as empty from now on.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        Self::check_position(pos)?;

        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.invalidate_from(pos);
        self.graph.remove_precedents(pos);
        self.cells.remove(&pos);

        if pos.row + 1 == self.size.rows || pos.col + 1 == self.size.cols {
            self.recompute_size();
        }

        Ok(())
    }

    /// Drop the cached value of `pos` and of everything that reads it,
    /// directly or transitively.
    fn invalidate_from(&mut self, pos: Position) {
        let affected = self.graph.affected_by(pos);
        trace!(%pos, count = affected.len(), "invalidating cached values");
        for target in affected {
            if let Some(cell) = self.cells.get_mut(&target) {
                cell.invalidate_cache();
            }
        }
    }
}
