//! Printing the sheet as tab-separated rows.

use std::io::Write;

use tabula_engine::formula::Position;

use super::{Cell, Sheet};
use crate::error::Result;

impl Sheet {
    /// Write evaluated values over the printable area.
    pub fn print_values<W: Write>(&self, out: &mut W) -> Result<()> {
        self.print_with(out, |pos, cell| self.evaluate(pos, cell).to_string())
    }

    /// Write cell texts (formulas in canonical form) over the printable area.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> Result<()> {
        self.print_with(out, |_, cell| cell.text())
    }

    /// Row-major walk of the printable area: columns separated by tabs, one
    /// line per row, nothing written for absent cells.
    fn print_with<W, F>(&self, out: &mut W, render: F) -> Result<()>
    where
        W: Write,
        F: Fn(Position, &Cell) -> String,
    {
        for row in 0..self.size.rows {
            for col in 0..self.size.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                let pos = Position::new(row, col);
                if let Some(cell) = self.cells.get(&pos) {
                    out.write_all(render(pos, cell).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}
