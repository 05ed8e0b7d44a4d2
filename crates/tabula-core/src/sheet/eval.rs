//! Lazy evaluation of cell values.
//!
//! Values are computed on read and cached in the cell. Before evaluating a
//! formula, every uncached formula it depends on is evaluated first, leaves
//! before readers, so a formula's references always hit the cache and deep
//! reference chains do not recurse.

use std::collections::HashSet;

use tabula_engine::formula::{FormulaError, Position, Value};
use tracing::trace;

use super::{Cell, Sheet};

impl Sheet {
    /// Value of `cell`, which lives at `pos`.
    pub(super) fn evaluate<'a>(&'a self, pos: Position, cell: &'a Cell) -> &'a Value {
        if let Some(value) = cell.cached_value() {
            return value;
        }

        let pending = self.pending_evaluations(pos);
        trace!(%pos, pending = pending.len(), "evaluating");
        for target in pending {
            if let Some(upstream) = self.cells.get(&target) {
                upstream.value_with(|r| self.resolve(r));
            }
        }

        cell.value_with(|r| self.resolve(r))
    }

    /// Uncached formula cells reachable from `start` (inclusive), ordered so
    /// that every cell comes after everything it reads.
    fn pending_evaluations(&self, start: Position) -> Vec<Position> {
        let mut order = Vec::new();
        let mut visited = HashSet::from([start]);
        // Each frame is a position and the index of the next reference to follow.
        let mut path: Vec<(Position, usize)> = vec![(start, 0)];

        while let Some(frame) = path.last_mut() {
            let (current, index) = *frame;
            let next = self
                .cells
                .get(&current)
                .and_then(|cell| cell.referenced_cells().get(index).copied());

            let Some(next) = next else {
                order.push(current);
                path.pop();
                continue;
            };
            frame.1 += 1;

            // The graph is acyclic, so a visited reference is already in `order`.
            if self.needs_evaluation(next) && visited.insert(next) {
                path.push((next, 0));
            }
        }

        order
    }

    fn needs_evaluation(&self, pos: Position) -> bool {
        self.cells
            .get(&pos)
            .is_some_and(|cell| cell.content().is_formula() && !cell.is_cached())
    }

    /// Turn a referenced position into a number for formula arithmetic.
    ///
    /// - out of range -> `REF!`
    /// - absent or empty cell -> 0
    /// - number -> itself
    /// - error -> the same error
    /// - text -> parsed as a whole finite number literal, else `#VALUE!`
    fn resolve(&self, pos: Position) -> Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(0.0);
        };
        if cell.content().is_empty() {
            return Ok(0.0);
        }

        match cell.value_with(|r| self.resolve(r)) {
            Value::Number(n) => Ok(*n),
            Value::Error(e) => Err(*e),
            Value::Text(s) => s
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or(FormulaError::Value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a1(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    fn value(sheet: &Sheet, name: &str) -> Value {
        sheet.cell(a1(name)).unwrap().unwrap().value()
    }

    #[test]
    fn test_text_coercion() {
        let mut sheet = Sheet::new();
        sheet.set_cell(a1("A1"), "2.5").unwrap();
        sheet.set_cell(a1("A2"), "1e2").unwrap();
        sheet.set_cell(a1("A3"), " 3").unwrap();
        sheet.set_cell(a1("A4"), "3x").unwrap();
        sheet.set_cell(a1("A5"), "'7").unwrap();
        sheet.set_cell(a1("B1"), "=A1*2").unwrap();
        sheet.set_cell(a1("B2"), "=A2+1").unwrap();
        sheet.set_cell(a1("B3"), "=A3").unwrap();
        sheet.set_cell(a1("B4"), "=A4").unwrap();
        sheet.set_cell(a1("B5"), "=A5").unwrap();
        sheet.set_cell(a1("A6"), "nan").unwrap();
        sheet.set_cell(a1("A7"), "inf").unwrap();
        sheet.set_cell(a1("A8"), "-Infinity").unwrap();
        sheet.set_cell(a1("B6"), "=A6").unwrap();
        sheet.set_cell(a1("B7"), "=A7").unwrap();
        sheet.set_cell(a1("B8"), "=A8*0").unwrap();

        assert_eq!(value(&sheet, "B1"), Value::Number(5.0));
        assert_eq!(value(&sheet, "B2"), Value::Number(101.0));
        assert_eq!(value(&sheet, "B3"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B4"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B5"), Value::Number(7.0));
        // Non-finite spellings are text, not numbers.
        assert_eq!(value(&sheet, "B6"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B7"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B8"), Value::Error(FormulaError::Value));
    }

    #[test]
    fn test_empty_and_absent_cells_read_as_zero() {
        let mut sheet = Sheet::new();
        sheet.set_cell(a1("A1"), "").unwrap();
        sheet.set_cell(a1("B1"), "=A1+C1+1").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Number(1.0));
        // Read directly, an empty cell is empty text.
        assert_eq!(value(&sheet, "A1"), Value::Text(String::new()));
    }

    #[test]
    fn test_out_of_range_reference_is_ref() {
        let mut sheet = Sheet::new();
        sheet.set_cell(a1("A1"), "=ZZZZ1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), Value::Error(FormulaError::Ref));
        assert_eq!(sheet.cell(a1("A1")).unwrap().unwrap().text(), "=REF!+1");
        assert!(sheet.direct_dependencies(a1("A1")).is_empty());
    }

    #[test]
    fn test_reading_populates_upstream_caches() {
        let mut sheet = Sheet::new();
        sheet.set_cell(a1("A1"), "=1").unwrap();
        sheet.set_cell(a1("A2"), "=A1+1").unwrap();
        sheet.set_cell(a1("A3"), "=A2+1").unwrap();

        assert_eq!(value(&sheet, "A3"), Value::Number(3.0));
        assert!(sheet.cell(a1("A1")).unwrap().unwrap().is_cached());
        assert!(sheet.cell(a1("A2")).unwrap().unwrap().is_cached());
    }

    #[test]
    fn test_long_chain_evaluates_without_recursion() {
        let mut sheet = Sheet::new();
        // Top-down, so each edit only walks onto a fresh placeholder.
        for row in (1..10_000).rev() {
            sheet
                .set_cell(Position::new(row, 0), &format!("=A{}+1", row))
                .unwrap();
        }
        sheet.set_cell(Position::new(0, 0), "1").unwrap();
        assert_eq!(value(&sheet, "A10000"), Value::Number(10_000.0));
    }
}
