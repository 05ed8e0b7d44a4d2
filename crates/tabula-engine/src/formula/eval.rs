//! Parsed formulas and their evaluation.
//!
//! A [`Formula`] is the only thing the sheet needs from this crate: it can be
//! executed against a resolver, report the cells it reads, and print itself
//! back in canonical form.

use std::fmt;

use super::ast::Expr;
use super::parser::{FormulaParseError, ParseOptions, parse_expression};
use super::{FormulaError, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    expr: Expr,
    /// Sorted, de-duplicated, valid references.
    referenced: Vec<Position>,
}

impl Formula {
    /// Parse expression text (without the leading `=`) using default limits.
    pub fn parse(expression: &str) -> Result<Formula, FormulaParseError> {
        Self::parse_with(expression, &ParseOptions::default())
    }

    pub fn parse_with(
        expression: &str,
        options: &ParseOptions,
    ) -> Result<Formula, FormulaParseError> {
        let expr = match parse_expression(expression, options) {
            Ok(expr) => expr,
            Err(e) => {
                tracing::debug!(expression, error = %e, "formula rejected");
                return Err(e);
            }
        };

        let mut referenced = Vec::new();
        expr.collect_cells(&mut referenced);
        // Out-of-range references evaluate to REF! and never become graph edges.
        referenced.retain(Position::is_valid);
        referenced.sort();
        referenced.dedup();
        tracing::trace!(expression, references = referenced.len(), "formula parsed");

        Ok(Formula { expr, referenced })
    }

    /// Evaluate the formula. `resolve` turns a referenced position into a
    /// number or the error that should abort evaluation.
    pub fn execute<F>(&self, resolve: F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.expr.execute(&resolve)
    }

    pub fn referenced_cells(&self) -> &[Position] {
        &self.referenced
    }

    /// Canonical expression text, without the leading `=`.
    pub fn expression(&self) -> String {
        self.expr.to_string()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_cells_sorted_unique_valid() {
        let formula = Formula::parse("B1+A2+B1*A1+ZZZZ1").unwrap();
        assert_eq!(
            formula.referenced_cells(),
            &[Position::new(0, 0), Position::new(0, 1), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_execute_with_resolver() {
        let formula = Formula::parse("A1*2+B1").unwrap();
        let result = formula.execute(|pos| Ok(if pos.col == 0 { 5.0 } else { 1.0 }));
        assert_eq!(result, Ok(11.0));
    }

    #[test]
    fn test_out_of_range_reference_prints_and_evaluates_as_ref() {
        let formula = Formula::parse("A1+ZZZZ1").unwrap();
        assert_eq!(formula.expression(), "A1+REF!");
        assert_eq!(formula.execute(|_| Ok(1.0)), Err(FormulaError::Ref));
    }
}
