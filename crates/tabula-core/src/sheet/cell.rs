//! Cell data structures for the sheet.
//!
//! - [`Content`] - What the user typed, parsed (empty, text, or formula)
//! - [`Cell`] - Content plus the cached result of evaluating it
//!
//! Cells never hold references to each other; the sheet owns every cell and
//! the dependency graph between them, keyed by [`Position`].

use std::cell::OnceCell;

use tabula_engine::formula::{
    Formula, FormulaError, FormulaParseError, ParseOptions, Position, Value,
};

/// Prefix that forces the rest of the input to be read as literal text.
pub const ESCAPE_SIGN: char = '\'';
/// Prefix that marks a formula.
pub const FORMULA_SIGN: char = '=';

/// The parsed content of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Empty,
    Text(String),
    Formula(Formula),
}

impl Content {
    /// Classify user input.
    /// - Empty string -> Empty
    /// - `=` followed by at least one character -> Formula (without the `=`)
    /// - Otherwise -> Text, verbatim
    pub fn parse(input: &str, options: &ParseOptions) -> Result<Content, FormulaParseError> {
        if input.is_empty() {
            return Ok(Content::Empty);
        }
        match input.strip_prefix(FORMULA_SIGN) {
            Some(expression) if !expression.is_empty() => {
                Ok(Content::Formula(Formula::parse_with(expression, options)?))
            }
            _ => Ok(Content::Text(input.to_string())),
        }
    }

    /// Text for editing: what the user typed, with formulas in canonical form.
    pub fn text(&self) -> String {
        match self {
            Content::Empty => String::new(),
            Content::Text(s) => s.clone(),
            Content::Formula(f) => format!("{}{}", FORMULA_SIGN, f.expression()),
        }
    }

    /// Evaluate the content. Only formulas consult `resolve`.
    pub fn value<F>(&self, resolve: F) -> Value
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        match self {
            Content::Empty => Value::Text(String::new()),
            Content::Text(s) => Value::Text(s.strip_prefix(ESCAPE_SIGN).unwrap_or(s.as_str()).to_string()),
            Content::Formula(f) => f.execute(resolve).into(),
        }
    }

    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            Content::Formula(f) => f.referenced_cells(),
            Content::Empty | Content::Text(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Content::Formula(_))
    }
}

/// A cell in the sheet.
#[derive(Clone, Debug)]
pub struct Cell {
    content: Content,
    /// Result of the last evaluation; empty until read after any change upstream.
    cache: OnceCell<Value>,
}

impl Cell {
    pub fn new(content: Content) -> Cell {
        Cell {
            content,
            cache: OnceCell::new(),
        }
    }

    pub fn new_empty() -> Cell {
        Cell::new(Content::Empty)
    }

    /// Parse user input and create a cell holding it.
    pub fn from_input(input: &str, options: &ParseOptions) -> Result<Cell, FormulaParseError> {
        Ok(Cell::new(Content::parse(input, options)?))
    }

    /// Replace the content and drop any cached value.
    ///
    /// Dependency edges are the sheet's business and are left untouched.
    pub fn set_content(&mut self, input: &str, options: &ParseOptions) -> Result<(), FormulaParseError> {
        self.content = Content::parse(input, options)?;
        self.cache = OnceCell::new();
        Ok(())
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn referenced_cells(&self) -> &[Position] {
        self.content.referenced_cells()
    }

    /// Cached value, or evaluate with `resolve` and cache the result.
    pub fn value_with<F>(&self, resolve: F) -> &Value
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.cache.get_or_init(|| self.content.value(resolve))
    }

    pub fn cached_value(&self) -> Option<&Value> {
        self.cache.get()
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.take();
    }
}
