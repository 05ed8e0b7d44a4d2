//! Cell positions and A1 notation.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//!
//! # Examples
//!
//! ```
//! use tabula_engine::formula::Position;
//!
//! let pos = Position::from_a1("B3").unwrap();
//! assert_eq!(pos.col, 1); // 0-indexed
//! assert_eq!(pos.row, 2);
//! assert_eq!(pos.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of addressable rows.
pub const MAX_ROWS: usize = 16384;
/// Number of addressable columns.
pub const MAX_COLS: usize = 16384;

/// A zero-indexed (row, column) cell address.
///
/// Ordering is row-major, so sorted positions read like a printed sheet.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Out-of-range sentinel, produced when A1 notation overflows.
    pub const INVALID: Position = Position {
        row: usize::MAX,
        col: usize::MAX,
    };

    pub const fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    ///
    /// Returns `None` when the text is not of the form `letters digits` or the
    /// row number is zero. References that are well-formed but too large to
    /// address yield [`Position::INVALID`].
    pub fn from_a1(name: &str) -> Option<Position> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        if numbers.bytes().all(|b| b == b'0') {
            return None;
        }

        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            match col_acc.checked_mul(26).and_then(|acc| acc.checked_add(digit)) {
                Some(acc) => col_acc = acc,
                None => return Some(Position::INVALID),
            }
        }
        let col = col_acc - 1;

        let row = match numbers.parse::<usize>() {
            Ok(n) => n - 1,
            Err(_) => return Some(Position::INVALID),
        };

        Some(Position::new(row, col))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            Position::col_to_letters(self.col),
            self.row as u128 + 1
        )
    }
}
