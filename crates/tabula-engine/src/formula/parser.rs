//! Formula parser - converts formula text (without the leading `=`) into an AST.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | CELL | '(' expr ')'
//! ```

use thiserror::Error;

use super::Position;
use super::ast::{BinaryOp, Expr, UnaryOp};

/// Default limit on nested parentheses and unary signs.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A formula that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct FormulaParseError {
    pub message: String,
    /// Byte offset into the expression text.
    pub offset: usize,
}

impl FormulaParseError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        FormulaParseError {
            message: message.into(),
            offset,
        }
    }
}

/// Parser limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of parenthesized groups and unary signs. Operator
    /// chains are flat, so this bounds the stack use of evaluation and
    /// printing.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Cell(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, FormulaParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i];
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let text = &input[start..i];
                let n = text
                    .parse::<f64>()
                    .map_err(|_| FormulaParseError::new(format!("Invalid number '{}'", text), start))?;
                tokens.push((Token::Number(n), start));
                continue;
            }
            b'A'..=b'Z' | b'a'..=b'z' => {
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let text = &input[start..i];
                let pos = Position::from_a1(text).ok_or_else(|| {
                    FormulaParseError::new(format!("Invalid cell reference '{}'", text), start)
                })?;
                tokens.push((Token::Cell(pos), start));
                continue;
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(FormulaParseError::new(
                    format!("Unexpected character '{}'", ch),
                    start,
                ));
            }
        };
        tokens.push((token, start));
        i += 1;
    }

    Ok(tokens)
}

/// Scan `digits [. digits] [(e|E) [+|-] digits]` starting at `i`.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}


struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    end: usize,
    /// Unary operators and parenthesized groups currently being parsed.
    nesting: usize,
    options: &'a ParseOptions,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, o)| *o)
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaParseError> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(Expr::chain(first, rest)),
            };
            self.pos += 1;
            rest.push((op, self.parse_term()?));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaParseError> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(Expr::chain(first, rest)),
            };
            self.pos += 1;
            rest.push((op, self.parse_unary()?));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaParseError> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Minus,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.nesting -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaParseError> {
        let offset = self.offset();
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Cell(pos)) => {
                self.pos += 1;
                Ok(Expr::Cell(pos))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_expr()?;
                self.nesting -= 1;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(FormulaParseError::new("Expected ')'", self.offset())),
                }
            }
            Some(token) => Err(FormulaParseError::new(
                format!("Unexpected token {:?}", token),
                offset,
            )),
            None => Err(FormulaParseError::new("Unexpected end of formula", offset)),
        }
    }

    /// Recursion guard checked before each group or unary sign.
    fn descend(&mut self) -> Result<(), FormulaParseError> {
        self.nesting += 1;
        if self.nesting > self.options.max_depth {
            return Err(FormulaParseError::new(
                format!("Expression nested deeper than {}", self.options.max_depth),
                self.offset(),
            ));
        }
        Ok(())
    }
}

/// Parse expression text into an AST.
pub fn parse_expression(input: &str, options: &ParseOptions) -> Result<Expr, FormulaParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FormulaParseError::new("Empty formula", 0));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: input.len(),
        nesting: 0,
        options,
    };
    let expr = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        return Err(FormulaParseError::new(
            format!("Unexpected token {:?}", tokens[parser.pos].0),
            parser.offset(),
        ));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Expr, FormulaParseError> {
        parse_expression(input, &ParseOptions::default())
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(parse("1+2*3").unwrap().to_string(), "1+2*3");
        assert_eq!(parse("(1+2)*3").unwrap().to_string(), "(1+2)*3");
        assert_eq!(parse("1-2-3").unwrap().to_string(), "1-2-3");
        assert_eq!(parse("1-(2-3)").unwrap().to_string(), "1-(2-3)");
        assert_eq!(parse("1+(2+3)").unwrap().to_string(), "1+2+3");
        assert_eq!(parse("8/(4/2)").unwrap().to_string(), "8/(4/2)");
    }

    #[test]
    fn test_whitespace_and_redundant_parentheses_are_dropped() {
        assert_eq!(parse(" ( ( A1 ) ) + 2 ").unwrap().to_string(), "A1+2");
        assert_eq!(parse("-(-1)").unwrap().to_string(), "--1");
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(parse("1.5").unwrap(), Expr::Number(1.5));
        assert_eq!(parse(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(parse("2.5E-1").unwrap(), Expr::Number(0.25));
    }

    #[test]
    fn test_lowercase_reference_prints_uppercase() {
        assert_eq!(parse("b2*2").unwrap().to_string(), "B2*2");
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("").is_err());
        assert!(parse("1+").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("1)").is_err());
        assert!(parse("A").is_err());
        assert!(parse("A0").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("SUM(A1)").is_err());
        assert!(parse(".").is_err());

        let err = parse("1+$").unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_depth_limit() {
        let options = ParseOptions { max_depth: 8 };
        let long_chain = vec!["1"; 20].join("+");
        assert!(parse_expression(&long_chain, &options).is_ok());

        let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_expression(&nested, &options).is_err());

        let signs = format!("{}1", "-".repeat(20));
        assert!(parse_expression(&signs, &options).is_err());
    }

    #[test]
    fn test_long_flat_chain_is_one_level() {
        let sum = (1..=5000).map(|row| format!("A{}", row)).collect::<Vec<_>>().join("+");
        let expr = parse(&sum).unwrap();
        match &expr {
            Expr::Chain { rest, .. } => assert_eq!(rest.len(), 4999),
            other => panic!("expected a chain, got {:?}", other),
        }
        assert_eq!(expr.to_string(), sum);

        let product = vec!["2"; 1000].join("*");
        assert!(parse(&product).is_ok());
    }
}
