//! Expression tree for arithmetic formulas.
//!
//! Parentheses are not stored: the tree shape carries grouping, and
//! [`fmt::Display`] re-inserts only the parentheses the shape requires.

use std::fmt;

use super::{FormulaError, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    /// `a - (b - c)` and `a / (b / c)` change meaning without parentheses.
    fn groups_right_operand(self) -> bool {
        matches!(self, BinaryOp::Sub | BinaryOp::Div)
    }
}

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Cell(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `first op1 e1 op2 e2 ...`, evaluated left to right. All operators in
    /// one chain share a precedence level.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinaryOp, Expr)>,
    },
}

impl Expr {
    /// `first` alone when `rest` is empty, else a chain.
    pub fn chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
        if rest.is_empty() {
            first
        } else {
            Expr::Chain {
                first: Box::new(first),
                rest,
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Cell(_) => ATOM_PRECEDENCE,
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Chain { first, rest } => rest
                .first()
                .map_or_else(|| first.precedence(), |(op, _)| op.precedence()),
        }
    }

    /// Evaluate the tree, resolving cell references through `resolve`.
    ///
    /// The first error anywhere in the tree aborts evaluation.
    pub fn execute(
        &self,
        resolve: &dyn Fn(Position) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        let n = match self {
            Expr::Number(n) => *n,
            Expr::Cell(pos) => {
                if !pos.is_valid() {
                    return Err(FormulaError::Ref);
                }
                resolve(*pos)?
            }
            Expr::Unary { op, operand } => {
                let n = operand.execute(resolve)?;
                match op {
                    UnaryOp::Plus => n,
                    UnaryOp::Minus => -n,
                }
            }
            Expr::Chain { first, rest } => {
                let mut acc = first.execute(resolve)?;
                for (op, operand) in rest {
                    let r = operand.execute(resolve)?;
                    acc = finite(match op {
                        BinaryOp::Add => acc + r,
                        BinaryOp::Sub => acc - r,
                        BinaryOp::Mul => acc * r,
                        BinaryOp::Div => acc / r,
                    })?;
                }
                acc
            }
        };

        finite(n)
    }

    /// Push every cell reference in the tree onto `out`, in source order.
    pub fn collect_cells(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Cell(pos) => out.push(*pos),
            Expr::Unary { operand, .. } => operand.collect_cells(out),
            Expr::Chain { first, rest } => {
                first.collect_cells(out);
                for (_, operand) in rest {
                    operand.collect_cells(out);
                }
            }
        }
    }
}

/// Non-finite arithmetic results (division by zero, overflow) are `#DIV/0!`.
fn finite(n: f64) -> Result<f64, FormulaError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(FormulaError::Div0)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Cell(pos) if pos.is_valid() => write!(f, "{}", pos),
            Expr::Cell(_) => write!(f, "{}", FormulaError::Ref),
            Expr::Unary { op, operand } => {
                f.write_str(match op {
                    UnaryOp::Plus => "+",
                    UnaryOp::Minus => "-",
                })?;
                write_operand(f, operand, operand.precedence() < UNARY_PRECEDENCE)
            }
            Expr::Chain { first, rest } => {
                let prec = self.precedence();
                write_operand(f, first, first.precedence() < prec)?;
                for (op, operand) in rest {
                    write!(f, "{}", op.symbol())?;
                    let operand_prec = operand.precedence();
                    let parenthesize = operand_prec < prec
                        || (operand_prec == prec && op.groups_right_operand());
                    write_operand(f, operand, parenthesize)?;
                }
                Ok(())
            }
        }
    }
}
