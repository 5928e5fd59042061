//! Expression tree of a parsed program

use serde::{Deserialize, Serialize};
use std::fmt;
use texlm_matrix::MatrixValue;

/// One-argument operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Transpose,
    Inverse,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Transpose => "transpose",
            Self::Inverse => "inverse",
        }
    }
}

/// Two-argument operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Multiply,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Multiply => "multiply",
        }
    }
}

/// A program is exactly one `Expr` tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(MatrixValue),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of operation calls in the tree
    pub fn operation_count(&self) -> usize {
        match self {
            Self::Literal(_) => 0,
            Self::Unary { operand, .. } => 1 + operand.operation_count(),
            Self::Binary { left, right, .. } => {
                1 + left.operation_count() + right.operation_count()
            }
        }
    }
}

/// Canonical program text, e.g. `add([[1, 2]], [[3, 4]])`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(matrix) => write!(f, "{}", matrix),
            Self::Unary { op, operand } => write!(f, "{}({})", op.name(), operand),
            Self::Binary { op, left, right } => {
                write!(f, "{}({}, {})", op.name(), left, right)
            }
        }
    }
}
