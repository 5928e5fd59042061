//! Bottom-up evaluation of an expression tree

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::errors::EvalResult;
use crate::parser::parse;
use texlm_matrix::MatrixValue;

/// Parse and evaluate a program.
///
/// Identical text always produces an identical value.
pub fn evaluate(program: &str) -> EvalResult<MatrixValue> {
    let expr = parse(program)?;
    evaluate_expr(&expr)
}

/// Evaluate an already parsed tree
pub fn evaluate_expr(expr: &Expr) -> EvalResult<MatrixValue> {
    match expr {
        Expr::Literal(matrix) => Ok(matrix.clone()),
        Expr::Unary { op, operand } => {
            let value = evaluate_expr(operand)?;
            match op {
                UnaryOp::Transpose => Ok(value.transpose()),
                UnaryOp::Inverse => Ok(value.inverse()?),
            }
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate_expr(left)?;
            let right = evaluate_expr(right)?;
            let value = match op {
                BinaryOp::Add => left.add(&right)?,
                BinaryOp::Multiply => left.multiply(&right)?,
            };
            Ok(value)
        }
    }
}
