//! Parser: recursive descent over the token stream
//!
//! A program is a single matrix literal or a single call. Calls nest
//! without limit in the grammar; the parser caps nesting at
//! [`MAX_NESTING`] so hostile input cannot exhaust the stack.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::errors::{EvalError, EvalResult};
use crate::grammar::arity_of;
use crate::lexer::{Lexer, Token, TokenKind};
use texlm_matrix::{MatrixValue, Scalar};

/// Deepest call nesting accepted
pub const MAX_NESTING: usize = 256;

/// Parse program text into an expression tree
pub fn parse(input: &str) -> EvalResult<Expr> {
    Parser::parse(input)
}

/// Bracketed list as written, before it is checked for rank and shape
enum ListItem {
    Number(Scalar),
    List(Vec<ListItem>),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn parse(input: &str) -> EvalResult<Expr> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Self { tokens, pos: 0 };

        let expr = parser.parse_expr(0)?;
        if !parser.check(TokenKind::Eof) {
            let tok = parser.peek();
            return Err(EvalError::syntax(
                tok.line,
                tok.col,
                format!("unexpected '{}' after the end of the program", tok.text),
            ));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self, nesting: usize) -> EvalResult<Expr> {
        if nesting > MAX_NESTING {
            let tok = self.peek();
            return Err(EvalError::syntax(
                tok.line,
                tok.col,
                format!("calls nest deeper than {} levels", MAX_NESTING),
            ));
        }

        match self.peek_kind() {
            TokenKind::OpenBracket => self.parse_literal(),
            TokenKind::Identifier => self.parse_call(nesting),
            TokenKind::Eof => {
                let tok = self.peek();
                Err(EvalError::syntax(
                    tok.line,
                    tok.col,
                    "expected a matrix literal or an operation call, found end of input",
                ))
            }
            _ => {
                let tok = self.peek();
                Err(EvalError::syntax(
                    tok.line,
                    tok.col,
                    format!(
                        "expected a matrix literal or an operation call, found '{}'",
                        tok.text
                    ),
                ))
            }
        }
    }

    fn parse_call(&mut self, nesting: usize) -> EvalResult<Expr> {
        let name_tok = self.advance().clone();
        self.expect(TokenKind::OpenParen)?;

        let Some(expected) = arity_of(&name_tok.text) else {
            return Err(EvalError::UnknownOperation {
                name: name_tok.text,
                line: name_tok.line,
                col: name_tok.col,
            });
        };

        let mut args = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                args.push(self.parse_expr(nesting + 1)?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen)?;

        if args.len() != expected {
            return Err(EvalError::Arity {
                operation: name_tok.text,
                expected,
                found: args.len(),
            });
        }

        let mut args = args.into_iter();
        let (Some(first), second) = (args.next(), args.next()) else {
            return Err(EvalError::syntax(
                name_tok.line,
                name_tok.col,
                "missing argument",
            ));
        };

        let expr = match (name_tok.text.as_str(), second) {
            ("transpose", None) => Expr::unary(UnaryOp::Transpose, first),
            ("inverse", None) => Expr::unary(UnaryOp::Inverse, first),
            ("add", Some(second)) => Expr::binary(BinaryOp::Add, first, second),
            ("multiply", Some(second)) => Expr::binary(BinaryOp::Multiply, first, second),
            (name, _) => {
                return Err(EvalError::UnknownOperation {
                    name: name.to_string(),
                    line: name_tok.line,
                    col: name_tok.col,
                })
            }
        };
        Ok(expr)
    }

    fn parse_literal(&mut self) -> EvalResult<Expr> {
        let open = self.peek().clone();
        let items = self.parse_list(1)?;

        let matrix = if items.iter().all(|item| matches!(item, ListItem::Number(_))) {
            let row = items
                .into_iter()
                .filter_map(|item| match item {
                    ListItem::Number(n) => Some(n),
                    ListItem::List(_) => None,
                })
                .collect();
            MatrixValue::from_row(row)?
        } else {
            let mut rows = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let ListItem::List(cells) = item else {
                    return Err(EvalError::Dimension(format!(
                        "matrix literal at line {}, column {} mixes numbers and rows (element {})",
                        open.line,
                        open.col,
                        index + 1
                    )));
                };
                let row = cells
                    .into_iter()
                    .map(|cell| match cell {
                        ListItem::Number(n) => Ok(n),
                        // parse_list rejects a third level before we get here
                        ListItem::List(_) => Err(EvalError::Dimension(
                            "matrix literal has rank greater than 2".into(),
                        )),
                    })
                    .collect::<EvalResult<Vec<Scalar>>>()?;
                rows.push(row);
            }
            MatrixValue::from_rows(rows)?
        };

        Ok(Expr::Literal(matrix))
    }

    /// `[ item (, item)* ]` where an item is a number or a nested list
    fn parse_list(&mut self, level: usize) -> EvalResult<Vec<ListItem>> {
        let open = self.expect(TokenKind::OpenBracket)?.clone();
        if level > 2 {
            return Err(EvalError::Dimension(format!(
                "matrix literal at line {}, column {} has rank greater than 2",
                open.line, open.col
            )));
        }

        let mut items = Vec::new();
        if !self.check(TokenKind::CloseBracket) {
            loop {
                let item = match self.peek_kind() {
                    TokenKind::OpenBracket => ListItem::List(self.parse_list(level + 1)?),
                    TokenKind::Number => ListItem::Number(self.parse_number()?),
                    _ => {
                        let tok = self.peek();
                        return Err(EvalError::syntax(
                            tok.line,
                            tok.col,
                            format!("expected a number or '[', found '{}'", tok.text),
                        ));
                    }
                };
                items.push(item);

                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseBracket)?;

        if items.is_empty() {
            return Err(EvalError::Dimension(format!(
                "matrix literal at line {}, column {} is empty",
                open.line, open.col
            )));
        }
        Ok(items)
    }

    fn parse_number(&mut self) -> EvalResult<Scalar> {
        let tok = self.advance().clone();
        let text = tok.text.as_str();

        let is_integer = !text.contains(['.', 'e', 'E']);
        if is_integer {
            if let Ok(v) = text.parse::<i64>() {
                return Ok(Scalar::Int(v));
            }
        }

        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Scalar::Float(v)),
            _ => Err(EvalError::syntax(
                tok.line,
                tok.col,
                format!("number '{}' is out of range", text),
            )),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    fn expect(&mut self, kind: TokenKind) -> EvalResult<&Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let tok = self.peek();
        let found = if tok.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", tok.text)
        };
        Err(EvalError::syntax(
            tok.line,
            tok.col,
            format!("expected {}, found {}", kind, found),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EvalErrorKind;

    fn kind_of(input: &str) -> EvalErrorKind {
        parse(input).unwrap_err().kind()
    }

    #[test]
    fn test_parse_literal() {
        let expr = parse("[[1, 2], [3, 4]]").unwrap();
        let Expr::Literal(m) = expr else {
            panic!("expected literal");
        };
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
    }

    #[test]
    fn test_rank_one_literal_is_a_row() {
        let Expr::Literal(m) = parse("[1, 2, 3]").unwrap() else {
            panic!("expected literal");
        };
        assert_eq!((m.rows(), m.cols()), (1, 3));
    }

    #[test]
    fn test_parse_nested_calls() {
        let expr = parse("inverse(add([[1,2],[3,4]], [[5,6],[7,8]]))").unwrap();
        assert_eq!(expr.operation_count(), 2);
        assert!(matches!(
            expr,
            Expr::Unary {
                op: UnaryOp::Inverse,
                ..
            }
        ));
    }

    #[test]
    fn test_whitespace_insignificant() {
        let tight = parse("multiply([[1,0],[2,3]],[[4],[5]])").unwrap();
        let loose = parse("  multiply( [[1, 0],\n [2, 3]] ,  [[4], [5]] ) ").unwrap();
        assert_eq!(tight, loose);
    }

    #[test]
    fn test_integer_and_float_literals() {
        let Expr::Literal(m) = parse("[[1, -2.5, 3e2, 99999999999999999999]]").unwrap() else {
            panic!("expected literal");
        };
        assert_eq!(m.get(0, 0), Some(Scalar::Int(1)));
        assert_eq!(m.get(0, 1), Some(Scalar::Float(-2.5)));
        assert_eq!(m.get(0, 2), Some(Scalar::Float(300.0)));
        assert!(!m.get(0, 3).unwrap().is_int());
    }

    #[test]
    fn test_unknown_operation() {
        let err = parse("determinant([[1]])").unwrap_err();
        assert!(matches!(
            err,
            EvalError::UnknownOperation { ref name, line: 1, col: 1 } if name == "determinant"
        ));
    }

    #[test]
    fn test_operation_names_are_case_sensitive() {
        assert_eq!(kind_of("Transpose([[1]])"), EvalErrorKind::UnknownOperationError);
    }

    #[test]
    fn test_unknown_operation_reported_before_arity() {
        assert_eq!(kind_of("det([[1]], [[2]])"), EvalErrorKind::UnknownOperationError);
    }

    #[test]
    fn test_arity() {
        let err = parse("transpose([[1]], [[2]])").unwrap_err();
        assert_eq!(
            err,
            EvalError::Arity {
                operation: "transpose".into(),
                expected: 1,
                found: 2
            }
        );
        assert_eq!(kind_of("add([[1]])"), EvalErrorKind::ArityError);
        assert_eq!(kind_of("inverse()"), EvalErrorKind::ArityError);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(kind_of(""), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("transpose"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("transpose([[1]]"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("[[1, 2]] [[3]]"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("add([[1]], )"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("A"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("5"), EvalErrorKind::SyntaxError);
        assert_eq!(kind_of("[[1e999]]"), EvalErrorKind::SyntaxError);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("add([[1]],\n    [[2]]]").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { line: 2, col: 10, .. }));
    }

    #[test]
    fn test_dimension_errors() {
        assert_eq!(kind_of("[[1, 2], [3]]"), EvalErrorKind::DimensionError);
        assert_eq!(kind_of("[]"), EvalErrorKind::DimensionError);
        assert_eq!(kind_of("[[]]"), EvalErrorKind::DimensionError);
        assert_eq!(kind_of("[[[1]]]"), EvalErrorKind::DimensionError);
        assert_eq!(kind_of("[[1, 2], 3]"), EvalErrorKind::DimensionError);
        assert_eq!(kind_of("transpose([1, [2]])"), EvalErrorKind::DimensionError);
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_NESTING + 5;
        let program = format!("{}[[1]]{}", "transpose(".repeat(depth), ")".repeat(depth));
        assert_eq!(kind_of(&program), EvalErrorKind::SyntaxError);

        let ok = format!("{}[[1]]{}", "transpose(".repeat(10), ")".repeat(10));
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn test_display_reparses() {
        let program = "transpose(multiply([[1,0],[2,3]], [[4],[5.5]]))";
        let expr = parse(program).unwrap();
        let canonical = expr.to_string();
        assert_eq!(canonical, "transpose(multiply([[1, 0], [2, 3]], [[4], [5.5]]))");
        assert_eq!(parse(&canonical).unwrap(), expr);
    }
}
