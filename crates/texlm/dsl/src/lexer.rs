//! Lexer: tokenizes program text
//!
//! Produces brackets, parentheses, commas, identifiers and signed
//! decimal numbers. Whitespace between tokens is skipped.

use crate::errors::{EvalError, EvalResult};

/// A token produced by the lexer
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw text of the token
    pub text: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }
}

/// Token types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "operation name"),
            Self::Number => write!(f, "number"),
            Self::OpenBracket => write!(f, "'['"),
            Self::CloseBracket => write!(f, "']'"),
            Self::OpenParen => write!(f, "'('"),
            Self::CloseParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> EvalResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.pos >= self.input.len() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line, self.col));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> EvalResult<Token> {
        let ch = self.input[self.pos];
        let line = self.line;
        let col = self.col;

        let single = |kind, text: &str| Token::new(kind, text, line, col);
        match ch {
            '[' => {
                self.advance();
                Ok(single(TokenKind::OpenBracket, "["))
            }
            ']' => {
                self.advance();
                Ok(single(TokenKind::CloseBracket, "]"))
            }
            '(' => {
                self.advance();
                Ok(single(TokenKind::OpenParen, "("))
            }
            ')' => {
                self.advance();
                Ok(single(TokenKind::CloseParen, ")"))
            }
            ',' => {
                self.advance();
                Ok(single(TokenKind::Comma, ","))
            }
            c if c.is_ascii_digit() || c == '.' || c == '+' || c == '-' => self.read_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_identifier()),
            _ => Err(EvalError::syntax(
                line,
                col,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    /// `[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?`
    fn read_number(&mut self) -> EvalResult<Token> {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();

        if let Some(sign @ ('+' | '-')) = self.peek_at(0) {
            text.push(sign);
            self.advance();
        }

        let int_digits = self.read_digits(&mut text);
        let mut frac_digits = 0;
        if self.peek_at(0) == Some('.') {
            text.push('.');
            self.advance();
            frac_digits = self.read_digits(&mut text);
        }

        if int_digits == 0 && frac_digits == 0 {
            return Err(EvalError::syntax(
                line,
                col,
                format!("malformed number '{}'", text),
            ));
        }

        // The exponent is only taken when digits follow it.
        if let Some('e' | 'E') = self.peek_at(0) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.peek_at(0) {
                        text.push(c);
                    }
                    self.advance();
                }
                self.read_digits(&mut text);
            }
        }

        Ok(Token::new(TokenKind::Number, text, line, col))
    }

    fn read_digits(&mut self, text: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek_at(0).filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.advance();
            count += 1;
        }
        count
    }

    fn read_identifier(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();

        while let Some(c) = self
            .peek_at(0)
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            text.push(c);
            self.advance();
        }

        Token::new(TokenKind::Identifier, text, line, col)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_at(0).is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }
}
