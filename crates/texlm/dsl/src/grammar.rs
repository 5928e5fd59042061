//! Published grammar of the matrix expression language
//!
//! The parser in this crate is hand-written; [`GRAMMAR`] is the same
//! language in Lark EBNF, for constraining a generator and for humans.

/// Lark EBNF for a program
pub const GRAMMAR: &str = r#"start: call | matrix

call: unary_op LPAR start RPAR
    | binary_op LPAR start COMMA SP start RPAR

unary_op: "transpose" | "inverse"
binary_op: "add" | "multiply"

matrix: LBRACK rows RBRACK
rows: row (COMMA SP row)*
row: LBRACK elements RBRACK
elements: NUMBER (COMMA SP NUMBER)*

NUMBER: /[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?/

LPAR: "("
RPAR: ")"
LBRACK: "["
RBRACK: "]"
COMMA: ","
SP: " "
"#;

/// Name and argument count of every operation a program may call
pub const OPERATIONS: [(&str, usize); 4] = [
    ("transpose", 1),
    ("inverse", 1),
    ("add", 2),
    ("multiply", 2),
];

/// Argument count of a named operation, if it exists
pub fn arity_of(name: &str) -> Option<usize> {
    OPERATIONS
        .iter()
        .find(|(op, _)| *op == name)
        .map(|(_, arity)| *arity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_lookup() {
        assert_eq!(arity_of("transpose"), Some(1));
        assert_eq!(arity_of("multiply"), Some(2));
        assert_eq!(arity_of("Transpose"), None);
        assert_eq!(arity_of("det"), None);
    }

    #[test]
    fn test_grammar_names_every_operation() {
        for (name, _) in OPERATIONS {
            assert!(GRAMMAR.contains(&format!("\"{}\"", name)));
        }
    }
}
