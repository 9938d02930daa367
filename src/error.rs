//! Error taxonomy for expression evaluation and pipeline execution.

use std::io;

use thiserror::Error;

use crate::token::{Position, Token, TokenKind};

/// Stage-local failure raised by a running stream transform.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Malformed stage input discovered at run time, e.g. a column list that
    /// is not a comma-separated list of integers.
    #[error("{0}")]
    Invalid(String),
}

/// Everything that can go wrong between expression text and final output.
///
/// The first four variants are detected during the build phase (parsing and
/// validation) and abort the run before any stage starts; `Runtime` surfaces
/// only after execution has begun.
#[derive(Debug, Error)]
pub enum Error {
    /// The lexer produced an `Illegal` token: an unterminated quoted string
    /// or an unrecognized character.
    #[error("invalid input: {literal}")]
    Lexical { literal: String, position: Position },

    /// A token did not match the grammar's expected set.
    #[error("unexpected {found}, expected {}", expected_list(.expected))]
    Syntax {
        found: Token,
        expected: Vec<TokenKind>,
    },

    /// The attempted name is absent from the registry.
    #[error("unknown filter '{name}()'")]
    UnknownFilter {
        name: String,
        /// Best registered name by edit distance, when one is strictly
        /// closer than no match at all.
        suggestion: Option<String>,
        position: Position,
    },

    /// Arity mismatch, type mismatch, or pattern-compile failure.
    #[error("{message}")]
    Argument {
        message: String,
        /// Registry key (case-folded) of the failing filter.
        name: String,
        position: Position,
    },

    /// A running transform's own failure.
    #[error("error filtering pipeline: {0}")]
    Runtime(#[from] FilterError),
}

impl Error {
    /// Span into the original expression, for diagnostic rendering.
    /// `Runtime` errors carry no position: the expression itself was valid.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lexical { position, .. }
            | Error::UnknownFilter { position, .. }
            | Error::Argument { position, .. } => Some(*position),
            Error::Syntax { found, .. } => Some(found.position),
            Error::Runtime(_) => None,
        }
    }
}

fn expected_list(kinds: &[TokenKind]) -> String {
    match kinds {
        [only] => format!("'{only}'"),
        many => {
            let labels: Vec<String> = many.iter().map(|kind| format!("'{kind}'")).collect();
            format!("one of {}", labels.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_message_single_expected() {
        let err = Error::Syntax {
            found: Token::new(TokenKind::Eof, String::new(), Position::new(10, 11)),
            expected: vec![TokenKind::RParen],
        };
        assert_eq!(err.to_string(), "unexpected 'EOF', expected ')'");
        assert_eq!(err.position(), Some(Position::new(10, 11)));
    }

    #[test]
    fn test_syntax_error_message_multiple_expected() {
        let err = Error::Syntax {
            found: Token::new(TokenKind::Pipe, "|".to_string(), Position::new(4, 5)),
            expected: vec![TokenKind::RParen, TokenKind::Comma],
        };
        assert_eq!(err.to_string(), "unexpected '|', expected one of ')', ','");
    }

    #[test]
    fn test_unknown_filter_message_keeps_call_site_case() {
        let err = Error::UnknownFilter {
            name: "Foo".to_string(),
            suggestion: None,
            position: Position::new(0, 3),
        };
        assert_eq!(err.to_string(), "unknown filter 'Foo()'");
    }
}
