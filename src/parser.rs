//! Recursive-descent parser for pipeline expressions.
//!
//! One-token lookahead, no backtracking. Grammar:
//!
//! ```text
//! program   := EOF | stage ( PIPE stage )* EOF
//! stage     := NAME LPAREN arguments? RPAREN
//! arguments := argument ( COMMA argument )*
//! argument  := STRING | INT
//! ```

use crate::ast::{Argument, Program, Stage};
use crate::error::Error;
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};

/// Parse an expression into a [`Program`].
pub fn parse(input: &str) -> Result<Program, Error> {
    Parser::new(input).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            token: Token::new(TokenKind::Eof, String::new(), Position::new(0, 0)),
        }
    }

    /// Consumes the token stream and builds the program.
    ///
    /// An empty expression yields an empty program.
    pub fn parse(mut self) -> Result<Program, Error> {
        self.advance()?;

        let mut stages = Vec::new();
        if self.at(TokenKind::Eof) {
            return Ok(Program { stages });
        }

        loop {
            stages.push(self.parse_stage()?);

            self.advance()?;
            if self.at(TokenKind::Eof) {
                break;
            }
            self.expect(TokenKind::Pipe)?;
            self.advance()?;
        }

        Ok(Program { stages })
    }

    /// `stage := NAME LPAREN arguments? RPAREN`; leaves the cursor on the
    /// closing parenthesis.
    fn parse_stage(&mut self) -> Result<Stage, Error> {
        self.expect(TokenKind::Name)?;
        let name = self.token.literal.clone();
        let position = self.token.position;

        self.advance()?;
        self.expect(TokenKind::LParen)?;

        self.advance()?;
        let args = self.parse_arguments()?;

        self.expect(TokenKind::RParen)?;

        Ok(Stage {
            name,
            args,
            position,
        })
    }

    /// Collects arguments up to (not including) the closing parenthesis.
    fn parse_arguments(&mut self) -> Result<Vec<Argument>, Error> {
        let mut args = Vec::new();

        if self.at(TokenKind::RParen) || self.at(TokenKind::Eof) {
            return Ok(args);
        }

        loop {
            match self.token.kind {
                TokenKind::Str => args.push(Argument::String(self.token.literal.clone())),
                TokenKind::Int => args.push(self.parse_int()?),
                _ => return Err(self.unexpected(&[TokenKind::Str, TokenKind::Int])),
            }

            self.advance()?;
            if self.at(TokenKind::RParen) {
                break;
            }
            if !self.at(TokenKind::Comma) {
                return Err(self.unexpected(&[TokenKind::RParen, TokenKind::Comma]));
            }
            self.advance()?;
        }

        Ok(args)
    }

    fn parse_int(&self) -> Result<Argument, Error> {
        self.token
            .literal
            .parse::<i64>()
            .map(Argument::Int)
            .map_err(|_| Error::Lexical {
                literal: format!("integer '{}' out of range", self.token.literal),
                position: self.token.position,
            })
    }

    /// Pulls the next token; an `Illegal` token fails immediately so a
    /// lexical problem surfaces as itself rather than as a grammar mismatch.
    fn advance(&mut self) -> Result<(), Error> {
        self.token = self.lexer.next_token();
        if self.token.kind == TokenKind::Illegal {
            return Err(Error::Lexical {
                literal: self.token.literal.clone(),
                position: self.token.position,
            });
        }
        Ok(())
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    fn expect(&self, kind: TokenKind) -> Result<(), Error> {
        if !self.at(kind) {
            return Err(self.unexpected(&[kind]));
        }
        Ok(())
    }

    fn unexpected(&self, expected: &[TokenKind]) -> Error {
        Error::Syntax {
            found: self.token.clone(),
            expected: expected.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pipeline_ast() {
        let input = r#"Replace(" ", "\n") | Freq() | First(1)"#;

        let want = Program {
            stages: vec![
                Stage {
                    name: "Replace".to_string(),
                    args: vec![
                        Argument::String(" ".to_string()),
                        Argument::String("\n".to_string()),
                    ],
                    position: Position::new(0, 7),
                },
                Stage {
                    name: "Freq".to_string(),
                    args: vec![],
                    position: Position::new(21, 25),
                },
                Stage {
                    name: "First".to_string(),
                    args: vec![Argument::Int(1)],
                    position: Position::new(30, 35),
                },
            ],
        };

        assert_eq!(parse(input).unwrap(), want);
    }

    #[test]
    fn test_empty_expression_is_empty_program() {
        assert_eq!(parse("").unwrap(), Program::default());
    }

    #[test]
    fn test_stage_position_is_name_span_only() {
        let program = parse("  CountLines()").unwrap();
        assert_eq!(program.stages[0].position, Position::new(2, 12));
    }

    #[test]
    fn test_missing_closing_paren_expects_rparen_at_eof() {
        let input = r#"Match("pl""#;
        let err = parse(input).unwrap_err();
        match err {
            Error::Syntax { found, expected } => {
                assert_eq!(found.kind, TokenKind::Eof);
                assert_eq!(found.position, Position::new(input.len(), input.len() + 1));
                assert!(expected.contains(&TokenKind::RParen));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_pipe_between_stages() {
        let err = parse("First(1) Last(1)").unwrap_err();
        match err {
            Error::Syntax { found, expected } => {
                assert_eq!(found.kind, TokenKind::Name);
                assert_eq!(expected, vec![TokenKind::Pipe]);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_argument_must_be_string_or_int() {
        let err = parse("First(())").unwrap_err();
        match err {
            Error::Syntax { found, expected } => {
                assert_eq!(found.kind, TokenKind::LParen);
                assert_eq!(expected, vec![TokenKind::Str, TokenKind::Int]);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string_is_lexical_error() {
        let err = parse(r#"Match("pl"#).unwrap_err();
        match err {
            Error::Lexical { literal, position } => {
                assert!(literal.starts_with("unterminated string"));
                assert_eq!(position.start, 6);
            }
            other => panic!("expected lexical error, got {other:?}"),
        }
    }

    #[test]
    fn test_illegal_character_is_lexical_error() {
        let err = parse("First(@)").unwrap_err();
        match err {
            Error::Lexical { literal, .. } => assert_eq!(literal, "@"),
            other => panic!("expected lexical error, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_overflow() {
        let err = parse("First(99999999999999999999)").unwrap_err();
        match err {
            Error::Lexical { literal, .. } => assert!(literal.contains("out of range")),
            other => panic!("expected lexical error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_argument() {
        let program = parse("First(-1)").unwrap();
        assert_eq!(program.stages[0].args, vec![Argument::Int(-1)]);
    }

    #[test]
    fn test_trailing_comma_rejected() {
        let err = parse(r#"Replace("a",)"#).unwrap_err();
        match err {
            Error::Syntax { found, expected } => {
                assert_eq!(found.kind, TokenKind::RParen);
                assert_eq!(expected, vec![TokenKind::Str, TokenKind::Int]);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
