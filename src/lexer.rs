//! Lexer for pipeline expressions.
//!
//! Produces a lazy, finite sequence of tokens with byte-offset spans.
//! Only ASCII space is skipped between tokens; tabs and newlines are
//! meaningful inside quoted arguments and lex as `Illegal` elsewhere.

use crate::token::{Position, Token, TokenKind};

/// Byte-cursor lexer over a single expression.
///
/// Call [`Lexer::next_token`] repeatedly until it returns an `Eof` token.
/// The cursor is not restartable.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Scans and returns the next token, advancing the cursor.
    ///
    /// Every token's position spans exactly the consumed bytes. The `Eof`
    /// token's span is one byte wide past the end of the text so diagnostics
    /// have something to underline.
    pub fn next_token(&mut self) -> Token {
        let ch = self.significant_byte();
        let start = self.position;

        if is_name_byte(ch) {
            let literal = self.scan_while(is_name_byte);
            return Token::new(TokenKind::Name, literal, Position::new(start, self.position));
        }

        if ch.is_ascii_digit() || (ch == b'-' && self.byte_at(1).is_ascii_digit()) {
            let literal = self.scan_int();
            return Token::new(TokenKind::Int, literal, Position::new(start, self.position));
        }

        if ch == b'"' {
            return self.scan_quoted();
        }

        let kind = match ch {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b'|' => TokenKind::Pipe,
            0 => TokenKind::Eof,
            _ => TokenKind::Illegal,
        };

        let literal = if ch.is_ascii_graphic() {
            char::from(ch).to_string()
        } else {
            String::new()
        };

        self.position += 1;

        Token::new(kind, literal, Position::new(start, self.position))
    }

    /// Skips ASCII spaces and returns the byte at the cursor, NUL at end.
    fn significant_byte(&mut self) -> u8 {
        let mut ch = self.byte_at(0);
        while ch == b' ' {
            self.position += 1;
            ch = self.byte_at(0);
        }
        ch
    }

    fn byte_at(&self, offset: usize) -> u8 {
        self.input
            .as_bytes()
            .get(self.position + offset)
            .copied()
            .unwrap_or(0)
    }

    /// Consumes a run of bytes accepted by `accept`; the first byte is
    /// already known to match.
    fn scan_while(&mut self, accept: fn(u8) -> bool) -> String {
        let start = self.position;
        self.position += 1;
        while accept(self.byte_at(0)) {
            self.position += 1;
        }
        self.input[start..self.position].to_string()
    }

    /// Consumes an integer literal; the first byte is a digit or a `-` known
    /// to be followed by a digit.
    fn scan_int(&mut self) -> String {
        let start = self.position;
        self.position += 1;
        while self.byte_at(0).is_ascii_digit() {
            self.position += 1;
        }
        self.input[start..self.position].to_string()
    }

    /// Scans a `"`-delimited literal starting at the cursor.
    ///
    /// `\\` and `\"` are literal-continuation escapes; scanning stops only at
    /// an unescaped closing quote or end of text. An unterminated literal or
    /// an unsupported escape sequence yields an `Illegal` token whose literal
    /// embeds the raw text and an explanatory message.
    fn scan_quoted(&mut self) -> Token {
        let start = self.position;

        loop {
            self.position += 1;
            let ch = self.byte_at(0);
            if ch == b'"' {
                self.position += 1;
                break;
            }
            if ch == 0 {
                let raw = &self.input[start..self.position];
                return Token::new(
                    TokenKind::Illegal,
                    format!("unterminated string '{raw}'"),
                    Position::new(start, self.position),
                );
            }
            let next = self.byte_at(1);
            if ch == b'\\' && (next == b'\\' || next == b'"') {
                self.position += 1;
            }
        }

        let position = Position::new(start, self.position);
        let raw = &self.input[start..self.position];

        match unescape(raw) {
            Ok(literal) => Token::new(TokenKind::Str, literal, position),
            Err(message) => Token::new(TokenKind::Illegal, format!("{message} '{raw}'"), position),
        }
    }
}

fn is_name_byte(ch: u8) -> bool {
    ch == b'!' || ch.is_ascii_alphabetic()
}

/// Unescapes a raw quoted literal (surrounding quotes included).
///
/// Recognized escapes: `\\`, `\"`, `\n`, `\t`, `\r`.
fn unescape(raw: &str) -> Result<String, String> {
    let inner = &raw[1..raw.len() - 1];
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            unescaped.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('"') => unescaped.push('"'),
            Some('n') => unescaped.push('\n'),
            Some('t') => unescaped.push('\t'),
            Some('r') => unescaped.push('\r'),
            Some(other) => return Err(format!("unsupported escape '\\{other}'")),
            None => return Err("dangling escape".to_string()),
        }
    }

    Ok(unescaped)
}
