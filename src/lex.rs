//! # Notes
//! `+` and `-` are folded into a numeric literal when the next byte starts
//!  one (`-1.2345` is a single Number token); otherwise they are operator
//!  tokens. This mirrors maximal-munch lexing, so `3-2` tokenizes as
//!  `Number(3) Number(-2)` and fails in the parser — write `3 - 2`.
//!
//! Temporal literals are recognized before plain numbers: a token starting
//!  with a digit that matches the full-date shape `YYYY-MM-DD` becomes a
//!  Temporal token, optionally extended by `THH:MM:SS` and a timezone
//!  offset. A `T` directly after a full date commits to a timestamp, so a
//!  truncated time (`2000-01-01T01`) is a lexical error rather than a date
//!  plus trailing garbage.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::bytes::Regex;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenType {
    ParenLeft,
    ParenRight,
    Comma,
    Plus,
    Minus,
    Asterisk,
    ForwardSlash,
    Percent,
    Caret,
    Concat, // ||
    Equals,
    NotEquals, // <>
    LT,
    GT,
    LTE,
    GTE,
    Number,
    String,
    Temporal,
    Bool,
    Identifier,
    And,
    Or,
    Not,
    Like,
    Ilike,
    Between,
    Is,
    In,
    Null,
    Spatial,
    Dwithin,
    Point,
    Linestring,
    Polygon,
    MultiPoint,
    MultiLinestring,
    MultiPolygon,
    GeometryCollection,
    Envelope,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub ty: TokenType,

    // Byte indexes into the source
    start: usize,
    end: usize,
}

impl Token {
    pub fn start(&self) -> usize {
        self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnterminatedStringLiteral(usize),
    UnexpectedCharacter(usize),
    InvalidLiteral(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedStringLiteral(start) => {
                write!(f, "Unterminated string literal starting at {start}")
            }
            Self::UnexpectedCharacter(start) => {
                write!(f, "Unexpected character at {start}")
            }
            Self::InvalidLiteral(start) => {
                write!(f, "Malformed literal at {start}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Shape of a temporal literal: full date, optional full time, optional
/// timezone offset. Built on first use, read-only afterwards.
static TEMPORAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:T\d{2}:\d{2}:\d{2}(?:Z|[+-]\d{2}:\d{2})?)?")
        .expect("temporal literal pattern compiles")
});

/// This type simply holds a reference to the source and an index, so it's
///  cheap to copy, making lookahead/rewind operations in the parser very easy.
#[derive(Clone)]
pub struct Lexer<'input> {
    source: &'input str,
    current: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(source: &'input str) -> Self {
        Self { source, current: 0 }
    }

    #[inline]
    fn bytes(&self) -> &'input [u8] {
        self.source.as_bytes()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current >= self.source.len()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.current).copied()
    }

    #[inline]
    fn peek_at(&self, at: usize) -> Option<u8> {
        self.bytes().get(self.current + at).copied()
    }

    #[inline]
    fn pop(&mut self) -> Option<u8> {
        let res = self.peek();
        if res.is_some() {
            self.current += 1;
        }
        res
    }

    /// If current starts with [prefix], consume it and return true.
    fn consume1(&mut self, prefix: u8) -> bool {
        if let Some(c) = self.peek()
            && c == prefix
        {
            self.current += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while let Some(c) = self.peek()
            && predicate(c)
        {
            self.current += 1;
        }
    }

    #[inline]
    fn consume_whitespace(&mut self) {
        self.consume_while(|b| b.is_ascii_whitespace());
    }

    /// Consumes `digits [. digits] [e|E [+|-] digits]`. The exponent is only
    /// taken when complete, so `1e` stays a number followed by an identifier.
    fn consume_number(&mut self) {
        self.consume_while(|b| b.is_ascii_digit());

        if self.peek() == Some(b'.') {
            self.current += 1;
            self.consume_while(|b| b.is_ascii_digit());
        }

        if let Some(e) = self.peek()
            && (e == b'e' || e == b'E')
        {
            let digits_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) {
                2
            } else {
                1
            };
            if matches!(self.peek_at(digits_at), Some(c) if c.is_ascii_digit()) {
                self.current += digits_at;
                self.consume_while(|b| b.is_ascii_digit());
            }
        }
    }

    /// Returns the slice of the source that this token was lexed from.
    /// Token boundaries always fall on ASCII, so slicing the str is safe.
    #[inline]
    pub fn source_of(&self, token: &Token) -> &'input str {
        &self.source[token.start..token.end]
    }

    /// Lookahead without consuming; the lexer is just a cursor, so peeking
    ///  is a clone away.
    pub fn peek_token(&self) -> Result<Option<Token>, Error> {
        self.clone().next_token()
    }

    /// If the next token has type [ty], consume it and return true.
    pub fn consume(&mut self, ty: TokenType) -> Result<bool, Error> {
        if let Some(tok) = self.peek_token()?
            && tok.ty == ty
        {
            _ = self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Tokenizes the whole input at once. The parser streams tokens off the
    ///  cursor instead, but this is handy for tools and tests.
    pub fn tokenize(source: &'input str) -> Result<Vec<Token>, Error> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        while let Some(tok) = lexer.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, Error> {
        self.consume_whitespace();

        if self.is_empty() {
            return Ok(None);
        }
        let start = self.current;

        // Convenience macro for returning a token from `start` to `self.current`
        macro_rules! tok {
            ($name:ident) => {{
                Token {
                    ty: TokenType::$name,
                    start,
                    end: self.current,
                }
            }};
        }

        let Some(c) = self.pop() else {
            return Ok(None);
        };

        Ok(Some(match c {
            b'(' => tok!(ParenLeft),
            b')' => tok!(ParenRight),
            b',' => tok!(Comma),
            b'*' => tok!(Asterisk),
            b'/' => tok!(ForwardSlash),
            b'%' => tok!(Percent),
            b'^' => tok!(Caret),
            b'=' => tok!(Equals),
            b'|' => {
                if self.consume1(b'|') {
                    tok!(Concat)
                } else {
                    return Err(Error::UnexpectedCharacter(start));
                }
            }
            b'<' => {
                if self.consume1(b'>') {
                    tok!(NotEquals)
                } else if self.consume1(b'=') {
                    tok!(LTE)
                } else {
                    tok!(LT)
                }
            }
            b'>' => {
                if self.consume1(b'=') {
                    tok!(GTE)
                } else {
                    tok!(GT)
                }
            }

            // A sign immediately followed by a digit (or decimal point) is
            //  part of the numeric literal, never a binary operator
            b'+' | b'-' => {
                let starts_number = matches!(self.peek(), Some(c) if c.is_ascii_digit())
                    || (self.peek() == Some(b'.')
                        && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()));
                if starts_number {
                    self.consume_number();
                    tok!(Number)
                } else if c == b'+' {
                    tok!(Plus)
                } else {
                    tok!(Minus)
                }
            }

            b'.' if matches!(self.peek(), Some(c) if c.is_ascii_digit()) => {
                // rewind so consume_number sees the dot itself
                self.current = start;
                self.consume_number();
                tok!(Number)
            }

            // Single-quoted string, '' escapes an embedded quote
            b'\'' => loop {
                match self.pop() {
                    None => return Err(Error::UnterminatedStringLiteral(start)),
                    Some(b'\'') => {
                        if self.peek() == Some(b'\'') {
                            self.current += 1;
                        } else {
                            break tok!(String);
                        }
                    }
                    Some(_) => {}
                }
            },

            // Digits start a temporal literal or a number
            b'0'..=b'9' => {
                self.current = start;
                self.lex_number_or_temporal(start)?
            }

            // Identifiers and keywords start with a-Z or underscore
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.consume_while(|b| matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_'));
                Token {
                    ty: classify_word(&self.bytes()[start..self.current]),
                    start,
                    end: self.current,
                }
            }

            _ => return Err(Error::UnexpectedCharacter(start)),
        }))
    }

    fn lex_number_or_temporal(&mut self, start: usize) -> Result<Token, Error> {
        let rest = &self.bytes()[start..];

        if let Some(m) = TEMPORAL.find(rest) {
            // Date followed directly by 'T' means a timestamp was intended;
            //  a time that failed to match is an error, not a shorter token
            if m.end() == 10 && rest.get(10) == Some(&b'T') {
                return Err(Error::InvalidLiteral(start));
            }

            let lexeme = &self.source[start..start + m.end()];
            validate_temporal(lexeme).map_err(|()| Error::InvalidLiteral(start))?;

            self.current = start + m.end();
            return Ok(Token {
                ty: TokenType::Temporal,
                start,
                end: self.current,
            });
        }

        self.consume_number();
        Ok(Token {
            ty: TokenType::Number,
            start,
            end: self.current,
        })
    }
}

/// The shape is already established by the lexer; this rejects literals
/// that are not real calendar dates/times, like `2000-13-41`.
fn validate_temporal(lexeme: &str) -> Result<(), ()> {
    NaiveDate::parse_from_str(&lexeme[..10], "%Y-%m-%d").map_err(|_| ())?;
    if lexeme.len() > 10 {
        NaiveTime::parse_from_str(&lexeme[11..19], "%H:%M:%S").map_err(|_| ())?;
    }
    Ok(())
}

fn classify_word(word: &[u8]) -> TokenType {
    match word.to_ascii_uppercase().as_slice() {
        b"AND" => TokenType::And,
        b"OR" => TokenType::Or,
        b"NOT" => TokenType::Not,
        b"LIKE" => TokenType::Like,
        b"ILIKE" => TokenType::Ilike,
        b"BETWEEN" => TokenType::Between,
        b"IS" => TokenType::Is,
        b"IN" => TokenType::In,
        b"NULL" => TokenType::Null,

        // Boolean literals allow exactly the all-upper and all-lower
        //  spellings; `True` is an identifier
        b"TRUE" | b"FALSE" => {
            if matches!(word, b"TRUE" | b"true" | b"FALSE" | b"false") {
                TokenType::Bool
            } else {
                TokenType::Identifier
            }
        }

        b"CROSSES" | b"CONTAINS" | b"DISJOINT" | b"EQUALS" | b"INTERSECTS" | b"OVERLAPS"
        | b"TOUCHES" | b"WITHIN" => TokenType::Spatial,
        b"DWITHIN" => TokenType::Dwithin,

        b"POINT" => TokenType::Point,
        b"LINESTRING" => TokenType::Linestring,
        b"POLYGON" => TokenType::Polygon,
        b"MULTIPOINT" => TokenType::MultiPoint,
        b"MULTILINESTRING" => TokenType::MultiLinestring,
        b"MULTIPOLYGON" => TokenType::MultiPolygon,
        b"GEOMETRYCOLLECTION" => TokenType::GeometryCollection,
        b"ENVELOPE" => TokenType::Envelope,

        _ => TokenType::Identifier,
    }
}
