//! IMAP lexer for tokenizing server responses.
//!
//! Breaks one logical response line (as produced by the line framer,
//! without its final CRLF) into tokens. Literals embedded in the line are
//! returned whole.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b' ' => {
                self.advance();
                Ok(Token::Space)
            }
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'[' => {
                self.advance();
                Ok(Token::LBracket)
            }
            b']' => {
                self.advance();
                Ok(Token::RBracket)
            }
            b'*' => {
                self.advance();
                Ok(Token::Asterisk)
            }
            b'+' => {
                self.advance();
                Ok(Token::Plus)
            }
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal(),
            // literal8 (RFC 3516)
            b'~' if self.peek_at(1) == Some(b'{') => {
                self.advance();
                self.read_literal()
            }
            b'\\' => self.read_atom(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    /// Reads a quoted string token.
    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance(); // Skip opening quote

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c) => result.push(c),
                    None => return Err(self.error("Unterminated quoted string")),
                },
                Some(c) => result.push(c),
                None => return Err(self.error("Unterminated quoted string")),
            }
        }

        Ok(Token::QuotedString(
            String::from_utf8_lossy(&result).into_owned(),
        ))
    }

    /// Reads a literal `{n}` followed by CRLF and `n` bytes.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance(); // Skip {

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let size: usize = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("Invalid literal size"))?;

        // LITERAL+ marker
        if self.peek() == Some(b'+') {
            self.advance();
        }

        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }

        let Some(end) = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
        else {
            return Err(self.error("Incomplete literal data"));
        };

        let data = self.input[self.pos..end].to_vec();
        self.skip(size);

        Ok(Token::Literal(data))
    }

    /// Reads an atom, NIL, or number.
    ///
    /// An atom immediately followed by `[` takes the bracketed section (which
    /// may contain spaces and parentheses) and an optional `<partial>` as
    /// part of itself, so `BODY[HEADER.FIELDS (SUBJECT)]<0>` is one token.
    fn read_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;

        // Flags such as \Seen, and the \* wildcard flag
        if self.peek() == Some(b'\\') {
            self.advance();
            if self.peek() == Some(b'*') {
                self.advance();
            }
        }

        while self.peek().is_some_and(is_atom_char) {
            self.advance();
        }

        let mut attached = false;
        if self.peek() == Some(b'[') && self.pos > start {
            attached = true;
            self.read_delimited(b'[', b']')?;
            if self.peek() == Some(b'<') {
                self.read_delimited(b'<', b'>')?;
            }
        }

        let s = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))?;

        if !attached && !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse() {
                return Ok(Token::Number(n));
            }
        }

        if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    /// Consumes `open ... close`, allowing nesting.
    fn read_delimited(&mut self, open: u8, close: u8) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Some(b) if b == open => depth += 1,
                Some(b) if b == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => {
                    return Err(self.error(&format!(
                        "Unterminated section, expected {}",
                        char::from(close)
                    )));
                }
            }
        }
    }

    /// Creates a parse error at the current position.
    #[must_use]
    pub fn error(&self, message: &str) -> Error {
        Error::Parse {
            line: String::from_utf8_lossy(self.input).into_owned(),
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Expects and consumes a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Expects and consumes a space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }

    /// Reads a command tag: every byte up to the next space.
    pub fn read_tag(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(is_tag_char) {
            self.advance();
        }
        if self.pos == start {
            return Err(self.error("Missing tag"));
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in tag"))
    }

    /// Reads the rest of the line as text.
    pub fn read_text(&mut self) -> String {
        let text = String::from_utf8_lossy(self.remaining()).into_owned();
        self.pos = self.input.len();
        text
    }

    /// Skips optional spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }
}

/// Returns true if the byte is a valid atom character.
///
/// Excludes `[` so that an attached section can be recognised; `\` is
/// only accepted by the lexer at the start of a flag.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    !is_atom_special(b) && b != b'['
}

/// Returns true if the byte is an atom special character.
#[must_use]
pub const fn is_atom_special(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'{' | b' ' | b'%' | b'*' | b'"' | b'\\' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Tags are astring characters other than `+`.
const fn is_tag_char(b: u8) -> bool {
    (is_atom_char(b) || b == b']' || b == b'[') && b != b'+'
}
