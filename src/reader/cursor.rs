use crate::error::{ParseError, Result};
use std::borrow::Cow;

/// Left-to-right view of the unparsed input with position tracking
///
/// Tokens are borrowed from the input, never copied.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    rest: &'a str,
    /// 0-based line of the next unread byte
    line: usize,
    /// 0-based byte column of the next unread byte
    col: usize,
    separator: u8,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str, separator: u8) -> Self {
        Self {
            rest: input,
            line: 0,
            col: 0,
            separator,
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn peek(&self) -> Option<u8> {
        self.rest.as_bytes().first().copied()
    }

    /// Whether the rest of the input is nothing but empty lines
    pub fn only_newlines_left(&self) -> bool {
        self.rest.bytes().all(|b| b == b'\n')
    }

    /// 1-based `(line, column)` of the next unread byte
    pub fn position(&self) -> (usize, usize) {
        (self.line + 1, self.col + 1)
    }

    pub fn error(&self, message: impl Into<Cow<'static, str>>) -> ParseError {
        self.error_at(self.position(), message)
    }

    pub fn error_at(
        &self,
        (line, col): (usize, usize),
        message: impl Into<Cow<'static, str>>,
    ) -> ParseError {
        ParseError {
            line,
            col,
            message: message.into(),
        }
    }

    fn advance(&mut self, len: usize) {
        self.rest = &self.rest[len..];
        self.col += len;
    }

    fn advance_line(&mut self) {
        self.rest = &self.rest[1..];
        self.line += 1;
        self.col = 0;
    }

    /// Consume `literal` if the input starts with it
    pub fn consume_literal(&mut self, literal: &str) -> bool {
        if self.rest.starts_with(literal) {
            self.advance(literal.len());
            true
        } else {
            false
        }
    }

    /// Consume one byte of the form `<byte><separator>`, returning the byte
    pub fn parse_flag(&mut self, allowed: &[u8], expected: &'static str) -> Result<u8> {
        match self.peek() {
            Some(b) if allowed.contains(&b) => {
                self.advance(1);
                self.expect_field_separator()?;
                Ok(b)
            }
            _ => Err(self.error(expected)),
        }
    }

    pub fn expect_field_separator(&mut self) -> Result<()> {
        if self.peek() != Some(self.separator) {
            return Err(self.error("expected field separator"));
        }
        self.advance(1);
        Ok(())
    }

    /// Consume a newline; the end of input also terminates the last line
    pub fn check_and_consume_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.advance_line();
                true
            }
            None => true,
            Some(_) => false,
        }
    }

    pub fn expect_newline(&mut self) -> Result<()> {
        if self.check_and_consume_newline() {
            Ok(())
        } else {
            Err(self.error("expected end of line"))
        }
    }

    /// Read a non-empty string up to `end`, consuming `end`
    ///
    /// With `end_nl` set a newline (or the end of input) also terminates the
    /// string and is left unconsumed for the caller.
    pub fn parse_string(&mut self, end: u8, end_nl: bool) -> Result<&'a str> {
        let rest = self.rest;
        let bytes = rest.as_bytes();
        let stop = bytes.iter().position(|&b| b == end || b == b'\n');

        let len = match stop {
            Some(len) if bytes[len] == end => len,
            Some(len) if end_nl => len,
            Some(len) => {
                let (line, col) = self.position();
                return Err(self.error_at((line, col + len), "unexpected end of line"));
            }
            None if end_nl => bytes.len(),
            None => {
                let (line, col) = self.position();
                return Err(self.error_at((line, col + bytes.len()), "unexpected end of file"));
            }
        };
        if len == 0 {
            return Err(self.error("malformed field"));
        }

        let token = &rest[..len];
        if end == b'\n' && bytes.get(len) == Some(&b'\n') {
            self.advance(len);
            self.advance_line();
        } else if bytes.get(len) == Some(&end) {
            self.advance(len + 1);
        } else {
            self.advance(len);
        }
        Ok(token)
    }

    /// Read a non-negative decimal number
    pub fn parse_number_field(&mut self, end: u8, end_nl: bool) -> Result<i64> {
        let start = self.position();
        let token = self.parse_string(end, end_nl)?;
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error_at(start, format!("expected decimal number, found {:?}", token)));
        }
        token
            .parse::<i64>()
            .map_err(|e| self.error_at(start, format!("invalid decimal number {:?}: {}", token, e)))
    }

    /// Read a hexadecimal number written without a `0x` prefix
    pub fn parse_hex_field(&mut self, end: u8, end_nl: bool) -> Result<u64> {
        let start = self.position();
        let token = self.parse_string(end, end_nl)?;
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error_at(
                start,
                format!("expected hexadecimal number, found {:?}", token),
            ));
        }
        u64::from_str_radix(token, 16).map_err(|e| {
            self.error_at(start, format!("invalid hexadecimal number {:?}: {}", token, e))
        })
    }
}
