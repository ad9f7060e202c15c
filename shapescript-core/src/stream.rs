//! Input-data token stream.
//!
//! The `Read` command pulls numeric values from the raw input data, which
//! is tokenized lazily into whitespace/quote-delimited tokens with
//! single-token lookahead. The cursor only ever moves forward.
//!
//! # Token production rules
//!
//! | Input          | Token produced            |
//! |----------------|---------------------------|
//! | `12 abc`       | `12`, `abc`               |
//! | `"two words"`  | `"two words"` (one token) |
//! | `'x'`          | `"x"` (requoted)          |
//!
//! Quoted tokens are re-wrapped in double quotes regardless of the quote
//! character used, so downstream classification sees one uniform form.

use crate::error::{ErrorKind, RunResult, ScriptError};

// ---------------------------------------------------------------------------
// Token stream
// ---------------------------------------------------------------------------

/// A forward-only cursor over the input data with one token of lookahead.
pub struct TokenStream {
    /// Source bytes (owned).
    src: Vec<u8>,
    /// Current byte position.
    pos: usize,
    /// Cached next token, filled by `peek`.
    lookahead: Option<String>,
}

impl TokenStream {
    /// Create a stream over the given input data.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            src: source.as_bytes().to_vec(),
            pos: 0,
            lookahead: None,
        }
    }

    /// The next token without consuming it, cached until `consume`.
    pub fn peek(&mut self) -> Option<&str> {
        if self.lookahead.is_none() {
            self.lookahead = self.scan_token();
        }
        self.lookahead.as_deref()
    }

    /// Consume and return the next token.
    pub fn consume(&mut self) -> RunResult<String> {
        if let Some(tok) = self.lookahead.take() {
            return Ok(tok);
        }
        self.scan_token().ok_or_else(|| {
            ScriptError::new(ErrorKind::UnexpectedEndOfInput, "Unexpected end of input data")
        })
    }

    /// Consume the next token and parse it as a number.
    pub fn consume_number(&mut self) -> RunResult<f64> {
        let tok = self.consume()?;
        tok.parse::<f64>().map_err(|_| {
            ScriptError::new(
                ErrorKind::ExpectedNumber,
                format!("Expected a number in input data, got `{tok}`"),
            )
        })
    }

    // -- internal helpers --

    fn scan_token(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.pos >= self.src.len() {
            return None;
        }
        let c = self.src[self.pos];
        if c == b'"' || c == b'\'' {
            Some(self.scan_quoted(c))
        } else {
            Some(self.scan_bare())
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Quoted token; the content is re-wrapped in double quotes.
    fn scan_quoted(&mut self, quote: u8) -> String {
        self.pos += 1; // opening quote
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos] != quote {
            self.pos += 1;
        }
        let content = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        if self.pos < self.src.len() {
            self.pos += 1; // closing quote
        }
        format!("\"{content}\"")
    }

    /// Maximal run of non-whitespace, non-quote characters.
    fn scan_bare(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            if c.is_ascii_whitespace() || c == b'"' || c == b'\'' {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn drain(input: &str) -> Vec<String> {
        let mut stream = TokenStream::new(input);
        let mut out = Vec::new();
        while stream.peek().is_some() {
            out.push(stream.consume().expect("peeked token"));
        }
        out
    }

    // -- basic tokenization --

    #[test]
    fn empty_input() {
        let mut stream = TokenStream::new("");
        assert_eq!(stream.peek(), None);
        assert!(stream.consume().is_err());
    }

    #[test]
    fn whitespace_only() {
        assert!(drain("  \t \n  ").is_empty());
    }

    #[test]
    fn bare_tokens() {
        assert_eq!(drain("12 abc -3.5"), vec!["12", "abc", "-3.5"]);
    }

    #[test]
    fn newlines_separate_tokens() {
        assert_eq!(drain("1\n2\r\n3"), vec!["1", "2", "3"]);
    }

    // -- quoted tokens --

    #[test]
    fn double_quoted_token() {
        assert_eq!(drain("\"two words\" x"), vec!["\"two words\"", "x"]);
    }

    #[test]
    fn single_quotes_are_requoted() {
        assert_eq!(drain("'hello'"), vec!["\"hello\""]);
    }

    #[test]
    fn quote_adjacent_to_bare_token() {
        assert_eq!(drain("abc\"x\""), vec!["abc", "\"x\""]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(drain("\"open"), vec!["\"open\""]);
    }

    // -- peek / consume discipline --

    #[test]
    fn peek_does_not_advance() {
        let mut stream = TokenStream::new("1 2");
        assert_eq!(stream.peek(), Some("1"));
        assert_eq!(stream.peek(), Some("1"));
        assert_eq!(stream.consume().unwrap(), "1");
        assert_eq!(stream.peek(), Some("2"));
    }

    #[test]
    fn consume_past_end_fails() {
        let mut stream = TokenStream::new("1");
        stream.consume().unwrap();
        let err = stream.consume().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEndOfInput);
    }

    // -- numbers --

    #[test]
    fn consume_number_parses_floats() {
        let mut stream = TokenStream::new("3 -1.5 2e2");
        assert_eq!(stream.consume_number().unwrap(), 3.0);
        assert_eq!(stream.consume_number().unwrap(), -1.5);
        assert_eq!(stream.consume_number().unwrap(), 200.0);
    }

    #[test]
    fn consume_number_rejects_words() {
        let mut stream = TokenStream::new("abc");
        let err = stream.consume_number().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedNumber);
        assert!(err.message.contains("abc"), "message: {}", err.message);
    }

    #[test]
    fn consume_number_rejects_quoted_numbers() {
        // The requoting makes `"5"` a string token, not the number 5.
        let mut stream = TokenStream::new("\"5\"");
        assert_eq!(stream.consume_number().unwrap_err().kind, ErrorKind::ExpectedNumber);
    }
}
