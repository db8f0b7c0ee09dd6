//! Module `scanner` implements a one-pass lexer for the Quill language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping
//! whitespace and comments, and emitting exactly one `EOF` token at the end.
//! The pass is **batch**, not lazy: [`Scanner::scan_tokens`] consumes the
//! scanner and fully drains the input, so a fresh instance is required per
//! source text.
//!
//! Lexical errors (unterminated string, unexpected character) never stop
//! token production — they accumulate and are returned next to the tokens,
//! so the caller sees every problem in the unit at once.
//!
//! # Dialect notes
//!
//! - `//` **and** `/*` both start a comment running to end of line.  There is
//!   no block-comment terminator.
//! - `&&` and `||` are aliases for the `and` / `or` keywords.  A lone `&` or
//!   `|` produces no token and no error.
//! - Identifiers may contain hyphens (`foo-bar` is a single identifier).
//! - Compound assignment operators `+=` `-=` `*=` `/=` are single tokens.

use crate::error::QuillError;
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile-time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single-pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a [u8],             // entire source unit
    start: usize,              // index of the *first* byte of the current lexeme
    curr: usize,               // index *one past* the last byte examined
    line: usize,               // 1-based line counter (\n increments)
    tokens: Vec<Token>,        // tokens produced so far
    errors: Vec<QuillError>,   // lexical errors, accumulated
}

impl<'a> Scanner<'a> {
    /// Create a new scanner over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scan the whole input, returning the token sequence (always terminated
    /// by exactly one `EOF`) together with any accumulated lexical errors.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<QuillError>) {
        while !self.is_at_end() {
            self.start = self.curr;
            self.scan_token();
        }

        self.tokens.push(Token::new(TokenType::EOF, "", self.line));

        info!(
            "Scan finished: {} tokens, {} errors",
            self.tokens.len(),
            self.errors.len()
        );

        (self.tokens, self.errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers always guard with
    /// [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past
    /// EOF to avoid branching at call-site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    /// Returns `true` on success so callers can branch inline without an else.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Current lexeme as text.
    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        let slice: &[u8] = &self.src[self.start..self.curr];

        // SAFETY: the source came in as a &str and every lexeme boundary sits
        // on an ASCII byte, so the slice is valid UTF-8.
        unsafe { std::str::from_utf8_unchecked(slice) }
    }

    /// Emit a token for the current lexeme.
    fn add_token(&mut self, token_type: TokenType) {
        debug!("Scanned token ({:?}) on line {}", token_type, self.line);

        let token = Token::new(token_type, self.lexeme(), self.line);
        self.tokens.push(token);
    }

    /// Record a lexical error without stopping the scan.
    fn error<S: Into<String>>(&mut self, msg: S) {
        self.errors.push(QuillError::lex(self.line, msg));
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.start`.  Whitespace and
    /// comments produce no token; everything else either emits a token or
    /// records an error.
    fn scan_token(&mut self) {
        let b = self.advance();

        match b {
            // ── single-character punctuators ──────────────────────────────
            b'(' => self.add_token(TokenType::LEFT_PAREN),
            b')' => self.add_token(TokenType::RIGHT_PAREN),
            b'{' => self.add_token(TokenType::LEFT_BRACE),
            b'}' => self.add_token(TokenType::RIGHT_BRACE),
            b',' => self.add_token(TokenType::COMMA),
            b'.' => self.add_token(TokenType::DOT),
            b';' => self.add_token(TokenType::SEMICOLON),

            // ── one-or-two-character operators ────────────────────────────
            b'-' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else {
                    TokenType::MINUS
                };

                self.add_token(tt);
            }

            b'+' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                };

                self.add_token(tt);
            }

            b'*' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                };

                self.add_token(tt);
            }

            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.add_token(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.add_token(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.add_token(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.add_token(tt);
            }

            // ── comments, /= and / ────────────────────────────────────────
            // Both `//` and `/*` run to end of line; no terminator exists.
            b'/' => {
                if self.match_byte(b'/') || self.match_byte(b'*') {
                    // Fast-forward to the next newline using `memchr`.
                    // If none is found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }
                } else if self.match_byte(b'=') {
                    self.add_token(TokenType::SLASH_EQUAL);
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            // ── keyword aliases && and || ─────────────────────────────────
            // A lone '&' or '|' is silently dropped.
            b'&' => {
                if self.match_byte(b'&') {
                    self.add_token(TokenType::AND);
                }
            }

            b'|' => {
                if self.match_byte(b'|') {
                    self.add_token(TokenType::OR);
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1; // track for diagnostics
            }

            // ── string literal " … " ──────────────────────────────────────
            b'"' => {
                self.scan_string();
            }

            // ── number literal (digit-leading) ───────────────────────────
            b'0'..=b'9' => {
                self.scan_number();
            }

            // ── identifiers / keywords ───────────────────────────────────
            // is_alpha admits '-' so hyphens continue identifiers; a leading
            // '-' never reaches this arm (the operator arm above wins).
            c if is_alpha(c) => {
                self.scan_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                self.error(format!("Unexpected character: {}", b as char));
            }
        }
    }

    /// Scan a double-quoted string literal.  Strings may span lines; an
    /// unterminated string records an error and produces no token.
    fn scan_string(&mut self) {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            self.error("Unterminated string found!");
            return;
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let value: String = {
            let slice: &[u8] = &self.src[self.start + 1..self.curr - 1];

            // SAFETY: sliced between ASCII quote bytes of a valid &str.
            unsafe { std::str::from_utf8_unchecked(slice) }.to_owned()
        };

        self.add_token(TokenType::STRING(value));
    }

    /// Scan a numeric literal (`123`, `3.14`).  At most one fractional part;
    /// a trailing `.` without a following digit is left for the next lexeme.
    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let n: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0); // digits only, parse cannot fail
        self.add_token(TokenType::NUMBER(n));
    }

    /// Scan an identifier and decide whether it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn scan_identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.add_token(tt);
    }
}

/// Identifier-start/continue class: letters and hyphen.
#[inline(always)]
fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'-'
}

#[inline(always)]
fn is_alpha_numeric(c: u8) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}
