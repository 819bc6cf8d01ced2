//! The coil tokenizer.
//!
//! Converts source text into tokens, synthesizing the structural
//! `Newline`/`Indent`/`Dedent` markers from physical line structure. Lines
//! inside unbalanced brackets are joined implicitly; a trailing `\` joins
//! lines explicitly. Diagnostics accumulate in an internal collection that
//! the parser drains through its error sink.

use crate::char_codes::*;
use crate::token::{Token, TokenSource, TokenValue};
use coil_ast::token_kind::TokenKind;
use coil_ast::types::TokenFlags;
use coil_core::text::TextRange;
use coil_diagnostics::{messages, Diagnostic, DiagnosticCollection, ErrorCodes};

/// Tab stops used when measuring indentation columns.
const TAB_SIZE: u32 = 8;

/// The one unrecoverable input failure: the source bytes are not valid UTF-8.
#[derive(Debug, Clone, thiserror::Error)]
#[error("source is not valid UTF-8 at byte offset {offset}")]
pub struct DecodeError {
    pub offset: usize,
}

/// Buffer for a string or bytes literal under construction.
enum LiteralBuf {
    Text(String),
    Bin(Vec<u8>),
}

impl LiteralBuf {
    fn push_char(&mut self, ch: char) {
        match self {
            LiteralBuf::Text(s) => s.push(ch),
            LiteralBuf::Bin(b) => {
                let mut buf = [0u8; 4];
                b.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    fn push_byte(&mut self, byte: u8) {
        match self {
            // Bytes 0..=255 map onto the first 256 scalar values.
            LiteralBuf::Text(s) => s.push(byte as char),
            LiteralBuf::Bin(b) => b.push(byte),
        }
    }

    fn into_value(self) -> TokenValue {
        match self {
            LiteralBuf::Text(s) => TokenValue::Str(s),
            LiteralBuf::Bin(b) => TokenValue::Bytes(b),
        }
    }
}

/// The tokenizer. One instance scans one source unit front to back.
#[derive(Debug)]
pub struct Lexer {
    text: String,
    unit: String,
    /// Current byte position.
    pos: usize,
    /// Start of the token being scanned.
    token_start: usize,
    /// Positioned at the start of a physical line, before indentation.
    at_line_start: bool,
    /// The current logical line has produced at least one real token.
    line_has_content: bool,
    /// Indentation columns: (tab = 8 columns, tab = 1 column). The second
    /// measure catches indentation that only matches under one tab width.
    indent_stack: Vec<(u32, u32)>,
    /// Dedent tokens still owed from the last indentation drop.
    pending_dedents: u32,
    /// Open bracket depth; newlines are joined while nonzero.
    bracket_depth: u32,
    /// An unterminated string ran into end of input; more input could
    /// still extend it.
    string_continues: bool,
    /// The synthetic final Newline has been emitted.
    eof_newline_emitted: bool,
    diagnostics: DiagnosticCollection,
}

impl Lexer {
    /// Create a lexer over already-validated text.
    pub fn new(text: &str, unit: &str) -> Self {
        Self {
            text: text.to_string(),
            unit: unit.to_string(),
            pos: 0,
            token_start: 0,
            at_line_start: true,
            line_has_content: false,
            indent_stack: vec![(0, 0)],
            pending_dedents: 0,
            bracket_depth: 0,
            string_continues: false,
            eof_newline_emitted: false,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Create a lexer from raw bytes, validating UTF-8 at the boundary.
    /// This is the one failure class that aborts a parse outright.
    pub fn from_bytes(bytes: &[u8], unit: &str) -> Result<Self, DecodeError> {
        match simdutf8::compat::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(text, unit)),
            Err(e) => Err(DecodeError {
                offset: e.valid_up_to(),
            }),
        }
    }

    // ========================================================================
    // Character primitives
    // ========================================================================

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    #[inline]
    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(n)
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume `ch` if it is next; ASCII only.
    #[inline]
    fn eat(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    fn span_from(&self, start: usize) -> TextRange {
        TextRange::new(start as u32, self.pos as u32)
    }

    fn report(&mut self, span: TextRange, message: &coil_diagnostics::DiagnosticMessage, args: &[&str]) {
        self.diagnostics
            .add(Diagnostic::with_location(self.unit.clone(), span, message, args));
    }

    fn report_with_codes(
        &mut self,
        span: TextRange,
        message: &coil_diagnostics::DiagnosticMessage,
        args: &[&str],
        extra: ErrorCodes,
    ) {
        self.diagnostics.add(
            Diagnostic::with_location(self.unit.clone(), span, message, args).with_codes(extra),
        );
    }

    /// Make a real (non-structural) token; marks the logical line non-blank.
    fn token(&mut self, kind: TokenKind) -> Token {
        self.line_has_content = true;
        Token::new(kind, self.span_from(self.token_start))
    }

    // ========================================================================
    // Main scan loop
    // ========================================================================

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return Token::new(TokenKind::DedentToken, TextRange::empty(self.pos as u32));
        }

        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                if let Some(tok) = self.scan_line_start() {
                    return tok;
                }
                continue;
            }

            while let Some(ch) = self.peek_char() {
                if is_line_whitespace(ch) {
                    self.pos += 1;
                } else {
                    break;
                }
            }

            self.token_start = self.pos;
            let Some(ch) = self.peek_char() else {
                return self.scan_eof();
            };

            match ch {
                '\n' | '\r' => {
                    self.consume_newline();
                    if self.bracket_depth == 0 && self.line_has_content {
                        self.line_has_content = false;
                        self.at_line_start = true;
                        return Token::new(TokenKind::NewlineToken, self.span_from(self.token_start));
                    }
                    self.at_line_start = self.bracket_depth == 0;
                }
                '#' => self.skip_comment(),
                '\\' => {
                    self.pos += 1;
                    if matches!(self.peek_char(), Some('\n' | '\r')) {
                        self.consume_newline();
                    } else {
                        let span = self.span_from(self.token_start);
                        self.report(span, &messages::UNEXPECTED_CHARACTER_AFTER_CONTINUATION, &[]);
                    }
                }
                '\'' | '"' => return self.scan_string(false, false),
                c if is_digit(c) => return self.scan_number(),
                '.' if self.peek_char_at(1).is_some_and(is_digit) => return self.scan_number(),
                c if is_identifier_start(c) => return self.scan_word(),
                _ => {
                    if let Some(tok) = self.scan_operator(ch) {
                        return tok;
                    }
                }
            }
        }
    }

    /// Measure indentation at the start of a logical line, emitting Indent or
    /// the first of any owed Dedents. Returns None when the line is blank,
    /// comment-only, or keeps the current indentation level.
    fn scan_line_start(&mut self) -> Option<Token> {
        let start = self.pos;
        let mut col = 0u32;
        let mut alt_col = 0u32;
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' => {
                    col += 1;
                    alt_col += 1;
                }
                '\t' => {
                    col = (col / TAB_SIZE + 1) * TAB_SIZE;
                    alt_col += 1;
                }
                '\x0c' => {
                    col = 0;
                    alt_col = 0;
                }
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek_char() {
            // Trailing whitespace before EOF produces no block structure.
            None => {
                self.at_line_start = false;
                return None;
            }
            // Blank line: consume and stay at line start.
            Some('\n' | '\r') => {
                self.consume_newline();
                return None;
            }
            // Comment-only line: skip to the newline; next iteration
            // treats it as blank.
            Some('#') => {
                self.skip_comment();
                return None;
            }
            _ => {}
        }

        self.at_line_start = false;
        let (top, alt_top) = *self.indent_stack.last().unwrap();
        if col > top {
            if alt_col <= alt_top {
                let span = self.span_from(start);
                self.report(span, &messages::INCONSISTENT_INDENTATION, &[]);
            }
            self.indent_stack.push((col, alt_col));
            return Some(Token::new(TokenKind::IndentToken, self.span_from(start)));
        }
        if col < top {
            let mut dedents = 0u32;
            while self.indent_stack.len() > 1 && self.indent_stack.last().unwrap().0 > col {
                self.indent_stack.pop();
                dedents += 1;
            }
            if self.indent_stack.last().unwrap().0 != col {
                let span = self.span_from(start);
                self.report(span, &messages::UNINDENT_DOES_NOT_MATCH, &[]);
            }
            self.pending_dedents = dedents.saturating_sub(1);
            return Some(Token::new(TokenKind::DedentToken, self.span_from(start)));
        }
        if alt_col != alt_top {
            let span = self.span_from(start);
            self.report(span, &messages::INCONSISTENT_INDENTATION, &[]);
        }
        None
    }

    /// End of input: a synthetic Newline closes an unterminated logical line,
    /// then one Dedent per open indentation level, then EndOfFile forever.
    fn scan_eof(&mut self) -> Token {
        let pos = self.pos as u32;
        if self.line_has_content && !self.eof_newline_emitted {
            self.eof_newline_emitted = true;
            self.line_has_content = false;
            return Token::new(TokenKind::NewlineToken, TextRange::empty(pos))
                .with_flags(TokenFlags::SYNTHETIC);
        }
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            return Token::new(TokenKind::DedentToken, TextRange::empty(pos))
                .with_flags(TokenFlags::SYNTHETIC);
        }
        Token::eof(pos)
    }

    fn consume_newline(&mut self) {
        if self.eat('\r') {
            self.eat('\n');
        } else {
            self.eat('\n');
        }
    }

    fn skip_comment(&mut self) {
        match memchr::memchr(b'\n', &self.text.as_bytes()[self.pos..]) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.text.len(),
        }
    }

    // ========================================================================
    // Words: identifiers, keywords, string prefixes
    // ========================================================================

    fn scan_word(&mut self) -> Token {
        self.token_start = self.pos;
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if is_identifier_part(ch) {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.text[start..self.pos];

        // A short run of prefix letters directly before a quote starts a
        // string literal: r"...", b'...', br"""...""" and friends.
        if word.len() <= 2
            && word.chars().all(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U'))
            && matches!(self.peek_char(), Some('\'' | '"'))
        {
            let raw = word.chars().any(|c| matches!(c, 'r' | 'R'));
            let bytes = word.chars().any(|c| matches!(c, 'b' | 'B'));
            return self.scan_string(raw, bytes);
        }

        if let Some(kind) = TokenKind::from_keyword(word) {
            return self.token(kind);
        }
        let value = TokenValue::Name(word.to_string());
        self.token(TokenKind::Identifier).with_value(value)
    }

    // ========================================================================
    // String and bytes literals
    // ========================================================================

    fn scan_string(&mut self, raw: bool, bytes: bool) -> Token {
        let quote = self.bump().unwrap();
        let triple = self.peek_char() == Some(quote) && self.peek_char_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        let mut buf = if bytes {
            LiteralBuf::Bin(Vec::new())
        } else {
            LiteralBuf::Text(String::new())
        };
        let mut flags = TokenFlags::NONE;

        loop {
            match self.peek_char() {
                None => {
                    // The literal runs into end of input: more input could
                    // still terminate it.
                    self.string_continues = true;
                    flags |= TokenFlags::UNTERMINATED;
                    let span = self.span_from(self.token_start);
                    let message = if bytes {
                        &messages::UNTERMINATED_BYTES_LITERAL
                    } else {
                        &messages::UNTERMINATED_STRING_LITERAL
                    };
                    self.report_with_codes(span, message, &[], ErrorCodes::INCOMPLETE_TOKEN);
                    break;
                }
                Some('\n' | '\r') if !triple => {
                    // A one-line literal cannot be extended past its line.
                    flags |= TokenFlags::UNTERMINATED;
                    let span = self.span_from(self.token_start);
                    let message = if bytes {
                        &messages::UNTERMINATED_BYTES_LITERAL
                    } else {
                        &messages::UNTERMINATED_STRING_LITERAL
                    };
                    self.report(span, message, &[]);
                    break;
                }
                Some(c) if c == quote => {
                    if triple {
                        if self.peek_char_at(1) == Some(quote) && self.peek_char_at(2) == Some(quote)
                        {
                            self.pos += 3;
                            break;
                        }
                        buf.push_char(c);
                        self.bump();
                    } else {
                        self.bump();
                        break;
                    }
                }
                Some('\\') => {
                    if raw {
                        // Raw literals keep the backslash but it still
                        // escapes a following quote or newline.
                        self.bump();
                        buf.push_char('\\');
                        if let Some(next) = self.peek_char() {
                            buf.push_char(next);
                            if matches!(next, '\n' | '\r') {
                                self.consume_newline();
                            } else {
                                self.bump();
                            }
                        }
                    } else {
                        self.scan_escape(&mut buf);
                    }
                }
                Some(c) => {
                    buf.push_char(c);
                    self.bump();
                }
            }
        }

        let kind = if bytes {
            TokenKind::BytesLiteral
        } else {
            TokenKind::StringLiteral
        };
        let value = buf.into_value();
        self.token(kind).with_value(value).with_flags(flags)
    }

    /// Process one backslash escape. Unknown escapes keep the backslash and
    /// draw a warning.
    fn scan_escape(&mut self, buf: &mut LiteralBuf) {
        let escape_start = self.pos;
        self.bump(); // the backslash
        let Some(ch) = self.peek_char() else {
            buf.push_char('\\');
            return;
        };
        match ch {
            '\n' | '\r' => self.consume_newline(),
            '\\' => {
                buf.push_char('\\');
                self.bump();
            }
            '\'' | '"' => {
                buf.push_char(ch);
                self.bump();
            }
            'a' => {
                buf.push_byte(0x07);
                self.bump();
            }
            'b' => {
                buf.push_byte(0x08);
                self.bump();
            }
            'f' => {
                buf.push_byte(0x0c);
                self.bump();
            }
            'n' => {
                buf.push_char('\n');
                self.bump();
            }
            'r' => {
                buf.push_char('\r');
                self.bump();
            }
            't' => {
                buf.push_char('\t');
                self.bump();
            }
            'v' => {
                buf.push_byte(0x0b);
                self.bump();
            }
            '0'..='7' => {
                // Up to three octal digits.
                let mut value = 0u32;
                let mut count = 0;
                while count < 3 {
                    match self.peek_char() {
                        Some(c @ '0'..='7') => {
                            value = value * 8 + c.to_digit(8).unwrap();
                            self.bump();
                            count += 1;
                        }
                        _ => break,
                    }
                }
                buf.push_byte(value as u8);
            }
            'x' => {
                self.bump();
                let mut value = 0u32;
                let mut count = 0;
                while count < 2 {
                    match self.peek_char().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.bump();
                            count += 1;
                        }
                        None => break,
                    }
                }
                if count == 2 {
                    buf.push_byte(value as u8);
                } else {
                    let span = self.span_from(escape_start);
                    self.report(span, &messages::INVALID_ESCAPE_SEQUENCE, &["x"]);
                    buf.push_char('\\');
                    buf.push_char('x');
                }
            }
            other => {
                let span = self.span_from(escape_start);
                self.report(span, &messages::INVALID_ESCAPE_SEQUENCE, &[&other.to_string()]);
                buf.push_char('\\');
                buf.push_char(other);
                self.bump();
            }
        }
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn scan_number(&mut self) -> Token {
        self.token_start = self.pos;
        let start = self.pos;

        // Radix-prefixed int forms.
        if self.peek_char() == Some('0')
            && matches!(self.peek_char_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            let radix = match self.peek_char_at(1).unwrap() {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                _ => 2,
            };
            self.pos += 2;
            let digits_start = self.pos;
            while let Some(ch) = self.peek_char() {
                if ch.is_digit(radix) {
                    self.bump();
                } else {
                    break;
                }
            }
            let digits = self.text[digits_start..self.pos].to_string();
            let long_suffix = self.eat('l') || self.eat('L');
            if digits.is_empty() {
                let span = self.span_from(start);
                let text = self.text[start..self.pos].to_string();
                self.report(span, &messages::INVALID_NUMBER_LITERAL, &[&text]);
                return self.token(TokenKind::IntLiteral).with_value(TokenValue::Int(0));
            }
            return self.make_int_token(&digits, radix, long_suffix);
        }

        // Decimal int or float.
        let mut is_float = false;
        while self.peek_char().is_some_and(is_digit) {
            self.pos += 1;
        }
        if self.peek_char() == Some('.') {
            is_float = true;
            self.pos += 1;
            while self.peek_char().is_some_and(is_digit) {
                self.pos += 1;
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exp_start = self.pos;
            self.pos += 1;
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.peek_char().is_some_and(is_digit) {
                is_float = true;
                while self.peek_char().is_some_and(is_digit) {
                    self.pos += 1;
                }
            } else {
                // Not an exponent after all: e.g. `1e` as `1` then name `e`.
                self.pos = exp_start;
            }
        }

        let text = self.text[start..self.pos].to_string();
        if is_float {
            let value = text.parse::<f64>().unwrap_or_else(|_| {
                let span = self.span_from(start);
                self.report(span, &messages::INVALID_NUMBER_LITERAL, &[&text]);
                0.0
            });
            return self
                .token(TokenKind::FloatLiteral)
                .with_value(TokenValue::Float(value));
        }

        let long_suffix = self.eat('l') || self.eat('L');

        // A leading zero with more digits is a legacy octal literal.
        if text.len() > 1 && text.starts_with('0') {
            if text.bytes().any(|b| b == b'8' || b == b'9') {
                let span = self.span_from(start);
                self.report(span, &messages::INVALID_NUMBER_LITERAL, &[&text]);
                return self.token(TokenKind::IntLiteral).with_value(TokenValue::Int(0));
            }
            return self.make_int_token(&text, 8, long_suffix);
        }
        self.make_int_token(&text, 10, long_suffix)
    }

    fn make_int_token(&mut self, digits: &str, radix: u32, long_suffix: bool) -> Token {
        let flags = if long_suffix {
            TokenFlags::LONG_SUFFIX
        } else {
            TokenFlags::NONE
        };
        let value = match u128::from_str_radix(digits, radix) {
            Ok(magnitude) if !long_suffix && magnitude <= i32::MAX as u128 => {
                TokenValue::Int(magnitude as i32)
            }
            Ok(magnitude) => TokenValue::BigInt(magnitude.to_string()),
            // Wider than u128; keep the digit text as written.
            Err(_) => TokenValue::BigInt(digits.to_string()),
        };
        self.token(TokenKind::IntLiteral)
            .with_value(value)
            .with_flags(flags)
    }

    // ========================================================================
    // Operators and delimiters
    // ========================================================================

    /// Scan a punctuation token, or report an invalid character and return
    /// None so the caller resumes scanning.
    fn scan_operator(&mut self, ch: char) -> Option<Token> {
        self.pos += ch.len_utf8();
        let kind = match ch {
            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                match ch {
                    '(' => TokenKind::OpenParenToken,
                    '[' => TokenKind::OpenBracketToken,
                    _ => TokenKind::OpenBraceToken,
                }
            }
            ')' | ']' | '}' => {
                if self.bracket_depth == 0 {
                    let span = self.span_from(self.token_start);
                    self.report(span, &messages::UNMATCHED_CLOSING_BRACKET, &[&ch.to_string()]);
                } else {
                    self.bracket_depth -= 1;
                }
                match ch {
                    ')' => TokenKind::CloseParenToken,
                    ']' => TokenKind::CloseBracketToken,
                    _ => TokenKind::CloseBraceToken,
                }
            }
            ',' => TokenKind::CommaToken,
            ':' => TokenKind::ColonToken,
            ';' => TokenKind::SemicolonToken,
            '.' => TokenKind::DotToken,
            '@' => TokenKind::AtToken,
            '~' => TokenKind::TildeToken,
            '+' => {
                if self.eat('=') {
                    TokenKind::PlusEqualsToken
                } else {
                    TokenKind::PlusToken
                }
            }
            '-' => {
                if self.eat('=') {
                    TokenKind::MinusEqualsToken
                } else {
                    TokenKind::MinusToken
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::AsteriskAsteriskEqualsToken
                    } else {
                        TokenKind::AsteriskAsteriskToken
                    }
                } else if self.eat('=') {
                    TokenKind::AsteriskEqualsToken
                } else {
                    TokenKind::AsteriskToken
                }
            }
            '/' => {
                if self.eat('/') {
                    if self.eat('=') {
                        TokenKind::SlashSlashEqualsToken
                    } else {
                        TokenKind::SlashSlashToken
                    }
                } else if self.eat('=') {
                    TokenKind::SlashEqualsToken
                } else {
                    TokenKind::SlashToken
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEqualsToken
                } else {
                    TokenKind::PercentToken
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::LessThanLessThanEqualsToken
                    } else {
                        TokenKind::LessThanLessThanToken
                    }
                } else if self.eat('=') {
                    TokenKind::LessThanEqualsToken
                } else if self.eat('>') {
                    // Legacy spelling of `!=`.
                    TokenKind::ExclamationEqualsToken
                } else {
                    TokenKind::LessThanToken
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('=') {
                        TokenKind::GreaterThanGreaterThanEqualsToken
                    } else {
                        TokenKind::GreaterThanGreaterThanToken
                    }
                } else if self.eat('=') {
                    TokenKind::GreaterThanEqualsToken
                } else {
                    TokenKind::GreaterThanToken
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqualsEqualsToken
                } else {
                    TokenKind::EqualsToken
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::ExclamationEqualsToken
                } else {
                    let span = self.span_from(self.token_start);
                    self.report(span, &messages::INVALID_CHARACTER, &["!"]);
                    return None;
                }
            }
            '&' => {
                if self.eat('=') {
                    TokenKind::AmpersandEqualsToken
                } else {
                    TokenKind::AmpersandToken
                }
            }
            '|' => {
                if self.eat('=') {
                    TokenKind::BarEqualsToken
                } else {
                    TokenKind::BarToken
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretEqualsToken
                } else {
                    TokenKind::CaretToken
                }
            }
            other => {
                let span = self.span_from(self.token_start);
                self.report(span, &messages::INVALID_CHARACTER, &[&other.to_string()]);
                return None;
            }
        };
        Some(self.token(kind))
    }

    /// Get the accumulated diagnostics.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Token {
        self.scan()
    }

    fn end_continues(&self) -> bool {
        self.string_continues || self.bracket_depth > 0
    }

    fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    fn unit_name(&self) -> &str {
        &self.unit
    }
}
