//! Token values and the pull-based token source contract.

use coil_ast::token_kind::TokenKind;
use coil_ast::types::TokenFlags;
use coil_core::text::TextRange;
use coil_diagnostics::DiagnosticCollection;

/// The literal payload of a token, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// An integer in the small-int range.
    Int(i32),
    /// An integer outside the small-int range, or written with an explicit
    /// long suffix. Decimal digit string of the magnitude.
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Identifier text.
    Name(String),
}

/// An immutable lexical unit: kind, optional literal value, span, and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<TokenValue>,
    pub span: TextRange,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self {
            kind,
            value: None,
            span,
            flags: TokenFlags::NONE,
        }
    }

    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// An end-of-file token at the given position.
    pub fn eof(pos: u32) -> Self {
        Self::new(TokenKind::EndOfFileToken, TextRange::empty(pos))
    }

    /// The identifier text, for `Identifier` tokens.
    pub fn name(&self) -> Option<&str> {
        match self.value {
            Some(TokenValue::Name(ref s)) => Some(s),
            _ => None,
        }
    }
}

/// A pull-based provider of tokens.
///
/// The parser calls `next_token` to refill its one-token lookahead buffer and
/// never re-lexes. After end of input, implementations keep returning
/// `EndOfFileToken`.
pub trait TokenSource {
    /// Scan and return the next token.
    fn next_token(&mut self) -> Token;

    /// Whether more input could still extend the current token: true while
    /// positioned at end of input inside an unterminated string literal or
    /// with unbalanced open brackets. Drives incomplete-input
    /// classification for interactive parsing.
    fn end_continues(&self) -> bool;

    /// Drain diagnostics produced while scanning, so the parser can funnel
    /// them through its error sink in order.
    fn take_diagnostics(&mut self) -> DiagnosticCollection;

    /// Name of the source unit, used in diagnostics.
    fn unit_name(&self) -> &str;
}
