//! coil_lexer: Tokenizer for coil source code.
//!
//! Produces a stream of `(Token, span)` pairs from source text, with full
//! support for:
//! - Indentation-based block structure (`Indent`/`Dedent`/`Newline` markers)
//! - Implicit line joining inside brackets and explicit `\` continuation
//! - String and bytes literals, including triple quotes and raw prefixes
//! - Int literals in all radixes, long suffix, and float literals
//!
//! The lexer implements the [`TokenSource`] contract consumed by the parser,
//! including the `end_continues` indicator that drives incomplete-input
//! classification for interactive hosts.

mod char_codes;
mod lexer;
mod token;

pub use lexer::{DecodeError, Lexer};
pub use token::{Token, TokenSource, TokenValue};
