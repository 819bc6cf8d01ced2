//! Character classification helpers for the lexer.

use unicode_xid::UnicodeXID;

/// Whether `ch` can start an identifier.
#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_xid_start()
}

/// Whether `ch` can continue an identifier.
#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_xid_continue()
}

/// Whether `ch` is a decimal digit.
#[inline]
pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// Whether `ch` is horizontal whitespace inside a line.
#[inline]
pub fn is_line_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\x0c'
}
