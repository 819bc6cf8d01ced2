//! Interactive (REPL) parse classification and input helpers.

use coil_ast::node::Stmt;

/// How an interactive chunk of input parsed.
///
/// Hosts use this to decide between executing the input, prompting for a
/// continuation line, or reporting an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResultKind {
    /// Nothing but whitespace and comments.
    Empty,
    /// A well-formed statement.
    Complete,
    /// A compound statement was started but not finished; more lines could
    /// complete it.
    IncompleteStatement,
    /// A token itself is unfinished (open string or bracket); more input
    /// could complete it.
    IncompleteToken,
    /// A real syntax error; no amount of further input helps.
    Invalid,
}

/// The outcome of parsing one interactive chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveParse {
    /// The parsed statement, absent when the input was `Empty`.
    pub statement: Option<Stmt>,
    pub kind: ParseResultKind,
}

impl InteractiveParse {
    /// Whether the host should prompt for a continuation line.
    pub fn wants_more_input(&self) -> bool {
        matches!(
            self.kind,
            ParseResultKind::IncompleteStatement | ParseResultKind::IncompleteToken
        )
    }
}

/// Suggest an indentation depth, in characters, for the line following
/// `text`: the previous non-blank line's leading whitespace, one
/// `indent_width` deeper when that line opens a block with a trailing `:`.
pub fn suggested_indentation(text: &str, indent_width: usize) -> usize {
    let mut last_line: Option<&str> = None;
    for line in text.lines() {
        if !line.trim().is_empty() {
            last_line = Some(line);
        }
    }
    let Some(line) = last_line else {
        return 0;
    };
    let mut indent = 0;
    for ch in line.chars() {
        match ch {
            ' ' => indent += 1,
            '\t' => indent += indent_width,
            _ => break,
        }
    }
    // Strip a trailing comment before looking for the block-opening colon.
    let code = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    if code.trim_end().ends_with(':') {
        indent + indent_width
    } else {
        indent
    }
}
