//! coil_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Syntax errors are reported through an [`ErrorSink`] and never abort the
//! parse; the parser substitutes placeholder nodes and keeps going. Each
//! diagnostic carries a numeric message code plus a bit-flaggable
//! [`ErrorCodes`] classification so hosts can filter on "incomplete" or
//! "indentation-related" without string matching.

use coil_core::text::TextRange;
use std::fmt;

bitflags::bitflags! {
    /// Bit-flag classification of a diagnostic.
    ///
    /// The low bits are modifiers ORed onto a base class. `INCOMPLETE_MASK`
    /// is what the interactive driver inspects to decide "wait for more
    /// input" versus "show an error".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ErrorCodes: u32 {
        const NONE                 = 0;
        /// A compound statement was started but not finished.
        const INCOMPLETE_STATEMENT = 1 << 0;
        /// A token itself is unterminated (open string or bracket).
        const INCOMPLETE_TOKEN     = 1 << 1;
        /// Rendering should suppress the column caret for this diagnostic.
        const NO_CARET             = 1 << 2;

        /// Generic grammar violation.
        const SYNTAX_ERROR         = 1 << 4;
        /// Block-structure violation. Implies `SYNTAX_ERROR`.
        const INDENTATION_ERROR    = (1 << 5) | Self::SYNTAX_ERROR.bits();

        const INCOMPLETE_MASK = Self::INCOMPLETE_STATEMENT.bits() | Self::INCOMPLETE_TOKEN.bits();
    }
}

impl ErrorCodes {
    /// Whether this code carries either incompleteness modifier.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        self.intersects(ErrorCodes::INCOMPLETE_MASK)
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
    /// Unrecoverable; the in-progress parse is abandoned.
    FatalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::FatalError => write!(f, "fatal error"),
        }
    }
}

/// A diagnostic message template with a numeric code and classification.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic message code (e.g., 1002).
    pub code: u32,
    /// Bit-flag classification of this message.
    pub class: ErrorCodes,
    /// The severity of this message.
    pub severity: Severity,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The source unit (file name, `<stdin>`, ...) where this occurred, if any.
    pub unit: Option<String>,
    /// The source range where this diagnostic occurred, if any.
    pub span: Option<TextRange>,
    /// The resolved message text.
    pub message_text: String,
    /// The numeric message code.
    pub code: u32,
    /// Bit-flag classification, possibly with incompleteness modifiers ORed in.
    pub codes: ErrorCodes,
    /// The severity.
    pub severity: Severity,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            unit: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            codes: message.class,
            severity: message.severity,
        }
    }

    /// Create a new diagnostic with unit and span info.
    pub fn with_location(
        unit: String,
        span: TextRange,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            unit: Some(unit),
            span: Some(span),
            message_text: format_message(message.message, args),
            code: message.code,
            codes: message.class,
            severity: message.severity,
        }
    }

    /// OR additional classification bits onto this diagnostic.
    pub fn with_codes(mut self, extra: ErrorCodes) -> Self {
        self.codes |= extra;
        self
    }

    /// Whether this is an error or fatal-error diagnostic.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::FatalError)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref unit) = self.unit {
            write!(f, "{}", unit)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.pos)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} C{}: {}", self.severity, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Receiver of diagnostics produced during a parse session.
///
/// Injected into the parser at construction and fixed for the life of the
/// session; the parser keeps going after reporting recoverable errors.
pub trait ErrorSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A collection of diagnostics accumulated during a parse.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Sort diagnostics by unit and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let unit_cmp = a.unit.cmp(&b.unit);
            if unit_cmp != std::cmp::Ordering::Equal {
                return unit_cmp;
            }
            let a_pos = a.span.map(|s| s.pos).unwrap_or(0);
            let b_pos = b.span.map(|s| s.pos).unwrap_or(0);
            a_pos.cmp(&b_pos)
        });
    }
}

impl ErrorSink for DiagnosticCollection {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.add(diagnostic);
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $class:ident, Error, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                class: ErrorCodes::$class,
                severity: Severity::Error,
                message: $msg,
            }
        };
        ($code:expr, $class:ident, FatalError, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                class: ErrorCodes::$class,
                severity: Severity::FatalError,
                message: $msg,
            }
        };
        ($code:expr, $class:ident, Warning, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                class: ErrorCodes::$class,
                severity: Severity::Warning,
                message: $msg,
            }
        };
    }

    // ========================================================================
    // Lexer errors (1000-1099)
    // ========================================================================
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1002, SYNTAX_ERROR, Error, "unterminated string literal");
    pub const UNTERMINATED_BYTES_LITERAL: DiagnosticMessage = diag!(1003, SYNTAX_ERROR, Error, "unterminated bytes literal");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1004, SYNTAX_ERROR, Error, "invalid character '{0}' in source");
    pub const INVALID_NUMBER_LITERAL: DiagnosticMessage = diag!(1005, SYNTAX_ERROR, Error, "invalid number literal '{0}'");
    pub const INVALID_ESCAPE_SEQUENCE: DiagnosticMessage = diag!(1006, SYNTAX_ERROR, Warning, "unrecognized escape sequence '\\{0}'");
    pub const UNEXPECTED_CHARACTER_AFTER_CONTINUATION: DiagnosticMessage = diag!(1007, SYNTAX_ERROR, Error, "unexpected character after line continuation character");
    pub const UNMATCHED_CLOSING_BRACKET: DiagnosticMessage = diag!(1008, SYNTAX_ERROR, Error, "unmatched '{0}'");
    pub const INCONSISTENT_INDENTATION: DiagnosticMessage = diag!(1009, INDENTATION_ERROR, Error, "inconsistent use of tabs and spaces in indentation");
    pub const UNINDENT_DOES_NOT_MATCH: DiagnosticMessage = diag!(1010, INDENTATION_ERROR, Error, "unindent does not match any outer indentation level");
    pub const MALFORMED_SOURCE_ENCODING: DiagnosticMessage = diag!(1011, SYNTAX_ERROR, FatalError, "source is not valid UTF-8 at byte offset {0}");

    // ========================================================================
    // Parser errors (1100-1199)
    // ========================================================================
    pub const UNEXPECTED_TOKEN_0: DiagnosticMessage = diag!(1101, SYNTAX_ERROR, Error, "unexpected token '{0}'");
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1102, SYNTAX_ERROR, Error, "'{0}' expected");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(1103, SYNTAX_ERROR, Error, "expression expected");
    pub const STATEMENT_EXPECTED: DiagnosticMessage = diag!(1104, SYNTAX_ERROR, Error, "statement expected");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1105, SYNTAX_ERROR, Error, "identifier expected");
    pub const UNEXPECTED_END_OF_INPUT: DiagnosticMessage = diag!(1106, SYNTAX_ERROR, Error, "unexpected end of input");
    pub const EXPECTED_AN_INDENTED_BLOCK: DiagnosticMessage = diag!(1107, INDENTATION_ERROR, Error, "expected an indented block");
    pub const UNEXPECTED_INDENT: DiagnosticMessage = diag!(1108, INDENTATION_ERROR, Error, "unexpected indent");
    pub const NESTING_TOO_DEEP: DiagnosticMessage = diag!(1109, SYNTAX_ERROR, Error, "too many levels of nesting");

    // ========================================================================
    // Assignment targets (1120-1129)
    // ========================================================================
    pub const CANT_ASSIGN_TO_0: DiagnosticMessage = diag!(1120, SYNTAX_ERROR, Error, "can't assign to {0}");
    pub const ILLEGAL_AUGMENTED_ASSIGNMENT_TARGET: DiagnosticMessage = diag!(1121, SYNTAX_ERROR, Error, "illegal expression for augmented assignment");
    pub const CANT_DELETE_0: DiagnosticMessage = diag!(1122, SYNTAX_ERROR, Error, "can't delete {0}");

    // ========================================================================
    // Context legality (1140-1159)
    // ========================================================================
    pub const BREAK_OUTSIDE_LOOP: DiagnosticMessage = diag!(1140, SYNTAX_ERROR, Error, "'break' outside loop");
    pub const CONTINUE_OUTSIDE_LOOP: DiagnosticMessage = diag!(1141, SYNTAX_ERROR, Error, "'continue' not properly in loop");
    pub const CONTINUE_INSIDE_FINALLY: DiagnosticMessage = diag!(1142, SYNTAX_ERROR, Error, "'continue' not supported inside 'finally' clause");
    pub const RETURN_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(1143, SYNTAX_ERROR, Error, "'return' outside function");
    pub const RETURN_WITH_ARGUMENT_INSIDE_GENERATOR: DiagnosticMessage = diag!(1144, SYNTAX_ERROR, Error, "'return' with argument inside generator");
    pub const YIELD_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(1145, SYNTAX_ERROR, Error, "'yield' outside function");

    // ========================================================================
    // Parameter and argument lists (1160-1179)
    // ========================================================================
    pub const DUPLICATE_ARGUMENT_0_IN_DEFINITION: DiagnosticMessage = diag!(1160, SYNTAX_ERROR, Error, "duplicate argument '{0}' in function definition");
    pub const NON_DEFAULT_FOLLOWS_DEFAULT: DiagnosticMessage = diag!(1161, SYNTAX_ERROR, Error, "non-default argument follows default argument");
    pub const KEYWORD_ARGUMENT_REPEATED_0: DiagnosticMessage = diag!(1162, SYNTAX_ERROR, Error, "keyword argument repeated: '{0}'");
    pub const POSITIONAL_ARGUMENT_FOLLOWS_KEYWORD: DiagnosticMessage = diag!(1163, SYNTAX_ERROR, Error, "positional argument follows keyword argument");
    pub const ONLY_ONE_STAR_ARGUMENT_ALLOWED: DiagnosticMessage = diag!(1164, SYNTAX_ERROR, Error, "only one '*' argument allowed");
    pub const KEYWORDS_ARGUMENT_MUST_BE_LAST: DiagnosticMessage = diag!(1165, SYNTAX_ERROR, Error, "'**' argument must be last");
    pub const KEYWORD_CANT_BE_AN_EXPRESSION: DiagnosticMessage = diag!(1166, SYNTAX_ERROR, Error, "keyword can't be an expression");

    // ========================================================================
    // Future statements (1180-1189)
    // ========================================================================
    pub const FUTURE_IMPORT_NOT_AT_TOP: DiagnosticMessage = diag!(1180, SYNTAX_ERROR, Error, "'from __future__ import' must occur at the beginning of the file");
    pub const UNKNOWN_FUTURE_FEATURE_0: DiagnosticMessage = diag!(1181, SYNTAX_ERROR, Error, "future feature '{0}' is not defined");
}
