//! The coil parser implementation.
//!
//! A recursive descent parser with one token of lookahead. Syntax errors are
//! reported through the injected error sink and recovered from with `Error`
//! placeholder nodes; the parse never aborts except for the fatal input
//! decode failure. The first reported error's classification is kept as the
//! session's primary code, which drives interactive incomplete-input
//! classification.

use coil_ast::node::*;
use coil_ast::token_kind::TokenKind;
use coil_ast::types::{LanguageFeatures, TokenFlags};
use coil_core::text::TextRange;
use coil_diagnostics::{messages, Diagnostic, DiagnosticMessage, ErrorCodes, ErrorSink, Severity};
use coil_lexer::{Token, TokenSource, TokenValue};
use rustc_hash::FxHashSet;

use crate::interactive::{InteractiveParse, ParseResultKind};
use crate::precedence::{get_binary_operator_precedence, OperatorPrecedence};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// The decimal magnitude of `-i32::MIN`, which only fits an i32 when it
/// appears directly under a unary minus.
const I32_MIN_MAGNITUDE: &str = "2147483648";

/// An unrecoverable parse failure. Recoverable syntax errors go through the
/// error sink instead; this surfaces only for fatal diagnostics such as
/// malformed input encoding.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{diagnostic}")]
pub struct FatalParseError {
    pub diagnostic: Diagnostic,
}

/// Per-function bookkeeping for `yield`/`return` legality.
#[derive(Default)]
struct FunctionContext {
    is_generator: bool,
    /// Span of the first `return <value>` in this function, checked against
    /// generator-ness once the whole body has been seen.
    return_with_value: Option<TextRange>,
}

/// The parser. Generic over its token source so tests can substitute one;
/// production use wraps a `coil_lexer::Lexer`.
pub struct Parser<'a, T: TokenSource> {
    source: T,
    sink: &'a mut dyn ErrorSink,
    current: Token,
    /// End offset of the most recently consumed token.
    prev_end: u32,
    interactive: bool,
    /// Classification of the first reported error, sticky for the session.
    primary_code: ErrorCodes,
    fatal: Option<Diagnostic>,
    in_loop: bool,
    in_finally: bool,
    /// `from __future__ import` is only legal while this holds.
    allow_future: bool,
    /// Class name driving private-name mangling, leading underscores
    /// stripped.
    private_prefix: Option<String>,
    functions: Vec<FunctionContext>,
    features: LanguageFeatures,
    recursion_depth: u32,
}

impl<'a, T: TokenSource> Parser<'a, T> {
    pub fn new(mut source: T, sink: &'a mut dyn ErrorSink) -> Self {
        let current = source.next_token();
        let mut parser = Self {
            source,
            sink,
            current,
            prev_end: 0,
            interactive: false,
            primary_code: ErrorCodes::NONE,
            fatal: None,
            in_loop: false,
            in_finally: false,
            allow_future: true,
            private_prefix: None,
            functions: Vec::new(),
            features: LanguageFeatures::empty(),
            recursion_depth: 0,
        };
        parser.drain_source();
        parser
    }

    /// Reinitialize for a fresh source unit, reusing the instance and sink.
    pub fn reset(&mut self, mut source: T) {
        self.current = source.next_token();
        self.source = source;
        self.prev_end = 0;
        self.interactive = false;
        self.primary_code = ErrorCodes::NONE;
        self.fatal = None;
        self.in_loop = false;
        self.in_finally = false;
        self.allow_future = true;
        self.private_prefix = None;
        self.functions.clear();
        self.features = LanguageFeatures::empty();
        self.recursion_depth = 0;
        self.drain_source();
    }

    /// The classification of the first error reported this session, or
    /// `NONE` when the parse was clean.
    pub fn primary_error_code(&self) -> ErrorCodes {
        self.primary_code
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Parse a whole source unit as a module.
    pub fn parse_module(&mut self) -> Result<Module, FatalParseError> {
        let mut body = Vec::new();
        while self.peek() != TokenKind::EndOfFileToken {
            if self.accept(TokenKind::NewlineToken) {
                continue;
            }
            if self.peek() == TokenKind::IndentToken {
                self.error_at_current(&messages::UNEXPECTED_INDENT, &[]);
                self.advance();
                continue;
            }
            if self.peek() == TokenKind::DedentToken {
                self.advance();
                continue;
            }
            let stmt = self.parse_statement();
            self.update_future_window(&stmt);
            body.push(stmt);
            self.check_fatal()?;
        }
        self.check_fatal()?;
        let end = self.current.span.end;
        Ok(Module {
            body,
            range: TextRange::new(0, end),
            is_module: true,
            features: self.features,
        })
    }

    /// Parse one interactive chunk and classify the result for the host.
    pub fn parse_interactive(&mut self) -> Result<InteractiveParse, FatalParseError> {
        self.interactive = true;
        while self.accept(TokenKind::NewlineToken) {}
        if self.peek() == TokenKind::EndOfFileToken && self.primary_code == ErrorCodes::NONE {
            self.check_fatal()?;
            return Ok(InteractiveParse {
                statement: None,
                kind: ParseResultKind::Empty,
            });
        }
        let statement = if self.peek() == TokenKind::EndOfFileToken {
            None
        } else {
            Some(self.parse_statement())
        };
        self.check_fatal()?;
        Ok(InteractiveParse {
            statement,
            kind: self.classify(),
        })
    }

    /// Parse exactly one statement, for hosts compiling a statement at a
    /// time.
    pub fn parse_single_statement(&mut self) -> Result<Stmt, FatalParseError> {
        while self.accept(TokenKind::NewlineToken) {}
        let stmt = if self.peek() == TokenKind::EndOfFileToken {
            self.error_at_current(&messages::STATEMENT_EXPECTED, &[]);
            Stmt::Error {
                range: self.current.span,
            }
        } else {
            self.parse_statement()
        };
        self.check_fatal()?;
        Ok(stmt)
    }

    /// Parse the source as a single expression, as `eval` would.
    pub fn parse_expression_only(&mut self) -> Result<Expr, FatalParseError> {
        while self.accept(TokenKind::NewlineToken) {}
        let expr = self.parse_expression_list();
        self.accept(TokenKind::NewlineToken);
        if self.peek() != TokenKind::EndOfFileToken {
            self.error_at_current(&messages::UNEXPECTED_TOKEN_0, &[self.current.kind.describe()]);
        }
        self.check_fatal()?;
        Ok(expr)
    }

    fn classify(&self) -> ParseResultKind {
        if self.primary_code == ErrorCodes::NONE {
            ParseResultKind::Complete
        } else if self.primary_code.contains(ErrorCodes::INCOMPLETE_TOKEN) {
            ParseResultKind::IncompleteToken
        } else if self.primary_code.contains(ErrorCodes::INCOMPLETE_STATEMENT) {
            ParseResultKind::IncompleteStatement
        } else {
            ParseResultKind::Invalid
        }
    }

    fn check_fatal(&mut self) -> Result<(), FatalParseError> {
        match self.fatal.take() {
            Some(diagnostic) => Err(FatalParseError { diagnostic }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn peek(&self) -> TokenKind {
        self.current.kind
    }

    fn advance(&mut self) -> Token {
        let next = self.source.next_token();
        let prev = std::mem::replace(&mut self.current, next);
        self.prev_end = prev.span.end;
        self.drain_source();
        prev
    }

    /// Consume the current token if it has the given kind.
    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require a token of the given kind. On mismatch, reports and does NOT
    /// advance, so the caller's recovery sees the offending token.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            let text = kind
                .punctuation_text()
                .or_else(|| kind.keyword_text())
                .unwrap_or_else(|| kind.describe());
            self.error_at_current(&messages::_0_EXPECTED, &[text]);
            false
        }
    }

    /// Like `expect`, but reports end of input with its own message. Used at
    /// structural boundaries where "'<token>' expected" would be misleading.
    fn expect_no_eof(&mut self, kind: TokenKind) -> bool {
        if self.peek() == TokenKind::EndOfFileToken {
            self.error_at_current(&messages::UNEXPECTED_END_OF_INPUT, &[]);
            false
        } else {
            self.expect(kind)
        }
    }

    /// Funnel diagnostics the token source produced into the session sink.
    fn drain_source(&mut self) {
        let diags = self.source.take_diagnostics();
        if !diags.is_empty() {
            for diagnostic in diags.into_diagnostics() {
                self.emit(diagnostic);
            }
        }
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            if self.primary_code == ErrorCodes::NONE {
                self.primary_code = diagnostic.codes;
            }
            if diagnostic.severity == Severity::FatalError && self.fatal.is_none() {
                self.fatal = Some(diagnostic.clone());
            }
        }
        self.sink.report(diagnostic);
    }

    fn error_at(&mut self, span: TextRange, message: &DiagnosticMessage, args: &[&str]) {
        let extra = self.incomplete_classification();
        let diagnostic =
            Diagnostic::with_location(self.source.unit_name().to_string(), span, message, args)
                .with_codes(extra);
        self.emit(diagnostic);
    }

    fn error_at_current(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let span = self.current.span;
        self.error_at(span, message, args);
    }

    /// Incomplete-input modifiers for an error at the current token:
    /// attached only in interactive mode and only when the parse ran off the
    /// end of the input. Synthetic Newline/Dedent tokens produced at end of
    /// input count as the end; their real counterparts do not.
    fn incomplete_classification(&self) -> ErrorCodes {
        let at_end = self.current.kind == TokenKind::EndOfFileToken
            || self.current.flags.contains(TokenFlags::SYNTHETIC);
        if self.interactive && at_end {
            if self.source.end_continues() {
                ErrorCodes::INCOMPLETE_TOKEN
            } else {
                ErrorCodes::INCOMPLETE_STATEMENT
            }
        } else {
            ErrorCodes::NONE
        }
    }

    /// A range from `start` to the end of the last consumed token.
    fn span_to(&self, start: u32) -> TextRange {
        TextRange::new(start, self.prev_end.max(start))
    }

    // ========================================================================
    // Names and mangling
    // ========================================================================

    /// Read an identifier without mangling, for import paths.
    fn parse_raw_name(&mut self) -> Option<(String, TextRange)> {
        if self.peek() == TokenKind::Identifier {
            let tok = self.advance();
            let name = tok.name().unwrap_or_default().to_string();
            Some((name, tok.span))
        } else {
            self.error_at_current(&messages::IDENTIFIER_EXPECTED, &[]);
            None
        }
    }

    /// Read an identifier, applying private-name mangling under an active
    /// class prefix.
    fn parse_name(&mut self) -> Option<(String, TextRange)> {
        let (name, span) = self.parse_raw_name()?;
        Some((self.fix_name(name), span))
    }

    /// `__bar` becomes `_Foo__bar` inside `class Foo`. Dunder names and
    /// names without two leading underscores are left alone.
    fn fix_name(&self, name: String) -> String {
        match &self.private_prefix {
            Some(prefix) if name.starts_with("__") && !name.ends_with("__") => {
                format!("_{}{}", prefix, name)
            }
            _ => name,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Stmt {
        if !self.enter_nesting() {
            let range = self.current.span;
            self.recover_to_end_of_line();
            return Stmt::Error { range };
        }
        let result = self.parse_statement_inner();
        self.recursion_depth -= 1;
        result
    }

    fn parse_statement_inner(&mut self) -> Stmt {
        match self.peek() {
            TokenKind::IfKeyword => self.parse_if_statement(),
            TokenKind::WhileKeyword => self.parse_while_statement(),
            TokenKind::ForKeyword => self.parse_for_statement(),
            TokenKind::TryKeyword => self.parse_try_statement(),
            TokenKind::WithKeyword => self.parse_with_statement(),
            TokenKind::DefKeyword => Stmt::FunctionDef(self.parse_function_def(Vec::new())),
            TokenKind::ClassKeyword => Stmt::ClassDef(self.parse_class_def(Vec::new())),
            TokenKind::AtToken => self.parse_decorated(),
            _ => self.parse_simple_statement_line(),
        }
    }

    /// One logical line of `;`-separated simple statements. A lone statement
    /// is returned unwrapped; two or more become a `Suite`.
    fn parse_simple_statement_line(&mut self) -> Stmt {
        let start = self.current.span.pos;
        let mut stmts = vec![self.parse_small_statement()];
        while self.accept(TokenKind::SemicolonToken) {
            if self.peek().ends_statement_list() {
                break;
            }
            stmts.push(self.parse_small_statement());
        }
        self.expect_end_of_line();
        if stmts.len() == 1 {
            stmts.pop().unwrap()
        } else {
            Stmt::Suite {
                body: stmts,
                range: self.span_to(start),
            }
        }
    }

    fn expect_end_of_line(&mut self) {
        match self.peek() {
            TokenKind::NewlineToken => {
                self.advance();
            }
            TokenKind::EndOfFileToken | TokenKind::DedentToken => {}
            _ => {
                self.error_at_current(
                    &messages::UNEXPECTED_TOKEN_0,
                    &[self.current.kind.describe()],
                );
                self.recover_to_end_of_line();
            }
        }
    }

    /// Skip forward to the end of the logical line. Guarantees forward
    /// progress after a failed statement parse.
    fn recover_to_end_of_line(&mut self) {
        while !self.peek().ends_statement_list() {
            self.advance();
        }
        self.accept(TokenKind::NewlineToken);
    }

    fn parse_small_statement(&mut self) -> Stmt {
        match self.peek() {
            TokenKind::PassKeyword => {
                let tok = self.advance();
                Stmt::Pass { range: tok.span }
            }
            TokenKind::BreakKeyword => {
                let tok = self.advance();
                if !self.in_loop {
                    self.error_at(tok.span, &messages::BREAK_OUTSIDE_LOOP, &[]);
                }
                Stmt::Break { range: tok.span }
            }
            TokenKind::ContinueKeyword => {
                let tok = self.advance();
                if !self.in_loop {
                    self.error_at(tok.span, &messages::CONTINUE_OUTSIDE_LOOP, &[]);
                } else if self.in_finally {
                    self.error_at(tok.span, &messages::CONTINUE_INSIDE_FINALLY, &[]);
                }
                Stmt::Continue { range: tok.span }
            }
            TokenKind::ReturnKeyword => self.parse_return_statement(),
            TokenKind::RaiseKeyword => self.parse_raise_statement(),
            TokenKind::AssertKeyword => self.parse_assert_statement(),
            TokenKind::GlobalKeyword => self.parse_global_statement(),
            TokenKind::DelKeyword => self.parse_delete_statement(),
            TokenKind::ImportKeyword => self.parse_import_statement(),
            TokenKind::FromKeyword => self.parse_import_from_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_return_statement(&mut self) -> Stmt {
        let kw = self.advance();
        if self.functions.is_empty() {
            self.error_at(kw.span, &messages::RETURN_OUTSIDE_FUNCTION, &[]);
        }
        let value = if self.can_start_expression() {
            Some(self.parse_expression_list())
        } else {
            None
        };
        let range = self.span_to(kw.span.pos);
        if value.is_some() {
            if let Some(ctx) = self.functions.last_mut() {
                ctx.return_with_value.get_or_insert(range);
            }
        }
        Stmt::Return { value, range }
    }

    fn parse_raise_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let exc = if self.can_start_expression() {
            Some(self.parse_expression_list())
        } else {
            None
        };
        Stmt::Raise {
            exc,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_assert_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let test = self.parse_test();
        let msg = if self.accept(TokenKind::CommaToken) {
            Some(self.parse_test())
        } else {
            None
        };
        Stmt::Assert {
            test,
            msg,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_global_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let mut names = Vec::new();
        loop {
            if let Some((name, _)) = self.parse_name() {
                names.push(name);
            }
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
        }
        Stmt::Global {
            names,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_delete_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let mut targets = Vec::new();
        loop {
            let expr = self.parse_test();
            if !expr.is_assignment_target() {
                let (span, noun) = (expr.range(), expr.describe());
                self.error_at(span, &messages::CANT_DELETE_0, &[noun]);
            }
            targets.push(expr);
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
            if self.peek().ends_statement_list() {
                break;
            }
        }
        Stmt::Delete {
            targets,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_dotted_name(&mut self) -> Option<(String, TextRange)> {
        let (mut name, span) = self.parse_raw_name()?;
        let start = span.pos;
        while self.accept(TokenKind::DotToken) {
            match self.parse_raw_name() {
                Some((part, _)) => {
                    name.push('.');
                    name.push_str(&part);
                }
                None => break,
            }
        }
        Some((name, self.span_to(start)))
    }

    fn parse_import_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let mut names = Vec::new();
        loop {
            let alias_start = self.current.span.pos;
            let Some((name, _)) = self.parse_dotted_name() else {
                break;
            };
            let asname = if self.accept(TokenKind::AsKeyword) {
                self.parse_raw_name().map(|(n, _)| n)
            } else {
                None
            };
            names.push(ImportAlias {
                name,
                asname,
                range: self.span_to(alias_start),
            });
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
        }
        Stmt::Import {
            names,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_import_from_statement(&mut self) -> Stmt {
        let kw = self.advance();
        let module = match self.parse_dotted_name() {
            Some((name, _)) => name,
            None => String::new(),
        };
        self.expect(TokenKind::ImportKeyword);

        let mut names = Vec::new();
        let mut is_wildcard = false;
        if self.accept(TokenKind::AsteriskToken) {
            is_wildcard = true;
        } else {
            let parenthesized = self.accept(TokenKind::OpenParenToken);
            loop {
                let alias_start = self.current.span.pos;
                let Some((name, _)) = self.parse_raw_name() else {
                    break;
                };
                let asname = if self.accept(TokenKind::AsKeyword) {
                    self.parse_raw_name().map(|(n, _)| n)
                } else {
                    None
                };
                names.push(ImportAlias {
                    name,
                    asname,
                    range: self.span_to(alias_start),
                });
                if !self.accept(TokenKind::CommaToken) {
                    break;
                }
                if parenthesized && self.peek() == TokenKind::CloseParenToken {
                    break;
                }
            }
            if parenthesized {
                self.expect(TokenKind::CloseParenToken);
            }
        }

        let range = self.span_to(kw.span.pos);
        if module == "__future__" {
            self.apply_future_import(kw.span, &names, is_wildcard);
        }
        Stmt::ImportFrom {
            module,
            names,
            is_wildcard,
            range,
        }
    }

    fn apply_future_import(&mut self, span: TextRange, names: &[ImportAlias], wildcard: bool) {
        if !self.allow_future {
            self.error_at(span, &messages::FUTURE_IMPORT_NOT_AT_TOP, &[]);
        }
        if wildcard {
            self.error_at(span, &messages::UNKNOWN_FUTURE_FEATURE_0, &["*"]);
            return;
        }
        for alias in names {
            match LanguageFeatures::from_feature_name(&alias.name) {
                Some(feature) => self.features |= feature,
                None => {
                    let span = alias.range;
                    self.error_at(span, &messages::UNKNOWN_FUTURE_FEATURE_0, &[&alias.name]);
                }
            }
        }
    }

    /// The `from __future__` window stays open only across docstrings and
    /// future imports at the top of the module.
    fn update_future_window(&mut self, stmt: &Stmt) {
        let keeps_open = match stmt {
            Stmt::Expr {
                value: Expr::Constant {
                    value: ConstantValue::Str(_),
                    ..
                },
                ..
            } => true,
            Stmt::ImportFrom { module, .. } => module == "__future__",
            _ => false,
        };
        if !keeps_open {
            self.allow_future = false;
        }
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        let first = if self.peek() == TokenKind::YieldKeyword {
            self.parse_yield_expr()
        } else {
            self.parse_expression_list()
        };

        if self.peek().is_augmented_assign() {
            let op_tok = self.advance();
            if !first.is_augmented_assignment_target() {
                let span = first.range();
                self.error_at(span, &messages::ILLEGAL_AUGMENTED_ASSIGNMENT_TARGET, &[]);
            }
            let value = if self.peek() == TokenKind::YieldKeyword {
                self.parse_yield_expr()
            } else {
                self.parse_expression_list()
            };
            return Stmt::AugAssign {
                target: first,
                op: augmented_op(op_tok.kind),
                value,
                range: self.span_to(start),
            };
        }

        if self.peek() == TokenKind::EqualsToken {
            let mut exprs = vec![first];
            while self.accept(TokenKind::EqualsToken) {
                let expr = if self.peek() == TokenKind::YieldKeyword {
                    self.parse_yield_expr()
                } else {
                    self.parse_expression_list()
                };
                exprs.push(expr);
            }
            let value = exprs.pop().unwrap();
            for target in &exprs {
                if !target.is_assignment_target() {
                    let (span, noun) = (target.range(), target.describe());
                    self.error_at(span, &messages::CANT_ASSIGN_TO_0, &[noun]);
                }
            }
            return Stmt::Assign {
                targets: exprs,
                value,
                range: self.span_to(start),
            };
        }

        let range = first.range();
        Stmt::Expr {
            value: first,
            range,
        }
    }

    // ========================================================================
    // Compound statements
    // ========================================================================

    /// The statements of an indented block, or of a `: simple; statements`
    /// suite on the same line.
    fn parse_suite(&mut self) -> Vec<Stmt> {
        self.expect_no_eof(TokenKind::ColonToken);
        if !self.accept(TokenKind::NewlineToken) {
            let stmt = self.parse_simple_statement_line();
            return match stmt {
                Stmt::Suite { body, .. } => body,
                single => vec![single],
            };
        }

        if self.peek() != TokenKind::IndentToken {
            self.error_at_current(&messages::EXPECTED_AN_INDENTED_BLOCK, &[]);
            return vec![Stmt::Error {
                range: TextRange::empty(self.current.span.pos),
            }];
        }
        self.advance();

        let mut body = Vec::new();
        while !matches!(
            self.peek(),
            TokenKind::DedentToken | TokenKind::EndOfFileToken
        ) {
            if self.accept(TokenKind::NewlineToken) {
                continue;
            }
            if self.peek() == TokenKind::IndentToken {
                self.error_at_current(&messages::UNEXPECTED_INDENT, &[]);
                self.advance();
                continue;
            }
            body.push(self.parse_statement());
        }
        self.accept(TokenKind::DedentToken);
        body
    }

    fn parse_if_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        let mut branch_start = start;
        self.advance(); // 'if'
        let mut branches = Vec::new();
        loop {
            let test = self.parse_test();
            let body = self.parse_suite();
            branches.push(IfBranch {
                test,
                body,
                range: self.span_to(branch_start),
            });
            if self.peek() == TokenKind::ElifKeyword {
                branch_start = self.current.span.pos;
                self.advance();
            } else {
                break;
            }
        }
        let orelse = if self.peek() == TokenKind::ElseKeyword {
            self.advance();
            self.parse_suite()
        } else {
            Vec::new()
        };
        Stmt::If {
            branches,
            orelse,
            range: self.span_to(start),
        }
    }

    /// Parse a suite as a loop body: `break`/`continue` become legal,
    /// `continue` is no longer crossing a `finally`.
    fn parse_loop_body(&mut self) -> Vec<Stmt> {
        let saved = (self.in_loop, self.in_finally);
        self.in_loop = true;
        self.in_finally = false;
        let body = self.parse_suite();
        (self.in_loop, self.in_finally) = saved;
        body
    }

    fn parse_while_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        self.advance(); // 'while'
        let test = self.parse_test();
        let body = self.parse_loop_body();
        let orelse = if self.peek() == TokenKind::ElseKeyword {
            self.advance();
            self.parse_suite()
        } else {
            Vec::new()
        };
        Stmt::While {
            test,
            body,
            orelse,
            range: self.span_to(start),
        }
    }

    fn parse_for_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        self.advance(); // 'for'
        let target = self.parse_target_list();
        self.expect(TokenKind::InKeyword);
        let iter = self.parse_expression_list();
        let body = self.parse_loop_body();
        let orelse = if self.peek() == TokenKind::ElseKeyword {
            self.advance();
            self.parse_suite()
        } else {
            Vec::new()
        };
        Stmt::For {
            target,
            iter,
            body,
            orelse,
            range: self.span_to(start),
        }
    }

    fn parse_try_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        self.advance(); // 'try'
        let body = self.parse_suite();

        let mut handlers = Vec::new();
        while self.peek() == TokenKind::ExceptKeyword {
            handlers.push(self.parse_except_handler());
        }
        let orelse = if !handlers.is_empty() && self.peek() == TokenKind::ElseKeyword {
            self.advance();
            self.parse_suite()
        } else {
            Vec::new()
        };
        let finalbody = if self.peek() == TokenKind::FinallyKeyword {
            self.advance();
            let saved = (self.in_loop, self.in_finally);
            self.in_loop = false;
            self.in_finally = true;
            let suite = self.parse_suite();
            (self.in_loop, self.in_finally) = saved;
            suite
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            self.error_at_current(&messages::_0_EXPECTED, &["except"]);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            range: self.span_to(start),
        }
    }

    fn parse_except_handler(&mut self) -> ExceptHandler {
        let start = self.current.span.pos;
        self.advance(); // 'except'
        let typ = if self.peek() != TokenKind::ColonToken {
            Some(self.parse_test())
        } else {
            None
        };
        let name = if typ.is_some()
            && (self.accept(TokenKind::AsKeyword) || self.accept(TokenKind::CommaToken))
        {
            let target = self.parse_trailer_chain();
            if !target.is_assignment_target() {
                let (span, noun) = (target.range(), target.describe());
                self.error_at(span, &messages::CANT_ASSIGN_TO_0, &[noun]);
            }
            Some(target)
        } else {
            None
        };
        let body = self.parse_suite();
        ExceptHandler {
            typ,
            name,
            body,
            range: self.span_to(start),
        }
    }

    fn parse_with_statement(&mut self) -> Stmt {
        let start = self.current.span.pos;
        self.advance(); // 'with'
        let mut items = Vec::new();
        loop {
            let item_start = self.current.span.pos;
            let context = self.parse_test();
            let target = if self.accept(TokenKind::AsKeyword) {
                let target = self.parse_trailer_chain();
                if !target.is_assignment_target() {
                    let (span, noun) = (target.range(), target.describe());
                    self.error_at(span, &messages::CANT_ASSIGN_TO_0, &[noun]);
                }
                Some(target)
            } else {
                None
            };
            items.push(WithItem {
                context,
                target,
                range: self.span_to(item_start),
            });
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
        }
        let body = self.parse_suite();
        Stmt::With {
            items,
            body,
            range: self.span_to(start),
        }
    }

    fn parse_function_def(&mut self, decorators: Vec<Expr>) -> FunctionDef {
        let start = self.current.span.pos;
        self.advance(); // 'def'
        let name = match self.parse_name() {
            Some((name, _)) => name,
            None => String::new(),
        };
        self.expect(TokenKind::OpenParenToken);
        let params = self.parse_parameter_list(TokenKind::CloseParenToken);
        self.expect(TokenKind::CloseParenToken);

        self.functions.push(FunctionContext {
            is_generator: false,
            return_with_value: None,
        });
        let saved = (self.in_loop, self.in_finally);
        self.in_loop = false;
        self.in_finally = false;
        let body = self.parse_suite();
        (self.in_loop, self.in_finally) = saved;
        let ctx = self.functions.pop().unwrap();

        if ctx.is_generator {
            if let Some(span) = ctx.return_with_value {
                self.error_at(span, &messages::RETURN_WITH_ARGUMENT_INSIDE_GENERATOR, &[]);
            }
        }
        FunctionDef {
            name,
            params,
            decorators,
            body,
            is_generator: ctx.is_generator,
            range: self.span_to(start),
        }
    }

    fn parse_class_def(&mut self, decorators: Vec<Expr>) -> ClassDef {
        let start = self.current.span.pos;
        self.advance(); // 'class'
        let name = match self.parse_name() {
            Some((name, _)) => name,
            None => String::new(),
        };
        let mut bases = Vec::new();
        if self.accept(TokenKind::OpenParenToken) {
            if self.peek() != TokenKind::CloseParenToken {
                loop {
                    bases.push(self.parse_test());
                    if !self.accept(TokenKind::CommaToken) {
                        break;
                    }
                    if self.peek() == TokenKind::CloseParenToken {
                        break;
                    }
                }
            }
            self.expect(TokenKind::CloseParenToken);
        }

        // The class body masks any surrounding loop or function context and
        // installs the mangling prefix.
        let saved_prefix = self.private_prefix.take();
        let stripped = name.trim_start_matches('_');
        self.private_prefix = if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        };
        let saved_flags = (self.in_loop, self.in_finally);
        self.in_loop = false;
        self.in_finally = false;
        let saved_functions = std::mem::take(&mut self.functions);

        let body = self.parse_suite();

        self.functions = saved_functions;
        (self.in_loop, self.in_finally) = saved_flags;
        self.private_prefix = saved_prefix;

        ClassDef {
            name,
            bases,
            decorators,
            body,
            range: self.span_to(start),
        }
    }

    fn parse_decorated(&mut self) -> Stmt {
        let start = self.current.span.pos;
        let mut decorators = Vec::new();
        while self.peek() == TokenKind::AtToken {
            self.advance();
            let mut expr = match self.parse_name() {
                Some((name, span)) => Expr::Name {
                    id: name,
                    range: span,
                },
                None => Expr::Error {
                    range: self.current.span,
                },
            };
            while self.accept(TokenKind::DotToken) {
                match self.parse_name() {
                    Some((attr, _)) => {
                        let range = self.span_to(expr.range().pos);
                        expr = Expr::Attribute {
                            value: Box::new(expr),
                            attr,
                            range,
                        };
                    }
                    None => break,
                }
            }
            if self.peek() == TokenKind::OpenParenToken {
                expr = self.parse_call(expr);
            }
            decorators.push(expr);
            self.expect(TokenKind::NewlineToken);
        }
        match self.peek() {
            TokenKind::DefKeyword => Stmt::FunctionDef(self.parse_function_def(decorators)),
            TokenKind::ClassKeyword => Stmt::ClassDef(self.parse_class_def(decorators)),
            _ => {
                self.error_at_current(&messages::STATEMENT_EXPECTED, &[]);
                self.recover_to_end_of_line();
                Stmt::Error {
                    range: self.span_to(start),
                }
            }
        }
    }

    /// Formal parameters up to (not including) `closing`. Checks duplicate
    /// names, default ordering, and `*`/`**` placement.
    fn parse_parameter_list(&mut self, closing: TokenKind) -> Vec<Parameter> {
        let mut params = Vec::new();
        let mut names: FxHashSet<String> = FxHashSet::default();
        let mut seen_default = false;
        let mut seen_star = false;
        let mut seen_double_star = false;
        if self.peek() == closing {
            return params;
        }
        loop {
            let start = self.current.span.pos;
            let kind = if self.accept(TokenKind::AsteriskToken) {
                if seen_star {
                    self.error_at(
                        self.span_to(start),
                        &messages::ONLY_ONE_STAR_ARGUMENT_ALLOWED,
                        &[],
                    );
                }
                ParameterKind::Star
            } else if self.accept(TokenKind::AsteriskAsteriskToken) {
                ParameterKind::DoubleStar
            } else {
                ParameterKind::Normal
            };
            if seen_double_star {
                self.error_at(
                    TextRange::empty(start),
                    &messages::KEYWORDS_ARGUMENT_MUST_BE_LAST,
                    &[],
                );
            }

            let Some((name, name_span)) = self.parse_name() else {
                break;
            };
            if !names.insert(name.clone()) {
                self.error_at(name_span, &messages::DUPLICATE_ARGUMENT_0_IN_DEFINITION, &[&name]);
            }

            let default = if kind == ParameterKind::Normal && self.accept(TokenKind::EqualsToken) {
                seen_default = true;
                Some(self.parse_test())
            } else {
                if kind == ParameterKind::Normal && seen_default && !seen_star {
                    self.error_at(name_span, &messages::NON_DEFAULT_FOLLOWS_DEFAULT, &[]);
                }
                None
            };
            match kind {
                ParameterKind::Star => seen_star = true,
                ParameterKind::DoubleStar => seen_double_star = true,
                ParameterKind::Normal => {}
            }
            params.push(Parameter {
                name,
                default,
                kind,
                range: self.span_to(start),
            });
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
            if self.peek() == closing {
                break;
            }
        }
        params
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn can_start_expression(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Identifier
                | TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::BytesLiteral
                | TokenKind::TrueKeyword
                | TokenKind::FalseKeyword
                | TokenKind::NoneKeyword
                | TokenKind::OpenParenToken
                | TokenKind::OpenBracketToken
                | TokenKind::OpenBraceToken
                | TokenKind::PlusToken
                | TokenKind::MinusToken
                | TokenKind::TildeToken
                | TokenKind::NotKeyword
                | TokenKind::LambdaKeyword
        )
    }

    /// A testlist: comma folding into a tuple.
    fn parse_expression_list(&mut self) -> Expr {
        let first = self.parse_test();
        if self.peek() != TokenKind::CommaToken {
            return first;
        }
        let start = first.range().pos;
        let mut elts = vec![first];
        while self.accept(TokenKind::CommaToken) {
            if !self.can_start_expression() {
                break;
            }
            elts.push(self.parse_test());
        }
        Expr::Tuple {
            elts,
            expandable: true,
            range: self.span_to(start),
        }
    }

    /// An assignment-position expression list (`for` targets, comprehension
    /// targets), validated as a target.
    fn parse_target_list(&mut self) -> Expr {
        let first = self.parse_binary_expression(OperatorPrecedence::BitwiseOr);
        let expr = if self.peek() == TokenKind::CommaToken {
            let start = first.range().pos;
            let mut elts = vec![first];
            while self.accept(TokenKind::CommaToken) {
                if !self.can_start_expression() {
                    break;
                }
                elts.push(self.parse_binary_expression(OperatorPrecedence::BitwiseOr));
            }
            Expr::Tuple {
                elts,
                expandable: true,
                range: self.span_to(start),
            }
        } else {
            first
        };
        if !expr.is_assignment_target() {
            let (span, noun) = (expr.range(), expr.describe());
            self.error_at(span, &messages::CANT_ASSIGN_TO_0, &[noun]);
        }
        expr
    }

    /// Enter one level of recursive nesting. On success the caller must
    /// decrement `recursion_depth` when its frame unwinds; on failure the
    /// depth diagnostic has already been reported.
    fn enter_nesting(&mut self) -> bool {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.recursion_depth -= 1;
            self.error_at_current(&messages::NESTING_TOO_DEEP, &[]);
            return false;
        }
        true
    }

    fn parse_test(&mut self) -> Expr {
        if !self.enter_nesting() {
            return Expr::Error {
                range: self.current.span,
            };
        }
        let result = self.parse_test_inner();
        self.recursion_depth -= 1;
        result
    }

    fn parse_test_inner(&mut self) -> Expr {
        if self.peek() == TokenKind::LambdaKeyword {
            return self.parse_lambda();
        }
        let expr = self.parse_or_test();
        if self.peek() == TokenKind::IfKeyword {
            let start = expr.range().pos;
            self.advance();
            let test = self.parse_or_test();
            let orelse = if self.expect(TokenKind::ElseKeyword) {
                self.parse_test()
            } else {
                Expr::Error {
                    range: self.current.span,
                }
            };
            return Expr::Conditional {
                test: Box::new(test),
                body: Box::new(expr),
                orelse: Box::new(orelse),
                range: self.span_to(start),
            };
        }
        expr
    }

    /// `test` without the trailing conditional, for comprehension `if`
    /// clauses where `else` belongs to an enclosing form.
    fn parse_old_test(&mut self) -> Expr {
        if self.peek() == TokenKind::LambdaKeyword {
            return self.parse_lambda();
        }
        self.parse_or_test()
    }

    fn parse_or_test(&mut self) -> Expr {
        let first = self.parse_and_test();
        if self.peek() != TokenKind::OrKeyword {
            return first;
        }
        let start = first.range().pos;
        let mut values = vec![first];
        while self.accept(TokenKind::OrKeyword) {
            values.push(self.parse_and_test());
        }
        Expr::BoolOp {
            op: BoolOp::Or,
            values,
            range: self.span_to(start),
        }
    }

    fn parse_and_test(&mut self) -> Expr {
        let first = self.parse_not_test();
        if self.peek() != TokenKind::AndKeyword {
            return first;
        }
        let start = first.range().pos;
        let mut values = vec![first];
        while self.accept(TokenKind::AndKeyword) {
            values.push(self.parse_not_test());
        }
        Expr::BoolOp {
            op: BoolOp::And,
            values,
            range: self.span_to(start),
        }
    }

    fn parse_not_test(&mut self) -> Expr {
        if self.peek() == TokenKind::NotKeyword {
            if !self.enter_nesting() {
                return Expr::Error {
                    range: self.current.span,
                };
            }
            let kw = self.advance();
            let operand = self.parse_not_test();
            self.recursion_depth -= 1;
            return Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                range: self.span_to(kw.span.pos),
            };
        }
        self.parse_comparison()
    }

    /// A comparison chain folded into one node: `a < b < c` keeps one left
    /// operand and two (op, comparator) pairs.
    fn parse_comparison(&mut self) -> Expr {
        let left = self.parse_binary_expression(OperatorPrecedence::BitwiseOr);
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.peek() {
                TokenKind::LessThanToken => {
                    self.advance();
                    CompareOp::Lt
                }
                TokenKind::GreaterThanToken => {
                    self.advance();
                    CompareOp::Gt
                }
                TokenKind::LessThanEqualsToken => {
                    self.advance();
                    CompareOp::LtE
                }
                TokenKind::GreaterThanEqualsToken => {
                    self.advance();
                    CompareOp::GtE
                }
                TokenKind::EqualsEqualsToken => {
                    self.advance();
                    CompareOp::Eq
                }
                TokenKind::ExclamationEqualsToken => {
                    self.advance();
                    CompareOp::NotEq
                }
                TokenKind::InKeyword => {
                    self.advance();
                    CompareOp::In
                }
                TokenKind::IsKeyword => {
                    self.advance();
                    if self.accept(TokenKind::NotKeyword) {
                        CompareOp::IsNot
                    } else {
                        CompareOp::Is
                    }
                }
                TokenKind::NotKeyword => {
                    self.advance();
                    self.expect(TokenKind::InKeyword);
                    CompareOp::NotIn
                }
                _ => break,
            };
            ops.push(op);
            comparators.push(self.parse_binary_expression(OperatorPrecedence::BitwiseOr));
        }
        if ops.is_empty() {
            return left;
        }
        let start = left.range().pos;
        Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
            range: self.span_to(start),
        }
    }

    /// Left-associative precedence climbing over the arithmetic and bitwise
    /// operators.
    fn parse_binary_expression(&mut self, min: OperatorPrecedence) -> Expr {
        let mut left = self.parse_unary_expression();
        loop {
            let kind = self.peek();
            let prec = get_binary_operator_precedence(kind);
            if prec == OperatorPrecedence::Invalid || prec < min {
                break;
            }
            self.advance();
            let right = self.parse_binary_expression(prec.one_higher());
            let range = left.range().union(right.range());
            left = Expr::BinaryOp {
                op: binary_op(kind),
                left: Box::new(left),
                right: Box::new(right),
                range,
            };
        }
        left
    }

    fn parse_unary_expression(&mut self) -> Expr {
        let op = match self.peek() {
            TokenKind::PlusToken => UnaryOp::Pos,
            TokenKind::MinusToken => UnaryOp::Neg,
            TokenKind::TildeToken => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        if !self.enter_nesting() {
            return Expr::Error {
                range: self.current.span,
            };
        }
        let result = self.parse_unary_operator(op);
        self.recursion_depth -= 1;
        result
    }

    fn parse_unary_operator(&mut self, op: UnaryOp) -> Expr {
        let tok = self.advance();

        // The one literal whose magnitude overflows i32 by exactly one:
        // `-2147483648` collapses back to a small int unless written with the
        // long suffix.
        if op == UnaryOp::Neg
            && self.peek() == TokenKind::IntLiteral
            && !self.current.flags.contains(TokenFlags::LONG_SUFFIX)
            && matches!(&self.current.value, Some(TokenValue::BigInt(s)) if s == I32_MIN_MAGNITUDE)
        {
            let lit = self.advance();
            let base = Expr::Constant {
                value: ConstantValue::Int(i32::MIN),
                range: TextRange::new(tok.span.pos, lit.span.end),
            };
            // Exponentiation still binds tighter than the collapsed literal.
            if self.accept(TokenKind::AsteriskAsteriskToken) {
                let right = self.parse_unary_expression();
                let range = self.span_to(tok.span.pos);
                return Expr::BinaryOp {
                    op: BinaryOp::Pow,
                    left: Box::new(base),
                    right: Box::new(right),
                    range,
                };
            }
            return base;
        }

        let operand = self.parse_unary_expression();
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            range: self.span_to(tok.span.pos),
        }
    }

    /// `**` is right-associative and its right operand may start with a
    /// unary operator.
    fn parse_power(&mut self) -> Expr {
        let base = self.parse_trailer_chain();
        if self.peek() != TokenKind::AsteriskAsteriskToken {
            return base;
        }
        self.advance();
        let right = if self.enter_nesting() {
            let right = self.parse_unary_expression();
            self.recursion_depth -= 1;
            right
        } else {
            Expr::Error {
                range: self.current.span,
            }
        };
        let range = base.range().union(right.range());
        Expr::BinaryOp {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(right),
            range,
        }
    }

    /// An atom followed by any number of call, subscript, and attribute
    /// trailers.
    fn parse_trailer_chain(&mut self) -> Expr {
        let mut expr = self.parse_atom();
        loop {
            match self.peek() {
                TokenKind::OpenParenToken => expr = self.parse_call(expr),
                TokenKind::OpenBracketToken => expr = self.parse_subscript(expr),
                TokenKind::DotToken => {
                    self.advance();
                    match self.parse_name() {
                        Some((attr, _)) => {
                            let range = self.span_to(expr.range().pos);
                            expr = Expr::Attribute {
                                value: Box::new(expr),
                                attr,
                                range,
                            };
                        }
                        None => break,
                    }
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call(&mut self, func: Expr) -> Expr {
        let start = func.range().pos;
        self.advance(); // '('
        let mut args: Vec<Argument> = Vec::new();
        let mut seen_keyword = false;
        let mut seen_star = false;
        let mut seen_double_star = false;
        let mut keyword_names: FxHashSet<String> = FxHashSet::default();

        if self.peek() != TokenKind::CloseParenToken {
            loop {
                let arg_start = self.current.span.pos;
                if self.accept(TokenKind::AsteriskToken) {
                    if seen_star {
                        self.error_at(
                            self.span_to(arg_start),
                            &messages::ONLY_ONE_STAR_ARGUMENT_ALLOWED,
                            &[],
                        );
                    }
                    if seen_double_star {
                        self.error_at(
                            self.span_to(arg_start),
                            &messages::KEYWORDS_ARGUMENT_MUST_BE_LAST,
                            &[],
                        );
                    }
                    seen_star = true;
                    let value = self.parse_test();
                    args.push(Argument {
                        name: None,
                        value,
                        kind: ArgumentKind::Star,
                        range: self.span_to(arg_start),
                    });
                } else if self.accept(TokenKind::AsteriskAsteriskToken) {
                    if seen_double_star {
                        self.error_at(
                            self.span_to(arg_start),
                            &messages::KEYWORDS_ARGUMENT_MUST_BE_LAST,
                            &[],
                        );
                    }
                    seen_double_star = true;
                    let value = self.parse_test();
                    args.push(Argument {
                        name: None,
                        value,
                        kind: ArgumentKind::DoubleStar,
                        range: self.span_to(arg_start),
                    });
                } else {
                    let value = self.parse_test();
                    if self.peek() == TokenKind::EqualsToken {
                        self.advance();
                        let name = match &value {
                            Expr::Name { id, .. } => Some(id.clone()),
                            other => {
                                let span = other.range();
                                self.error_at(span, &messages::KEYWORD_CANT_BE_AN_EXPRESSION, &[]);
                                None
                            }
                        };
                        let keyword_value = self.parse_test();
                        if let Some(n) = &name {
                            if !keyword_names.insert(n.clone()) {
                                self.error_at(
                                    self.span_to(arg_start),
                                    &messages::KEYWORD_ARGUMENT_REPEATED_0,
                                    &[n],
                                );
                            }
                        }
                        seen_keyword = true;
                        args.push(Argument {
                            name,
                            value: keyword_value,
                            kind: ArgumentKind::Keyword,
                            range: self.span_to(arg_start),
                        });
                    } else if self.peek() == TokenKind::ForKeyword && args.is_empty() {
                        // A generator expression as the sole argument.
                        let gen = self.finish_generator_expression(value, arg_start);
                        let range = gen.range();
                        args.push(Argument {
                            name: None,
                            value: gen,
                            kind: ArgumentKind::Positional,
                            range,
                        });
                        break;
                    } else {
                        if seen_keyword || seen_star || seen_double_star {
                            let span = value.range();
                            self.error_at(
                                span,
                                &messages::POSITIONAL_ARGUMENT_FOLLOWS_KEYWORD,
                                &[],
                            );
                        }
                        args.push(Argument {
                            name: None,
                            value,
                            kind: ArgumentKind::Positional,
                            range: self.span_to(arg_start),
                        });
                    }
                }
                if !self.accept(TokenKind::CommaToken) {
                    break;
                }
                if self.peek() == TokenKind::CloseParenToken {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParenToken);
        Expr::Call {
            func: Box::new(func),
            args,
            range: self.span_to(start),
        }
    }

    fn parse_subscript(&mut self, value: Expr) -> Expr {
        let start = value.range().pos;
        self.advance(); // '['
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            items.push(self.parse_subscript_item());
            if !self.accept(TokenKind::CommaToken) {
                break;
            }
            saw_comma = true;
            if self.peek() == TokenKind::CloseBracketToken {
                break;
            }
        }
        self.expect_no_eof(TokenKind::CloseBracketToken);
        // A trailing comma makes even a single item a tuple index: `a[1,]`
        // subscripts with `(1,)`.
        let index = if items.len() == 1 && !saw_comma {
            items.pop().unwrap()
        } else {
            let tuple_start = items.first().map(|e| e.range().pos).unwrap_or(start);
            Expr::Tuple {
                elts: items,
                expandable: true,
                range: self.span_to(tuple_start),
            }
        };
        Expr::Subscript {
            value: Box::new(value),
            index: Box::new(index),
            range: self.span_to(start),
        }
    }

    fn parse_subscript_item(&mut self) -> Expr {
        let start = self.current.span.pos;
        let lower = if self.peek() == TokenKind::ColonToken {
            None
        } else {
            Some(self.parse_test())
        };
        if self.peek() != TokenKind::ColonToken {
            return lower.unwrap_or_else(|| {
                self.error_at_current(&messages::EXPRESSION_EXPECTED, &[]);
                Expr::Error {
                    range: TextRange::empty(start),
                }
            });
        }
        self.advance(); // ':'
        let upper = if matches!(
            self.peek(),
            TokenKind::ColonToken | TokenKind::CloseBracketToken | TokenKind::CommaToken
        ) {
            None
        } else {
            Some(self.parse_test())
        };
        let step = if self.accept(TokenKind::ColonToken) {
            if matches!(
                self.peek(),
                TokenKind::CloseBracketToken | TokenKind::CommaToken
            ) {
                None
            } else {
                Some(self.parse_test())
            }
        } else {
            None
        };
        Expr::Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
            range: self.span_to(start),
        }
    }

    fn parse_lambda(&mut self) -> Expr {
        let kw = self.advance();
        let params = self.parse_parameter_list(TokenKind::ColonToken);
        self.expect(TokenKind::ColonToken);
        self.functions.push(FunctionContext {
            is_generator: false,
            return_with_value: None,
        });
        let body = self.parse_test();
        let ctx = self.functions.pop().unwrap_or_default();
        Expr::Lambda {
            params,
            body: Box::new(body),
            is_generator: ctx.is_generator,
            range: self.span_to(kw.span.pos),
        }
    }

    fn parse_yield_expr(&mut self) -> Expr {
        let kw = self.advance();
        if self.functions.is_empty() {
            self.error_at(kw.span, &messages::YIELD_OUTSIDE_FUNCTION, &[]);
        } else if let Some(ctx) = self.functions.last_mut() {
            ctx.is_generator = true;
        }
        let value = if self.can_start_expression() {
            Some(Box::new(self.parse_expression_list()))
        } else {
            None
        };
        Expr::Yield {
            value,
            range: self.span_to(kw.span.pos),
        }
    }

    // ========================================================================
    // Atoms and displays
    // ========================================================================

    fn parse_atom(&mut self) -> Expr {
        match self.peek() {
            TokenKind::Identifier => {
                let tok = self.advance();
                let id = self.fix_name(tok.name().unwrap_or_default().to_string());
                Expr::Name {
                    id,
                    range: tok.span,
                }
            }
            TokenKind::IntLiteral => {
                let tok = self.advance();
                let value = match tok.value {
                    Some(TokenValue::Int(v)) => ConstantValue::Int(v),
                    Some(TokenValue::BigInt(s)) => ConstantValue::BigInt(s),
                    _ => ConstantValue::Int(0),
                };
                Expr::Constant {
                    value,
                    range: tok.span,
                }
            }
            TokenKind::FloatLiteral => {
                let tok = self.advance();
                let value = match tok.value {
                    Some(TokenValue::Float(v)) => ConstantValue::Float(v),
                    _ => ConstantValue::Float(0.0),
                };
                Expr::Constant {
                    value,
                    range: tok.span,
                }
            }
            TokenKind::StringLiteral | TokenKind::BytesLiteral => {
                self.parse_string_concatenation()
            }
            TokenKind::TrueKeyword => {
                let tok = self.advance();
                Expr::Constant {
                    value: ConstantValue::True,
                    range: tok.span,
                }
            }
            TokenKind::FalseKeyword => {
                let tok = self.advance();
                Expr::Constant {
                    value: ConstantValue::False,
                    range: tok.span,
                }
            }
            TokenKind::NoneKeyword => {
                let tok = self.advance();
                Expr::Constant {
                    value: ConstantValue::None,
                    range: tok.span,
                }
            }
            TokenKind::OpenParenToken => self.parse_paren_form(),
            TokenKind::OpenBracketToken => self.parse_list_display(),
            TokenKind::OpenBraceToken => self.parse_dict_or_set_display(),
            _ => {
                self.error_at_current(&messages::EXPRESSION_EXPECTED, &[]);
                Expr::Error {
                    range: TextRange::empty(self.current.span.pos),
                }
            }
        }
    }

    /// Adjacent string/bytes literals concatenate into one constant. The
    /// result is a str when any piece is one.
    fn parse_string_concatenation(&mut self) -> Expr {
        let first = self.advance();
        let start = first.span.pos;
        let mut pieces = vec![first];
        while matches!(
            self.peek(),
            TokenKind::StringLiteral | TokenKind::BytesLiteral
        ) {
            pieces.push(self.advance());
        }
        let any_str = pieces.iter().any(|t| t.kind == TokenKind::StringLiteral);
        let value = if any_str {
            let mut text = String::new();
            for piece in pieces {
                match piece.value {
                    Some(TokenValue::Str(s)) => text.push_str(&s),
                    Some(TokenValue::Bytes(b)) => text.extend(b.iter().map(|&x| x as char)),
                    _ => {}
                }
            }
            ConstantValue::Str(text)
        } else {
            let mut bytes = Vec::new();
            for piece in pieces {
                if let Some(TokenValue::Bytes(b)) = piece.value {
                    bytes.extend_from_slice(&b);
                }
            }
            ConstantValue::Bytes(bytes)
        };
        Expr::Constant {
            value,
            range: self.span_to(start),
        }
    }

    fn parse_paren_form(&mut self) -> Expr {
        let open = self.advance();
        let start = open.span.pos;
        if self.accept(TokenKind::CloseParenToken) {
            return Expr::Tuple {
                elts: Vec::new(),
                expandable: false,
                range: self.span_to(start),
            };
        }
        if self.peek() == TokenKind::YieldKeyword {
            let inner = self.parse_yield_expr();
            self.expect_no_eof(TokenKind::CloseParenToken);
            return match inner {
                Expr::Yield { value, .. } => Expr::Yield {
                    value,
                    range: self.span_to(start),
                },
                other => other,
            };
        }

        let first = self.parse_test();
        if self.peek() == TokenKind::ForKeyword {
            let gen = self.finish_generator_expression(first, start);
            self.expect_no_eof(TokenKind::CloseParenToken);
            return match gen {
                Expr::GeneratorExp {
                    function, iterable, ..
                } => Expr::GeneratorExp {
                    function,
                    iterable,
                    range: self.span_to(start),
                },
                other => other,
            };
        }
        if self.peek() == TokenKind::CommaToken {
            let mut elts = vec![first];
            while self.accept(TokenKind::CommaToken) {
                if self.peek() == TokenKind::CloseParenToken {
                    break;
                }
                elts.push(self.parse_test());
            }
            self.expect_no_eof(TokenKind::CloseParenToken);
            return Expr::Tuple {
                elts,
                expandable: true,
                range: self.span_to(start),
            };
        }
        // Plain grouping: the parens leave no node behind.
        self.expect_no_eof(TokenKind::CloseParenToken);
        first
    }

    fn parse_list_display(&mut self) -> Expr {
        let open = self.advance();
        let start = open.span.pos;
        if self.accept(TokenKind::CloseBracketToken) {
            return Expr::List {
                elts: Vec::new(),
                range: self.span_to(start),
            };
        }
        let first = self.parse_test();
        if self.peek() == TokenKind::ForKeyword {
            let clauses = self.parse_comp_clauses();
            self.expect_no_eof(TokenKind::CloseBracketToken);
            return Expr::ListComp {
                element: Box::new(first),
                clauses,
                range: self.span_to(start),
            };
        }
        let mut elts = vec![first];
        while self.accept(TokenKind::CommaToken) {
            if self.peek() == TokenKind::CloseBracketToken {
                break;
            }
            elts.push(self.parse_test());
        }
        self.expect_no_eof(TokenKind::CloseBracketToken);
        Expr::List {
            elts,
            range: self.span_to(start),
        }
    }

    fn parse_dict_or_set_display(&mut self) -> Expr {
        let open = self.advance();
        let start = open.span.pos;
        if self.accept(TokenKind::CloseBraceToken) {
            return Expr::Dict {
                keys: Vec::new(),
                values: Vec::new(),
                range: self.span_to(start),
            };
        }
        let first = self.parse_test();
        if self.accept(TokenKind::ColonToken) {
            let mut keys = vec![first];
            let mut values = vec![self.parse_test()];
            while self.accept(TokenKind::CommaToken) {
                if self.peek() == TokenKind::CloseBraceToken {
                    break;
                }
                keys.push(self.parse_test());
                self.expect(TokenKind::ColonToken);
                values.push(self.parse_test());
            }
            self.expect_no_eof(TokenKind::CloseBraceToken);
            return Expr::Dict {
                keys,
                values,
                range: self.span_to(start),
            };
        }
        let mut elts = vec![first];
        while self.accept(TokenKind::CommaToken) {
            if self.peek() == TokenKind::CloseBraceToken {
                break;
            }
            elts.push(self.parse_test());
        }
        self.expect_no_eof(TokenKind::CloseBraceToken);
        Expr::Set {
            elts,
            range: self.span_to(start),
        }
    }

    // ========================================================================
    // Comprehensions and generator expressions
    // ========================================================================

    /// `for`/`if` clauses, positioned at a `for` keyword.
    fn parse_comp_clauses(&mut self) -> Vec<ComprehensionClause> {
        let mut clauses = Vec::new();
        loop {
            match self.peek() {
                TokenKind::ForKeyword => {
                    let kw = self.advance();
                    let target = self.parse_target_list();
                    self.expect(TokenKind::InKeyword);
                    let iter = self.parse_or_test();
                    clauses.push(ComprehensionClause::For {
                        target,
                        iter,
                        range: self.span_to(kw.span.pos),
                    });
                }
                TokenKind::IfKeyword => {
                    let kw = self.advance();
                    let test = self.parse_old_test();
                    clauses.push(ComprehensionClause::If {
                        test,
                        range: self.span_to(kw.span.pos),
                    });
                }
                _ => break,
            }
        }
        clauses
    }

    /// Desugar a generator expression, positioned at its first `for`.
    ///
    /// The outermost iterable is evaluated eagerly at the definition site and
    /// passed as the sole parameter of an implicit generator function whose
    /// body re-yields the element through the remaining clauses.
    fn finish_generator_expression(&mut self, element: Expr, start: u32) -> Expr {
        let mut clauses = self.parse_comp_clauses();

        let outer_iterable = match clauses.first_mut() {
            Some(ComprehensionClause::For { iter, .. }) => {
                let param_ref = Expr::Name {
                    id: ".0".to_string(),
                    range: iter.range(),
                };
                std::mem::replace(iter, param_ref)
            }
            _ => Expr::Error {
                range: TextRange::empty(start),
            },
        };

        let element_range = element.range();
        let mut body = Stmt::Expr {
            value: Expr::Yield {
                value: Some(Box::new(element)),
                range: element_range,
            },
            range: element_range,
        };
        for clause in clauses.into_iter().rev() {
            body = match clause {
                ComprehensionClause::For {
                    target,
                    iter,
                    range,
                } => Stmt::For {
                    target,
                    iter,
                    body: vec![body],
                    orelse: Vec::new(),
                    range,
                },
                ComprehensionClause::If { test, range } => Stmt::If {
                    branches: vec![IfBranch {
                        test,
                        body: vec![body],
                        range,
                    }],
                    orelse: Vec::new(),
                    range,
                },
            };
        }

        let range = self.span_to(start);
        let function = FunctionDef {
            name: "<genexpr>".to_string(),
            params: vec![Parameter {
                name: ".0".to_string(),
                default: None,
                kind: ParameterKind::Normal,
                range: outer_iterable.range(),
            }],
            decorators: Vec::new(),
            body: vec![body],
            is_generator: true,
            range,
        };
        Expr::GeneratorExp {
            function: Box::new(function),
            iterable: Box::new(outer_iterable),
            range,
        }
    }
}

// ============================================================================
// Operator mapping
// ============================================================================

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::PlusToken => BinaryOp::Add,
        TokenKind::MinusToken => BinaryOp::Sub,
        TokenKind::AsteriskToken => BinaryOp::Mul,
        TokenKind::SlashToken => BinaryOp::Div,
        TokenKind::SlashSlashToken => BinaryOp::FloorDiv,
        TokenKind::PercentToken => BinaryOp::Mod,
        TokenKind::LessThanLessThanToken => BinaryOp::LeftShift,
        TokenKind::GreaterThanGreaterThanToken => BinaryOp::RightShift,
        TokenKind::AmpersandToken => BinaryOp::BitAnd,
        TokenKind::BarToken => BinaryOp::BitOr,
        TokenKind::CaretToken => BinaryOp::BitXor,
        _ => unreachable!("not a climbing binary operator: {kind:?}"),
    }
}

fn augmented_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::PlusEqualsToken => BinaryOp::Add,
        TokenKind::MinusEqualsToken => BinaryOp::Sub,
        TokenKind::AsteriskEqualsToken => BinaryOp::Mul,
        TokenKind::AsteriskAsteriskEqualsToken => BinaryOp::Pow,
        TokenKind::SlashEqualsToken => BinaryOp::Div,
        TokenKind::SlashSlashEqualsToken => BinaryOp::FloorDiv,
        TokenKind::PercentEqualsToken => BinaryOp::Mod,
        TokenKind::LessThanLessThanEqualsToken => BinaryOp::LeftShift,
        TokenKind::GreaterThanGreaterThanEqualsToken => BinaryOp::RightShift,
        TokenKind::AmpersandEqualsToken => BinaryOp::BitAnd,
        TokenKind::BarEqualsToken => BinaryOp::BitOr,
        TokenKind::CaretEqualsToken => BinaryOp::BitXor,
        _ => unreachable!("not an augmented assignment operator: {kind:?}"),
    }
}
