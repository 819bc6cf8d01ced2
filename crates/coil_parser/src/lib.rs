//! coil_parser: Recursive descent parser for the coil language.
//!
//! Parses token streams from the lexer into an owned AST, recovering from
//! syntax errors with placeholder nodes. Includes the interactive entry point
//! that classifies incomplete input for REPL hosts.

mod interactive;
mod parser;
mod precedence;

pub use interactive::{suggested_indentation, InteractiveParse, ParseResultKind};
pub use parser::{FatalParseError, Parser};

use coil_ast::node::Module;
use coil_diagnostics::{messages, Diagnostic, ErrorSink};
use coil_lexer::Lexer;

/// Parse a source string as a module, reporting diagnostics to `sink`.
pub fn parse_module_source(
    text: &str,
    unit: &str,
    sink: &mut dyn ErrorSink,
) -> Result<Module, FatalParseError> {
    let lexer = Lexer::new(text, unit);
    Parser::new(lexer, sink).parse_module()
}

/// Parse raw bytes as a module. Input that is not valid UTF-8 is a fatal
/// error; nothing is parsed past the first bad byte.
pub fn parse_module_bytes(
    bytes: &[u8],
    unit: &str,
    sink: &mut dyn ErrorSink,
) -> Result<Module, FatalParseError> {
    match Lexer::from_bytes(bytes, unit) {
        Ok(lexer) => Parser::new(lexer, sink).parse_module(),
        Err(err) => {
            let diagnostic = Diagnostic::new(
                &messages::MALFORMED_SOURCE_ENCODING,
                &[&err.offset.to_string()],
            );
            sink.report(diagnostic.clone());
            Err(FatalParseError { diagnostic })
        }
    }
}
