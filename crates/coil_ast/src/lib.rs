//! coil_ast: Abstract Syntax Tree definitions for the coil language.
//!
//! This crate defines the `TokenKind` enum shared by the lexer and parser,
//! the flag bitsets, and the statement/expression node types. Nodes own their
//! children exclusively and carry a source range; an `Error` variant in each
//! category keeps the tree well-formed after recovered syntax errors.

pub mod node;
pub mod token_kind;
pub mod types;

// Re-export key types
pub use node::*;
pub use token_kind::TokenKind;
pub use types::*;
