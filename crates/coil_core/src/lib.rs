//! coil_core: Core utilities for the coil language frontend.
//!
//! Provides source span types and line/column mapping used by the lexer,
//! the parser, and diagnostic rendering.

pub mod text;

// Re-export commonly used types
pub use text::{LineAndColumn, LineMap, TextRange, TextSpan};
