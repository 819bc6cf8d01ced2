//! Flag types shared by the lexer and parser.

bitflags::bitflags! {
    /// Per-token flags produced by the lexer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u8 {
        const NONE        = 0;
        /// An int literal carried an explicit long-integer suffix (`l`/`L`).
        const LONG_SUFFIX = 1 << 0;
        /// A string or bytes literal ran off the end of the input.
        const UNTERMINATED = 1 << 1;
        /// A structural token (Newline, Dedent) synthesized at end of input
        /// rather than scanned from text.
        const SYNTHETIC   = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Language features enabled by `from __future__ import` statements.
    ///
    /// Collected by the parser while future statements are still legal (at
    /// the top of the unit) and recorded on the resulting module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LanguageFeatures: u32 {
        const NONE            = 0;
        const NESTED_SCOPES   = 1 << 0;
        const GENERATORS      = 1 << 1;
        const DIVISION        = 1 << 2;
        const ABSOLUTE_IMPORT = 1 << 3;
        const WITH_STATEMENT  = 1 << 4;
    }
}

impl LanguageFeatures {
    /// Map a `__future__` feature name to its flag.
    pub fn from_feature_name(name: &str) -> Option<LanguageFeatures> {
        Some(match name {
            "nested_scopes" => LanguageFeatures::NESTED_SCOPES,
            "generators" => LanguageFeatures::GENERATORS,
            "division" => LanguageFeatures::DIVISION,
            "absolute_import" => LanguageFeatures::ABSOLUTE_IMPORT,
            "with_statement" => LanguageFeatures::WITH_STATEMENT,
            _ => return None,
        })
    }
}
