//! TokenKind enum - the closed set of lexical token kinds.
//!
//! Produced by the lexer and consumed by the parser. The structural markers
//! (`NewlineToken`, `IndentToken`, `DedentToken`, `EndOfFileToken`) carry the
//! line/block structure of the language; everything else is a keyword,
//! literal, or punctuation token.

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TokenKind {
    Unknown = 0,
    EndOfFileToken = 1,

    // Structural markers
    NewlineToken = 2,
    IndentToken = 3,
    DedentToken = 4,

    // Literals and names
    IntLiteral = 5,
    FloatLiteral = 6,
    StringLiteral = 7,
    BytesLiteral = 8,
    Identifier = 9,

    // Punctuation
    OpenParenToken = 10,
    CloseParenToken = 11,
    OpenBracketToken = 12,
    CloseBracketToken = 13,
    OpenBraceToken = 14,
    CloseBraceToken = 15,
    CommaToken = 16,
    ColonToken = 17,
    SemicolonToken = 18,
    DotToken = 19,
    AtToken = 20,

    // Operators
    PlusToken = 21,
    MinusToken = 22,
    AsteriskToken = 23,
    AsteriskAsteriskToken = 24,
    SlashToken = 25,
    SlashSlashToken = 26,
    PercentToken = 27,
    LessThanLessThanToken = 28,
    GreaterThanGreaterThanToken = 29,
    AmpersandToken = 30,
    BarToken = 31,
    CaretToken = 32,
    TildeToken = 33,
    LessThanToken = 34,
    GreaterThanToken = 35,
    LessThanEqualsToken = 36,
    GreaterThanEqualsToken = 37,
    EqualsEqualsToken = 38,
    ExclamationEqualsToken = 39,

    // Assignment operators
    EqualsToken = 40,
    PlusEqualsToken = 41,
    MinusEqualsToken = 42,
    AsteriskEqualsToken = 43,
    AsteriskAsteriskEqualsToken = 44,
    SlashEqualsToken = 45,
    SlashSlashEqualsToken = 46,
    PercentEqualsToken = 47,
    LessThanLessThanEqualsToken = 48,
    GreaterThanGreaterThanEqualsToken = 49,
    AmpersandEqualsToken = 50,
    BarEqualsToken = 51,
    CaretEqualsToken = 52,

    // Keywords
    AndKeyword = 53,
    AsKeyword = 54,
    AssertKeyword = 55,
    BreakKeyword = 56,
    ClassKeyword = 57,
    ContinueKeyword = 58,
    DefKeyword = 59,
    DelKeyword = 60,
    ElifKeyword = 61,
    ElseKeyword = 62,
    ExceptKeyword = 63,
    FalseKeyword = 64,
    FinallyKeyword = 65,
    ForKeyword = 66,
    FromKeyword = 67,
    GlobalKeyword = 68,
    IfKeyword = 69,
    ImportKeyword = 70,
    InKeyword = 71,
    IsKeyword = 72,
    LambdaKeyword = 73,
    NoneKeyword = 74,
    NotKeyword = 75,
    OrKeyword = 76,
    PassKeyword = 77,
    RaiseKeyword = 78,
    ReturnKeyword = 79,
    TrueKeyword = 80,
    TryKeyword = 81,
    WhileKeyword = 82,
    WithKeyword = 83,
    YieldKeyword = 84,
}

impl TokenKind {
    pub const FIRST_KEYWORD: TokenKind = TokenKind::AndKeyword;
    pub const LAST_KEYWORD: TokenKind = TokenKind::YieldKeyword;

    /// Whether this kind is a keyword.
    pub fn is_keyword(self) -> bool {
        self >= Self::FIRST_KEYWORD && self <= Self::LAST_KEYWORD
    }

    /// Whether this kind is a literal or identifier token.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::BytesLiteral
        )
    }

    /// Whether this kind is one of the structural markers (including EOF).
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokenKind::NewlineToken
                | TokenKind::IndentToken
                | TokenKind::DedentToken
                | TokenKind::EndOfFileToken
        )
    }

    /// Whether this kind is an augmented assignment operator (`+=` etc.).
    pub fn is_augmented_assign(self) -> bool {
        matches!(
            self,
            TokenKind::PlusEqualsToken
                | TokenKind::MinusEqualsToken
                | TokenKind::AsteriskEqualsToken
                | TokenKind::AsteriskAsteriskEqualsToken
                | TokenKind::SlashEqualsToken
                | TokenKind::SlashSlashEqualsToken
                | TokenKind::PercentEqualsToken
                | TokenKind::LessThanLessThanEqualsToken
                | TokenKind::GreaterThanGreaterThanEqualsToken
                | TokenKind::AmpersandEqualsToken
                | TokenKind::BarEqualsToken
                | TokenKind::CaretEqualsToken
        )
    }

    /// Whether this kind can terminate a simple-statement sequence.
    pub fn ends_statement_list(self) -> bool {
        matches!(
            self,
            TokenKind::NewlineToken | TokenKind::EndOfFileToken | TokenKind::DedentToken
        )
    }

    /// The source text of a keyword kind.
    pub fn keyword_text(self) -> Option<&'static str> {
        Some(match self {
            TokenKind::AndKeyword => "and",
            TokenKind::AsKeyword => "as",
            TokenKind::AssertKeyword => "assert",
            TokenKind::BreakKeyword => "break",
            TokenKind::ClassKeyword => "class",
            TokenKind::ContinueKeyword => "continue",
            TokenKind::DefKeyword => "def",
            TokenKind::DelKeyword => "del",
            TokenKind::ElifKeyword => "elif",
            TokenKind::ElseKeyword => "else",
            TokenKind::ExceptKeyword => "except",
            TokenKind::FalseKeyword => "False",
            TokenKind::FinallyKeyword => "finally",
            TokenKind::ForKeyword => "for",
            TokenKind::FromKeyword => "from",
            TokenKind::GlobalKeyword => "global",
            TokenKind::IfKeyword => "if",
            TokenKind::ImportKeyword => "import",
            TokenKind::InKeyword => "in",
            TokenKind::IsKeyword => "is",
            TokenKind::LambdaKeyword => "lambda",
            TokenKind::NoneKeyword => "None",
            TokenKind::NotKeyword => "not",
            TokenKind::OrKeyword => "or",
            TokenKind::PassKeyword => "pass",
            TokenKind::RaiseKeyword => "raise",
            TokenKind::ReturnKeyword => "return",
            TokenKind::TrueKeyword => "True",
            TokenKind::TryKeyword => "try",
            TokenKind::WhileKeyword => "while",
            TokenKind::WithKeyword => "with",
            TokenKind::YieldKeyword => "yield",
            _ => return None,
        })
    }

    /// Map keyword text to its kind.
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "and" => TokenKind::AndKeyword,
            "as" => TokenKind::AsKeyword,
            "assert" => TokenKind::AssertKeyword,
            "break" => TokenKind::BreakKeyword,
            "class" => TokenKind::ClassKeyword,
            "continue" => TokenKind::ContinueKeyword,
            "def" => TokenKind::DefKeyword,
            "del" => TokenKind::DelKeyword,
            "elif" => TokenKind::ElifKeyword,
            "else" => TokenKind::ElseKeyword,
            "except" => TokenKind::ExceptKeyword,
            "False" => TokenKind::FalseKeyword,
            "finally" => TokenKind::FinallyKeyword,
            "for" => TokenKind::ForKeyword,
            "from" => TokenKind::FromKeyword,
            "global" => TokenKind::GlobalKeyword,
            "if" => TokenKind::IfKeyword,
            "import" => TokenKind::ImportKeyword,
            "in" => TokenKind::InKeyword,
            "is" => TokenKind::IsKeyword,
            "lambda" => TokenKind::LambdaKeyword,
            "None" => TokenKind::NoneKeyword,
            "not" => TokenKind::NotKeyword,
            "or" => TokenKind::OrKeyword,
            "pass" => TokenKind::PassKeyword,
            "raise" => TokenKind::RaiseKeyword,
            "return" => TokenKind::ReturnKeyword,
            "True" => TokenKind::TrueKeyword,
            "try" => TokenKind::TryKeyword,
            "while" => TokenKind::WhileKeyword,
            "with" => TokenKind::WithKeyword,
            "yield" => TokenKind::YieldKeyword,
            _ => return None,
        })
    }

    /// The source text of a punctuation or operator kind.
    pub fn punctuation_text(self) -> Option<&'static str> {
        Some(match self {
            TokenKind::OpenParenToken => "(",
            TokenKind::CloseParenToken => ")",
            TokenKind::OpenBracketToken => "[",
            TokenKind::CloseBracketToken => "]",
            TokenKind::OpenBraceToken => "{",
            TokenKind::CloseBraceToken => "}",
            TokenKind::CommaToken => ",",
            TokenKind::ColonToken => ":",
            TokenKind::SemicolonToken => ";",
            TokenKind::DotToken => ".",
            TokenKind::AtToken => "@",
            TokenKind::PlusToken => "+",
            TokenKind::MinusToken => "-",
            TokenKind::AsteriskToken => "*",
            TokenKind::AsteriskAsteriskToken => "**",
            TokenKind::SlashToken => "/",
            TokenKind::SlashSlashToken => "//",
            TokenKind::PercentToken => "%",
            TokenKind::LessThanLessThanToken => "<<",
            TokenKind::GreaterThanGreaterThanToken => ">>",
            TokenKind::AmpersandToken => "&",
            TokenKind::BarToken => "|",
            TokenKind::CaretToken => "^",
            TokenKind::TildeToken => "~",
            TokenKind::LessThanToken => "<",
            TokenKind::GreaterThanToken => ">",
            TokenKind::LessThanEqualsToken => "<=",
            TokenKind::GreaterThanEqualsToken => ">=",
            TokenKind::EqualsEqualsToken => "==",
            TokenKind::ExclamationEqualsToken => "!=",
            TokenKind::EqualsToken => "=",
            TokenKind::PlusEqualsToken => "+=",
            TokenKind::MinusEqualsToken => "-=",
            TokenKind::AsteriskEqualsToken => "*=",
            TokenKind::AsteriskAsteriskEqualsToken => "**=",
            TokenKind::SlashEqualsToken => "/=",
            TokenKind::SlashSlashEqualsToken => "//=",
            TokenKind::PercentEqualsToken => "%=",
            TokenKind::LessThanLessThanEqualsToken => "<<=",
            TokenKind::GreaterThanGreaterThanEqualsToken => ">>=",
            TokenKind::AmpersandEqualsToken => "&=",
            TokenKind::BarEqualsToken => "|=",
            TokenKind::CaretEqualsToken => "^=",
            _ => return None,
        })
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        if let Some(text) = self.keyword_text().or_else(|| self.punctuation_text()) {
            return text;
        }
        match self {
            TokenKind::Unknown => "unknown token",
            TokenKind::EndOfFileToken => "end of input",
            TokenKind::NewlineToken => "end of line",
            TokenKind::IndentToken => "indent",
            TokenKind::DedentToken => "dedent",
            TokenKind::IntLiteral | TokenKind::FloatLiteral => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::BytesLiteral => "bytes",
            TokenKind::Identifier => "identifier",
            _ => "token",
        }
    }
}
