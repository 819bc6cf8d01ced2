//! Operator precedence for binary operators.

use coil_ast::token_kind::TokenKind;

/// Operator precedence levels, loosest binding first.
///
/// Only the arithmetic and bitwise levels participate in precedence
/// climbing; boolean operators, comparisons, conditionals, and `lambda` are
/// parsed structurally above, and exponentiation structurally below, so
/// their levels here are documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[allow(dead_code)]
pub enum OperatorPrecedence {
    Lowest = 0,
    Lambda = 1,
    Conditional = 2,
    LogicalOr = 3,
    LogicalAnd = 4,
    LogicalNot = 5,
    Comparison = 6,
    BitwiseOr = 7,
    BitwiseXor = 8,
    BitwiseAnd = 9,
    Shift = 10,
    Additive = 11,
    Multiplicative = 12,
    Unary = 13,
    Exponentiation = 14,
    Highest = 15,
    Invalid = 255,
}

impl OperatorPrecedence {
    /// The next-tighter climbing level, used as the minimum for the right
    /// operand of a left-associative operator.
    pub fn one_higher(self) -> OperatorPrecedence {
        match self {
            OperatorPrecedence::BitwiseOr => OperatorPrecedence::BitwiseXor,
            OperatorPrecedence::BitwiseXor => OperatorPrecedence::BitwiseAnd,
            OperatorPrecedence::BitwiseAnd => OperatorPrecedence::Shift,
            OperatorPrecedence::Shift => OperatorPrecedence::Additive,
            OperatorPrecedence::Additive => OperatorPrecedence::Multiplicative,
            OperatorPrecedence::Multiplicative => OperatorPrecedence::Unary,
            other => other,
        }
    }
}

/// Get the climbing precedence for a binary operator token, or `Invalid` for
/// tokens that are not climbing binary operators.
pub fn get_binary_operator_precedence(kind: TokenKind) -> OperatorPrecedence {
    match kind {
        TokenKind::BarToken => OperatorPrecedence::BitwiseOr,
        TokenKind::CaretToken => OperatorPrecedence::BitwiseXor,
        TokenKind::AmpersandToken => OperatorPrecedence::BitwiseAnd,
        TokenKind::LessThanLessThanToken | TokenKind::GreaterThanGreaterThanToken => {
            OperatorPrecedence::Shift
        }
        TokenKind::PlusToken | TokenKind::MinusToken => OperatorPrecedence::Additive,
        TokenKind::AsteriskToken
        | TokenKind::SlashToken
        | TokenKind::SlashSlashToken
        | TokenKind::PercentToken => OperatorPrecedence::Multiplicative,
        _ => OperatorPrecedence::Invalid,
    }
}
