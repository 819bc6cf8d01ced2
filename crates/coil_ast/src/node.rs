//! AST node definitions for the coil language.
//!
//! Statements and expressions are closed sum types so that grammar additions
//! cannot silently fall through a match. Every variant carries its source
//! range; children are exclusively owned via `Box`/`Vec`. The `Error`
//! variants stand in for recovered-from syntax errors, keeping the tree
//! well-formed so diagnostics can keep rendering.

use crate::types::LanguageFeatures;
use coil_core::text::TextRange;

// ============================================================================
// Operators
// ============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Pos,
    Neg,
    Invert,
}

/// Binary arithmetic and bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    BitXor,
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators, including identity and membership tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    LtE,
    GtE,
    Eq,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

// ============================================================================
// Constants
// ============================================================================

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    None,
    True,
    False,
    /// An integer that fits the small-int range.
    Int(i32),
    /// An integer too large for the small-int range, or one written with an
    /// explicit long suffix. Stored as its decimal digit string.
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

// ============================================================================
// Supporting pieces
// ============================================================================

/// The kind of a formal parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// An ordinary named parameter, possibly with a default.
    Normal,
    /// `*args`.
    Star,
    /// `**kwargs`.
    DoubleStar,
}

/// A formal parameter of a `def` or `lambda`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
    pub kind: ParameterKind,
    pub range: TextRange,
}

/// The kind of an actual argument in a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Positional,
    /// `name=value`.
    Keyword,
    /// `*iterable`.
    Star,
    /// `**mapping`.
    DoubleStar,
}

/// An actual argument in a call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
    pub kind: ArgumentKind,
    pub range: TextRange,
}

/// One `for` or `if` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub enum ComprehensionClause {
    For {
        target: Expr,
        iter: Expr,
        range: TextRange,
    },
    If {
        test: Expr,
        range: TextRange,
    },
}

/// An `if`/`elif` arm of an if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

/// One `except` clause of a try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// The exception type expression, if any (`except Type:`).
    pub typ: Option<Expr>,
    /// The bound target, if any (`except Type as name:`).
    pub name: Option<Expr>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

/// One context-manager item of a with statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
    pub range: TextRange,
}

/// A dotted name with an optional `as` binding in an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportAlias {
    pub name: String,
    pub asname: Option<String>,
    pub range: TextRange,
}

/// A function definition: `def`, or the implicit function synthesized for a
/// generator expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    /// Set when any `yield` occurs in the body (not in nested functions).
    pub is_generator: bool,
    pub range: TextRange,
}

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

// ============================================================================
// Statements
// ============================================================================

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Two or more simple statements joined by `;` on one line. A lone
    /// statement is never wrapped.
    Suite {
        body: Vec<Stmt>,
        range: TextRange,
    },
    Expr {
        value: Expr,
        range: TextRange,
    },
    /// `a = b = value` — one node, multiple targets.
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        range: TextRange,
    },
    AugAssign {
        target: Expr,
        op: BinaryOp,
        value: Expr,
        range: TextRange,
    },
    If {
        branches: Vec<IfBranch>,
        orelse: Vec<Stmt>,
        range: TextRange,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        range: TextRange,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        range: TextRange,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
        range: TextRange,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        range: TextRange,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return {
        value: Option<Expr>,
        range: TextRange,
    },
    Raise {
        exc: Option<Expr>,
        range: TextRange,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
        range: TextRange,
    },
    Global {
        names: Vec<String>,
        range: TextRange,
    },
    Delete {
        targets: Vec<Expr>,
        range: TextRange,
    },
    Import {
        names: Vec<ImportAlias>,
        range: TextRange,
    },
    ImportFrom {
        module: String,
        /// Empty when `is_wildcard` is set.
        names: Vec<ImportAlias>,
        is_wildcard: bool,
        range: TextRange,
    },
    Pass {
        range: TextRange,
    },
    Break {
        range: TextRange,
    },
    Continue {
        range: TextRange,
    },
    /// Placeholder produced after a recovered syntax error.
    Error {
        range: TextRange,
    },
}

impl Stmt {
    /// The source range of this statement.
    pub fn range(&self) -> TextRange {
        match self {
            Stmt::Suite { range, .. }
            | Stmt::Expr { range, .. }
            | Stmt::Assign { range, .. }
            | Stmt::AugAssign { range, .. }
            | Stmt::If { range, .. }
            | Stmt::While { range, .. }
            | Stmt::For { range, .. }
            | Stmt::Try { range, .. }
            | Stmt::With { range, .. }
            | Stmt::Return { range, .. }
            | Stmt::Raise { range, .. }
            | Stmt::Assert { range, .. }
            | Stmt::Global { range, .. }
            | Stmt::Delete { range, .. }
            | Stmt::Import { range, .. }
            | Stmt::ImportFrom { range, .. }
            | Stmt::Pass { range }
            | Stmt::Break { range }
            | Stmt::Continue { range }
            | Stmt::Error { range } => *range,
            Stmt::FunctionDef(def) => def.range,
            Stmt::ClassDef(def) => def.range,
        }
    }

    /// Whether this is a compound (suite-carrying) statement.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Stmt::If { .. }
                | Stmt::While { .. }
                | Stmt::For { .. }
                | Stmt::Try { .. }
                | Stmt::With { .. }
                | Stmt::FunctionDef(_)
                | Stmt::ClassDef(_)
        )
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name {
        id: String,
        range: TextRange,
    },
    Constant {
        value: ConstantValue,
        range: TextRange,
    },
    Tuple {
        elts: Vec<Expr>,
        /// Set for parenthesized tuples eligible for unpacking contexts, as
        /// opposed to plain grouping.
        expandable: bool,
        range: TextRange,
    },
    List {
        elts: Vec<Expr>,
        range: TextRange,
    },
    Set {
        elts: Vec<Expr>,
        range: TextRange,
    },
    Dict {
        keys: Vec<Expr>,
        values: Vec<Expr>,
        range: TextRange,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        range: TextRange,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        range: TextRange,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
        range: TextRange,
    },
    /// A chained comparison: one node referencing every operand, so
    /// `a < b < c` has one left operand plus two (op, comparator) pairs.
    Compare {
        left: Box<Expr>,
        ops: Vec<CompareOp>,
        comparators: Vec<Expr>,
        range: TextRange,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Argument>,
        range: TextRange,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        range: TextRange,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
        range: TextRange,
    },
    /// Appears only as the index of a `Subscript`.
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        range: TextRange,
    },
    Lambda {
        params: Vec<Parameter>,
        body: Box<Expr>,
        /// True when the body contains a `yield`; calling such a lambda
        /// produces a generator.
        is_generator: bool,
        range: TextRange,
    },
    /// `body if test else orelse`.
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        range: TextRange,
    },
    Yield {
        value: Option<Box<Expr>>,
        range: TextRange,
    },
    ListComp {
        element: Box<Expr>,
        clauses: Vec<ComprehensionClause>,
        range: TextRange,
    },
    /// A generator expression, desugared to an implicit generator function.
    ///
    /// The function takes a single parameter bound to `iterable`, which is
    /// the outermost `for` clause's iterable evaluated eagerly at definition
    /// time; inner clause iterables stay inside the function body and are
    /// evaluated lazily at each activation.
    GeneratorExp {
        function: Box<FunctionDef>,
        iterable: Box<Expr>,
        range: TextRange,
    },
    /// Placeholder produced after a recovered syntax error.
    Error {
        range: TextRange,
    },
}

impl Expr {
    /// The source range of this expression.
    pub fn range(&self) -> TextRange {
        match self {
            Expr::Name { range, .. }
            | Expr::Constant { range, .. }
            | Expr::Tuple { range, .. }
            | Expr::List { range, .. }
            | Expr::Set { range, .. }
            | Expr::Dict { range, .. }
            | Expr::UnaryOp { range, .. }
            | Expr::BinaryOp { range, .. }
            | Expr::BoolOp { range, .. }
            | Expr::Compare { range, .. }
            | Expr::Call { range, .. }
            | Expr::Attribute { range, .. }
            | Expr::Subscript { range, .. }
            | Expr::Slice { range, .. }
            | Expr::Lambda { range, .. }
            | Expr::Conditional { range, .. }
            | Expr::Yield { range, .. }
            | Expr::ListComp { range, .. }
            | Expr::GeneratorExp { range, .. }
            | Expr::Error { range } => *range,
        }
    }

    /// A short noun describing this expression, for diagnostics like
    /// "can't assign to literal".
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Name { .. } => "name",
            Expr::Constant { .. } => "literal",
            Expr::Tuple { .. } => "tuple",
            Expr::List { .. } => "list",
            Expr::Set { .. } => "set display",
            Expr::Dict { .. } => "dict display",
            Expr::UnaryOp { .. } | Expr::BinaryOp { .. } => "operator",
            Expr::BoolOp { .. } => "operator",
            Expr::Compare { .. } => "comparison",
            Expr::Call { .. } => "function call",
            Expr::Attribute { .. } => "attribute",
            Expr::Subscript { .. } => "subscript",
            Expr::Slice { .. } => "slice",
            Expr::Lambda { .. } => "lambda",
            Expr::Conditional { .. } => "conditional expression",
            Expr::Yield { .. } => "yield expression",
            Expr::ListComp { .. } => "list comprehension",
            Expr::GeneratorExp { .. } => "generator expression",
            Expr::Error { .. } => "invalid expression",
        }
    }

    /// Whether this expression is a structurally valid assignment target.
    /// Tuples and lists are valid when every element is.
    pub fn is_assignment_target(&self) -> bool {
        match self {
            Expr::Name { .. } | Expr::Attribute { .. } | Expr::Subscript { .. } => true,
            Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
                !elts.is_empty() && elts.iter().all(Expr::is_assignment_target)
            }
            // Recovered placeholders were already reported; don't cascade.
            Expr::Error { .. } => true,
            _ => false,
        }
    }

    /// Whether this expression may be the target of an augmented assignment.
    /// Unlike plain assignment, tuple/list targets are not allowed.
    pub fn is_augmented_assignment_target(&self) -> bool {
        matches!(
            self,
            Expr::Name { .. } | Expr::Attribute { .. } | Expr::Subscript { .. } | Expr::Error { .. }
        )
    }
}

// ============================================================================
// Module
// ============================================================================

/// A parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub range: TextRange,
    /// Whether this unit was parsed as a whole module (as opposed to a
    /// single interactive chunk or bare expression).
    pub is_module: bool,
    /// Features enabled by `from __future__ import` statements.
    pub features: LanguageFeatures,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: &str) -> Expr {
        Expr::Name {
            id: id.to_string(),
            range: TextRange::empty(0),
        }
    }

    #[test]
    fn assignment_target_validity() {
        assert!(name("x").is_assignment_target());
        let tuple = Expr::Tuple {
            elts: vec![name("a"), name("b")],
            expandable: true,
            range: TextRange::empty(0),
        };
        assert!(tuple.is_assignment_target());
        assert!(!tuple.is_augmented_assignment_target());

        let call = Expr::Call {
            func: Box::new(name("f")),
            args: vec![],
            range: TextRange::empty(0),
        };
        assert!(!call.is_assignment_target());
        assert_eq!(call.describe(), "function call");
    }

    #[test]
    fn compound_statement_predicate() {
        let pass = Stmt::Pass {
            range: TextRange::empty(0),
        };
        assert!(!pass.is_compound());
    }
}
