//! Parser integration tests.
//!
//! Verifies statement and expression structure, validation diagnostics, and
//! error recovery over whole-module parses.

use coil_ast::node::*;
use coil_ast::types::LanguageFeatures;
use coil_diagnostics::{DiagnosticCollection, ErrorCodes};
use coil_lexer::Lexer;
use coil_parser::{parse_module_bytes, Parser};

/// Helper: parse a module, returning it with the collected diagnostics.
fn parse(source: &str) -> (Module, DiagnosticCollection) {
    let mut sink = DiagnosticCollection::new();
    let lexer = Lexer::new(source, "<test>");
    let module = Parser::new(lexer, &mut sink)
        .parse_module()
        .expect("fatal parse error");
    (module, sink)
}

/// Helper: parse a module that must produce no errors.
fn parse_ok(source: &str) -> Module {
    let (module, diags) = parse(source);
    assert!(
        !diags.has_errors(),
        "unexpected errors in {:?}: {:?}",
        source,
        diags.diagnostics()
    );
    module
}

/// Helper: parse a single statement.
fn stmt(source: &str) -> Stmt {
    let mut module = parse_ok(source);
    assert_eq!(module.body.len(), 1, "expected one statement in {:?}", source);
    module.body.pop().unwrap()
}

/// Helper: parse a single expression statement and return its expression.
fn expr(source: &str) -> Expr {
    match stmt(source) {
        Stmt::Expr { value, .. } => value,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

/// Helper: parse and return the codes of all error diagnostics.
fn error_codes(source: &str) -> Vec<u32> {
    let (_, diags) = parse(source);
    diags
        .diagnostics()
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.code)
        .collect()
}

fn name_of(expr: &Expr) -> &str {
    match expr {
        Expr::Name { id, .. } => id,
        other => panic!("expected name, got {:?}", other),
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match expr("1 + 2 * 3") {
        Expr::BinaryOp {
            op: BinaryOp::Add,
            right,
            ..
        } => {
            assert!(matches!(
                *right,
                Expr::BinaryOp {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_parenthesized_grouping() {
    match expr("(1 + 2) * 3") {
        Expr::BinaryOp {
            op: BinaryOp::Mul,
            left,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::BinaryOp {
                    op: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_power_is_right_associative() {
    match expr("2 ** 3 ** 2") {
        Expr::BinaryOp {
            op: BinaryOp::Pow,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Constant {
                    value: ConstantValue::Int(2),
                    ..
                }
            ));
            assert!(matches!(
                *right,
                Expr::BinaryOp {
                    op: BinaryOp::Pow,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_unary_minus_binds_looser_than_power() {
    match expr("-2 ** 2") {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand,
            ..
        } => {
            assert!(matches!(
                *operand,
                Expr::BinaryOp {
                    op: BinaryOp::Pow,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_chained_comparison_is_one_node() {
    match expr("a < b <= c") {
        Expr::Compare {
            left,
            ops,
            comparators,
            ..
        } => {
            assert_eq!(name_of(&left), "a");
            assert_eq!(ops, vec![CompareOp::Lt, CompareOp::LtE]);
            assert_eq!(comparators.len(), 2);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_membership_and_identity_operators() {
    match expr("a not in b") {
        Expr::Compare { ops, .. } => assert_eq!(ops, vec![CompareOp::NotIn]),
        other => panic!("unexpected shape: {:?}", other),
    }
    match expr("a is not b") {
        Expr::Compare { ops, .. } => assert_eq!(ops, vec![CompareOp::IsNot]),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_boolean_operators_flatten() {
    match expr("a or b or c") {
        Expr::BoolOp {
            op: BoolOp::Or,
            values,
            ..
        } => assert_eq!(values.len(), 3),
        other => panic!("unexpected shape: {:?}", other),
    }
    // `and` binds tighter than `or`.
    match expr("a or b and c") {
        Expr::BoolOp {
            op: BoolOp::Or,
            values,
            ..
        } => {
            assert_eq!(values.len(), 2);
            assert!(matches!(
                values[1],
                Expr::BoolOp {
                    op: BoolOp::And,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_not_applies_to_whole_comparison() {
    match expr("not a == b") {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            operand,
            ..
        } => assert!(matches!(*operand, Expr::Compare { .. })),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_conditional_expression() {
    match expr("a if b else c") {
        Expr::Conditional {
            test, body, orelse, ..
        } => {
            assert_eq!(name_of(&test), "b");
            assert_eq!(name_of(&body), "a");
            assert_eq!(name_of(&orelse), "c");
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_lambda() {
    match expr("lambda x, y=1: x") {
        Expr::Lambda {
            params,
            body,
            is_generator,
            ..
        } => {
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].name, "x");
            assert!(params[0].default.is_none());
            assert!(params[1].default.is_some());
            assert_eq!(name_of(&body), "x");
            assert!(!is_generator);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_yield_in_lambda_marks_generator_lambda() {
    // The yield belongs to the lambda, not the enclosing def.
    let module = parse_ok("def f():\n    g = lambda: (yield 1)\n");
    match &module.body[0] {
        Stmt::FunctionDef(def) => {
            assert!(!def.is_generator);
            match &def.body[0] {
                Stmt::Assign { value, .. } => {
                    assert!(matches!(value, Expr::Lambda { is_generator: true, .. }));
                }
                other => panic!("unexpected shape: {:?}", other),
            }
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_trailer_chain() {
    match expr("a.b(c).d[0]") {
        Expr::Subscript { value, .. } => match *value {
            Expr::Attribute { attr, value, .. } => {
                assert_eq!(attr, "d");
                assert!(matches!(*value, Expr::Call { .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        },
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_slices() {
    match expr("a[1:2:3]") {
        Expr::Subscript { index, .. } => match *index {
            Expr::Slice {
                lower, upper, step, ..
            } => {
                assert!(lower.is_some());
                assert!(upper.is_some());
                assert!(step.is_some());
            }
            other => panic!("unexpected shape: {:?}", other),
        },
        other => panic!("unexpected shape: {:?}", other),
    }
    match expr("a[:]") {
        Expr::Subscript { index, .. } => {
            assert!(matches!(
                *index,
                Expr::Slice {
                    lower: None,
                    upper: None,
                    step: None,
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    // A comma in a subscript builds a tuple index.
    match expr("a[1, 2]") {
        Expr::Subscript { index, .. } => {
            assert!(matches!(*index, Expr::Tuple { ref elts, .. } if elts.len() == 2));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_subscript_trailing_comma_builds_tuple() {
    // `a[1,]` subscripts with the one-element tuple `(1,)`.
    match expr("a[1,]") {
        Expr::Subscript { index, .. } => {
            assert!(matches!(*index, Expr::Tuple { ref elts, .. } if elts.len() == 1));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    // Without the comma the index stays a bare expression.
    match expr("a[1]") {
        Expr::Subscript { index, .. } => {
            assert!(matches!(*index, Expr::Constant { .. }));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_displays() {
    assert!(matches!(expr("[1, 2, 3]"), Expr::List { ref elts, .. } if elts.len() == 3));
    assert!(matches!(expr("{1, 2}"), Expr::Set { ref elts, .. } if elts.len() == 2));
    match expr("{1: 2, 3: 4}") {
        Expr::Dict { keys, values, .. } => {
            assert_eq!(keys.len(), 2);
            assert_eq!(values.len(), 2);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    // Empty braces are a dict, not a set.
    assert!(matches!(expr("{}"), Expr::Dict { ref keys, .. } if keys.is_empty()));
}

#[test]
fn test_tuples() {
    match expr("()") {
        Expr::Tuple {
            elts, expandable, ..
        } => {
            assert!(elts.is_empty());
            assert!(!expandable);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    assert!(
        matches!(expr("(1, 2)"), Expr::Tuple { ref elts, expandable: true, .. } if elts.len() == 2)
    );
    // A trailing comma makes a one-element tuple.
    assert!(
        matches!(expr("(1,)"), Expr::Tuple { ref elts, expandable: true, .. } if elts.len() == 1)
    );
}

#[test]
fn test_bare_tuple_assignment() {
    match stmt("x = 1, 2") {
        Stmt::Assign { value, .. } => {
            assert!(
                matches!(value, Expr::Tuple { ref elts, expandable: true, .. } if elts.len() == 2)
            );
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_string_concatenation() {
    match expr("'a' 'b'") {
        Expr::Constant {
            value: ConstantValue::Str(s),
            ..
        } => assert_eq!(s, "ab"),
        other => panic!("unexpected shape: {:?}", other),
    }
    match expr("b'a' b'b'") {
        Expr::Constant {
            value: ConstantValue::Bytes(b),
            ..
        } => assert_eq!(b, b"ab"),
        other => panic!("unexpected shape: {:?}", other),
    }
    // Mixing str and bytes yields a str.
    assert!(matches!(
        expr("'a' b'b'"),
        Expr::Constant {
            value: ConstantValue::Str(_),
            ..
        }
    ));
}

#[test]
fn test_negated_int_min_stays_small() {
    match expr("-2147483648") {
        Expr::Constant {
            value: ConstantValue::Int(v),
            ..
        } => assert_eq!(v, i32::MIN),
        other => panic!("unexpected shape: {:?}", other),
    }
    // Without the minus the magnitude overflows the small range.
    assert!(matches!(
        expr("2147483648"),
        Expr::Constant {
            value: ConstantValue::BigInt(_),
            ..
        }
    ));
    // One less stays an ordinary negation.
    assert!(matches!(
        expr("-2147483647"),
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            ..
        }
    ));
    // An explicit long suffix keeps the big representation.
    match expr("-2147483648L") {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            operand,
            ..
        } => assert!(matches!(
            *operand,
            Expr::Constant {
                value: ConstantValue::BigInt(_),
                ..
            }
        )),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_list_comprehension() {
    match expr("[x * 2 for x in y if x]") {
        Expr::ListComp { clauses, .. } => {
            assert_eq!(clauses.len(), 2);
            assert!(matches!(clauses[0], ComprehensionClause::For { .. }));
            assert!(matches!(clauses[1], ComprehensionClause::If { .. }));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_generator_expression_desugars_to_function() {
    match expr("(x for x in y)") {
        Expr::GeneratorExp {
            function, iterable, ..
        } => {
            assert_eq!(function.name, "<genexpr>");
            assert!(function.is_generator);
            assert_eq!(function.params.len(), 1);
            assert_eq!(function.params[0].name, ".0");
            // The outermost iterable is hoisted to the call site.
            assert_eq!(name_of(&iterable), "y");
            // The body iterates the parameter, not the original iterable.
            match &function.body[0] {
                Stmt::For { iter, body, .. } => {
                    assert_eq!(name_of(iter), ".0");
                    assert!(matches!(
                        body[0],
                        Stmt::Expr {
                            value: Expr::Yield { .. },
                            ..
                        }
                    ));
                }
                other => panic!("unexpected body: {:?}", other),
            }
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_generator_expression_as_sole_call_argument() {
    match expr("sum(x for x in y)") {
        Expr::Call { args, .. } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(args[0].value, Expr::GeneratorExp { .. }));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_assignment_chain() {
    match stmt("a = b = 1") {
        Stmt::Assign { targets, value, .. } => {
            assert_eq!(targets.len(), 2);
            assert!(matches!(
                value,
                Expr::Constant {
                    value: ConstantValue::Int(1),
                    ..
                }
            ));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_augmented_assignment() {
    match stmt("x += 1") {
        Stmt::AugAssign {
            op: BinaryOp::Add, ..
        } => {}
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("x //= 2") {
        Stmt::AugAssign {
            op: BinaryOp::FloorDiv,
            ..
        } => {}
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_semicolons_build_a_suite() {
    match stmt("a = 1; b = 2") {
        Stmt::Suite { body, .. } => assert_eq!(body.len(), 2),
        other => panic!("unexpected shape: {:?}", other),
    }
    // A trailing semicolon does not wrap a lone statement.
    assert!(matches!(stmt("a = 1;"), Stmt::Assign { .. }));
}

#[test]
fn test_if_elif_else() {
    let source = "if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n";
    match stmt(source) {
        Stmt::If {
            branches, orelse, ..
        } => {
            assert_eq!(branches.len(), 2);
            assert_eq!(orelse.len(), 1);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_same_line_suite() {
    match stmt("if x: y = 1; z = 2\n") {
        Stmt::If { branches, .. } => assert_eq!(branches[0].body.len(), 2),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_loops_with_else() {
    match stmt("while x:\n    break\nelse:\n    pass\n") {
        Stmt::While { orelse, .. } => assert_eq!(orelse.len(), 1),
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("for i in x:\n    continue\nelse:\n    pass\n") {
        Stmt::For { orelse, .. } => assert_eq!(orelse.len(), 1),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_for_unpacks_tuple_target() {
    match stmt("for k, v in items:\n    pass\n") {
        Stmt::For { target, .. } => {
            assert!(matches!(target, Expr::Tuple { ref elts, .. } if elts.len() == 2));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_try_statement() {
    let source = "\
try:
    pass
except ValueError as e:
    pass
else:
    pass
finally:
    pass
";
    match stmt(source) {
        Stmt::Try {
            handlers,
            orelse,
            finalbody,
            ..
        } => {
            assert_eq!(handlers.len(), 1);
            assert!(handlers[0].typ.is_some());
            assert!(matches!(handlers[0].name, Some(Expr::Name { ref id, .. }) if id == "e"));
            assert_eq!(orelse.len(), 1);
            assert_eq!(finalbody.len(), 1);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    // Old-style comma binding of the exception target.
    match stmt("try:\n    pass\nexcept ValueError, e:\n    pass\n") {
        Stmt::Try { handlers, .. } => {
            assert!(matches!(handlers[0].name, Some(Expr::Name { ref id, .. }) if id == "e"));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_try_requires_except_or_finally() {
    assert!(error_codes("try:\n    pass\n").contains(&1102));
}

#[test]
fn test_with_statement() {
    match stmt("with open(p) as f, lock:\n    pass\n") {
        Stmt::With { items, .. } => {
            assert_eq!(items.len(), 2);
            assert!(items[0].target.is_some());
            assert!(items[1].target.is_none());
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_function_def() {
    match stmt("def f(a, b=1, *args, **kwargs):\n    return a\n") {
        Stmt::FunctionDef(def) => {
            assert_eq!(def.name, "f");
            assert_eq!(def.params.len(), 4);
            assert_eq!(def.params[1].default.is_some(), true);
            assert_eq!(def.params[2].kind, ParameterKind::Star);
            assert_eq!(def.params[3].kind, ParameterKind::DoubleStar);
            assert!(!def.is_generator);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_yield_marks_generator() {
    match stmt("def f():\n    yield 1\n") {
        Stmt::FunctionDef(def) => assert!(def.is_generator),
        other => panic!("unexpected shape: {:?}", other),
    }
    // A bare return inside a generator is fine.
    parse_ok("def f():\n    yield 1\n    return\n");
}

#[test]
fn test_decorators() {
    match stmt("@dec(1)\n@mod.other\ndef f():\n    pass\n") {
        Stmt::FunctionDef(def) => {
            assert_eq!(def.decorators.len(), 2);
            assert!(matches!(def.decorators[0], Expr::Call { .. }));
            assert!(matches!(def.decorators[1], Expr::Attribute { .. }));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("@register\nclass C:\n    pass\n") {
        Stmt::ClassDef(def) => assert_eq!(def.decorators.len(), 1),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_class_def() {
    match stmt("class C(Base, mixin.M):\n    pass\n") {
        Stmt::ClassDef(def) => {
            assert_eq!(def.name, "C");
            assert_eq!(def.bases.len(), 2);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_imports() {
    match stmt("import a.b.c as m, d") {
        Stmt::Import { names, .. } => {
            assert_eq!(names.len(), 2);
            assert_eq!(names[0].name, "a.b.c");
            assert_eq!(names[0].asname.as_deref(), Some("m"));
            assert!(names[1].asname.is_none());
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("from a.b import (c, d,)") {
        Stmt::ImportFrom { module, names, .. } => {
            assert_eq!(module, "a.b");
            assert_eq!(names.len(), 2);
        }
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("from a import *") {
        Stmt::ImportFrom { is_wildcard, .. } => assert!(is_wildcard),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_global_and_del() {
    match stmt("global a, b") {
        Stmt::Global { names, .. } => assert_eq!(names, vec!["a", "b"]),
        other => panic!("unexpected shape: {:?}", other),
    }
    match stmt("del x, y[0]") {
        Stmt::Delete { targets, .. } => assert_eq!(targets.len(), 2),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_assert_raise() {
    match stmt("assert x, 'message'") {
        Stmt::Assert { msg, .. } => assert!(msg.is_some()),
        other => panic!("unexpected shape: {:?}", other),
    }
    assert!(matches!(stmt("raise"), Stmt::Raise { exc: None, .. }));
    assert!(matches!(stmt("raise E(1)"), Stmt::Raise { exc: Some(_), .. }));
}

// ============================================================================
// Private name mangling
// ============================================================================

#[test]
fn test_private_names_are_mangled_inside_classes() {
    let module = parse_ok("class Foo:\n    def meth(self):\n        return self.__x\n");
    let Stmt::ClassDef(class) = &module.body[0] else {
        panic!("expected class");
    };
    let Stmt::FunctionDef(meth) = &class.body[0] else {
        panic!("expected method");
    };
    match &meth.body[0] {
        Stmt::Return {
            value: Some(Expr::Attribute { attr, .. }),
            ..
        } => assert_eq!(attr, "_Foo__x"),
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_dunder_names_are_not_mangled() {
    let module = parse_ok("class Foo:\n    def __init__(self):\n        pass\n");
    let Stmt::ClassDef(class) = &module.body[0] else {
        panic!("expected class");
    };
    let Stmt::FunctionDef(meth) = &class.body[0] else {
        panic!("expected method");
    };
    assert_eq!(meth.name, "__init__");
}

#[test]
fn test_mangling_strips_leading_underscores_from_class_name() {
    let module = parse_ok("class _Foo:\n    __x = 1\n");
    let Stmt::ClassDef(class) = &module.body[0] else {
        panic!("expected class");
    };
    match &class.body[0] {
        Stmt::Assign { targets, .. } => {
            assert!(matches!(targets[0], Expr::Name { ref id, .. } if id == "_Foo__x"));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_all_underscore_class_name_disables_mangling() {
    let module = parse_ok("class __:\n    __x = 1\n");
    let Stmt::ClassDef(class) = &module.body[0] else {
        panic!("expected class");
    };
    match &class.body[0] {
        Stmt::Assign { targets, .. } => {
            assert!(matches!(targets[0], Expr::Name { ref id, .. } if id == "__x"));
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_import_names_are_not_mangled() {
    let module = parse_ok("class Foo:\n    import __m\n");
    let Stmt::ClassDef(class) = &module.body[0] else {
        panic!("expected class");
    };
    match &class.body[0] {
        Stmt::Import { names, .. } => assert_eq!(names[0].name, "__m"),
        other => panic!("unexpected shape: {:?}", other),
    }
}

// ============================================================================
// Statement legality
// ============================================================================

#[test]
fn test_break_and_continue_placement() {
    assert!(error_codes("break\n").contains(&1140));
    assert!(error_codes("continue\n").contains(&1141));
    let source = "\
while 1:
    try:
        pass
    finally:
        continue
";
    assert!(error_codes(source).contains(&1142));
    // A loop inside the finally clause makes continue legal again.
    parse_ok("try:\n    pass\nfinally:\n    for i in x:\n        continue\n");
}

#[test]
fn test_return_and_yield_placement() {
    assert!(error_codes("return 1\n").contains(&1143));
    assert!(error_codes("yield 1\n").contains(&1145));
    assert!(error_codes("def f():\n    yield 1\n    return 2\n").contains(&1144));
}

#[test]
fn test_class_body_masks_function_context() {
    // A class inside a function does not inherit return legality.
    let source = "\
def f():
    class C:
        return 1
";
    assert!(error_codes(source).contains(&1143));
}

// ============================================================================
// Target validation
// ============================================================================

#[test]
fn test_invalid_assignment_targets() {
    assert!(error_codes("1 = x\n").contains(&1120));
    assert!(error_codes("x + y = 1\n").contains(&1120));
    assert!(error_codes("f() = 1\n").contains(&1120));
    assert!(error_codes("for 1 in x:\n    pass\n").contains(&1120));
}

#[test]
fn test_invalid_augmented_targets() {
    assert!(error_codes("1 += 2\n").contains(&1121));
    // Tuples take plain assignment but not augmented assignment.
    assert!(error_codes("(a, b) += 1\n").contains(&1121));
    parse_ok("a, b = 1, 2\n");
}

#[test]
fn test_invalid_delete_targets() {
    assert!(error_codes("del 1 + 2\n").contains(&1122));
    assert!(error_codes("del f()\n").contains(&1122));
}

// ============================================================================
// Parameter and argument validation
// ============================================================================

#[test]
fn test_duplicate_parameter() {
    assert!(error_codes("def f(a, a):\n    pass\n").contains(&1160));
    assert!(error_codes("lambda a, a: a\n").contains(&1160));
}

#[test]
fn test_non_default_after_default() {
    assert!(error_codes("def f(a=1, b):\n    pass\n").contains(&1161));
}

#[test]
fn test_call_argument_validation() {
    assert!(error_codes("f(a=1, a=2)\n").contains(&1162));
    assert!(error_codes("f(a=1, b)\n").contains(&1163));
    assert!(error_codes("f(*a, *b)\n").contains(&1164));
    assert!(error_codes("f(**a, **b)\n").contains(&1165));
    assert!(error_codes("f(1 + 2 = 3)\n").contains(&1166));
    parse_ok("f(1, b=2, *rest, **extra)\n");
}

// ============================================================================
// Future imports
// ============================================================================

#[test]
fn test_future_import_sets_feature() {
    let module = parse_ok("from __future__ import division\nx = 1 / 2\n");
    assert!(module.features.contains(LanguageFeatures::DIVISION));
}

#[test]
fn test_future_import_allowed_after_docstring() {
    let module = parse_ok("'''doc'''\nfrom __future__ import generators, division\n");
    assert!(module.features.contains(LanguageFeatures::GENERATORS));
    assert!(module.features.contains(LanguageFeatures::DIVISION));
}

#[test]
fn test_future_import_must_be_first() {
    assert!(error_codes("x = 1\nfrom __future__ import division\n").contains(&1180));
}

#[test]
fn test_unknown_future_feature() {
    assert!(error_codes("from __future__ import braces\n").contains(&1181));
    assert!(error_codes("from __future__ import *\n").contains(&1181));
}

// ============================================================================
// Error recovery
// ============================================================================

#[test]
fn test_recovery_continues_past_bad_line() {
    let (module, diags) = parse("x = = 1\ny = 2\n");
    assert!(diags.has_errors());
    assert_eq!(module.body.len(), 2);
    assert!(matches!(module.body[1], Stmt::Assign { .. }));
}

#[test]
fn test_dangling_decorator_reports_and_recovers() {
    let (module, diags) = parse("@foo\nx = 1\n");
    assert!(diags.diagnostics().iter().any(|d| d.code == 1104));
    assert!(matches!(module.body[0], Stmt::Error { .. }));
}

#[test]
fn test_deep_nesting_is_reported() {
    let source = "(".repeat(300);
    assert!(error_codes(&source).contains(&1109));
}

#[test]
fn test_deep_unary_chain_is_reported() {
    // Long runs of prefix operators must hit the depth limit, not the stack.
    let source = format!("{}1\n", "~".repeat(100_000));
    assert!(error_codes(&source).contains(&1109));
    let source = format!("{}1\n", "-".repeat(100_000));
    assert!(error_codes(&source).contains(&1109));
    let source = format!("{}1\n", "not ".repeat(10_000));
    assert!(error_codes(&source).contains(&1109));
}

#[test]
fn test_deep_power_chain_is_reported() {
    let source = format!("{}1\n", "1 ** ".repeat(10_000));
    assert!(error_codes(&source).contains(&1109));
}

#[test]
fn test_deep_statement_nesting_is_reported() {
    let mut source = String::new();
    for level in 0..300 {
        source.push_str(&"    ".repeat(level));
        source.push_str("if x:\n");
    }
    assert!(error_codes(&source).contains(&1109));
}

#[test]
fn test_missing_indented_block() {
    let (module, diags) = parse("if x:\nelse:\n    pass\n");
    assert!(diags.diagnostics().iter().any(|d| d.code == 1107));
    assert_eq!(module.body.len(), 1);
}

#[test]
fn test_missing_suite_colon_reports_and_recovers() {
    let (module, diags) = parse("while x pass\n");
    assert!(diags.diagnostics().iter().any(|d| d.code == 1102));
    assert!(matches!(module.body[0], Stmt::While { .. }));
}

// ============================================================================
// Entry points
// ============================================================================

#[test]
fn test_parse_expression_only() {
    let mut sink = DiagnosticCollection::new();
    let lexer = Lexer::new("1 + 2", "<test>");
    let expr = Parser::new(lexer, &mut sink)
        .parse_expression_only()
        .unwrap();
    assert!(!sink.has_errors());
    assert!(matches!(
        expr,
        Expr::BinaryOp {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn test_parse_expression_only_rejects_trailing_input() {
    let mut sink = DiagnosticCollection::new();
    let lexer = Lexer::new("1 if\n", "<test>");
    let _ = Parser::new(lexer, &mut sink).parse_expression_only();
    assert!(sink.has_errors());
}

#[test]
fn test_parse_single_statement() {
    let mut sink = DiagnosticCollection::new();
    let lexer = Lexer::new("\nx = 1\n", "<test>");
    let stmt = Parser::new(lexer, &mut sink)
        .parse_single_statement()
        .unwrap();
    assert!(!sink.has_errors());
    assert!(matches!(stmt, Stmt::Assign { .. }));
}

#[test]
fn test_reset_clears_session_state() {
    let mut sink = DiagnosticCollection::new();
    let lexer = Lexer::new("1 +\n", "<test>");
    let mut parser = Parser::new(lexer, &mut sink);
    let _ = parser.parse_module();
    assert_ne!(parser.primary_error_code(), ErrorCodes::NONE);

    parser.reset(Lexer::new("x = 1\n", "<test>"));
    let module = parser.parse_module().unwrap();
    assert_eq!(parser.primary_error_code(), ErrorCodes::NONE);
    assert_eq!(module.body.len(), 1);
}

#[test]
fn test_invalid_utf8_is_fatal() {
    let mut sink = DiagnosticCollection::new();
    let err = parse_module_bytes(b"x = 1\n\xff\xfe", "<test>", &mut sink).unwrap_err();
    assert_eq!(err.diagnostic.code, 1011);
}

#[test]
fn test_statement_spans_cover_source() {
    let module = parse_ok("x = 1\ny = 2\n");
    let first = module.body[0].range();
    let second = module.body[1].range();
    assert_eq!(first.pos, 0);
    assert_eq!(first.end, 5);
    assert_eq!(second.pos, 6);
    assert_eq!(second.end, 11);
}
