use loxide as lox;

use lox::ast_printer::AstPrinter;
use lox::error::ErrorReporter;
use lox::expr::Expr;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::stmt::Stmt;

fn parse(source: &str) -> (Vec<Stmt>, ErrorReporter) {
    let mut reporter = ErrorReporter::new();
    let tokens = Scanner::new(source, &mut reporter).scan_tokens();
    let statements = Parser::new(tokens, &mut reporter).parse();
    (statements, reporter)
}

/// Parses a single expression statement and renders it in prefix form.
fn parse_expression(source: &str) -> String {
    let (statements, reporter) = parse(source);

    assert!(!reporter.had_error, "unexpected parse error for {:?}", source);
    assert_eq!(statements.len(), 1);

    match &statements[0] {
        Stmt::Expression(expr) => AstPrinter::print(expr),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(parse_expression("1 + 2 * 3;"), "(+ 1.0 (* 2.0 3.0))");
}

#[test]
fn binary_operators_are_left_associative() {
    assert_eq!(parse_expression("1 - 2 - 3;"), "(- (- 1.0 2.0) 3.0)");
    assert_eq!(parse_expression("8 / 4 / 2;"), "(/ (/ 8.0 4.0) 2.0)");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(parse_expression("a = b = 1;"), "(= a (= b 1.0))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(parse_expression("(1 + 2) * 3;"), "(* (group (+ 1.0 2.0)) 3.0)");
}

#[test]
fn comparison_and_equality_nest_correctly() {
    assert_eq!(
        parse_expression("1 < 2 == true;"),
        "(== (< 1.0 2.0) true)"
    );
}

#[test]
fn unary_operators_nest() {
    assert_eq!(parse_expression("!!true;"), "(! (! true))");
    assert_eq!(parse_expression("--1;"), "(- (- 1.0))");
}

#[test]
fn logical_operators_keep_their_precedence() {
    assert_eq!(
        parse_expression("a or b and c;"),
        "(or a (and b c))"
    );
}

#[test]
fn calls_and_property_access_chain() {
    assert_eq!(
        parse_expression("object.method(1)(2);"),
        "(call (call (. object method) 1.0) 2.0)"
    );
}

#[test]
fn property_assignment_becomes_set() {
    assert_eq!(
        parse_expression("object.field = 1;"),
        "(.= object field 1.0)"
    );
}

#[test]
fn super_and_this_parse_in_expressions() {
    assert_eq!(parse_expression("this.x;"), "(. this x)");
    assert_eq!(parse_expression("super.say();"), "(call (super say))");
}

#[test]
fn invalid_assignment_target_is_reported_but_not_fatal() {
    let (statements, reporter) = parse("1 = 2; print 3;");

    assert!(reporter.had_error);
    assert!(reporter
        .diagnostics
        .iter()
        .any(|d| d.contains("Invalid assignment target.")));

    // The right-hand side was consumed, so parsing picked up cleanly at the
    // next statement.
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[1], Stmt::Print(_)));
}

#[test]
fn parse_errors_do_not_hide_later_ones() {
    let (statements, reporter) = parse("var 1 = x;\nprint +;\nvar ok = 1;");

    assert!(reporter.had_error);
    assert_eq!(reporter.diagnostics.len(), 2);
    assert!(reporter.diagnostics[0].contains("Expect variable name."));
    assert!(reporter.diagnostics[1].contains("Expect expression."));

    // The healthy declaration still parsed.
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Var { .. }));
}

#[test]
fn error_at_end_of_input() {
    let (_, reporter) = parse("print 1");

    assert!(reporter.had_error);
    assert!(reporter.diagnostics[0].contains("at end"));
}

#[test]
fn for_desugars_into_block_and_while() {
    let (statements, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print i;");

    assert!(!reporter.had_error);
    assert_eq!(statements.len(), 1);

    let inner = match &statements[0] {
        Stmt::Block(inner) => inner,
        other => panic!("expected outer block, got {:?}", other),
    };
    assert_eq!(inner.len(), 2);
    assert!(matches!(inner[0], Stmt::Var { .. }));

    let (condition, body) = match &inner[1] {
        Stmt::While { condition, body } => (condition, body),
        other => panic!("expected while loop, got {:?}", other),
    };
    assert_eq!(AstPrinter::print(condition), "(< i 3.0)");

    // Body block pairs the original statement with the increment.
    let body = match body.as_ref() {
        Stmt::Block(body) => body,
        other => panic!("expected body block, got {:?}", other),
    };
    assert_eq!(body.len(), 2);
    assert!(matches!(body[0], Stmt::Print(_)));
    match &body[1] {
        Stmt::Expression(expr) => assert_eq!(AstPrinter::print(expr), "(= i (+ i 1.0))"),
        other => panic!("expected increment expression, got {:?}", other),
    }
}

#[test]
fn for_without_condition_loops_on_true() {
    let (statements, reporter) = parse("for (;;) print 1;");

    assert!(!reporter.had_error);
    match &statements[0] {
        Stmt::While { condition, .. } => {
            assert!(matches!(condition, Expr::Literal(_)));
            assert_eq!(AstPrinter::print(condition), "true");
        }
        other => panic!("expected bare while loop, got {:?}", other),
    }
}

#[test]
fn class_declarations_parse_with_superclass_and_methods() {
    let (statements, reporter) = parse("class B < A { init(x) {} say() {} }");

    assert!(!reporter.had_error);
    match &statements[0] {
        Stmt::Class {
            name,
            superclass,
            methods,
        } => {
            assert_eq!(name.lexeme, "B");
            assert!(matches!(superclass, Some(Expr::Variable { .. })));
            assert_eq!(methods.len(), 2);
            assert_eq!(methods[0].name.lexeme, "init");
            assert_eq!(methods[0].params.len(), 1);
            assert_eq!(methods[1].name.lexeme, "say");
        }
        other => panic!("expected class declaration, got {:?}", other),
    }
}

#[test]
fn function_declarations_parse() {
    let (statements, reporter) = parse("fun add(a, b) { return a + b; }");

    assert!(!reporter.had_error);
    match &statements[0] {
        Stmt::Function(declaration) => {
            assert_eq!(declaration.name.lexeme, "add");
            assert_eq!(declaration.params.len(), 2);
            assert_eq!(declaration.body.len(), 1);
            assert!(matches!(declaration.body[0], Stmt::Return { .. }));
        }
        other => panic!("expected function declaration, got {:?}", other),
    }
}
