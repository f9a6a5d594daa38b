use loxide as lox;

use lox::error::ErrorReporter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;

/// Runs scan + parse + resolve and returns the reporter for inspection.
fn resolve(source: &str) -> ErrorReporter {
    let mut reporter = ErrorReporter::new();
    let tokens = Scanner::new(source, &mut reporter).scan_tokens();
    let statements = Parser::new(tokens, &mut reporter).parse();
    assert!(!reporter.had_error, "test source failed to parse: {:?}", source);

    let mut interpreter = Interpreter::new();
    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
    reporter
}

fn assert_resolve_error(source: &str, expected: &str) {
    let reporter = resolve(source);

    assert!(reporter.had_error, "expected a static error for {:?}", source);
    assert!(
        reporter.diagnostics.iter().any(|d| d.contains(expected)),
        "expected {:?} among {:?}",
        expected,
        reporter.diagnostics
    );
}

fn assert_resolves_cleanly(source: &str) {
    let reporter = resolve(source);

    assert!(
        !reporter.had_error,
        "unexpected static error: {:?}",
        reporter.diagnostics
    );
}

#[test]
fn top_level_return_is_rejected() {
    assert_resolve_error("return 1;", "Can't return from top-level code.");
}

#[test]
fn return_inside_a_function_is_fine() {
    assert_resolves_cleanly("fun f() { return 1; }");
}

#[test]
fn initializer_cannot_return_a_value() {
    assert_resolve_error(
        "class P { init() { return 1; } }",
        "Can't return a value from an initializer.",
    );
}

#[test]
fn initializer_may_return_bare() {
    assert_resolves_cleanly("class P { init() { return; } }");
}

#[test]
fn this_outside_a_class_is_rejected() {
    assert_resolve_error("print this;", "Can't use 'this' outside of a class.");
    assert_resolve_error(
        "fun notAMethod() { print this; }",
        "Can't use 'this' outside of a class.",
    );
}

#[test]
fn this_inside_a_method_is_fine() {
    assert_resolves_cleanly("class C { show() { print this; } }");
}

#[test]
fn super_outside_a_class_is_rejected() {
    assert_resolve_error("super.say();", "Can't use 'super' outside of a class.");
}

#[test]
fn super_without_a_superclass_is_rejected() {
    assert_resolve_error(
        "class C { say() { super.say(); } }",
        "Can't use 'super' in a class with no superclass.",
    );
}

#[test]
fn super_in_a_subclass_is_fine() {
    assert_resolves_cleanly(
        "class A { say() {} } class B < A { say() { super.say(); } }",
    );
}

#[test]
fn class_cannot_inherit_from_itself() {
    assert_resolve_error("class Oops < Oops {}", "A class can't inherit from itself.");
}

#[test]
fn duplicate_declaration_in_local_scope_is_rejected() {
    assert_resolve_error(
        "fun f(a) { var a = 1; }",
        "Already a variable with this name in this scope.",
    );
    assert_resolve_error(
        "{ var a = 1; var a = 2; }",
        "Already a variable with this name in this scope.",
    );
}

#[test]
fn global_redeclaration_is_allowed() {
    assert_resolves_cleanly("var a = 1; var a = 2;");
}

#[test]
fn reading_a_local_in_its_own_initializer_is_rejected() {
    assert_resolve_error(
        "{ var a = 1; { var a = a; } }",
        "Can't read local variable in its own initializer.",
    );
}

#[test]
fn shadowing_with_a_different_initializer_is_fine() {
    assert_resolves_cleanly("var a = 1; { var b = a; var a = b; }");
}

#[test]
fn resolution_continues_past_errors() {
    let reporter = resolve("return 1;\nprint this;");

    assert_eq!(reporter.diagnostics.len(), 2);
    assert!(reporter.diagnostics[0].contains("Can't return from top-level code."));
    assert!(reporter.diagnostics[1].contains("Can't use 'this' outside of a class."));
}
