use loxide as lox;

use lox::error::ErrorReporter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;

/// Runs the whole pipeline and returns the printed lines, or the runtime
/// error message.
fn evaluate(source: &str) -> Result<Vec<String>, String> {
    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new();

    let tokens = Scanner::new(source, &mut reporter).scan_tokens();
    let statements = Parser::new(tokens, &mut reporter).parse();
    assert!(
        !reporter.had_error,
        "test source failed to parse: {:?}",
        reporter.diagnostics
    );

    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);
    assert!(
        !reporter.had_error,
        "test source failed to resolve: {:?}",
        reporter.diagnostics
    );

    match interpreter.interpret(&statements) {
        Ok(()) => Ok(interpreter.output),
        Err(error) => Err(error.to_string()),
    }
}

fn check_output(source: &str, expected: &[&str]) {
    match evaluate(source) {
        Ok(output) => assert_eq!(output, expected),
        Err(error) => panic!("unexpected runtime error: {}", error),
    }
}

fn check_runtime_error(source: &str, expected: &str) {
    match evaluate(source) {
        Ok(output) => panic!("expected runtime error, got output {:?}", output),
        Err(error) => assert!(
            error.contains(expected),
            "expected {:?} in {:?}",
            expected,
            error
        ),
    }
}

// ── arithmetic & printing ────────────────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    check_output("print 1 + 2 * 3;", &["7"]);
}

#[test]
fn numbers_print_without_trailing_zero_when_integral() {
    check_output("print 3.0; print 2.5; print -0.5;", &["3", "2.5", "-0.5"]);
}

#[test]
fn division_follows_ieee_semantics() {
    check_output("print 7 / 2;", &["3.5"]);
    check_output("print 1 / 0 > 1000000;", &["true"]);
}

#[test]
fn string_concatenation() {
    check_output("print \"a\" + \"b\";", &["ab"]);
}

#[test]
fn mixed_plus_is_a_runtime_error() {
    check_runtime_error(
        "print 1 + \"b\";",
        "Operands must be two numbers or two strings.",
    );
}

#[test]
fn arithmetic_on_non_numbers_is_a_runtime_error() {
    check_runtime_error("print \"a\" * 2;", "Operands must be numbers.");
    check_runtime_error("print -\"a\";", "Operand must be a number.");
    check_runtime_error("print \"a\" < \"b\";", "Operands must be numbers.");
}

#[test]
fn runtime_errors_carry_the_line() {
    check_runtime_error("var a = 1;\nprint a + \"x\";", "[line 2]");
}

// ── truthiness, equality, logic ──────────────────────────────────────────

#[test]
fn only_nil_and_false_are_falsy() {
    check_output(
        "if (0) print \"zero\"; if (\"\") print \"empty\"; \
         if (nil) print \"nil\"; if (false) print \"false\"; print \"done\";",
        &["zero", "empty", "done"],
    );
}

#[test]
fn equality_rules() {
    check_output(
        "print 1 == 1; print 1 == \"1\"; print nil == nil; \
         print \"a\" == \"a\"; print 1 != 2;",
        &["true", "false", "true", "true", "true"],
    );
}

#[test]
fn logical_operators_return_operands_and_short_circuit() {
    check_output("print \"hi\" or 2;", &["hi"]);
    check_output("print nil or \"yes\";", &["yes"]);
    check_output("print nil and 1;", &["nil"]);
    check_output("print 1 and 2;", &["2"]);
}

#[test]
fn short_circuit_skips_side_effects() {
    check_output(
        "fun shout() { print \"evaluated\"; return true; } \
         var a = true or shout(); \
         var b = false and shout(); \
         print a; print b;",
        &["true", "false"],
    );
}

// ── variables & scope ────────────────────────────────────────────────────

#[test]
fn blocks_shadow_and_restore() {
    check_output(
        "var a = \"global a\";
         var b = \"global b\";
         {
           var a = \"outer a\";
           {
             var a = \"inner a\";
             print a;
             print b;
           }
           print a;
         }
         print a;",
        &["inner a", "global b", "outer a", "global a"],
    );
}

#[test]
fn assignment_is_an_expression() {
    check_output("var a = 1; print a = 2; print a;", &["2", "2"]);
}

#[test]
fn assignment_reaches_enclosing_scopes() {
    check_output("var a = 1; { a = 2; } print a;", &["2"]);
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
    check_runtime_error("print missing;", "Undefined variable 'missing'.");
}

#[test]
fn undefined_variable_assignment_is_a_runtime_error() {
    check_runtime_error("missing = 1;", "Undefined variable 'missing'.");
}

#[test]
fn uninitialized_variables_are_nil() {
    check_output("var a; print a;", &["nil"]);
}

// ── control flow ─────────────────────────────────────────────────────────

#[test]
fn while_loops_run_until_falsy() {
    check_output(
        "var i = 0; var sum = 0; \
         while (i < 4) { sum = sum + i; i = i + 1; } \
         print sum;",
        &["6"],
    );
}

#[test]
fn for_loops_print_their_range() {
    check_output(
        "for (var i = 0; i < 5; i = i + 1) print i;",
        &["0", "1", "2", "3", "4"],
    );
}

#[test]
fn for_loop_with_empty_body_range() {
    check_output("for (var i = 0; i < 0; i = i + 1) print i; print \"end\";", &["end"]);
}

#[test]
fn if_else_branches() {
    check_output(
        "if (1 < 2) print \"then\"; else print \"else\"; \
         if (2 < 1) print \"then\"; else print \"else\";",
        &["then", "else"],
    );
}

// ── functions & closures ─────────────────────────────────────────────────

#[test]
fn functions_return_values() {
    check_output(
        "fun add(a, b) { return a + b; } print add(1, 2);",
        &["3"],
    );
}

#[test]
fn functions_without_return_yield_nil() {
    check_output("fun f() {} print f();", &["nil"]);
    check_output("fun g() { return; } print g();", &["nil"]);
}

#[test]
fn recursion_works() {
    check_output(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } \
         print fib(10);",
        &["55"],
    );
}

#[test]
fn return_unwinds_nested_blocks() {
    check_output(
        "fun f() { { { return \"deep\"; } } } print f();",
        &["deep"],
    );
}

#[test]
fn closures_capture_their_defining_environment() {
    check_output(
        "fun makeCounter() {
           var i = 0;
           fun count() { i = i + 1; print i; }
           return count;
         }
         var counter = makeCounter();
         counter();
         counter();",
        &["1", "2"],
    );
}

#[test]
fn closures_see_definition_scope_not_call_scope() {
    check_output(
        "var a = \"global\";
         {
           fun showA() { print a; }
           showA();
           var a = \"block\";
           showA();
         }",
        &["global", "global"],
    );
}

#[test]
fn function_values_print_their_name() {
    check_output("fun f() {} print f;", &["<fn f>"]);
    check_output("print clock;", &["<native fn clock>"]);
}

#[test]
fn clock_returns_a_number() {
    check_output("print clock() > 0;", &["true"]);
}

#[test]
fn wrong_arity_is_a_runtime_error() {
    check_runtime_error(
        "fun f(a, b) {} f(1);",
        "Expected 2 arguments but got 1.",
    );
    check_runtime_error("clock(1);", "Expected 0 arguments but got 1.");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    check_runtime_error("\"not a fn\"();", "Can only call functions and classes.");
    check_runtime_error("nil();", "Can only call functions and classes.");
}

// ── classes ──────────────────────────────────────────────────────────────

#[test]
fn classes_and_instances_print_their_names() {
    check_output(
        "class Cake {} print Cake; print Cake();",
        &["Cake", "Cake instance"],
    );
}

#[test]
fn fields_can_be_set_and_read() {
    check_output(
        "class Box {} var box = Box(); box.value = 42; print box.value;",
        &["42"],
    );
}

#[test]
fn methods_bind_this() {
    check_output(
        "class Cake {
           taste() { print \"The \" + this.flavor + \" cake\"; }
         }
         var cake = Cake();
         cake.flavor = \"chocolate\";
         cake.taste();",
        &["The chocolate cake"],
    );
}

#[test]
fn bound_methods_keep_their_receiver() {
    check_output(
        "class Person {
           init(name) { this.name = name; }
           greet() { print this.name; }
         }
         var method = Person(\"Ada\").greet;
         method();",
        &["Ada"],
    );
}

#[test]
fn initializers_run_on_construction() {
    check_output(
        "class P { init(x) { this.x = x; } } print P(7).x;",
        &["7"],
    );
}

#[test]
fn initializer_early_return_yields_the_instance() {
    check_output(
        "class P { init(x) { this.x = x; return; } } print P(7).x;",
        &["7"],
    );
}

#[test]
fn class_arity_follows_the_initializer() {
    check_runtime_error("class P { init(x) {} } P();", "Expected 1 arguments but got 0.");
}

#[test]
fn fields_shadow_methods() {
    check_output(
        "class C { say() { print \"method\"; } }
         var c = C();
         fun replacement() { print \"field\"; }
         c.say = replacement;
         c.say();",
        &["field"],
    );
}

#[test]
fn undefined_property_is_a_runtime_error() {
    check_runtime_error("class C {} print C().missing;", "Undefined property 'missing'.");
}

#[test]
fn property_access_on_non_instances_is_a_runtime_error() {
    check_runtime_error("var x = 1; print x.y;", "Only instances have properties.");
    check_runtime_error("var x = 1; x.y = 2;", "Only instances have fields.");
}

#[test]
fn superclass_must_be_a_class() {
    check_runtime_error("var x = 1; class C < x {}", "Superclass must be a class.");
}

// ── inheritance & super ──────────────────────────────────────────────────

#[test]
fn methods_are_inherited() {
    check_output(
        "class A { say() { print \"A\"; } } class B < A {} B().say();",
        &["A"],
    );
}

#[test]
fn subclass_methods_override() {
    check_output(
        "class A { say() { print \"A\"; } }
         class B < A { say() { print \"B\"; } }
         B().say();",
        &["B"],
    );
}

#[test]
fn super_calls_the_superclass_method() {
    check_output(
        "class A { say() { print \"A\"; } }
         class B < A { say() { super.say(); print \"B\"; } }
         B().say();",
        &["A", "B"],
    );
}

#[test]
fn super_resolves_past_the_immediate_class() {
    check_output(
        "class A { method() { print \"A method\"; } }
         class B < A {
           method() { print \"B method\"; }
           test() { super.method(); }
         }
         class C < B {}
         C().test();",
        &["A method"],
    );
}

#[test]
fn super_methods_bind_the_receiver() {
    check_output(
        "class A { f() { return this.attr; } }
         class B < A {
           init(attr) { this.attr = attr; }
           f() { return 1337; }
           g() { return super.f(); }
         }
         print B(42).g();",
        &["42"],
    );
}

#[test]
fn missing_super_method_is_a_runtime_error() {
    check_runtime_error(
        "class A {} class B < A { f() { super.missing(); } } B().f();",
        "Undefined property 'missing'.",
    );
}

#[test]
fn inherited_initializers_run() {
    check_output(
        "class A { init(x) { this.x = x; } }
         class B < A {}
         print B(9).x;",
        &["9"],
    );
}
