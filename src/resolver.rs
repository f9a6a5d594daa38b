//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (false) and fully defined (true) names per block or function.
//!    The global scope is deliberately *not* on the stack; a lookup that
//!    falls off the bottom stays unresolved and the interpreter reads it
//!    from globals.
//! 2. **Enforces static rules**: duplicate declarations, reading a variable
//!    in its own initializer, `return` outside a function, `this`/`super`
//!    misuse.  Every violation goes to the diagnostics sink and the walk
//!    continues, so one bad declaration never hides the next.
//! 3. **Records binding distances**: each `Variable`, `Assign`, `This` and
//!    `Super` occurrence that hits a scope on the stack is noted on the
//!    interpreter's depth table, keyed by the expression's id.
//!
//! The resolver never mutates the AST.

use std::collections::HashMap;
use std::mem;

use log::{debug, info};

use crate::error::ErrorReporter;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    reporter: &'a mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter, reporter: &'a mut ErrorReporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!("resolving {} top-level statement(s)", statements.len());

        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    // ── statements ───────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Block(statements) => {
                self.begin_scope();
                for statement in statements {
                    self.resolve_stmt(statement);
                }
                self.end_scope();
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

                self.declare(name);
                self.define(name);

                if let Some(superclass_expr) = superclass {
                    if let Expr::Variable {
                        name: superclass_name,
                        ..
                    } = superclass_expr
                    {
                        if superclass_name.lexeme == name.lexeme {
                            self.reporter.error_token(
                                superclass_name,
                                "A class can't inherit from itself.",
                            );
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass_expr);

                    self.begin_scope();
                    self.peek_scope().insert("super".to_string(), true);
                }

                self.begin_scope();
                self.peek_scope().insert("this".to_string(), true);

                for method in methods {
                    let function_type = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, function_type);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .error_token(keyword, "Can't return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter
                            .error_token(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    // ── expressions ──────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.reporter.error_token(
                            name,
                            "Can't read local variable in its own initializer.",
                        );
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter
                        .error_token(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.reporter
                        .error_token(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::Subclass {
                    self.reporter
                        .error_token(keyword, "Can't use 'super' in a class with no superclass.");
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ── helpers ──────────────────────────────────────────────────────────

    fn resolve_function(&mut self, declaration: &FunctionDecl, function_type: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, function_type);

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        for statement in &declaration.body {
            self.resolve_stmt(statement);
        }
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn peek_scope(&mut self) -> &mut HashMap<String, bool> {
        self.scopes
            .last_mut()
            .expect("scope stack is non-empty inside begin_scope/end_scope pairs")
    }

    /// Marks a name as declared-but-unusable.  A duplicate in the same
    /// local scope is a static error; the global scope never complains.
    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        if self.peek_scope().contains_key(&name.lexeme) {
            self.reporter
                .error_token(name, "Already a variable with this name in this scope.");
        }

        self.peek_scope().insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        self.peek_scope().insert(name.lexeme.clone(), true);
    }

    /// Scans scopes innermost-out; the first hit fixes the binding depth on
    /// the interpreter's table.  No hit means the name lives in globals.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("'{}' resolves to globals", name.lexeme);
    }
}
