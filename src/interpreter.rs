use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Non-local exits from statement execution.  `Return` is control flow, not
/// a failure: it unwinds through blocks via the error channel but is caught
/// at the user-function call boundary and never reaches error reporting.
#[derive(Debug)]
enum RuntimeEvent {
    Error(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for RuntimeEvent {
    fn from(error: RuntimeError) -> Self {
        RuntimeEvent::Error(error)
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Depth side-table written by the resolver: expression identity to the
    /// number of environment frames between the use and its binding.
    locals: HashMap<ExprId, usize>,
    /// Transcript of everything `print` wrote, one line per statement.
    pub output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output: Vec::new(),
        }
    }

    /// Resolver callback: fixes the scope distance for one expression.
    /// The table is never touched again after resolution.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(RuntimeEvent::Error(error)) => return Err(error),
                // Top-level `return` is rejected by resolution, so nothing
                // reaches here in a gated run; treat it as end of program.
                Err(RuntimeEvent::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    // ── statements ───────────────────────────────────────────────────────

    fn execute(&mut self, statement: &Stmt) -> Result<(), RuntimeEvent> {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let text = value.to_string();
                println!("{}", text);
                self.output.push(text);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = Rc::new(LoxFunction {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                });

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(function));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(RuntimeEvent::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), RuntimeEvent> {
        let superclass_value = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable { name, .. } => name.clone(),
                            _ => name.clone(),
                        };
                        return Err(
                            RuntimeError::new(token, "Superclass must be a class.").into()
                        );
                    }
                }
            }
            None => None,
        };

        // Two-step definition: the name exists (as nil) while methods are
        // built, so they can close over a frame that will hold the class.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let enclosing = if let Some(class) = &superclass_value {
            let previous = Rc::clone(&self.environment);
            self.environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                &previous,
            ))));
            self.environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(class)));
            Some(previous)
        } else {
            None
        };

        let mut method_map = HashMap::new();
        for method in methods {
            let function = Rc::new(LoxFunction {
                declaration: Rc::clone(method),
                closure: Rc::clone(&self.environment),
                is_initializer: method.name.lexeme == "init",
            });
            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = Value::Class(Rc::new(LoxClass {
            name: name.lexeme.clone(),
            superclass: superclass_value,
            methods: method_map,
        }));

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        debug!("defined class '{}'", name.lexeme);

        self.environment.borrow_mut().assign(name, class)?;
        Ok(())
    }

    /// Runs `statements` in `environment`, restoring the previous cursor on
    /// every exit path, error and return included.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), RuntimeEvent> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;
        result
    }

    // ── expressions ──────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeEvent> {
        match expr {
            Expr::Literal(token) => Ok(evaluate_literal(token)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR => {
                        if is_truthy(&left) {
                            Ok(left)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    TokenType::AND => {
                        if !is_truthy(&left) {
                            Ok(left)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => unreachable!("logical expressions only carry 'or' and 'and'"),
                }
            }

            Expr::Variable { id, name } => Ok(self.look_up_variable(name, *id)?),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => {
                        Environment::assign_at(&self.environment, *distance, name, value.clone());
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args, paren)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),
                    _ => Err(RuntimeError::new(
                        name.clone(),
                        "Only instances have properties.",
                    )
                    .into()),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => {
                        Err(RuntimeError::new(name.clone(), "Only instances have fields.").into())
                    }
                }
            }

            Expr::This { id, keyword } => Ok(self.look_up_variable(keyword, *id)?),

            Expr::Super { id, method, .. } => {
                let distance = *self
                    .locals
                    .get(id)
                    .expect("'super' expressions are always resolved");

                let superclass =
                    match Environment::get_at(&self.environment, distance, "super") {
                        Value::Class(class) => class,
                        _ => unreachable!("'super' is only ever bound to a class"),
                    };

                // The receiver lives one frame closer than 'super'.
                let object = Environment::get_at(&self.environment, distance - 1, "this");

                let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
                    RuntimeError::new(
                        method.clone(),
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                })?;

                Ok(Value::Function(found.bind(object)))
            }
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, RuntimeEvent> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(
                    RuntimeError::new(operator.clone(), "Operand must be a number.").into(),
                ),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => unreachable!("unary expressions only carry '!' and '-'"),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, RuntimeEvent> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(RuntimeError::new(
                    operator.clone(),
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::SLASH => match (left, right) {
                // IEEE division: x / 0 is infinity, 0 / 0 is NaN.
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(numbers_error(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => unreachable!("binary expressions never carry other operators"),
        }
    }

    // ── calls ────────────────────────────────────────────────────────────

    fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeEvent> {
        let arity = match &callee {
            Value::Function(function) => function.arity(),
            Value::NativeFunction { arity, .. } => *arity,
            Value::Class(class) => class.arity(),
            _ => {
                return Err(RuntimeError::new(
                    paren.clone(),
                    "Can only call functions and classes.",
                )
                .into())
            }
        };

        if arguments.len() != arity {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("Expected {} arguments but got {}.", arity, arguments.len()),
            )
            .into());
        }

        match callee {
            Value::Function(function) => self.call_function(&function, arguments),

            Value::NativeFunction { func, .. } => func(&arguments)
                .map_err(|message| RuntimeError::new(paren.clone(), message).into()),

            Value::Class(class) => self.instantiate(&class, arguments),

            _ => unreachable!("non-callables are rejected by the arity check above"),
        }
    }

    fn call_function(
        &mut self,
        function: &LoxFunction,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeEvent> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &function.closure,
        ))));

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match self.execute_block(&function.declaration.body, environment) {
            Ok(()) => {
                if function.is_initializer {
                    Ok(Environment::get_at(&function.closure, 0, "this"))
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(RuntimeEvent::Return(value)) => {
                // Initializers always yield the instance, whatever the body
                // returned.
                if function.is_initializer {
                    Ok(Environment::get_at(&function.closure, 0, "this"))
                } else {
                    Ok(value)
                }
            }

            Err(event) => Err(event),
        }
    }

    fn instantiate(
        &mut self,
        class: &Rc<LoxClass>,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeEvent> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));
            self.call_function(&bound, arguments)?;
        }

        Ok(Value::Instance(instance))
    }

    // ── variable access ──────────────────────────────────────────────────

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(distance) => Ok(Environment::get_at(&self.environment, *distance, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate_literal(token: &Token) -> Value {
    match &token.token_type {
        TokenType::NUMBER(n) => Value::Number(*n),
        TokenType::STRING(s) => Value::String(s.clone()),
        TokenType::TRUE => Value::Bool(true),
        TokenType::FALSE => Value::Bool(false),
        TokenType::NIL => Value::Nil,
        _ => unreachable!("literal expressions only carry literal tokens"),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

fn numbers_error(operator: &Token) -> RuntimeEvent {
    RuntimeError::new(operator.clone(), "Operands must be numbers.").into()
}

fn clock_native(_arguments: &[Value]) -> Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
