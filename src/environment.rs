use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// One frame of the lexical scope chain.  Frames are shared behind
/// `Rc<RefCell<..>>` because closures keep their defining frame alive past
/// the block that created it.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Always writes to this frame, redefinition included.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = self.enclosing.as_ref() {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = self.enclosing.as_ref() {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Reads from the frame exactly `distance` links out.  The resolver
    /// guarantees the binding is there.
    pub fn get_at(environment: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
        Self::ancestor(environment, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .expect("resolved variable must exist at its recorded depth")
    }

    pub fn assign_at(
        environment: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) {
        Self::ancestor(environment, distance)
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }

    fn ancestor(environment: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut current = Rc::clone(environment);

        for _ in 0..distance {
            let enclosing = current
                .borrow()
                .enclosing
                .as_ref()
                .map(Rc::clone)
                .expect("environment chain must be at least as deep as the resolved distance");

            current = enclosing;
        }

        current
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
