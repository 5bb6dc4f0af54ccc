//! Lexical scope chain, per spec.md §4.5. Each scope is a `Rc<RefCell<..>>`
//! node pointing at its enclosing scope, so a closure can share ownership
//! of the environment it was created in after that scope's block has
//! otherwise finished executing. The chain can form reference cycles
//! (a closure stored back into the scope that captured it); this crate
//! does not attempt to break them, matching the teacher's model.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new_global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { values: HashMap::new(), enclosing: None }))
    }

    pub fn new_enclosed(enclosing: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { values: HashMap::new(), enclosing: Some(enclosing) }))
    }

    /// Binds `name`, shadowing any existing binding of the same name in
    /// this scope. Lox allows redeclaring a variable in the same block.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Walks `distance` enclosing links up the chain. `distance` comes
    /// from the resolver, which has already proven the name exists there.
    fn ancestor(env: Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut current = env;
        for _ in 0..distance {
            let next = current
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-reported scope distance to match the environment chain");
            current = next;
        }
        current
    }

    pub fn get_at(env: Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Value {
        let target = Self::ancestor(env, distance);
        let value = target
            .borrow()
            .values
            .get(&name.lexeme)
            .cloned()
            .expect("resolver-reported scope distance to match a defined binding");
        value
    }

    pub fn assign_at(env: Rc<RefCell<Environment>>, distance: usize, name: &Token, value: Value) {
        let target = Self::ancestor(env, distance);
        target.borrow_mut().values.insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::TokenKind;

    fn token(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, None, 1)
    }

    #[test]
    fn reads_through_enclosing_scope() {
        let global = Environment::new_global();
        global.borrow_mut().define("a", Value::Number(1.0));

        let local = Environment::new_enclosed(global);
        assert!(matches!(local.borrow().get(&token("a")), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_fails_for_undefined_name() {
        let global = Environment::new_global();
        assert!(global.borrow_mut().assign(&token("missing"), Value::Nil).is_err());
    }

    #[test]
    fn get_at_targets_the_right_ancestor() {
        let global = Environment::new_global();
        global.borrow_mut().define("x", Value::Number(0.0));

        let inner1 = Environment::new_enclosed(global);
        inner1.borrow_mut().define("x", Value::Number(1.0));

        let inner2 = Environment::new_enclosed(inner1);

        let value = Environment::get_at(inner2, 1, &token("x"));
        assert!(matches!(value, Value::Number(n) if n == 1.0));
    }
}
