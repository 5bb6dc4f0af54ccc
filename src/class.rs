//! Classes and instances, per spec.md §3 (`LoxClass`, `LoxInstance`) and
//! §4.4 (construction, method binding, field access).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ExecResult, RuntimeError};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(name: String, superclass: Option<Rc<LoxClass>>, methods: HashMap<String, Rc<LoxFunction>>) -> Self {
        LoxClass { name, superclass, methods }
    }

    /// Looks a method up on this class, then its superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass.as_ref().and_then(|super_class| super_class.find_method(name))
    }

    /// A class's arity is its `init` method's, or zero if it has none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    /// Constructs an instance and runs `init` if present. Called directly
    /// from the interpreter's call-expression handling, which holds the
    /// `Rc<LoxClass>` the instance needs to point back to — unlike
    /// `LoxFunction`/`NativeFunction`, a class is not reached through the
    /// shared [`Callable`] trait, since constructing it needs the `Rc`
    /// itself rather than a borrow of its contents.
    pub fn construct(self: &Rc<Self>, interpreter: &mut Interpreter, arguments: Vec<Value>, call_site: &Token) -> ExecResult<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(self.clone())));

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments, call_site)?;
        }

        Ok(Value::Instance(instance))
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance { class, fields: HashMap::new() }
    }

    pub fn get(this: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value, RuntimeError> {
        let borrowed = this.borrow();

        if let Some(value) = borrowed.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = borrowed.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(this.clone()))));
        }

        Err(RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme)))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::environment::Environment;
    use crate::stmt::FunctionDecl;
    use crate::token::TokenKind;

    fn token(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, None, 1)
    }

    fn method(name: &str) -> Rc<LoxFunction> {
        let declaration = Rc::new(FunctionDecl { name: token(name), params: Vec::new(), body: Vec::new() });
        Rc::new(LoxFunction::new(declaration, Environment::new_global(), false))
    }

    #[test]
    fn find_method_walks_superclass_chain() {
        let mut base_methods = HashMap::new();
        base_methods.insert("greet".to_string(), method("greet"));
        let base = Rc::new(LoxClass::new("Base".to_string(), None, base_methods));

        let derived = LoxClass::new("Derived".to_string(), Some(base), HashMap::new());

        assert!(derived.find_method("greet").is_some());
        assert!(derived.find_method("missing").is_none());
    }

    #[test]
    fn field_shadows_method_of_the_same_name() {
        let mut methods = HashMap::new();
        methods.insert("x".to_string(), method("x"));
        let class = Rc::new(LoxClass::new("Foo".to_string(), None, methods));

        let instance = Rc::new(RefCell::new(LoxInstance::new(class)));
        instance.borrow_mut().set(&token("x"), Value::Number(1.0));

        assert!(matches!(LoxInstance::get(&instance, &token("x")), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn undefined_property_is_a_runtime_error() {
        let class = Rc::new(LoxClass::new("Foo".to_string(), None, HashMap::new()));
        let instance = Rc::new(RefCell::new(LoxInstance::new(class)));

        assert!(LoxInstance::get(&instance, &token("missing")).is_err());
    }
}
