//! Callable values: user-defined Lox functions/methods and native
//! functions exposed to Lox source. Per spec.md §3 (`LoxFunction`) and
//! §6 (`clock`).

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::{ExecResult, RuntimeError, Unwind};
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A `fun` declaration or method closed over the environment it was
/// declared in. `is_initializer` marks a class's `init` method, whose
/// bare `return;` implicitly returns `this` instead of `nil`.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        LoxFunction { declaration, closure, is_initializer }
    }

    /// Returns a copy of this function whose closure has `this` bound to
    /// `instance`, for method lookup on a specific instance.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let env = Environment::new_enclosed(self.closure.clone());
        env.borrow_mut().define("this", Value::Instance(instance));
        LoxFunction { declaration: self.declaration.clone(), closure: env, is_initializer: self.is_initializer }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, _call_site: &Token) -> ExecResult<Value> {
        let env = Environment::new_enclosed(self.closure.clone());

        for (param, arg) in self.declaration.params.iter().zip(arguments.into_iter()) {
            env.borrow_mut().define(param.lexeme.clone(), arg);
        }

        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(Environment::get_at(self.closure.clone(), 0, &this_token()))
                } else {
                    Ok(Value::Nil)
                }
            }
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    Ok(Environment::get_at(self.closure.clone(), 0, &this_token()))
                } else {
                    Ok(value)
                }
            }
            Err(err @ Unwind::Error(_)) => Err(err),
        }
    }

    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

fn this_token() -> Token {
    Token::new(crate::token::TokenKind::This, "this", None, 0)
}

/// A function implemented in Rust rather than Lox source, exposed to
/// Lox as an ordinary callable (spec.md §6).
pub struct NativeFunction {
    pub name: String,
    arity: usize,
    func: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl NativeFunction {
    pub fn clock() -> NativeFunction {
        NativeFunction {
            name: "clock".to_string(),
            arity: 0,
            func: |_, _| {
                let elapsed = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("system clock to be after the unix epoch");
                Ok(Value::Number(elapsed.as_secs_f64()))
            },
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, _call_site: &Token) -> ExecResult<Value> {
        Ok((self.func)(interpreter, arguments)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
