//! The tree-walking evaluator, per spec.md §4.4. Executes the statement
//! sequence the parser produced, using the resolver's scope-distance side
//! table to find variables without searching the environment chain by name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{Error, ExecResult, RuntimeError, Unwind};
use crate::expr::{Expr, ExprId};
use crate::function::{LoxFunction, NativeFunction};
use crate::stmt::Stmt;
use crate::token::{Literal, Token, TokenKind};
use crate::value::{check_number, check_numbers, Callable, Value};

pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new_global();
        globals.borrow_mut().define("clock", Value::Native(Rc::new(NativeFunction::clock())));

        Interpreter { environment: globals.clone(), globals, locals: HashMap::new() }
    }

    /// Records the resolver's scope distance for a `Variable`/`Assign`/
    /// `This`/`Super` expression, keyed by its node id.
    pub fn resolve(&mut self, id: ExprId, distance: usize) {
        self.locals.insert(id, distance);
    }

    /// Runs a top-level statement sequence, stopping at the first runtime
    /// error (already reported to stderr by the time this returns).
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(Unwind::Error(err)) = self.execute(statement) {
                err.throw();
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", stringify(&value));
                Ok(())
            }
            Stmt::Assert(keyword, expr) => {
                let value = self.evaluate(expr)?;
                if value.is_truthy() {
                    Ok(())
                } else {
                    Err(RuntimeError::new(keyword, "Assert Failed.").into())
                }
            }
            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let block_env = Environment::new_enclosed(self.environment.clone());
                self.execute_block(statements, block_env)
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(condition, body) => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                self.environment.borrow_mut().define(declaration.name.lexeme.clone(), Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return(_, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Class(name, superclass, methods) => self.execute_class(name, superclass, methods),
        }
    }

    fn execute_class(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[Rc<crate::stmt::FunctionDecl>]) -> ExecResult<()> {
        let superclass = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable { name: super_name, .. } => super_name,
                            _ => unreachable!("parser only produces a Variable node for a superclass clause"),
                        };
                        return Err(RuntimeError::new(token, "Superclass must be a class.").into());
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(name.lexeme.clone(), Value::Nil);

        let method_env = if let Some(superclass) = &superclass {
            let enclosed = Environment::new_enclosed(self.environment.clone());
            enclosed.borrow_mut().define("super", Value::Class(superclass.clone()));
            enclosed
        } else {
            self.environment.clone()
        };

        let mut methods_map = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(method.clone(), method_env.clone(), is_initializer);
            methods_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Rc::new(LoxClass::new(name.lexeme.clone(), superclass, methods_map));
        self.environment.borrow_mut().assign(name, Value::Class(class))?;
        Ok(())
    }

    /// Executes a statement sequence in `env`, restoring the previous
    /// environment on the way out whether the block finished normally,
    /// returned, or errored.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Rc<RefCell<Environment>>) -> ExecResult<()> {
        let previous = std::mem::replace(&mut self.environment, env);

        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> ExecResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal_to_value(value)),
            Expr::Grouping { expr, .. } => self.evaluate(expr),
            Expr::Unary { operator, right, .. } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => Ok(Value::Number(-check_number(operator, &right)?)),
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser only produces '-'/'!' unary operators"),
                }
            }
            Expr::Binary { left, operator, right, .. } => self.evaluate_binary(left, operator, right),
            Expr::Logical { left, operator, right, .. } => {
                let left_value = self.evaluate(left)?;
                match operator.kind {
                    TokenKind::Or if left_value.is_truthy() => Ok(left_value),
                    TokenKind::Or => self.evaluate(right),
                    TokenKind::And if !left_value.is_truthy() => Ok(left_value),
                    TokenKind::And => self.evaluate(right),
                    _ => unreachable!("parser only produces 'and'/'or' logical operators"),
                }
            }
            Expr::Variable { id, name } => Ok(self.look_up_variable(*id, name)?),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(self.environment.clone(), distance, name, value.clone()),
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call { callee, paren, arguments, .. } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name, .. } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),
                    _ => Err(RuntimeError::new(name, "Only instances have properties.").into()),
                }
            }
            Expr::Set { object, name, value, .. } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(name, "Only instances have fields.").into()),
                }
            }
            Expr::This { id, keyword } => Ok(self.look_up_variable(*id, keyword)?),
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> ExecResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        if operator.kind == TokenKind::BangEqual {
            return Ok(Value::Bool(!left.lox_eq(&right)));
        }
        if operator.kind == TokenKind::EqualEqual {
            return Ok(Value::Bool(left.lox_eq(&right)));
        }
        if operator.kind == TokenKind::Plus {
            return match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::string(format!("{l}{r}"))),
                _ => Err(RuntimeError::new(operator, "Operands must be two numbers or two strings.").into()),
            };
        }

        let (l, r) = check_numbers(operator, &left, &right)?;
        let value = match operator.kind {
            TokenKind::Greater => Value::Bool(l > r),
            TokenKind::GreaterEqual => Value::Bool(l >= r),
            TokenKind::Less => Value::Bool(l < r),
            TokenKind::LessEqual => Value::Bool(l <= r),
            TokenKind::Minus => Value::Number(l - r),
            TokenKind::Star => Value::Number(l * r),
            TokenKind::Slash => {
                if r == 0.0 {
                    return Err(RuntimeError::new(operator, "Division by zero.").into());
                }
                Value::Number(l / r)
            }
            _ => unreachable!("parser only produces binary-eligible operators here"),
        };

        Ok(value)
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> ExecResult<Value> {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        match callee {
            Value::Function(function) => {
                check_arity(paren, function.arity(), args.len())?;
                function.call(self, args, paren)
            }
            Value::Native(native) => {
                check_arity(paren, native.arity(), args.len())?;
                native.call(self, args, paren)
            }
            Value::Class(class) => {
                check_arity(paren, class.arity(), args.len())?;
                class.construct(self, args, paren)
            }
            _ => Err(RuntimeError::new(paren, "Can only call functions and classes.").into()),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> ExecResult<Value> {
        let distance = *self.locals.get(&id).expect("resolver to have recorded a distance for every 'super' expression");

        let superclass = match Environment::get_at(self.environment.clone(), distance, &super_token(keyword.line)) {
            Value::Class(class) => class,
            _ => unreachable!("'super' always resolves to a class value"),
        };

        let instance = match Environment::get_at(self.environment.clone(), distance - 1, &this_token(keyword.line)) {
            Value::Instance(instance) => instance,
            _ => unreachable!("'this' always resolves to an instance value in a method body"),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(RuntimeError::new(method, format!("Undefined property '{}'.", method.lexeme)).into()),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(self.environment.clone(), distance, name)),
            None => self.globals.borrow().get(name),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn super_token(line: usize) -> Token {
    Token::new(TokenKind::Super, "super", None, line)
}

fn this_token(line: usize) -> Token {
    Token::new(TokenKind::This, "this", None, line)
}

fn check_arity(call_site: &Token, expected: usize, got: usize) -> Result<(), RuntimeError> {
    if expected == got {
        Ok(())
    } else {
        Err(RuntimeError::new(call_site, format!("Expected {expected} arguments but got {got}.")))
    }
}

fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::string(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

/// Lox's `print`/string-concatenation rendering (spec.md §4.4.1). `nil`,
/// booleans and strings render as their own text; numbers print as the
/// shortest round-tripping decimal, which `f64`'s own `Display` already
/// produces with no trailing `.0`.
pub fn stringify(value: &Value) -> String {
    value.to_string()
}
