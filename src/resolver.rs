//! Static scope resolution, per spec.md §4.3. Walks the AST once after
//! parsing and records, for every variable reference, how many enclosing
//! scopes to walk at runtime to find its binding — so the evaluator never
//! has to search by name. Also the pass responsible for catching
//! scope-level misuse that isn't a syntax error: `return` outside a
//! function, `this`/`super` outside a class, a class inheriting itself.

use std::collections::HashMap;
use std::mem;

use crate::error::{Error, ResolveError};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Self {
        Resolver { interpreter, scopes: Vec::new(), current_function: FunctionType::None, current_class: ClassType::None }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Assert(_, expr) => self.resolve_expr(expr),
            Stmt::Var(name, initializer) => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::If(condition, then_branch, else_branch) => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(condition, body) => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Function(declaration) => {
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }
            Stmt::Return(keyword, value) => {
                if self.current_function == FunctionType::None {
                    ResolveError { token: keyword.clone(), message: "Cannot return from top-level code".to_string() }.throw();
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        ResolveError {
                            token: keyword.clone(),
                            message: "Cannot return a value from an initializer".to_string(),
                        }.throw();
                    } else {
                        self.resolve_expr(value);
                    }
                }
            }
            Stmt::Class(name, superclass, methods) => self.resolve_class(name, superclass, methods),
        }
    }

    fn resolve_class(&mut self, name: &Token, superclass: &Option<Expr>, methods: &[std::rc::Rc<FunctionDecl>]) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(name);
        self.define(name);

        let has_superclass = superclass.is_some();

        if let Some(superclass_expr) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass_expr {
                if super_name.lexeme == name.lexeme {
                    ResolveError { token: super_name.clone(), message: "A class cannot inherit from itself".to_string() }.throw();
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass_expr);

            self.begin_scope();
            self.scopes.last_mut().expect("scope stack to be non-empty").insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().expect("scope stack to be non-empty").insert("this".to_string(), true);

        for method in methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if has_superclass {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Grouping { expr, .. } => self.resolve_expr(expr),
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        ResolveError {
                            token: name.clone(),
                            message: "Cannot read local variable in its own initializer".to_string(),
                        }.throw();
                    }
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Call { callee, arguments, .. } => {
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
            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    ResolveError { token: keyword.clone(), message: "Cannot use 'this' outside of a class".to_string() }.throw();
                    return;
                }
                self.resolve_local(*id, keyword);
            }
            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => {
                        ResolveError { token: keyword.clone(), message: "Cannot use 'super' outside of a class".to_string() }.throw();
                    }
                    ClassType::Class => {
                        ResolveError {
                            token: keyword.clone(),
                            message: "Cannot use 'super' in a class with no superclass".to_string(),
                        }.throw();
                    }
                }
                self.resolve_local(*id, keyword);
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            ResolveError {
                token: name.clone(),
                message: format!("A variable is already defined with name '{}' in this scope", name.lexeme),
            }.throw();
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        scope.insert(name.lexeme.clone(), true);
    }

    fn resolve_local(&mut self, id: crate::expr::ExprId, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, distance);
                return;
            }
        }
        // Not found in any tracked scope: treated as global at runtime.
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> Interpreter {
        crate::error::reset_error();
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();
        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements);
        interpreter
    }

    #[test]
    fn return_outside_function_is_an_error() {
        resolve("return 1;");
        assert!(crate::error::did_error());
        crate::error::reset_error();
    }

    #[test]
    fn this_outside_class_is_an_error() {
        resolve("print this;");
        assert!(crate::error::did_error());
        crate::error::reset_error();
    }

    #[test]
    fn class_inheriting_itself_is_an_error() {
        resolve("class A < A {}");
        assert!(crate::error::did_error());
        crate::error::reset_error();
    }

    #[test]
    fn shadowing_in_own_initializer_is_an_error() {
        resolve("var a = 1; { var a = a; }");
        assert!(crate::error::did_error());
        crate::error::reset_error();
    }

    #[test]
    fn well_scoped_program_resolves_cleanly() {
        resolve("fun f(a) { return a + 1; } print f(1);");
        assert!(!crate::error::did_error());
    }
}
