//! A tree-walk interpreter for Lox, a small dynamically-typed scripting
//! language with closures, single-inheritance classes, and lexical scoping.
//!
//! The pipeline has four stages, each a module of the same name, run in
//! sequence by [`Lox::run`]:
//!
//! 1. [`scanner`] turns source text into a flat token stream.
//! 2. [`parser`] turns tokens into a statement/expression AST
//!    ([`expr`], [`stmt`]) via hand-written recursive descent.
//! 3. [`resolver`] walks the AST once to compute lexical scope distances,
//!    so the evaluator never has to search the environment chain by name.
//! 4. [`interpreter`] walks the AST again, this time executing it, using
//!    [`environment`] for variable storage and [`value`]/[`function`]/
//!    [`class`] for the runtime value model.
//!
//! A compile-time error (scan, parse, or resolve) suppresses execution for
//! that run but does not panic; [`error`] tracks whether one occurred so
//! the driver can decide what to do next.

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::fs;
use std::process;

use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Drives the scan → parse → resolve → interpret pipeline across one or
/// more inputs, keeping the interpreter (and so its global environment)
/// alive across REPL lines.
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    pub fn new() -> Self {
        Lox { interpreter: Interpreter::new() }
    }

    /// Reads and runs a script file, then exits the process with the
    /// code spec.md §6 assigns to it: 65 for a compile-time error, 70 for
    /// an uncaught runtime error, 0 otherwise. `path` unreadable is a
    /// usage failure, not a Lox-level one, so it panics.
    pub fn run_file(&mut self, path: &str) {
        let source = fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("Could not read '{path}': {err}");
            process::exit(64);
        });

        self.run(&source);

        if error::did_error() {
            process::exit(65);
        }
        if error::did_runtime_error() {
            process::exit(70);
        }
    }

    /// Runs one line of REPL input. The error flags are reset afterward
    /// so one bad line doesn't poison the rest of the session.
    pub fn run_line(&mut self, source: &str) {
        self.run(source);
        error::reset_error();
    }

    fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens();

        let statements = Parser::new(tokens).parse();
        if error::did_error() {
            return;
        }

        Resolver::new(&mut self.interpreter).resolve(&statements);
        if error::did_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
