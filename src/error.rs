//! Error reporting sink shared by the scanner, parser, resolver and evaluator.
//!
//! Each pass reports through its own error type by calling [`Error::throw`],
//! which prints to stderr and flips the appropriate flag. The flags drive
//! the REPL's per-line reset and the file-mode exit code (spec'd in §6/§7).

use std::sync::atomic::{AtomicBool, Ordering};

use crate::token::{Token, TokenKind};
use crate::value::Value;

static HAD_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// True if a scan, parse, or resolve error has been reported.
pub fn did_error() -> bool {
    HAD_ERROR.load(Ordering::SeqCst)
}

/// True if a runtime error has been reported.
pub fn did_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::SeqCst)
}

/// Clears both flags. Called between lines in the REPL.
pub fn reset_error() {
    HAD_ERROR.store(false, Ordering::SeqCst);
    HAD_RUNTIME_ERROR.store(false, Ordering::SeqCst);
}

fn report(line: usize, r#where: &str, message: &str) {
    eprintln!("[line {line}] Error{where}: {message}");
    HAD_ERROR.store(true, Ordering::SeqCst);
}

/// Every error type in the pipeline implements this so callers can report
/// and move on without matching on error kind.
pub trait Error {
    fn throw(&self);
}

/// A lexical error: unterminated string, unterminated number, unexpected
/// character. Scanning continues after one is reported.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Error for ScanError {
    fn throw(&self) {
        report(self.line, "", &self.message);
    }
}

/// A syntax error raised by the parser. Parsing synchronizes and continues
/// after one is reported.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Error for ParseError {
    fn throw(&self) {
        let r#where = if self.token.kind == TokenKind::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", self.token.lexeme)
        };
        report(self.token.line, &r#where, &self.message);
    }
}

/// A static scoping error raised by the resolver (e.g. `this` outside a
/// class, returning a value from an initializer).
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Error for ResolveError {
    fn throw(&self) {
        let r#where = format!(" at '{}'", self.token.lexeme);
        report(self.token.line, &r#where, &self.message);
    }
}

/// An error raised while walking the AST: type mismatches, unresolved
/// names, bad arity, and so on. Unwinds the evaluator back to the driver.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError { token: token.clone(), message: message.into() }
    }
}

impl Error for RuntimeError {
    fn throw(&self) {
        eprintln!("{}\n[line {}]", self.message, self.token.line);
        HAD_RUNTIME_ERROR.store(true, Ordering::SeqCst);
    }
}

/// Control-flow signal threaded through statement execution. `Return` is
/// not an error — it unwinds exactly to the enclosing `LoxFunction::call`
/// — but reusing `Result`'s `?` propagation for it is the least ceremony
/// available without exceptions.
pub enum Unwind {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

pub type ExecResult<T> = Result<T, Unwind>;
