use std::sync::atomic::{AtomicBool, Ordering};

use crate::object::Object;
use crate::token::{Token, Type, Location};

static HAD_ERROR: AtomicBool = AtomicBool::new(false);
static HAD_RUNTIME_ERROR: AtomicBool = AtomicBool::new(false);

/// Checks if an error occurred during scanning, parsing, resolving or interpreting.
pub fn did_error() -> bool {
    did_static_error() || did_runtime_error()
}

/// Checks if an error occurred before evaluation started.
pub fn did_static_error() -> bool {
    HAD_ERROR.load(Ordering::Relaxed)
}

/// Checks if an error occurred during runtime.
pub fn did_runtime_error() -> bool {
    HAD_RUNTIME_ERROR.load(Ordering::Relaxed)
}

/// Resets the error flags.
/// This is used to reset the interpreter between prompt lines.
pub fn reset_error() {
    HAD_ERROR.store(false, Ordering::Relaxed);
    HAD_RUNTIME_ERROR.store(false, Ordering::Relaxed);
}

fn report(line: usize, context: &str, message: &str) {
    eprintln!("[line {line}] Error{context}: {message}");
    HAD_ERROR.store(true, Ordering::Relaxed);
}

/// Every error type must implement this trait.
pub trait Error {
    /// Prints the error message and sets the matching error flag.
    fn throw(&self);
}

/// Represents an error that occurs during scanning.
#[derive(Debug)]
pub struct ScanError {
    pub location: Location,
    pub message: String,
}

impl Error for ScanError {
    fn throw(&self) {
        report(self.location.line, "", &self.message);
    }
}

/// Represents an error that occurs during parsing.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Error for ParseError {
    fn throw(&self) {
        if self.token.r#type == Type::EOF {
            report(self.token.location.line, " at end", &self.message);
        } else {
            let context = format!(" at '{}'", self.token.lexeme);
            report(self.token.location.line, &context, &self.message);
        }
    }
}

/// Represents an error that occurs during resolution.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Error for ResolveError {
    fn throw(&self) {
        let context = format!(" at '{}'", self.token.lexeme);
        report(self.token.location.line, &context, &self.message);
    }
}

/// Represents an error that occurs during runtime.
#[derive(Debug)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Error for RuntimeError {
    fn throw(&self) {
        eprintln!("{message}\n[line {line}]", message = self.message, line = self.token.location.line);
        HAD_RUNTIME_ERROR.store(true, Ordering::Relaxed);
    }
}

/// The non-local exits of the evaluator. A `return` statement travels up the
/// execution stack the same way a runtime error does, but it is caught at the
/// function call boundary and converted into the call's result instead of
/// being reported.
#[derive(Debug)]
pub enum Unwind {
    Error(RuntimeError),
    Return(Object),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}
