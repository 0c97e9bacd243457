//! A tree-walk interpreter for the Lox programming language. Lox is a small
//! dynamically typed scripting language with first-class functions, lexical
//! closures and single-inheritance classes, described in the
//! [Crafting Interpreters](https://craftinginterpreters.com/) book by Bob
//! Nystrom.
//!
//! ## Scanning
//! The first stage converts the source text into a flat list of tokens. The
//! scanner lives in the [`scanner`](scanner) module; it is a single forward
//! pass that tracks line and column positions for diagnostics. Scan errors
//! like an unterminated string are reported as a
//! [`ScanError`](error::ScanError) and scanning continues, so several
//! problems can be reported in one run.
//!
//! ## Parsing
//! The [`parser`](parser) module holds a hand-written recursive descent
//! parser over the token list. It produces [`expressions`](expr::Expr),
//! pieces of code that evaluate to an [`Object`](object::Object), and
//! [`statements`](stmt::Stmt), pieces of code run for their effect. On a
//! syntax error the parser reports a [`ParseError`](error::ParseError),
//! discards tokens up to the next statement boundary, and keeps going.
//!
//! ## Resolving
//! Before anything runs, the [`resolver`](resolver) walks the tree once and
//! computes, for every variable reference, how many environment frames out
//! its binding lives. This pins every closure to the scope that was visible
//! where the function was written, instead of whatever happens to be in
//! scope when it is called. The pass also catches semantic mistakes that are
//! not syntax errors, like `return` at the top level or a class inheriting
//! from itself, reported as [`ResolveError`](error::ResolveError)s.
//!
//! ## Interpreting
//! The [`interpreter`](interpreter) module evaluates the resolved tree
//! directly. Variables live in a chain of [`Environment`](environment::Environment)
//! frames; functions capture the frame that was current at their
//! declaration. Type mistakes that survive the static passes, like adding a
//! string to a number, surface at this point as
//! [`RuntimeError`](error::RuntimeError)s and abort the current run.

use std::io::Write;
use std::{fs, process};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

pub mod error;
pub mod token;
pub mod scanner;
pub mod expr;
pub mod stmt;
pub mod environment;
pub mod parser;
pub mod ast;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod function;
pub mod resolver;
pub mod class;

use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use resolver::Resolver;

/// The front of the interpreter: feeds a source string through the pipeline
/// and maps errors to exit codes. `print` output goes to the writer given at
/// construction.
#[allow(non_camel_case_types)]
pub struct lox<'a> {
    interpreter: Interpreter<'a>,
}

impl<'a> lox<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        lox {
            interpreter: Interpreter::new(output),
        }
    }

    /// Runs a script file. Exits with 65 on a static error, 70 on a runtime
    /// error and 2 when the file cannot be read.
    pub fn run_file(&mut self, path: &str) {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                eprintln!("failed to read file: {error}");
                process::exit(2);
            },
        };

        self.run(&contents);

        if error::did_static_error() {
            process::exit(65);
        }
        if error::did_runtime_error() {
            process::exit(70);
        }
    }

    /// Runs an interactive prompt until end of input. Errors are reported
    /// per line; the error flags reset so one bad line does not poison the
    /// session.
    pub fn run_prompt(&mut self) {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(error) => {
                eprintln!("failed to start the prompt: {error}");
                return;
            },
        };

        let history = home::home_dir().map(|dir| dir.join(".lox_history"));
        if let Some(history) = &history {
            let _ = editor.load_history(history);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    self.run(&line);
                    error::reset_error();
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(error) => {
                    eprintln!("failed to read line: {error}");
                    break;
                },
            }
        }

        if let Some(history) = &history {
            let _ = editor.save_history(history);
        }
    }

    /// Runs one source string through scan, parse, resolve and interpret.
    /// Evaluation is skipped if any static error was reported.
    fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();

        if error::did_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);

        if error::did_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}
