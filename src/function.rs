use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::object::{Object, Callable};
use crate::error::{RuntimeError, Unwind};
use crate::stmt::{Stmt, FunctionData};
use crate::token::Token;
use crate::literal::Literal;

/// A user defined function together with the environment frame that was
/// current when it was declared. Calling the function chains a fresh frame
/// onto that closure, which is what pins the body to its lexical scope.
#[derive(Clone)]
pub struct Function {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

// The closure chain can reach back to this function, so Debug must not
// recurse into it.
impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

impl Function {
    pub fn new(declaration: &FunctionData, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function {
            name: declaration.name.clone(),
            params: declaration.params.clone(),
            body: declaration.body.clone(),
            closure,
            is_initializer,
        }
    }

    /// Produces a copy of this function whose closure is wrapped in a frame
    /// that defines `this` as the given instance.
    pub fn bind(&self, instance: Object) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", instance);

        Function {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, argument) in self.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let body = interpreter.execute_block(&self.body, Rc::new(RefCell::new(environment)));

        // An initializer always evaluates to the instance, even on an early
        // bare return.
        match body {
            Err(Unwind::Error(error)) => Err(error),
            Err(Unwind::Return(value)) if !self.is_initializer => Ok(value),
            _ if self.is_initializer => self.closure.borrow().get_at(0, &Token::from("this")),
            _ => Ok(Object::from(Literal::Nil)),
        }
    }

    fn arity(&self) -> usize {
        self.params.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

/// A host provided function exposed to the language through the globals frame.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Token,
    pub arity: usize,
    pub function: fn(&mut Interpreter<'_>, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl NativeFunction {
    /// The functions every globals frame starts out with.
    pub fn get_globals() -> Vec<NativeFunction> {
        vec![
            NativeFunction {
                name: Token::from("clock"),
                arity: 0,
                function: |_, _| {
                    let now = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_secs_f64();
                    Ok(Object::from(now))
                },
            },
        ]
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name.lexeme)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name.lexeme)
    }
}
