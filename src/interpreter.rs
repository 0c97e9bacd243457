use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::Class;
use crate::environment::Environment;
use crate::error::{Error, RuntimeError, Unwind};
use crate::expr::{Expr, ExprVisitor};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::{Token, Type};

type EvalResult = Result<Object, Unwind>;
type ExecResult = Result<(), Unwind>;

/// Walks the resolved AST and executes it. The interpreter owns the globals
/// frame, the current environment frame and the locals side table filled in
/// by the resolver. `print` output goes to the borrowed sink so callers can
/// capture it.
pub struct Interpreter<'a> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<Token, usize>,
    output: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        let globals = Rc::new(RefCell::new(Environment::default()));

        for native in NativeFunction::get_globals() {
            let name = native.name.lexeme.clone();
            globals.borrow_mut().define(&name, Object::from(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Executes the statements in order. The first runtime error is reported
    /// and aborts the rest of the run.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                match unwind {
                    Unwind::Error(error) => error.throw(),
                    // The resolver rejects top-level returns.
                    Unwind::Return(_) => (),
                }
                return;
            }
        }
    }

    /// Records the scope distance of a variable reference. Called by the
    /// resolver; the token's source location keeps entries distinct per
    /// reference site.
    pub fn resolve(&mut self, name: &Token, depth: usize) {
        self.locals.insert(name.clone(), depth);
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    /// Executes the statements with the current frame swapped for the given
    /// one. The previous frame is restored on every exit path, including a
    /// return unwinding through the block.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|statement| self.execute(statement));

        self.environment = previous;
        result
    }

    /// Reads a variable through the locals table: resolved references are
    /// fetched at their recorded distance, everything else falls through to
    /// the globals frame.
    fn look_up_variable(&self, name: &Token) -> Result<Object, RuntimeError> {
        match self.locals.get(name) {
            Some(distance) => self.environment.borrow().get_at(*distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operand_error(operator: &Token) -> Unwind {
    Unwind::Error(RuntimeError {
        token: operator.clone(),
        message: String::from("Operand must be a number."),
    })
}

fn check_number_operands(operator: &Token, left: &Object, right: &Object) -> Result<(f64, f64), Unwind> {
    match (left.as_number(), right.as_number()) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(number_operand_error(operator)),
    }
}

impl<'a> ExprVisitor<EvalResult> for Interpreter<'a> {
    fn visit_assign_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Assign(assign) = expr else { unreachable!() };

        let value = self.evaluate(&assign.value)?;

        match self.locals.get(&assign.name) {
            Some(distance) => {
                self.environment.borrow_mut().assign_at(*distance, &assign.name, value.clone());
            },
            None => {
                self.globals.borrow_mut().assign(&assign.name, value.clone())?;
            },
        }

        Ok(value)
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Binary(binary) = expr else { unreachable!() };

        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        let value = match binary.operator.r#type {
            Type::Greater => {
                let (left, right) = check_number_operands(&binary.operator, &left, &right)?;
                Object::from(left > right)
            },
            Type::GreaterEqual => {
                let (left, right) = check_number_operands(&binary.operator, &left, &right)?;
                Object::from(left >= right)
            },
            Type::Less => {
                let (left, right) = check_number_operands(&binary.operator, &left, &right)?;
                Object::from(left < right)
            },
            Type::LessEqual => {
                let (left, right) = check_number_operands(&binary.operator, &left, &right)?;
                Object::from(left <= right)
            },
            Type::BangEqual => Object::from(left != right),
            Type::EqualEqual => Object::from(left == right),
            Type::Minus => (left - right).ok_or_else(|| number_operand_error(&binary.operator))?,
            Type::Slash => (left / right).ok_or_else(|| number_operand_error(&binary.operator))?,
            Type::Star => (left * right).ok_or_else(|| number_operand_error(&binary.operator))?,
            Type::Plus => (left + right).ok_or_else(|| Unwind::Error(RuntimeError {
                token: binary.operator.clone(),
                message: String::from("Operands must be two numbers or two strings."),
            }))?,
            _ => unreachable!(),
        };

        Ok(value)
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Call(call) = expr else { unreachable!() };

        let callee = self.evaluate(&call.callee)?;

        let mut arguments = Vec::new();
        for argument in &call.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable = match &callee {
            Object::Function(function) => function,
            Object::NativeFunction(function) => function,
            Object::Class(class) => class,
            _ => return Err(Unwind::Error(RuntimeError {
                token: call.paren.clone(),
                message: String::from("Can only call functions and classes."),
            })),
        };

        if arguments.len() != callable.arity() {
            return Err(Unwind::Error(RuntimeError {
                token: call.paren.clone(),
                message: format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
            }));
        }

        Ok(callable.call(self, arguments)?)
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Get(get) = expr else { unreachable!() };

        let object = self.evaluate(&get.object)?;

        if let Object::Instance(instance) = &object {
            let value = instance.borrow().get(&get.name, &object)?;
            Ok(value)
        } else {
            Err(Unwind::Error(RuntimeError {
                token: get.name.clone(),
                message: String::from("Only instances have properties."),
            }))
        }
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Grouping(grouping) = expr else { unreachable!() };

        self.evaluate(&grouping.expr)
    }

    fn visit_literal_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Literal(literal) = expr else { unreachable!() };

        Ok(Object::from(literal.clone()))
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Logical(logical) = expr else { unreachable!() };

        let left = self.evaluate(&logical.left)?;

        // Short-circuit: the result is the deciding operand itself, not a
        // coerced boolean.
        if logical.operator.r#type == Type::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(&logical.right)
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Set(set) = expr else { unreachable!() };

        let object = self.evaluate(&set.object)?;

        let Object::Instance(instance) = object else {
            return Err(Unwind::Error(RuntimeError {
                token: set.name.clone(),
                message: String::from("Only instances have fields."),
            }));
        };

        let value = self.evaluate(&set.value)?;
        instance.borrow_mut().set(&set.name, value.clone());

        Ok(value)
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Super(super_expr) = expr else { unreachable!() };

        let distance = *self.locals.get(&super_expr.keyword)
            .expect("'super' should have a resolved scope distance");

        let superclass = self.environment.borrow().get_at(distance, &Token::from("super"))?;
        let Object::Class(superclass) = superclass else { unreachable!() };

        // The instance is bound one frame inside the frame that holds 'super'.
        let object = self.environment.borrow().get_at(distance - 1, &Token::from("this"))?;

        let method = superclass.borrow().find_method(&super_expr.method.lexeme);
        match method {
            Some(method) => Ok(Object::from(method.bind(object))),
            None => Err(Unwind::Error(RuntimeError {
                token: super_expr.method.clone(),
                message: format!("Undefined method '{}'.", super_expr.method.lexeme),
            })),
        }
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::This(this) = expr else { unreachable!() };

        Ok(self.look_up_variable(&this.keyword)?)
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Unary(unary) = expr else { unreachable!() };

        let right = self.evaluate(&unary.expr)?;

        match unary.operator.r#type {
            Type::Minus => Ok((-right).ok_or_else(|| number_operand_error(&unary.operator))?),
            Type::Bang => Ok(Object::from(!right.is_truthy())),
            _ => unreachable!(),
        }
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Variable(variable) = expr else { unreachable!() };

        Ok(self.look_up_variable(&variable.name)?)
    }
}

impl<'a> StmtVisitor<ExecResult> for Interpreter<'a> {
    fn visit_block_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Block(block) = stmt else { unreachable!() };

        let environment = Environment::new(Some(Rc::clone(&self.environment)));
        self.execute_block(&block.statements, Rc::new(RefCell::new(environment)))
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Class(class_stmt) = stmt else { unreachable!() };

        let superclass = match &class_stmt.superclass {
            Some(superclass_expr) => {
                let Expr::Variable(superclass_name) = superclass_expr else { unreachable!() };

                match self.evaluate(superclass_expr)? {
                    Object::Class(class) => Some(class),
                    _ => return Err(Unwind::Error(RuntimeError {
                        token: superclass_name.name.clone(),
                        message: String::from("Superclass must be a class."),
                    })),
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&class_stmt.name.lexeme, Object::from(Literal::Nil));

        // Methods of a subclass close over an extra frame that binds 'super'.
        let previous = Rc::clone(&self.environment);
        if let Some(superclass) = &superclass {
            let mut environment = Environment::new(Some(Rc::clone(&self.environment)));
            environment.define("super", Object::from(Rc::clone(superclass)));
            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut methods = HashMap::new();
        for method in &class_stmt.methods {
            let Stmt::Function(declaration) = method else { unreachable!() };

            let function = Function::new(
                declaration,
                Rc::clone(&self.environment),
                declaration.name.lexeme == "init",
            );
            methods.insert(declaration.name.lexeme.clone(), function);
        }

        let class = Class::new(class_stmt.name.lexeme.clone(), superclass, methods);

        self.environment = previous;
        self.environment.borrow_mut().assign(&class_stmt.name, Object::from(class))?;

        Ok(())
    }

    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Expression(data) = stmt else { unreachable!() };

        self.evaluate(&data.expr)?;
        Ok(())
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Function(data) = stmt else { unreachable!() };

        let function = Function::new(data, Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));

        Ok(())
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::If(data) = stmt else { unreachable!() };

        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)?;
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)?;
        }

        Ok(())
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Print(data) = stmt else { unreachable!() };

        let value = self.evaluate(&data.expr)?;
        let _ = writeln!(self.output, "{value}");

        Ok(())
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Return(data) = stmt else { unreachable!() };

        let value = match &data.value {
            Some(value) => self.evaluate(value)?,
            None => Object::from(Literal::Nil),
        };

        Err(Unwind::Return(value))
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Var(data) = stmt else { unreachable!() };

        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::from(Literal::Nil),
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);

        Ok(())
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::While(data) = stmt else { unreachable!() };

        while self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.body)?;
        }

        Ok(())
    }
}
