use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::Function;
use crate::object::{Callable, Object};
use crate::interpreter::Interpreter;
use crate::token::Token;

#[derive(Clone)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<RefCell<Class>>>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<RefCell<Class>>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Class { name, superclass, methods }
    }

    /// Looks a method up on this class, walking the superclass chain upwards.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        if let Some(superclass) = &self.superclass {
            return superclass.borrow().find_method(name);
        }

        None
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// Classes are called through their shared handle so that every instance
// points back at the same class object and identity comparisons hold.
impl Callable for Rc<RefCell<Class>> {
    fn arity(&self) -> usize {
        match self.borrow().find_method("init") {
            Some(initializer) => initializer.arity(),
            None => 0,
        }
    }

    /// Calling a class constructs an instance of it, running the `init`
    /// method (possibly inherited) when one exists.
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let instance = Object::from(Instance::from(self));

        if let Some(initializer) = self.borrow().find_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

#[derive(Clone)]
pub struct Instance {
    pub class: Rc<RefCell<Class>>,
    pub fields: HashMap<String, Object>,
}

impl Instance {
    /// Reads a property: a field when one was assigned, otherwise a method
    /// bound to this instance. `instance` is the shared handle to self,
    /// needed for the binding.
    pub fn get(&self, name: &Token, instance: &Object) -> Result<Object, RuntimeError> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            Ok(field.clone())
        } else if let Some(method) = self.class.borrow().find_method(&name.lexeme) {
            Ok(Object::from(method.bind(instance.clone())))
        } else {
            Err(RuntimeError {
                token: name.clone(),
                message: format!("Undefined property '{}'.", name.lexeme),
            })
        }
    }

    /// Writes a field, creating it on first assignment.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl From<&Rc<RefCell<Class>>> for Instance {
    fn from(value: &Rc<RefCell<Class>>) -> Self {
        Instance { class: Rc::clone(value), fields: HashMap::new() }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<instance {}>", self.class.borrow().name)
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow().name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn class(name: &str, superclass: Option<Rc<RefCell<Class>>>) -> Rc<RefCell<Class>> {
        Rc::new(RefCell::new(Class::new(name.to_string(), superclass, HashMap::new())))
    }

    #[test]
    fn find_method_walks_superclass_chain() {
        use crate::environment::Environment;
        use crate::stmt::FunctionData;
        use crate::token::Token;

        let declaration = FunctionData {
            name: Token::from("speak"),
            params: vec![],
            body: vec![],
        };
        let environment = Rc::new(RefCell::new(Environment::default()));
        let speak = Function::new(&declaration, environment, false);

        let base = class("Base", None);
        base.borrow_mut().methods.insert("speak".to_string(), speak);
        let derived = class("Derived", Some(Rc::clone(&base)));

        assert!(derived.borrow().find_method("speak").is_some());
        assert!(derived.borrow().find_method("missing").is_none());
    }

    #[test]
    fn field_shadows_nothing_until_set() {
        let class = class("Point", None);
        let instance = Instance::from(&class);
        let handle = Object::from(instance);

        let Object::Instance(instance) = &handle else { unreachable!() };
        let result = instance.borrow().get(&Token::from("x"), &handle);
        assert_eq!(result.unwrap_err().message, "Undefined property 'x'.");

        instance.borrow_mut().set(&Token::from("x"), Object::from(5.0));
        let result = instance.borrow().get(&Token::from("x"), &handle);
        assert_eq!(result.unwrap(), Object::from(5.0));
    }

    #[test]
    fn instance_display() {
        let class = class("Point", None);
        let instance = Object::from(Instance::from(&class));
        assert_eq!(instance.to_string(), "Point instance");
        assert_eq!(Object::from(class).to_string(), "Point");
    }
}
