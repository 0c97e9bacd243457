use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;
use crate::token::Token;
use crate::error::RuntimeError;

/// A single frame of the environment chain: the variables of one scope plus
/// a link to the enclosing scope. Frames are shared through `Rc` so that a
/// closure can keep its defining scope alive after control has left it.
#[derive(Debug, Clone)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    pub variables: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            enclosing,
            variables: HashMap::new(),
        }
    }

    /// Defines a variable in this frame, replacing any previous value.
    pub fn define(&mut self, name: &str, value: Object) {
        self.variables.insert(name.to_string(), value);
    }

    /// Walks `distance` frames up the enclosing chain. The resolver
    /// guarantees the chain is at least that long.
    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let parent = self.enclosing.clone()
            .unwrap_or_else(|| panic!("enclosing environment to exist at depth 1"));
        let mut environment = Rc::clone(&parent);

        for depth in 1..distance {
            let parent = environment.borrow().enclosing.clone()
                .unwrap_or_else(|| panic!("enclosing environment to exist at depth {depth}"));
            environment = Rc::clone(&parent);
        }

        environment
    }

    /// Looks a variable up, searching the enclosing chain outwards.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(variable) = self.variables.get(&name.lexeme) {
            return Ok(variable.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    /// Looks a variable up at a fixed distance computed by the resolver.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeError> {
        let variable = if distance > 0 {
            self.ancestor(distance).borrow().variables.get(&name.lexeme).cloned()
        } else {
            self.variables.get(&name.lexeme).cloned()
        };

        variable.ok_or_else(|| RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    /// Assigns to an existing variable, searching the enclosing chain outwards.
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.variables.contains_key(&name.lexeme) {
            self.variables.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    /// Assigns to a variable at a fixed distance computed by the resolver.
    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Object) {
        if distance > 0 {
            self.ancestor(distance).borrow_mut().variables.insert(name.lexeme.clone(), value);
        } else {
            self.variables.insert(name.lexeme.clone(), value);
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::literal::Literal;

    fn global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::default()))
    }

    #[test]
    fn define_and_get() {
        let environment = global();
        environment.borrow_mut().define("a", Object::from(1.0));

        let value = environment.borrow().get(&Token::from("a"));
        assert_eq!(value.unwrap(), Object::from(1.0));
    }

    #[test]
    fn get_undefined() {
        let environment = global();
        assert!(environment.borrow().get(&Token::from("ghost")).is_err());
    }

    #[test]
    fn define_replaces() {
        let environment = global();
        environment.borrow_mut().define("a", Object::from(1.0));
        environment.borrow_mut().define("a", Object::from(2.0));

        let value = environment.borrow().get(&Token::from("a"));
        assert_eq!(value.unwrap(), Object::from(2.0));
    }

    #[test]
    fn assign_searches_enclosing() {
        let outer = global();
        outer.borrow_mut().define("a", Object::from(1.0));

        let mut inner = Environment::new(Some(Rc::clone(&outer)));
        inner.assign(&Token::from("a"), Object::from(5.0)).unwrap();

        let value = outer.borrow().get(&Token::from("a"));
        assert_eq!(value.unwrap(), Object::from(5.0));
    }

    #[test]
    fn assign_undefined() {
        let environment = global();
        let result = environment.borrow_mut().assign(&Token::from("ghost"), Object::from(1.0));
        assert_eq!(result.unwrap_err().message, "Undefined variable 'ghost'.");
    }

    #[test]
    fn get_at_walks_the_chain() {
        let outer = global();
        outer.borrow_mut().define("a", Object::from(Literal::from("outer")));

        let middle = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&outer)))));
        middle.borrow_mut().define("a", Object::from(Literal::from("middle")));

        let inner = Environment::new(Some(Rc::clone(&middle)));

        assert_eq!(
            inner.get_at(1, &Token::from("a")).unwrap(),
            Object::from(Literal::from("middle")),
        );
        assert_eq!(
            inner.get_at(2, &Token::from("a")).unwrap(),
            Object::from(Literal::from("outer")),
        );
    }

    #[test]
    fn assign_at_writes_the_right_frame() {
        let outer = global();
        outer.borrow_mut().define("a", Object::from(1.0));

        let mut inner = Environment::new(Some(Rc::clone(&outer)));
        inner.define("a", Object::from(2.0));

        inner.assign_at(1, &Token::from("a"), Object::from(10.0));
        assert_eq!(outer.borrow().get(&Token::from("a")).unwrap(), Object::from(10.0));
        assert_eq!(inner.get_at(0, &Token::from("a")).unwrap(), Object::from(2.0));
    }
}
