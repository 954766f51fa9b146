use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::intooperation::{IntoOperation, IntoVariadicOperation};
use crate::value::{Builtin, Procedure, Value};
use crate::{Arity, Error};

/// Environment for variable bindings
///
/// An `Environment` is a shared handle to one frame of the chain. Cloning the handle
/// does not copy the frame: closures capture their defining frame this way, and a
/// mutation through any handle is visible to every other holder.
#[derive(Clone, Default)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
}

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Value>,
    outer: Option<Environment>,
}

impl Environment {
    /// Create an empty root frame
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create an empty frame whose outer link is `outer`
    pub fn with_outer(outer: &Environment) -> Self {
        Environment {
            frame: Rc::new(RefCell::new(Frame {
                bindings: HashMap::new(),
                outer: Some(outer.clone()),
            })),
        }
    }

    /// Create the frame for one procedure call, binding each parameter in order to
    /// the matching argument.
    pub fn extend(&self, params: &[String], args: Vec<Value>) -> Result<Environment, Error> {
        Arity::Exact(params.len()).validate(args.len())?;

        let env = Environment::with_outer(self);
        {
            let mut frame = env.frame.borrow_mut();
            for (param, arg) in params.iter().zip(args) {
                frame.bindings.insert(param.clone(), arg);
            }
        }
        Ok(env)
    }

    /// The enclosing frame, if any
    pub fn outer(&self) -> Option<Environment> {
        self.frame.borrow().outer.clone()
    }

    /// Check whether both handles refer to the same frame
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }

    /// Check whether `name` is bound in this frame, ignoring outer frames
    pub fn defines_locally(&self, name: &str) -> bool {
        self.frame.borrow().bindings.contains_key(name)
    }

    /// Find the frame that owns `name`, searching this frame first and then outward.
    ///
    /// The frame itself is returned (not the value) so callers can both read and
    /// overwrite the binding in place.
    pub fn lookup_frame(&self, name: &str) -> Result<Environment, Error> {
        let mut current = self.clone();
        loop {
            if current.defines_locally(name) {
                return Ok(current);
            }
            match current.outer() {
                Some(outer) => current = outer,
                None => return Err(Error::UnboundVariable(name.to_owned())),
            }
        }
    }

    /// Look up the value bound to `name` anywhere in the chain
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let owner = self.lookup_frame(name)?;
        let frame = owner.frame.borrow();
        frame
            .bindings
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnboundVariable(name.to_owned()))
    }

    /// Bind `name` in this frame, shadowing any outer binding and overwriting a
    /// previous local one.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.frame.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Overwrite the existing binding of `name` in the frame that owns it.
    ///
    /// Never creates a binding: fails with [`Error::UnboundVariable`] instead.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), Error> {
        let owner = self.lookup_frame(name)?;
        owner.define(name, value);
        Ok(())
    }

    /// Register a custom builtin function working directly on evaluated arguments.
    ///
    /// This is the low-level API. The function receives the argument values as a
    /// slice and must check their count and types itself.
    ///
    /// # Example
    /// ```
    /// use tinylisp::environment::Environment;
    /// use tinylisp::value::Value;
    /// use tinylisp::Error;
    ///
    /// fn count_args(args: &[Value]) -> Result<Value, Error> {
    ///     Ok(Value::Number(args.len() as f64))
    /// }
    ///
    /// let env = Environment::new();
    /// env.register_builtin_function("count-args", count_args);
    /// // Now (count-args a b c) evaluates to 3
    /// ```
    pub fn register_builtin_function<F>(&self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, Error> + 'static,
    {
        self.define_builtin(name, Box::new(move |args: Vec<Value>| func(&args)));
    }

    /// Register a strongly-typed Rust function as a builtin with automatic argument
    /// conversion and exact arity checking.
    ///
    /// ```
    /// use tinylisp::environment::Environment;
    ///
    /// fn hypot(a: f64, b: f64) -> f64 {
    ///     (a * a + b * b).sqrt()
    /// }
    ///
    /// let env = Environment::new();
    /// env.register_builtin_operation("hypot", hypot);
    /// ```
    ///
    /// Supported parameter types are `f64`, `bool`, `Value` and `Vec<Value>` (a list
    /// argument). Supported return types are `Value`, `f64`, `bool`, and
    /// `Result<T, Error>` where `T: Into<Value>`.
    pub fn register_builtin_operation<F, Args>(&self, name: &str, func: F)
    where
        F: IntoOperation<Args>,
    {
        self.define_builtin(name, func.into_operation());
    }

    /// Register a variadic builtin whose last Rust parameter is a
    /// [`crate::intooperation::Rest`] collecting the remaining arguments.
    ///
    /// The provided [`Arity`] is checked against the total argument count before the
    /// function runs, since minimum counts are not always derivable from the Rust
    /// signature alone.
    pub fn register_variadic_builtin_operation<F, Args>(&self, name: &str, arity: Arity, func: F)
    where
        F: IntoVariadicOperation<Args>,
    {
        let inner = func.into_variadic_operation();
        self.define_builtin(
            name,
            Box::new(move |args: Vec<Value>| {
                arity.validate(args.len())?;
                inner(args)
            }),
        );
    }

    fn define_builtin(&self, name: &str, func: Box<crate::intooperation::OperationFn>) {
        let builtin = Builtin {
            id: name.to_owned(),
            func,
        };
        self.define(name, Value::Procedure(Procedure::Builtin(Rc::new(builtin))));
    }

    /// Get all bindings visible from this frame
    /// Returns a Vec of (name, value) pairs sorted by name; inner bindings shadow outer ones
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Start with outer bindings so they can be overridden by local bindings
        if let Some(outer) = self.outer() {
            bindings.extend(outer.bindings());
        }

        for (name, value) in &self.frame.borrow().bindings {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Only local names are shown: bindings may hold closures that point back here.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.frame.borrow();
        let mut names: Vec<&String> = frame.bindings.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_outer", &frame.outer.is_some())
            .finish()
    }
}
