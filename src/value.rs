//! Runtime values produced by evaluation.
//!
//! [`Value`] is a closed sum type: numbers, symbols and lists (data, e.g. from
//! `quote`), booleans, procedures, and the [`Value::Unspecified`] marker returned by
//! forms that are evaluated only for their effect. A [`Procedure`] is either a
//! [`Closure`] created by `lambda` or a [`Builtin`] registered by the embedder.

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Expr, NumberType, write_number};
use crate::environment::Environment;
use crate::intooperation::OperationFn;

/// Core runtime value type
#[derive(Clone)]
pub enum Value {
    /// Numbers (double precision only)
    Number(NumberType),
    /// Symbols as data, returned by `quote`
    Symbol(String),
    /// Lists as data, returned by `quote` and list builtins
    List(Vec<Value>),
    /// Booleans; `Bool(false)` is the only false value for `if`
    Bool(bool),
    /// Closures and builtins
    Procedure(Procedure),
    /// Result of forms evaluated for their side effects (`define`, `set!`, ...)
    Unspecified,
}

/// A callable value
#[derive(Clone)]
pub enum Procedure {
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
}

/// A user-defined procedure (params, body, captured environment)
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expr,
    /// The environment active where the `lambda` was evaluated, shared with it
    pub env: Environment,
}

/// An opaque procedure implemented in Rust
pub struct Builtin {
    /// The name the builtin was registered under, used for display and equality
    pub id: String,
    pub func: Box<OperationFn>,
}

impl Builtin {
    pub fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        (self.func)(args)
    }
}

impl Value {
    /// Everything except `#f` counts as true, including `0` and the empty list
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Procedure(_))
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Bool(_) => "boolean",
            Value::Procedure(_) => "procedure",
            Value::Unspecified => "unspecified",
        }
    }
}

/// Quoted expressions become data: atoms map to atoms, lists to lists
impl From<&Expr> for Value {
    fn from(expr: &Expr) -> Self {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Symbol(s) => Value::Symbol(s.clone()),
            Expr::List(elements) => Value::List(elements.iter().map(Value::from).collect()),
        }
    }
}

impl From<NumberType> for Value {
    fn from(n: NumberType) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(NumberType::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Symbol(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

impl From<Procedure> for Value {
    fn from(p: Procedure) -> Self {
        Value::Procedure(p)
    }
}

/// Helper function for creating Values
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil)
pub fn nil() -> Value {
    Value::List(vec![])
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(list) => f.debug_tuple("List").field(list).finish(),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Procedure(p) => write!(f, "{p:?}"),
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// The captured environment is left out: it may contain this very closure.
impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Closure(c) => {
                write!(f, "Closure(params={:?}, body={})", c.params, c.body)
            }
            Procedure::Builtin(b) => write!(f, "Builtin({})", b.id),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write_number(f, *n),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Procedure(Procedure::Closure(c)) => {
                write!(f, "#<lambda (")?;
                write!(f, "{}", c.params.join(" "))?;
                write!(f, ")>")
            }
            Value::Procedure(Procedure::Builtin(b)) => write!(f, "#<builtin:{}>", b.id),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Procedure(a), Value::Procedure(b)) => a == b,
            (Value::Unspecified, Value::Unspecified) => true,
            _ => false,
        }
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Closures are equal only to themselves
            (Procedure::Closure(a), Procedure::Closure(b)) => Rc::ptr_eq(a, b),
            // Compare builtins by id, not function pointer
            (Procedure::Builtin(a), Procedure::Builtin(b)) => a.id == b.id,
            _ => false,
        }
    }
}
