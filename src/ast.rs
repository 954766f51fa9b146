//! This module defines the expression tree produced by the reader and consumed by the
//! evaluator. An [`Expr`] is either an atom (a number or a symbol) or a list of
//! expressions. Expressions are code: they are never the result of evaluation, except
//! through `quote`, which converts them into [`crate::value::Value`] data.
//!
//! Ergonomic helpers [`expr`], [`sym`] and [`list`] build trees in code and tests, and
//! [`std::fmt::Display`] renders a tree back into text the reader accepts.

/// Type alias for number values in the interpreter
pub type NumberType = f64;

/// Core expression type
///
/// To build an expression in code, use the helper functions:
/// - `expr(42)` for numbers, `sym("name")` for symbols
/// - `expr(["a", "b"])` for homogeneous lists
/// - `list(vec![sym("+"), expr(1), expr(2)])` for mixed lists
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric atoms
    Number(NumberType),
    /// Every non-numeric atom, compared by exact text
    Symbol(String),
    /// One parenthesized group; the head is the operator or special-form keyword
    List(Vec<Expr>),
}

impl Expr {
    /// The symbol text if this expression is a symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

}

// From trait implementations for Expr - enables .into() conversion
impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Symbol(s.to_owned())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Symbol(s)
    }
}

impl From<NumberType> for Expr {
    fn from(n: NumberType) -> Self {
        Expr::Number(n)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Expr {
            fn from(n: $int_type) -> Self {
                Expr::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Expr>> From<Vec<T>> for Expr {
    fn from(v: Vec<T>) -> Self {
        Expr::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Expr>, const N: usize> From<[T; N]> for Expr {
    fn from(arr: [T; N]) -> Self {
        Expr::List(arr.into_iter().map(Into::into).collect())
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Expr {
    Expr::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating expressions from anything convertible
pub fn expr<T: Into<Expr>>(value: T) -> Expr {
    value.into()
}

/// Helper function for creating lists of mixed expressions
pub fn list(elements: Vec<Expr>) -> Expr {
    Expr::List(elements)
}

/// Write a number so the reader parses it back to the same value.
///
/// Infinities come from literals too large for `f64` and are written as such a
/// literal, since `inf` would read back as a symbol.
pub fn write_number(f: &mut std::fmt::Formatter<'_>, n: NumberType) -> std::fmt::Result {
    if n == NumberType::INFINITY {
        write!(f, "1e999")
    } else if n == NumberType::NEG_INFINITY {
        write!(f, "-1e999")
    } else {
        write!(f, "{n}")
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write_number(f, *n),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}
