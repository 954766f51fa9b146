//! tinylisp - a tiny lexically-scoped Lisp evaluator
//!
//! This crate turns source text into a tree of expressions and evaluates that tree
//! against a chain of variable-binding frames. The language has exactly six special
//! forms plus generic procedure application:
//!
//! ```scheme
//! (quote (a b c))                 ; data, not code
//! (if (< x 0) (- x) x)            ; only #f is false, 0 is true
//! (define square (lambda (x) (* x x)))
//! (set! counter (+ counter 1))    ; mutate an existing binding
//! (begin (print 1) (print 2) 3)   ; sequencing
//! ((lambda (n) (* n n)) 7)        ; application
//! ```
//!
//! Numbers are `f64`; every other token that is not a parenthesis is a symbol.
//! There are no strings, comments or reader macros.
//!
//! ## Pipeline
//!
//! text → [`lexer::tokenize`] → tokens → [`reader::read_expression`] → [`ast::Expr`]
//! → [`evaluator::eval`] against an [`environment::Environment`] → [`value::Value`]
//!
//! The root environment is an explicit value. It is empty until a registration hook
//! (by default [`builtins::install`]) fills it with builtin procedures, so independent
//! sessions can coexist in one process:
//!
//! ```
//! use tinylisp::evaluator::{create_global_env, eval_source};
//! use tinylisp::value::Value;
//!
//! let env = create_global_env();
//! let values = eval_source("(define sq (lambda (x) (* x x))) (sq 12)", &env).unwrap();
//! assert_eq!(values.last(), Some(&Value::Number(144.0)));
//! ```
//!
//! ## Modules
//!
//! - `lexer`: splitting text into tokens
//! - `reader`: building expression trees from tokens
//! - `ast`: the expression data model
//! - `value`: runtime values and procedures
//! - `environment`: binding frames and the builtin registration API
//! - `evaluator`: special forms and application
//! - `builtins`: the default set of builtin procedures
//! - `intooperation`: adapters from typed Rust functions to builtins

use std::fmt;

/// Number of arguments accepted by a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
    /// Any number of arguments, including none
    Any,
}

impl Arity {
    /// Check an argument count against this arity
    pub fn validate(self, got: usize) -> Result<(), Error> {
        let ok = match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::ArityMismatch {
                expected: self,
                got,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Error types for the reader and the evaluator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The token stream ran out while an expression was still open
    #[error("ParseError: unexpected end of input")]
    UnexpectedEndOfInput,
    /// A `)` appeared where an expression was expected
    #[error("ParseError: unexpected ')'")]
    UnbalancedParenthesis,
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),
    /// The head of an application evaluated to something that is not a procedure
    #[error("Not callable: {0}")]
    NotCallable(String),
    #[error("ArityError: expected {expected} arguments, got {got}")]
    ArityMismatch { expected: Arity, got: usize },
    /// A special form whose operands do not have the required shape
    #[error("Malformed {keyword}: {message}")]
    MalformedForm {
        keyword: &'static str,
        message: String,
    },
    #[error("EvaluationError: cannot evaluate the empty list")]
    EmptyApplication,
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("EvaluationError: {0}")]
    EvalError(String),
}

impl Error {
    pub(crate) fn malformed(keyword: &'static str, message: impl Into<String>) -> Self {
        Error::MalformedForm {
            keyword,
            message: message.into(),
        }
    }
}

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod intooperation;
pub mod lexer;
pub mod reader;
pub mod value;
