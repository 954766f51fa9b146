use std::rc::Rc;

use tracing::{debug, trace};

use crate::Error;
use crate::ast::Expr;
use crate::builtins;
use crate::reader::parse;
use crate::value::{Closure, Procedure, Value};

pub use crate::environment::Environment;

/// Signature shared by all special forms: unevaluated operands and the current frame
type SpecialFormFn = fn(&[Expr], &Environment) -> Result<Value, Error>;

/// Registry of special forms, recognized purely by head-position symbol text
const SPECIAL_FORMS: &[(&str, SpecialFormFn)] = &[
    ("quote", eval_quote),
    ("if", eval_if),
    ("set!", eval_set),
    ("define", eval_define),
    ("lambda", eval_lambda),
    ("begin", eval_begin),
];

/// Find a special form by its keyword
fn find_special_form(keyword: &str) -> Option<SpecialFormFn> {
    SPECIAL_FORMS
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, form)| *form)
}

/// Evaluate an expression in an environment (public API)
pub fn eval(expr: &Expr, env: &Environment) -> Result<Value, Error> {
    match expr {
        // Variable lookup
        Expr::Symbol(name) => env.get(name),

        // Self-evaluating forms
        Expr::Number(n) => Ok(Value::Number(*n)),

        // Special forms or function application
        Expr::List(elements) => eval_list(elements, env),
    }
}

/// Evaluate a list expression: a special form if the head is one of the keywords,
/// generic application otherwise
fn eval_list(elements: &[Expr], env: &Environment) -> Result<Value, Error> {
    let [head, operands @ ..] = elements else {
        return Err(Error::EmptyApplication);
    };

    if let Some(special_form) = head.as_symbol().and_then(find_special_form) {
        trace!(form = %head, "special form");
        return special_form(operands, env);
    }

    // Function application: evaluate head and operands left to right, then apply
    let func = eval(head, env)?;
    let args = operands
        .iter()
        .map(|operand| eval(operand, env))
        .collect::<Result<Vec<_>, _>>()?;

    trace!(procedure = %func, argc = args.len(), "apply");
    apply(&func, args)
}

/// Invoke a procedure value on already evaluated arguments.
///
/// A closure runs its body in a fresh frame whose outer link is the environment the
/// closure captured (lexical scope), never the caller's environment.
pub fn apply(func: &Value, args: Vec<Value>) -> Result<Value, Error> {
    match func {
        Value::Procedure(Procedure::Builtin(builtin)) => builtin.call(args),
        Value::Procedure(Procedure::Closure(closure)) => {
            let frame = closure.env.extend(&closure.params, args)?;
            eval(&closure.body, &frame)
        }
        other => Err(Error::NotCallable(other.to_string())),
    }
}

/// Evaluate quote special form
fn eval_quote(args: &[Expr], _env: &Environment) -> Result<Value, Error> {
    match args {
        [datum] => Ok(Value::from(datum)),
        _ => Err(Error::malformed(
            "quote",
            format!("expected 1 operand, got {}", args.len()),
        )),
    }
}

/// Evaluate if special form; the branch not taken is never evaluated
fn eval_if(args: &[Expr], env: &Environment) -> Result<Value, Error> {
    let (test, consequent, alternative) = match args {
        [test, consequent] => (test, consequent, None),
        [test, consequent, alternative] => (test, consequent, Some(alternative)),
        _ => {
            return Err(Error::malformed(
                "if",
                format!("expected 2 or 3 operands, got {}", args.len()),
            ));
        }
    };

    if eval(test, env)?.is_truthy() {
        eval(consequent, env)
    } else {
        match alternative {
            Some(alternative) => eval(alternative, env),
            None => Ok(Value::Unspecified),
        }
    }
}

/// Evaluate set! special form
fn eval_set(args: &[Expr], env: &Environment) -> Result<Value, Error> {
    match args {
        [Expr::Symbol(name), expr] => {
            // The target must already exist before the value is computed
            let owner = env.lookup_frame(name)?;
            let value = eval(expr, env)?;
            debug!(%name, %value, "set!");
            owner.define(name.as_str(), value);
            Ok(Value::Unspecified)
        }
        [target, _] => Err(Error::malformed(
            "set!",
            format!("target must be a symbol, got {target}"),
        )),
        _ => Err(Error::malformed(
            "set!",
            format!("expected 2 operands, got {}", args.len()),
        )),
    }
}

/// Evaluate define special form
fn eval_define(args: &[Expr], env: &Environment) -> Result<Value, Error> {
    match args {
        [Expr::Symbol(name), expr] => {
            let value = eval(expr, env)?;
            debug!(%name, %value, "define");
            env.define(name.as_str(), value);
            Ok(Value::Unspecified)
        }
        [target, _] => Err(Error::malformed(
            "define",
            format!("target must be a symbol, got {target}"),
        )),
        _ => Err(Error::malformed(
            "define",
            format!("expected 2 operands, got {}", args.len()),
        )),
    }
}

/// Evaluate lambda special form
fn eval_lambda(args: &[Expr], env: &Environment) -> Result<Value, Error> {
    match args {
        [Expr::List(param_list), body] => {
            let mut params: Vec<String> = Vec::with_capacity(param_list.len());
            for param in param_list {
                match param {
                    Expr::Symbol(name) => {
                        if params.contains(name) {
                            return Err(Error::malformed(
                                "lambda",
                                format!("duplicate parameter name: {name}"),
                            ));
                        }
                        params.push(name.clone());
                    }
                    other => {
                        return Err(Error::malformed(
                            "lambda",
                            format!("parameters must be symbols, got {other}"),
                        ));
                    }
                }
            }

            debug!(?params, "closure created");
            Ok(Value::Procedure(Procedure::Closure(Rc::new(Closure {
                params,
                body: body.clone(),
                env: env.clone(),
            }))))
        }
        [params, _] => Err(Error::malformed(
            "lambda",
            format!("parameters must be a list, got {params}"),
        )),
        _ => Err(Error::malformed(
            "lambda",
            format!("expected a parameter list and 1 body, got {} operands", args.len()),
        )),
    }
}

/// Evaluate begin special form: every operand in order, the last value wins
fn eval_begin(args: &[Expr], env: &Environment) -> Result<Value, Error> {
    let mut result = Value::Unspecified;
    for expr in args {
        result = eval(expr, env)?;
    }
    Ok(result)
}

/// Parse every top-level expression in `text`, then evaluate them in order.
///
/// Returns one value per expression. A parse error prevents any evaluation; an
/// evaluation error stops at the failing expression without undoing earlier effects.
pub fn eval_source(text: &str, env: &Environment) -> Result<Vec<Value>, Error> {
    parse(text)?.iter().map(|expr| eval(expr, env)).collect()
}

/// Create a root environment and hand it once to `install` before returning it
pub fn create_env_with<F>(install: F) -> Environment
where
    F: FnOnce(&Environment),
{
    let env = Environment::new();
    install(&env);
    env
}

/// Create a global environment with the default builtin procedures
pub fn create_global_env() -> Environment {
    create_env_with(builtins::install)
}
