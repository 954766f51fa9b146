//! The default set of builtin procedures.
//!
//! [`install`] fills a root environment with constants, arithmetic, comparisons, list
//! primitives, type predicates and output. Everything is registered through the typed
//! registration API on [`Environment`], so argument conversion and arity checks come
//! from the adapter layer rather than from each function.
//!
//! ```scheme
//! (+ 1 2 3)          ; 6
//! (- 5)              ; -5
//! (< 1 2 3)          ; #t, comparisons chain
//! (cons 1 (list 2))  ; (1 2)
//! (equal? (quote (a)) (list (quote a)))  ; #t
//! ```
//!
//! ## Error Handling
//!
//! - **Type errors**: numeric operations reject non-numbers, `car`/`cdr`/`length`
//!   reject non-lists, and `cons` requires a list as its second argument
//! - **Arity errors**: every builtin declares its accepted argument count
//! - **No overflow errors**: arithmetic follows IEEE double semantics, so `(/ 1 0)`
//!   is infinity

use crate::environment::Environment;
use crate::intooperation::Rest;
use crate::value::{Value, nil};
use crate::{Arity, Error, ast::NumberType};

// Macro to generate chained numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(first: NumberType, Rest(rest): Rest<NumberType>) -> bool {
            // All adjacent pairs must satisfy the comparison
            let mut prev = first;
            for current in rest {
                if !(prev $op current) {
                    return false;
                }
                prev = current;
            }
            true
        }
    };
}

numeric_comparison!(builtin_num_eq, ==);
numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_ge, >=);

fn builtin_add(Rest(nums): Rest<NumberType>) -> NumberType {
    nums.iter().sum()
}

fn builtin_sub(first: NumberType, Rest(rest): Rest<NumberType>) -> NumberType {
    if rest.is_empty() {
        return -first;
    }
    rest.iter().fold(first, |acc, n| acc - n)
}

fn builtin_mul(Rest(nums): Rest<NumberType>) -> NumberType {
    nums.iter().product()
}

fn builtin_div(first: NumberType, Rest(rest): Rest<NumberType>) -> NumberType {
    if rest.is_empty() {
        return 1.0 / first;
    }
    rest.iter().fold(first, |acc, n| acc / n)
}

fn builtin_max(first: NumberType, Rest(rest): Rest<NumberType>) -> NumberType {
    rest.into_iter().fold(first, NumberType::max)
}

fn builtin_min(first: NumberType, Rest(rest): Rest<NumberType>) -> NumberType {
    rest.into_iter().fold(first, NumberType::min)
}

fn builtin_car(list: Vec<Value>) -> Result<Value, Error> {
    list.into_iter()
        .next()
        .ok_or_else(|| Error::EvalError("car of empty list".into()))
}

fn builtin_cdr(list: Vec<Value>) -> Result<Value, Error> {
    let mut items = list.into_iter();
    let Some(_) = items.next() else {
        return Err(Error::EvalError("cdr of empty list".into()));
    };
    Ok(Value::List(items.collect()))
}

fn builtin_cons(first: Value, tail: Vec<Value>) -> Value {
    let mut list = Vec::with_capacity(tail.len() + 1);
    list.push(first);
    list.extend(tail);
    Value::List(list)
}

fn builtin_list(Rest(items): Rest<Value>) -> Value {
    Value::List(items)
}

fn builtin_length(list: Vec<Value>) -> NumberType {
    list.len() as NumberType
}

fn builtin_print(Rest(values): Rest<Value>) -> Value {
    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
    println!("{}", rendered.join(" "));
    Value::Unspecified
}

/// Register the default builtins in `env`
pub fn install(env: &Environment) {
    // Constants
    env.define("true", Value::Bool(true));
    env.define("false", Value::Bool(false));
    env.define("#t", Value::Bool(true));
    env.define("#f", Value::Bool(false));
    env.define("nil", nil());

    // Arithmetic
    env.register_variadic_builtin_operation("+", Arity::Any, builtin_add);
    env.register_variadic_builtin_operation("-", Arity::AtLeast(1), builtin_sub);
    env.register_variadic_builtin_operation("*", Arity::Any, builtin_mul);
    env.register_variadic_builtin_operation("/", Arity::AtLeast(1), builtin_div);
    env.register_builtin_operation("abs", |n: NumberType| n.abs());
    env.register_variadic_builtin_operation("max", Arity::AtLeast(1), builtin_max);
    env.register_variadic_builtin_operation("min", Arity::AtLeast(1), builtin_min);

    // Comparison
    env.register_variadic_builtin_operation("=", Arity::AtLeast(2), builtin_num_eq);
    env.register_variadic_builtin_operation("<", Arity::AtLeast(2), builtin_lt);
    env.register_variadic_builtin_operation(">", Arity::AtLeast(2), builtin_gt);
    env.register_variadic_builtin_operation("<=", Arity::AtLeast(2), builtin_le);
    env.register_variadic_builtin_operation(">=", Arity::AtLeast(2), builtin_ge);

    // Logic
    env.register_builtin_operation("not", |value: Value| !value.is_truthy());

    // Lists
    env.register_builtin_operation("car", builtin_car);
    env.register_builtin_operation("cdr", builtin_cdr);
    env.register_builtin_operation("cons", builtin_cons);
    env.register_variadic_builtin_operation("list", Arity::Any, builtin_list);
    env.register_builtin_operation("length", builtin_length);
    env.register_builtin_operation("null?", |value: Value| value.is_nil());

    // Predicates
    env.register_builtin_operation("number?", |value: Value| matches!(value, Value::Number(_)));
    env.register_builtin_operation("symbol?", |value: Value| matches!(value, Value::Symbol(_)));
    env.register_builtin_operation("list?", |value: Value| matches!(value, Value::List(_)));
    env.register_builtin_operation("procedure?", |value: Value| value.is_procedure());
    env.register_builtin_operation("equal?", |a: Value, b: Value| a == b);

    // Output
    env.register_variadic_builtin_operation("print", Arity::Any, builtin_print);
    env.register_variadic_builtin_operation("display", Arity::Any, builtin_print);
}
