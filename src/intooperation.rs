use crate::Error;
use crate::value::Value;
use crate::{Arity, ast::NumberType};

// NOTE: This module is the adapter layer that turns strongly-typed Rust
// functions into the erased `OperationFn` stored in builtin procedures.
//
// Embedders normally go through the registration methods on
// `Environment`; the traits here only describe which Rust signatures
// those methods accept.

/// Canonical erased builtin function type used by the evaluator.
///
/// Builtins receive ownership of their argument vector, enabling
/// implementations that consume or rearrange arguments if desired.
pub type OperationFn = dyn Fn(Vec<Value>) -> Result<Value, Error>;

// =====================================================================
// Argument conversion
// =====================================================================

/// Conversion of one evaluated argument into a Rust parameter.
pub trait FromParam: Sized {
    fn from_arg(value: Value) -> Result<Self, Error>;
}

impl FromParam for Value {
    fn from_arg(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

impl FromParam for NumberType {
    fn from_arg(value: Value) -> Result<Self, Error> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(type_error("number", &other)),
        }
    }
}

impl FromParam for bool {
    fn from_arg(value: Value) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(type_error("boolean", &other)),
        }
    }
}

/// A list argument, taken apart into its elements
impl FromParam for Vec<Value> {
    fn from_arg(value: Value) -> Result<Self, Error> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(type_error("list", &other)),
        }
    }
}

fn type_error(expected: &str, got: &Value) -> Error {
    Error::TypeError(format!("expected {expected}, got {} {got}", got.type_name()))
}

/// Rest parameter: every remaining argument, each converted with [`FromParam`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rest<T>(pub Vec<T>);

impl<T: FromParam> Rest<T> {
    fn from_args(args: impl IntoIterator<Item = Value>) -> Result<Self, Error> {
        args.into_iter()
            .map(T::from_arg)
            .collect::<Result<Vec<T>, Error>>()
            .map(Rest)
    }
}

// =====================================================================
// Return-type adaptation for builtin functions
// =====================================================================

/// Normalizes builtin return types to the canonical `Result<Value, Error>`.
pub trait IntoValueResult {
    fn into_value_result(self) -> Result<Value, Error>;
}

macro_rules! impl_into_value_result {
    ($($ty:ty),+) => {
        $(
            impl IntoValueResult for $ty {
                fn into_value_result(self) -> Result<Value, Error> {
                    Ok(self.into())
                }
            }
        )+
    };
}

impl_into_value_result!(Value, NumberType, bool);

impl<T> IntoValueResult for Result<T, Error>
where
    T: Into<Value>,
{
    fn into_value_result(self) -> Result<Value, Error> {
        self.map(Into::into)
    }
}

// =====================================================================
// Fixed-arity adapters
// =====================================================================

/// Conversion of a Rust function with fixed parameters into an
/// [`OperationFn`], parameterized by its argument tuple type.
pub trait IntoOperation<Args> {
    fn into_operation(self) -> Box<OperationFn>;
}

// 0-arg functions / closures
impl<F, R> IntoOperation<()> for F
where
    F: Fn() -> R + 'static,
    R: IntoValueResult,
{
    fn into_operation(self) -> Box<OperationFn> {
        Box::new(move |args: Vec<Value>| {
            Arity::Exact(0).validate(args.len())?;
            (self)().into_value_result()
        })
    }
}

/// Helper macro to implement `IntoOperation` for functions of various
/// arities. Arity is checked up front, then each owned argument is
/// converted in order.
macro_rules! impl_into_operation_for_arity {
    ($arity:expr, $( $p:ident : $A:ident ),+ ) => {
        impl<F, R, $( $A ),+> IntoOperation<( $( $A, )+ )> for F
        where
            F: Fn( $( $A ),+ ) -> R + 'static,
            $( $A: FromParam, )+
            R: IntoValueResult,
        {
            fn into_operation(self) -> Box<OperationFn> {
                Box::new(move |args: Vec<Value>| {
                    Arity::Exact($arity).validate(args.len())?;
                    let mut args = args.into_iter();
                    $(
                        let $p = $A::from_arg(args.next().ok_or(Error::ArityMismatch {
                            expected: Arity::Exact($arity),
                            got: 0,
                        })?)?;
                    )+
                    (self)( $( $p ),+ ).into_value_result()
                })
            }
        }
    };
}

impl_into_operation_for_arity!(1, p0: A1);
impl_into_operation_for_arity!(2, p0: A1, p1: A2);
impl_into_operation_for_arity!(3, p0: A1, p1: A2, p2: A3);
impl_into_operation_for_arity!(4, p0: A1, p1: A2, p2: A3, p3: A4);

// =====================================================================
// Variadic adapters using a rest parameter
// =====================================================================

/// Conversion of a Rust function whose last parameter is a [`Rest`]
/// into an [`OperationFn`].
pub trait IntoVariadicOperation<Args> {
    fn into_variadic_operation(self) -> Box<OperationFn>;
}

/// Only a rest parameter, e.g. `fn(Rest<f64>) -> f64`
impl<F, R, T> IntoVariadicOperation<(Rest<T>,)> for F
where
    F: Fn(Rest<T>) -> R + 'static,
    T: FromParam,
    R: IntoValueResult,
{
    fn into_variadic_operation(self) -> Box<OperationFn> {
        Box::new(move |args: Vec<Value>| (self)(Rest::from_args(args)?).into_value_result())
    }
}

/// Helper macro to implement `IntoVariadicOperation` for functions with
/// a fixed prefix of `FromParam` parameters followed by a rest parameter.
macro_rules! impl_into_variadic_operation_for_prefix_and_rest {
    ($prefix:expr, $( $p:ident : $A:ident ),+ ) => {
        impl<F, R, T, $( $A ),+> IntoVariadicOperation<( $( $A, )+ Rest<T>, )> for F
        where
            F: Fn( $( $A, )+ Rest<T> ) -> R + 'static,
            $( $A: FromParam, )+
            T: FromParam,
            R: IntoValueResult,
        {
            fn into_variadic_operation(self) -> Box<OperationFn> {
                Box::new(move |args: Vec<Value>| {
                    Arity::AtLeast($prefix).validate(args.len())?;
                    let mut args = args.into_iter();
                    $(
                        let $p = $A::from_arg(args.next().ok_or(Error::ArityMismatch {
                            expected: Arity::AtLeast($prefix),
                            got: 0,
                        })?)?;
                    )+
                    let rest = Rest::from_args(args)?;
                    (self)( $( $p, )+ rest ).into_value_result()
                })
            }
        }
    };
}

impl_into_variadic_operation_for_prefix_and_rest!(1, p0: A1);
impl_into_variadic_operation_for_prefix_and_rest!(2, p0: A1, p1: A2);

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{nil, val};

    #[test]
    fn test_fixed_arity_adapters() {
        let zero = (|| 42.0_f64).into_operation();
        assert_eq!(zero(vec![]).unwrap(), val(42));
        assert!(matches!(
            zero(vec![val(1)]),
            Err(Error::ArityMismatch {
                expected: Arity::Exact(0),
                got: 1
            })
        ));

        let add = (|a: f64, b: f64| a + b).into_operation();
        assert_eq!(add(vec![val(2), val(3)]).unwrap(), val(5));
        assert!(matches!(
            add(vec![val(2)]),
            Err(Error::ArityMismatch {
                expected: Arity::Exact(2),
                got: 1
            })
        ));
        assert!(matches!(
            add(vec![val(2), val(true)]),
            Err(Error::TypeError(_))
        ));

        let first = (|items: Vec<Value>| items.first().cloned().unwrap_or_else(nil)).into_operation();
        assert_eq!(first(vec![val([1, 2])]).unwrap(), val(1));
        assert!(matches!(first(vec![val(1)]), Err(Error::TypeError(_))));
    }

    #[test]
    fn test_result_returning_builtins() {
        fn safe_div(a: f64, b: f64) -> Result<f64, Error> {
            if b == 0.0 {
                Err(Error::EvalError("division by zero".into()))
            } else {
                Ok(a / b)
            }
        }

        let op = safe_div.into_operation();
        assert_eq!(op(vec![val(6), val(3)]).unwrap(), val(2));
        assert_eq!(
            op(vec![val(1), val(0)]),
            Err(Error::EvalError("division by zero".into()))
        );
    }

    #[test]
    fn test_variadic_adapters() {
        fn sum(Rest(nums): Rest<f64>) -> f64 {
            nums.iter().sum()
        }
        let op = sum.into_variadic_operation();
        assert_eq!(op(vec![]).unwrap(), val(0));
        assert_eq!(op(vec![val(1), val(2), val(3)]).unwrap(), val(6));
        assert!(matches!(
            op(vec![val(1), val(false)]),
            Err(Error::TypeError(_))
        ));

        fn weighted(weight: f64, Rest(nums): Rest<f64>) -> f64 {
            weight * nums.iter().sum::<f64>()
        }
        let op = weighted.into_variadic_operation();
        assert_eq!(op(vec![val(2), val(1), val(2)]).unwrap(), val(6));
        assert_eq!(op(vec![val(2)]).unwrap(), val(0));
        assert!(matches!(
            op(vec![]),
            Err(Error::ArityMismatch {
                expected: Arity::AtLeast(1),
                got: 0
            })
        ));

        fn count_values(Rest(values): Rest<Value>) -> f64 {
            values.len() as f64
        }
        let op = count_values.into_variadic_operation();
        assert_eq!(op(vec![val("a"), val(true), nil()]).unwrap(), val(3));
    }
}
