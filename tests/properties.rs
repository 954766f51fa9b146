//! Language properties checked through the public API only.

#![expect(clippy::unwrap_used)] // test code OK

use tinylisp::Error;
use tinylisp::ast::{Expr, list, sym};
use tinylisp::environment::Environment;
use tinylisp::evaluator::{create_env_with, create_global_env, eval, eval_source};
use tinylisp::lexer::tokenize;
use tinylisp::reader::parse;
use tinylisp::value::{Value, nil, val};

/// Evaluate `source` in a fresh global environment and return the last value
fn run(source: &str) -> Result<Value, Error> {
    let env = create_global_env();
    eval_source(source, &env).map(|mut values| values.pop().unwrap_or(Value::Unspecified))
}

#[test]
fn tokenizer_pads_parentheses() {
    assert_eq!(
        tokenize("(define x(+ 1 2))"),
        vec!["(", "define", "x", "(", "+", "1", "2", ")", ")"]
    );
    assert!(tokenize(" \t\n ").is_empty());
}

#[test]
fn printed_expressions_read_back_identically() {
    let sources = [
        "(define make_adder (lambda (n) (lambda (x) (+ x n))))",
        "(if (< x 0) (- x) x)",
        "(quote (a (b (c)) 1.5 -2))",
        "()",
    ];
    for source in sources {
        let exprs = parse(source).unwrap();
        let printed: Vec<String> = exprs.iter().map(Expr::to_string).collect();
        assert_eq!(parse(&printed.join(" ")).unwrap(), exprs, "round trip of {source}");
    }
}

#[test]
fn unbalanced_input_is_reported() {
    assert_eq!(parse("(+ 1 2"), Err(Error::UnexpectedEndOfInput));
    assert_eq!(parse(")"), Err(Error::UnbalancedParenthesis));
}

#[test]
fn quote_returns_operand_unevaluated() {
    assert_eq!(run("(quote (a b))").unwrap(), val(["a", "b"]));
    assert_eq!(run("(quote undefined-symbol)").unwrap(), val("undefined-symbol"));
}

#[test]
fn closures_capture_their_defining_environment() {
    let source = "
        (define make_adder (lambda (n) (lambda (x) (+ x n))))
        ((make_adder 3) 4)";
    assert_eq!(run(source).unwrap(), val(7));
}

#[test]
fn define_in_a_call_frame_shadows_the_global() {
    let env = create_global_env();
    let values = eval_source("(define x 1) ((lambda (x) (begin (define x 2) x)) 5) x", &env).unwrap();
    assert_eq!(values, vec![Value::Unspecified, val(2), val(1)]);
}

#[test]
fn set_mutates_the_owning_frame_and_never_creates() {
    let env = create_global_env();
    eval_source("(define n 0) (define inc (lambda () (set! n (+ n 1))))", &env).unwrap();
    eval_source("(inc) (inc) (inc)", &env).unwrap();
    assert_eq!(env.get("n").unwrap(), val(3));

    assert_eq!(
        eval_source("(set! fresh 1)", &env),
        Err(Error::UnboundVariable("fresh".to_owned()))
    );
    assert!(env.get("fresh").is_err());
}

#[test]
fn if_evaluates_only_the_selected_branch() {
    let env = create_global_env();
    eval_source("(define hits 0)", &env).unwrap();
    let result = eval_source("(if (< 1 2) 10 (set! hits 1))", &env).unwrap();
    assert_eq!(result, vec![val(10)]);
    assert_eq!(env.get("hits").unwrap(), val(0));

    assert_eq!(run("(if 0 (quote yes) (quote no))").unwrap(), val("yes"));
    assert_eq!(run("(if #f (quote yes) (quote no))").unwrap(), val("no"));
}

#[test]
fn error_conditions() {
    assert_eq!(run("undefined"), Err(Error::UnboundVariable("undefined".into())));
    assert_eq!(run("(5 1)"), Err(Error::NotCallable("5".into())));
    assert_eq!(run("()"), Err(Error::EmptyApplication));
    assert!(matches!(
        run("((lambda (a b) a) 1)"),
        Err(Error::ArityMismatch { got: 1, .. })
    ));
    assert!(matches!(run("(lambda)"), Err(Error::MalformedForm { keyword: "lambda", .. })));
}

#[test]
fn recursive_procedures() {
    let source = "
        (define count_down (lambda (n acc) (if (= n 0) acc (count_down (- n 1) (cons n acc)))))
        (count_down 5 nil)";
    assert_eq!(run(source).unwrap(), val([1, 2, 3, 4, 5]));
}

#[test]
fn embedders_choose_the_root_bindings() {
    let env = create_env_with(|env: &Environment| {
        env.register_builtin_operation("inc", |n: f64| n + 1.0);
        env.define("start", val(41));
    });
    assert_eq!(eval_source("(inc start)", &env).unwrap(), vec![val(42)]);
    assert_eq!(
        eval_source("(+ 1 2)", &env),
        Err(Error::UnboundVariable("+".into()))
    );
}

#[test]
fn expression_trees_can_be_built_directly() {
    let env = create_global_env();
    let tree = list(vec![sym("cdr"), list(vec![sym("quote"), list(vec![sym("a")])])]);
    assert_eq!(eval(&tree, &env).unwrap(), nil());
}
