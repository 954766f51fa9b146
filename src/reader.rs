//! Building expression trees from tokens.
//!
//! The reader consumes tokens from the front of a single shared stream: every
//! recursive call advances the same cursor, so a nested list leaves the stream
//! positioned right after its closing parenthesis. Atoms are classified here: a token
//! matching the numeric grammar becomes [`Expr::Number`], anything else becomes
//! [`Expr::Symbol`] with the exact token text.

use std::iter::Peekable;

use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
};

use crate::Error;
use crate::ast::{Expr, NumberType};
use crate::lexer::{Token, tokenize};

/// Recognize a numeric literal:
/// `[+-]? ( digits ( "." digits )? | "." digits ) ( [eE] [+-]? digits )?`
fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(one_of("+-")),
        alt((
            recognize((digit1, opt((char('.'), digit1)))),
            recognize((char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// Check if a whole token matches the numeric grammar
pub fn is_number(token: &str) -> bool {
    all_consuming(number_literal).parse(token).is_ok()
}

/// Classify a single token as a number or a symbol
fn atom(token: Token<'_>) -> Expr {
    if is_number(token) {
        if let Ok(n) = token.parse::<NumberType>() {
            return Expr::Number(n);
        }
    }
    Expr::Symbol(token.to_owned())
}

/// Read exactly one expression from the front of `tokens`.
///
/// Fails with [`Error::UnexpectedEndOfInput`] if the stream runs out before the
/// expression is complete, and with [`Error::UnbalancedParenthesis`] if a `)` appears
/// where an expression should start.
pub fn read_expression<'a, I>(tokens: &mut Peekable<I>) -> Result<Expr, Error>
where
    I: Iterator<Item = Token<'a>>,
{
    match tokens.next() {
        None => Err(Error::UnexpectedEndOfInput),
        Some("(") => {
            let mut elements = Vec::new();
            loop {
                match tokens.peek() {
                    None => return Err(Error::UnexpectedEndOfInput),
                    Some(&")") => {
                        tokens.next();
                        return Ok(Expr::List(elements));
                    }
                    Some(_) => elements.push(read_expression(tokens)?),
                }
            }
        }
        Some(")") => Err(Error::UnbalancedParenthesis),
        Some(token) => Ok(atom(token)),
    }
}

/// Read every top-level expression in `tokens`, in order.
///
/// Any error aborts the whole read; no partial result is returned.
pub fn read_all<'a, I>(tokens: I) -> Result<Vec<Expr>, Error>
where
    I: IntoIterator<Item = Token<'a>>,
{
    let mut tokens = tokens.into_iter().peekable();
    let mut expressions = Vec::new();
    while tokens.peek().is_some() {
        expressions.push(read_expression(&mut tokens)?);
    }
    Ok(expressions)
}

/// Parse source text into its top-level expressions
pub fn parse(text: &str) -> Result<Vec<Expr>, Error> {
    read_all(tokenize(text))
}

/// Number of `(` minus number of `)` in `text`.
///
/// A positive depth means the text is an unfinished expression that needs more input.
pub fn paren_depth(text: &str) -> isize {
    tokenize(text).iter().fold(0, |depth, token| match *token {
        "(" => depth + 1,
        ")" => depth - 1,
        _ => depth,
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{expr, list, sym};

    /// Test result variants for reader tests
    #[derive(Debug)]
    enum ReadTestResult {
        Success(Vec<Expr>),    // Reading should succeed with these top-level expressions
        SpecificError(Error), // Reading should fail with exactly this error
    }
    use ReadTestResult::*;

    fn one(e: Expr) -> ReadTestResult {
        Success(vec![e])
    }

    /// Run reader tests, checking the structural round trip on every success
    fn run_read_tests(test_cases: Vec<(&str, ReadTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            match (parse(input), expected) {
                (Ok(actual), Success(expected_exprs)) => {
                    assert_eq!(actual, *expected_exprs, "{test_id}: value mismatch");

                    let rendered: Vec<String> = actual.iter().map(|e| format!("{e}")).collect();
                    let reparsed = parse(&rendered.join(" ")).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip parse failed for {rendered:?}: {e:?}")
                    });
                    assert_eq!(reparsed, actual, "{test_id}: round-trip mismatch for '{input}'");
                }
                (Err(err), SpecificError(expected_err)) => {
                    assert_eq!(err, *expected_err, "{test_id}: wrong error for '{input}'");
                }
                (Ok(actual), SpecificError(expected_err)) => {
                    panic!("{test_id}: expected {expected_err:?}, got {actual:?}");
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: expected success, got error {err:?}");
                }
            }
        }
    }

    #[test]
    fn test_reader_comprehensive() {
        let test_cases = vec![
            // ===== NUMBERS =====
            ("42", one(expr(42))),
            ("-5", one(expr(-5))),
            ("+7", one(expr(7))),
            ("3.25", one(expr(3.25))),
            (".5", one(expr(0.5))),
            ("-.5", one(expr(-0.5))),
            ("1e3", one(expr(1000))),
            ("2.5E-1", one(expr(0.25))),
            ("6e+2", one(expr(600))),
            // Literals beyond f64 range read as infinities and print back as literals
            ("1e999", one(expr(f64::INFINITY))),
            (
                "(a 1e999 -1e400)",
                one(list(vec![
                    sym("a"),
                    expr(f64::INFINITY),
                    expr(f64::NEG_INFINITY),
                ])),
            ),
            // ===== SYMBOLS =====
            ("foo", one(sym("foo"))),
            ("+", one(sym("+"))),
            ("-", one(sym("-"))),
            ("set!", one(sym("set!"))),
            ("make_adder", one(sym("make_adder"))),
            // Almost-numbers are symbols
            ("1.", one(sym("1."))),
            ("1e", one(sym("1e"))),
            ("123abc", one(sym("123abc"))),
            ("--1", one(sym("--1"))),
            ("1.2.3", one(sym("1.2.3"))),
            (".", one(sym("."))),
            ("#t", one(sym("#t"))),
            // ===== LISTS =====
            ("()", one(list(vec![]))),
            ("(42)", one(expr([42]))),
            ("(a b c)", one(expr(["a", "b", "c"]))),
            (
                "(+ 1 (* 2 3))",
                one(list(vec![
                    sym("+"),
                    expr(1),
                    list(vec![sym("*"), expr(2), expr(3)]),
                ])),
            ),
            ("(((1)))", one(list(vec![list(vec![expr([1])])]))),
            (
                "(lambda (x) (+ x n))",
                one(list(vec![
                    sym("lambda"),
                    expr(["x"]),
                    list(vec![sym("+"), sym("x"), sym("n")]),
                ])),
            ),
            // ===== WHITESPACE =====
            ("  42  ", one(expr(42))),
            ("( 1   2\t\n3 )", one(expr([1, 2, 3]))),
            // ===== MULTIPLE TOP-LEVEL EXPRESSIONS =====
            ("1 2", Success(vec![expr(1), expr(2)])),
            (
                "(define x 1) x",
                Success(vec![list(vec![sym("define"), sym("x"), expr(1)]), sym("x")]),
            ),
            ("", Success(vec![])),
            ("   ", Success(vec![])),
            // ===== ERRORS =====
            ("(+ 1", SpecificError(Error::UnexpectedEndOfInput)),
            ("((1 2)", SpecificError(Error::UnexpectedEndOfInput)),
            ("(", SpecificError(Error::UnexpectedEndOfInput)),
            (")", SpecificError(Error::UnbalancedParenthesis)),
            ("1 2 3)", SpecificError(Error::UnbalancedParenthesis)),
            ("(1 2))", SpecificError(Error::UnbalancedParenthesis)),
        ];

        run_read_tests(test_cases);
    }

    #[test]
    fn test_read_expression_threads_one_cursor() {
        let mut tokens = tokenize("(a (b c) d) e").into_iter().peekable();

        let first = read_expression(&mut tokens).unwrap();
        assert_eq!(
            first,
            list(vec![sym("a"), expr(["b", "c"]), sym("d")])
        );
        assert_eq!(tokens.peek(), Some(&"e"));

        assert_eq!(read_expression(&mut tokens).unwrap(), sym("e"));
        assert_eq!(
            read_expression(&mut tokens),
            Err(Error::UnexpectedEndOfInput)
        );
    }

    #[test]
    fn test_is_number() {
        for token in ["0", "-0", "+1", "12.75", ".5", "1e10", "1E-3", "-2.5e+3"] {
            assert!(is_number(token), "{token} should be a number");
        }
        for token in ["", "+", "-", ".", "1.", "e5", "1e", "0x10", "1_000", "one"] {
            assert!(!is_number(token), "{token} should not be a number");
        }
    }

    #[test]
    fn test_deep_nesting_has_no_limit() {
        let depth = 200;
        let source = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let mut parsed = parse(&source).unwrap();
        assert_eq!(parsed.len(), 1);

        let mut current = parsed.remove(0);
        for _ in 0..depth {
            match current {
                Expr::List(mut inner) => {
                    assert_eq!(inner.len(), 1);
                    current = inner.remove(0);
                }
                other => panic!("expected list, got {other:?}"),
            }
        }
        assert_eq!(current, sym("x"));
    }

    #[test]
    fn test_paren_depth() {
        assert_eq!(paren_depth(""), 0);
        assert_eq!(paren_depth("(define x"), 1);
        assert_eq!(paren_depth("(a (b"), 2);
        assert_eq!(paren_depth("(a (b c)) d"), 0);
        assert_eq!(paren_depth("x))"), -2);
    }
}
