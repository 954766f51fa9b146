//! Splitting source text into tokens.
//!
//! Parentheses and whitespace are the only structural characters. Every `(` and `)`
//! is a token of its own; every other maximal run of non-whitespace characters is one
//! token. There are no escapes, string literals or comments.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    multi::many0,
    sequence::preceded,
};

/// A token borrowed from the source text. Never empty, never contains whitespace.
pub type Token<'a> = &'a str;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// Parse one token, skipping any leading whitespace
fn parse_token(input: &str) -> IResult<&str, Token<'_>> {
    preceded(
        take_while(char::is_whitespace),
        alt((tag("("), tag(")"), take_while1(|c: char| !is_delimiter(c)))),
    )
    .parse(input)
}

/// Split `text` into its ordered sequence of tokens.
///
/// Never fails; blank input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    // Every branch of `parse_token` consumes at least one character, so `many0` only
    // stops at trailing whitespace or the end of input.
    match many0(parse_token).parse(text) {
        Ok((_, tokens)) => tokens,
        Err(_) => Vec::new(),
    }
}
