//! Parsing of the `try / catch / finally` construct from raw tokens.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! construct := `try` brace-block clause* `finally` brace-block
//! clause    := `catch` `(` class-path `,` binding `)` brace-block
//! ```
//!
//! Bodies stay opaque token streams here; the lowering pass walks them
//! again to find nested constructs.

use proc_macro2::{Delimiter, Group, Ident, Span, TokenStream, TokenTree};
use syn::{Error, Result};

use crate::lower;

pub struct Construct {
    pub try_span: Span,
    pub try_body: TokenStream,
    pub clauses: Vec<Clause>,
    pub finally_body: TokenStream,
}

pub struct Clause {
    pub span: Span,
    pub class: TokenStream,
    pub binding: Ident,
    pub body: TokenStream,
}

/// Top-level entry: parse the full input and lower it.
pub fn process(input: TokenStream) -> Result<TokenStream> {
    let tokens: Vec<TokenTree> = input.into_iter().collect();

    // Error marker forwarded by the declarative router so the message
    // points at the offending token.
    if let Some(TokenTree::Ident(id)) = tokens.first() {
        if id == "__ERROR" {
            let (span, what) = tokens
                .get(1)
                .map(|t| (t.span(), t.to_string()))
                .unwrap_or_else(|| (Span::call_site(), String::from("?")));
            return Err(Error::new(
                span,
                format!("expected `try {{ ... }}`, found `{what}`"),
            ));
        }
    }

    let (construct, consumed) = parse_construct(&tokens)?;
    if consumed < tokens.len() {
        return Err(Error::new(
            tokens[consumed].span(),
            "unexpected tokens after the `finally` block",
        ));
    }
    lower::lower_construct(&construct, true)
}

fn is_ident(token: Option<&TokenTree>, word: &str) -> bool {
    matches!(token, Some(TokenTree::Ident(id)) if id == word)
}

pub(crate) fn is_brace(token: Option<&TokenTree>) -> bool {
    matches!(token, Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Brace)
}

fn expect_brace<'a>(
    tokens: &'a [TokenTree],
    at: usize,
    fallback: Span,
    what: &str,
) -> Result<&'a Group> {
    match tokens.get(at) {
        Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Brace => Ok(g),
        Some(other) => Err(Error::new(
            other.span(),
            format!("{what} requires a braced block"),
        )),
        None => Err(Error::new(
            fallback,
            format!("{what} requires a braced block"),
        )),
    }
}

/// Parses one construct starting at `tokens[0]`, returning it and the
/// number of tokens consumed.
pub(crate) fn parse_construct(tokens: &[TokenTree]) -> Result<(Construct, usize)> {
    if !is_ident(tokens.first(), "try") {
        let span = tokens.first().map(|t| t.span()).unwrap_or_else(Span::call_site);
        return Err(Error::new(span, "expected `try { ... }`"));
    }
    let try_span = tokens[0].span();
    let mut at = 1;

    let try_body = expect_brace(tokens, at, try_span, "`try`")?.stream();
    at += 1;

    let mut clauses = Vec::new();
    while is_ident(tokens.get(at), "catch") {
        let span = tokens[at].span();
        at += 1;
        let header = match tokens.get(at) {
            Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Parenthesis => g,
            Some(other) => {
                return Err(Error::new(
                    other.span(),
                    "`catch` expects a `(Class, binding)` header",
                ))
            }
            None => {
                return Err(Error::new(
                    span,
                    "`catch` expects a `(Class, binding)` header",
                ))
            }
        };
        at += 1;
        let (class, binding) = split_clause_header(header)?;
        let body = expect_brace(tokens, at, span, "`catch`")?.stream();
        at += 1;
        clauses.push(Clause {
            span,
            class,
            binding,
            body,
        });
    }

    if !is_ident(tokens.get(at), "finally") {
        return Err(match tokens.get(at) {
            Some(other) => Error::new(
                other.span(),
                "expected a `catch (...)` clause or the mandatory `finally` block",
            ),
            None => Error::new(try_span, "`try` requires a mandatory `finally { ... }` block"),
        });
    }
    let finally_span = tokens[at].span();
    at += 1;
    let finally_body = expect_brace(tokens, at, finally_span, "`finally`")?.stream();
    at += 1;

    Ok((
        Construct {
            try_span,
            try_body,
            clauses,
            finally_body,
        },
        at,
    ))
}

/// Splits `(Class, binding)` at its first top-level comma.
fn split_clause_header(header: &Group) -> Result<(TokenStream, Ident)> {
    let tokens: Vec<TokenTree> = header.stream().into_iter().collect();
    let comma = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Punct(p) if p.as_char() == ','))
        .ok_or_else(|| {
            Error::new(
                header.span(),
                "`catch` header must be `(Class, binding)`",
            )
        })?;
    if comma == 0 {
        return Err(Error::new(
            header.span(),
            "`catch` header is missing the exception class",
        ));
    }
    let class: TokenStream = tokens[..comma].iter().cloned().collect();
    let mut rest = tokens[comma + 1..].iter();
    let binding = match (rest.next(), rest.next()) {
        (Some(TokenTree::Ident(id)), None) => id.clone(),
        (Some(other), _) => {
            return Err(Error::new(
                other.span(),
                "`catch` binding must be a single identifier",
            ))
        }
        (None, _) => {
            return Err(Error::new(
                header.span(),
                "`catch` header is missing the binding identifier",
            ))
        }
    };
    Ok((class, binding))
}
