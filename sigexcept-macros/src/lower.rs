//! Lowering of a parsed construct to the runtime call sequence.
//!
//! The emitted shape per construct:
//!
//! ```text
//! {
//!     static AUDITED: AtomicBool;            // one audit per site
//!     rt::try_begin(file, line, first);
//!     (debug) audit pass over the clause list;
//!     rt::with_final_armed(|| {
//!         if rt::with_try_armed(|| { try body }) {
//!             if rt::catch_match(&Class1) { let e = rt::caught(); body1 }
//!             else if rt::catch_match(&Class2) { ... }
//!         }
//!     });
//!     rt::enter_finally();
//!     rt::with_final_armed(|| { finally body });
//!     match rt::finally_resolve() { Completed => {}, Return(v) => return ... }
//! }
//! ```
//!
//! Bodies are scanned recursively: a `try` token followed by a braced
//! block inside any body is a nested construct and is lowered in place
//! with `first == false`, so a return event raised there propagates to
//! the invocation's outermost frame instead of returning from a closure.

use proc_macro2::{Group, TokenStream, TokenTree};
use quote::quote;
use syn::Result;

use crate::construct::{self, Construct};

/// Rewrites a body, lowering any nested constructs it contains.
fn lower_stream(input: TokenStream) -> Result<TokenStream> {
    let tokens: Vec<TokenTree> = input.into_iter().collect();
    let mut out = TokenStream::new();
    let mut at = 0;

    while at < tokens.len() {
        let token = &tokens[at];

        if matches!(token, TokenTree::Ident(id) if id == "try")
            && construct::is_brace(tokens.get(at + 1))
        {
            let (nested, consumed) = construct::parse_construct(&tokens[at..])?;
            out.extend(lower_construct(&nested, false)?);
            at += consumed;
            continue;
        }

        // Another macro's invocation: copy its argument group verbatim.
        // Its expansion happens after ours, on its own terms (a nested
        // `attempt!` written that way is its own activation).
        if at > 0
            && matches!(token, TokenTree::Punct(p) if p.as_char() == '!')
            && matches!(tokens.get(at - 1), Some(TokenTree::Ident(_)))
        {
            if let Some(group @ TokenTree::Group(_)) = tokens.get(at + 1) {
                out.extend([token.clone(), group.clone()]);
                at += 2;
                continue;
            }
        }

        match token {
            TokenTree::Group(group) => {
                let inner = lower_stream(group.stream())?;
                let mut lowered = Group::new(group.delimiter(), inner);
                lowered.set_span(group.span());
                out.extend([TokenTree::Group(lowered)]);
            }
            other => out.extend([other.clone()]),
        }
        at += 1;
    }

    Ok(out)
}

fn line_of(span: proc_macro2::Span) -> u32 {
    span.start().line as u32
}

pub(crate) fn lower_construct(c: &Construct, top_level: bool) -> Result<TokenStream> {
    let try_body = lower_stream(c.try_body.clone())?;
    let finally_body = lower_stream(c.finally_body.clone())?;
    let try_line = line_of(c.try_span);
    let first = top_level;

    let mut audit_calls = TokenStream::new();
    for clause in &c.clauses {
        let class = &clause.class;
        let line = line_of(clause.span);
        audit_calls.extend(quote! {
            ::sigexcept::rt::audit_clause(&(#class), #line);
        });
    }

    let mut chain = TokenStream::new();
    for (index, clause) in c.clauses.iter().enumerate() {
        let class = &clause.class;
        let binding = &clause.binding;
        let body = lower_stream(clause.body.clone())?;
        let keyword = if index == 0 {
            quote! { if }
        } else {
            quote! { else if }
        };
        chain.extend(quote! {
            #keyword ::sigexcept::rt::catch_match(&(#class)) {
                #[allow(unused_variables)]
                let #binding = ::sigexcept::rt::caught();
                #[allow(unreachable_code)]
                let _ = { #body };
            }
        });
    }

    let return_arm = if top_level {
        quote! { return ::sigexcept::rt::unwrap_return(__value) }
    } else {
        quote! {
            {
                let _ = __value;
                ::core::unreachable!("a return event cannot resolve at a nested frame")
            }
        }
    };

    Ok(quote! {
        {
            static __SIGEXCEPT_AUDITED: ::std::sync::atomic::AtomicBool =
                ::std::sync::atomic::AtomicBool::new(false);
            ::sigexcept::rt::try_begin(::core::file!(), #try_line, #first);
            if ::core::cfg!(debug_assertions)
                && !__SIGEXCEPT_AUDITED.swap(true, ::std::sync::atomic::Ordering::Relaxed)
            {
                ::sigexcept::rt::audit_begin();
                #audit_calls
                ::sigexcept::rt::audit_end(::core::file!(), #try_line);
            }
            ::sigexcept::rt::with_final_armed(|| {
                if ::sigexcept::rt::with_try_armed(|| {
                    #[allow(unreachable_code)]
                    let _ = { #try_body };
                }) {
                    #chain
                }
            });
            ::sigexcept::rt::enter_finally();
            ::sigexcept::rt::with_final_armed(|| {
                #[allow(unreachable_code)]
                let _ = { #finally_body };
            });
            match ::sigexcept::rt::finally_resolve() {
                ::sigexcept::rt::FrameOutcome::Completed => {}
                ::sigexcept::rt::FrameOutcome::Return(__value) => #return_arm,
            }
        }
    })
}
