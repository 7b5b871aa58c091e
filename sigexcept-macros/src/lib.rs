//! Proc macros for the sigexcept crate.
//!
//! One entry point: the declarative `attempt!` router hands the whole
//! construct over, and [`construct`] parses `try { } catch (Class, e) { }
//! ... finally { }` - including constructs nested inside the bodies, which
//! is how the engine learns which frame is the outermost one of an
//! activation - before [`lower`] emits the runtime call sequence.

use proc_macro::TokenStream;

mod construct;
mod lower;

/// Entry point behind `sigexcept::attempt!`.
#[proc_macro]
pub fn __attempt_proc(input: TokenStream) -> TokenStream {
    construct::process(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
