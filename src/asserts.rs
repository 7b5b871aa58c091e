//! Assertion support behind [`affirm!`](crate::affirm) and
//! [`check!`](crate::check).
//!
//! A failure inside any handler scope throws `FailedAssertion` carrying
//! the expression text as data, so a `catch` can retrieve it; outside it
//! writes the standard report and, with the `abort-on-assert` feature,
//! aborts. Keeping the action in a function rather than macro-only code
//! leaves a place for a debugger breakpoint.

use crate::class::FailedAssertion;
use crate::diag;
use crate::engine;
use crate::frame::{ExnData, Scope};

#[doc(hidden)]
pub fn assert_failed(expr: &'static str, file: &'static str, line: u32) {
    match engine::current_scope() {
        Scope::Try | Scope::Catch | Scope::Finally => {
            FailedAssertion.throw_with(ExnData::Str(expr), file, line);
        }
        _ => assert_action(expr, file, line),
    }
}

pub(crate) fn assert_action(expr: &str, file: &str, line: u32) {
    let flag = if cfg!(feature = "abort-on-assert") {
        ""
    } else {
        "(no abort)"
    };
    diag::diagln(format_args!(
        "Assertion failed {}: {}, file \"{}\", line {}.",
        flag, expr, file, line
    ));

    #[cfg(feature = "abort-on-assert")]
    std::process::abort();
}
