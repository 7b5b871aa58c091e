//! sigexcept - structured `try`/`catch`/`finally`/`throw` with trap translation
//!
//! # Overview
//!
//! `sigexcept` adds hierarchical, inheritance-matched exception handling to
//! POSIX Rust programs, including translation of the hardware traps
//! (abort, floating point, illegal instruction, segfault, bus error) into
//! catchable exceptions. Control transfers through `sigsetjmp` /
//! `siglongjmp` destinations owned by per-`try` frames, so a throw works
//! from arbitrary call depth - including from inside a signal handler.
//!
//! ```
//! use sigexcept::{attempt, throw, Exception};
//!
//! attempt! {
//!     try {
//!         throw!(Exception, "it happened here");
//!     }
//!     catch (Exception, e) {
//!         println!("{}", e.message());
//!     }
//!     finally {
//!         // always runs, on every exit path
//!     }
//! }
//! ```
//!
//! # Constructs
//!
//! | Construct | Description |
//! |-----------|-------------|
//! | `attempt! { try {} catch (C, e) {} finally {} }` | the handling block; `finally` is mandatory |
//! | `throw!(Class)` / `throw!(Class, data)` | raise an exception |
//! | `throw!(e, data)` | rethrow: keep class and origin, replace data |
//! | `try_return!(v)` | `return` routed through every entered `finally` |
//! | `pending!()` | in `finally`: is an unhandled exception in flight? |
//! | `define_class!(pub Name: Parent)` | declare an exception class |
//! | `affirm!(cond)` / `check!(cond, Class)` | assertions that throw |
//!
//! # Classes
//!
//! Exception classes form a static tree rooted at [`static@Throwable`]; a
//! `catch (Class, e)` clause matches any exception whose class is `Class`
//! or derives from it, first match wins. The built-in subtree mirrors the
//! trap set:
//!
//! ```text
//! Throwable
//! └── Exception
//!     ├── OutOfMemoryError
//!     ├── FailedAssertion
//!     └── RuntimeException
//!         ├── AbnormalTermination   (SIGABRT)
//!         ├── ArithmeticException   (SIGFPE)
//!         ├── IllegalInstruction    (SIGILL)
//!         ├── SegmentationFault     (SIGSEGV)
//!         └── BusError              (SIGBUS)
//! ```
//!
//! # Traps
//!
//! While at least one flow holds a frame, the five trap signals are
//! redirected into throws of the matching class; the previous dispositions
//! are saved and restored bit-identical when the last frame leaves. An
//! uncaught trap exception re-raises its signal against the restored
//! disposition after the outermost `finally` ran, producing the platform's
//! native termination at a reproducible point.
//!
//! # What this is not
//!
//! There is no unwinding of intermediate frames' locals - leaving a `try`
//! by throw skips destructors between the throw site and the frame; only
//! entered `finally` blocks are guaranteed to run. Rust panics raised
//! inside the blocks are carried across the engine's foreign frames and
//! resumed after each entered `finally`, but they are not exceptions and
//! cannot be caught by `catch`.

#[cfg(not(unix))]
compile_error!("sigexcept requires a POSIX target: it is built on signals and sigsetjmp");

mod alloc;
mod asserts;
mod audit;
mod class;
mod context;
mod diag;
mod engine;
mod frame;
mod jump;
mod macros;
mod signals;
mod sync;

pub use class::{
    AbnormalTermination, ArithmeticException, BusError, Class, Exception, FailedAssertion,
    IllegalInstruction, OutOfMemoryError, RuntimeException, SegmentationFault, Throwable,
};
pub use context::{cleanup_flow, CleanupError};
pub use diag::{reset_diagnostic_writer, set_diagnostic_writer};
pub use engine::current_scope;
pub use frame::{Caught, ExnData, Scope};

/// Fallible allocation helpers raising [`static@OutOfMemoryError`].
pub mod fallible {
    pub use crate::alloc::{try_box, try_reserve, AllocFailure};
}

// Re-export the proc-macro crate for the attempt! router.
#[doc(hidden)]
pub use sigexcept_macros;

/// Runtime entry points for macro-generated code. Not part of the public
/// API surface; the macros are.
#[doc(hidden)]
pub mod rt {
    pub use crate::asserts::assert_failed;
    pub use crate::audit::{audit_begin, audit_clause, audit_end};
    pub use crate::context::current_flow_id as flow_id;
    pub use crate::engine::{
        catch_match, caught, enter_finally, finally_resolve, pending, return_event, try_begin,
        unwrap_return, with_final_armed, with_try_armed, FrameOutcome,
    };
}
