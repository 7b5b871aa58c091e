//! The construct and throw/return/pending macros.

/// Structured exception handling block.
///
/// ```
/// use sigexcept::{attempt, throw, Exception, RuntimeException};
///
/// let mut seen = None;
/// attempt! {
///     try {
///         throw!(Exception, "boom");
///     }
///     catch (RuntimeException, e) {
///         unreachable!("{}", e.message());
///     }
///     catch (Exception, e) {
///         seen = Some(e.message());
///     }
///     finally {
///     }
/// }
/// assert!(seen.unwrap().starts_with("Exception: file"));
/// ```
///
/// Grammar: `try { … }` followed by zero or more `catch (Class, binding)
/// { … }` clauses and exactly one mandatory `finally { … }`. Clauses are
/// tried in order against the pending exception's class with inheritance
/// (`is_derived`); the first match wins. Constructs nest; write nested
/// ones inside the same `attempt!` invocation so the engine can tell the
/// activation's outermost `try` from inner ones (separate invocations in
/// the same function are treated as separate activations).
///
/// `try_return!` inside any of the blocks routes a `return` through every
/// entered `finally` of the invocation.
#[macro_export]
macro_rules! attempt {
    (try $($rest:tt)+) => {
        $crate::sigexcept_macros::__attempt_proc! { try $($rest)+ }
    };
    // Anything else: hand the first token to the proc macro so the error
    // points at it.
    ($first:tt $($rest:tt)*) => {
        $crate::sigexcept_macros::__attempt_proc! { __ERROR $first $($rest)* }
    };
    () => {
        ::core::compile_error!(
            "empty attempt! block: expected `try { ... } ... finally { ... }`"
        )
    };
}

/// Throws an exception.
///
/// `throw!(Class)` and `throw!(Class, data)` start a new exception at the
/// current file and line. `throw!(e, data)` with a caught binding
/// rethrows: the class and origin location are preserved and only the
/// data is replaced.
///
/// Inside an active `try` this does not return. Outside, the exception is
/// reported lost on the diagnostic stream and execution continues.
#[macro_export]
macro_rules! throw {
    ($what:expr) => {
        ($what).throw_with($crate::ExnData::None, ::core::file!(), ::core::line!())
    };
    ($what:expr, $data:expr) => {
        ($what).throw_with(
            $crate::ExnData::from($data),
            ::core::file!(),
            ::core::line!(),
        )
    };
}

/// Returns a value through the enclosing `finally` blocks.
///
/// Overlays the current frame with a return event, runs every entered
/// `finally` of the activation, then performs the native `return` at the
/// outermost construct. A later `try_return!` inside a `finally`
/// supersedes the value. Panics when no `attempt!` construct is active.
#[macro_export]
macro_rules! try_return {
    () => {
        $crate::rt::return_event(::std::boxed::Box::new(()))
    };
    ($value:expr) => {
        $crate::rt::return_event(::std::boxed::Box::new($value))
    };
}

/// True while the current frame holds an unhandled exception. Meaningful
/// inside `finally`, where it distinguishes the exceptional exit path
/// from the normal one.
#[macro_export]
macro_rules! pending {
    () => {
        $crate::rt::pending()
    };
}
