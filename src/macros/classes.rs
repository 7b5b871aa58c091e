//! Class declaration and assertion macros.

/// Declares an exception class as a static singleton.
///
/// ```
/// use sigexcept::{define_class, Exception};
///
/// define_class! {
///     /// Raised when the parser gives up.
///     ParseError: Exception
/// }
///
/// assert!(ParseError.is_derived(&Exception));
/// ```
#[macro_export]
macro_rules! define_class {
    ($(#[$meta:meta])* $vis:vis $name:ident : $parent:expr) => {
        $(#[$meta])*
        #[allow(non_upper_case_globals)]
        $vis static $name: $crate::Class = $crate::Class::new(
            ::core::option::Option::Some(&$parent),
            ::core::stringify!($name),
        );
    };
}

/// Debug-build assertion. On failure inside handler scope, throws
/// `FailedAssertion` with the expression text as data; outside, writes
/// the assertion report (and aborts with the `abort-on-assert` feature).
#[macro_export]
macro_rules! affirm {
    ($cond:expr) => {
        if ::core::cfg!(debug_assertions) {
            if $cond {
            } else {
                $crate::rt::assert_failed(
                    ::core::stringify!($cond),
                    ::core::file!(),
                    ::core::line!(),
                );
            }
        }
    };
}

/// Always-on check: a failed condition throws `$class`. Debug builds run
/// the `affirm!` action first, so inside handler scope the failure
/// surfaces as `FailedAssertion` there and as `$class` in release builds.
#[macro_export]
macro_rules! check {
    ($cond:expr, $class:expr) => {
        if $cond {
        } else {
            if ::core::cfg!(debug_assertions) {
                $crate::rt::assert_failed(
                    ::core::stringify!($cond),
                    ::core::file!(),
                    ::core::line!(),
                );
            }
            $crate::throw!($class);
        }
    };
}
