//! User-facing macros.
//!
//! `attempt!` is a thin router into the proc-macro crate, which parses
//! and lowers the construct (the declarative layer exists to keep error
//! spans good and to give the proc macro a stable entry token). The rest
//! are plain declarative macros over the runtime.

mod classes;
mod surface;
