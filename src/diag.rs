//! The diagnostic stream.
//!
//! Lost exceptions, auditor findings, assertion reports and internal
//! errors are one-line records written here. The default destination is
//! stderr; a process-wide writer can be installed instead, which is also
//! how the test suite observes diagnostics.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use lazy_static::lazy_static;

lazy_static! {
    static ref SINK: Mutex<Option<Box<dyn Write + Send>>> = Mutex::new(None);
}

/// Redirects all engine diagnostics to `writer`.
pub fn set_diagnostic_writer(writer: Box<dyn Write + Send>) {
    *lock_sink() = Some(writer);
}

/// Restores the default destination (stderr).
pub fn reset_diagnostic_writer() {
    *lock_sink() = None;
}

fn lock_sink() -> std::sync::MutexGuard<'static, Option<Box<dyn Write + Send>>> {
    SINK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes one diagnostic line.
pub(crate) fn diagln(args: fmt::Arguments<'_>) {
    let mut guard = lock_sink();
    match guard.as_mut() {
        Some(w) => {
            let _ = w.write_fmt(args);
            let _ = w.write_all(b"\n");
            let _ = w.flush();
        }
        None => {
            let stderr = io::stderr();
            let mut out = stderr.lock();
            let _ = out.write_fmt(args);
            let _ = out.write_all(b"\n");
        }
    }
}

/// Writes a multi-line record either to `out` or to the stream.
pub(crate) fn write_block(out: Option<&mut dyn Write>, text: &str) {
    match out {
        Some(w) => {
            let _ = w.write_all(text.as_bytes());
        }
        None => {
            let mut guard = lock_sink();
            match guard.as_mut() {
                Some(w) => {
                    let _ = w.write_all(text.as_bytes());
                    let _ = w.flush();
                }
                None => {
                    let _ = io::stderr().write_all(text.as_bytes());
                }
            }
        }
    }
}

/// Reports a condition the engine cannot recover from and terminates.
///
/// Per the design, a trap that fires while frame teardown is already in
/// progress leaves no armed destination to dispatch through; recovery is
/// not attempted.
pub(crate) fn fatal(what: &str) -> ! {
    diagln(format_args!("internal error: {what}; aborting"));
    std::process::abort();
}
