//! The dispatch engine.
//!
//! Each `attempt!` construct lowers to a fixed call sequence against this
//! module:
//!
//! ```text
//! try_begin
//! (debug) audit pass over the catch clauses
//! with_final_armed(|| {
//!     if with_try_armed(|| { scope = TRY; try body }) {
//!         catch_match chain, first match wins
//!     }
//! })
//! enter_finally
//! with_final_armed(|| { finally body })
//! finally_resolve -> Completed | Return(value)
//! ```
//!
//! `throw` transfers control by scope: inside TRY it enters the throw
//! target and starts catch evaluation; inside CATCH or FINALLY it enters
//! the final target, which skips the remaining clauses and, because the
//! final target is re-armed around the `finally` body itself, never
//! re-enters a `finally` that is already running.
//!
//! `finally_resolve` pops the frame and either finishes the construct,
//! hands a pending return value back to the macro code, or rewrites the
//! pending exception into the new top frame and dispatches again
//! (propagation). The frame with `first == true` stops return events at
//! the boundary of their activation.

use std::any::Any;
use std::io::Write;
use std::mem;
use std::panic;

use crate::class::{self, Class};
use crate::context;
use crate::diag;
use crate::frame::{Caught, ExnData, ExnState, Frame, Scope};
use crate::jump::{self, BodyExit};
use crate::signals;

/// What the macro code should do after a frame resolved.
pub enum FrameOutcome {
    /// Fall through to the code after the construct.
    Completed,
    /// Execute the native `return` with this value.
    Return(Box<dyn Any + Send>),
}

fn top_ptr(ctx: *mut context::Context) -> Option<*mut Frame> {
    unsafe { (*ctx).frames.last_mut().map(|frame| &mut **frame as *mut Frame) }
}

// The frame outlives every armed region; only the owning flow writes it.
fn set_scope(top: *mut Frame, scope: Scope) {
    unsafe { (*top).scope = scope }
}

/// Runs `f` against the current flow's top frame.
pub(crate) fn with_top_frame<R>(f: impl FnOnce(&Frame) -> R) -> R {
    let ctx = context::current().expect("no exception context for this flow");
    let top = top_ptr(ctx).expect("no active frame for this flow");
    f(unsafe { &*top })
}

/// Pushes a fresh frame, creating the context and installing the trap
/// handlers when this flow had none.
#[doc(hidden)]
pub fn try_begin(try_file: &'static str, try_line: u32, first: bool) {
    let ctx = context::get_or_create();
    unsafe {
        if (*ctx).frames.is_empty() {
            signals::install_current(ctx);
        }
        (*ctx).frames.push(Box::new(Frame::new(try_file, try_line, first)));
        tracing::trace!(
            target: "sigexcept",
            depth = (*ctx).frames.len(),
            file = try_file,
            line = try_line,
            first,
            "try"
        );
    }
}

/// Arms the throw target around the `try` body. Returns true when the
/// body was exited by a throw, i.e. catch evaluation should start.
#[doc(hidden)]
pub fn with_try_armed<F: FnOnce()>(body: F) -> bool {
    let ctx = context::current().expect("try body without a context");
    let top = top_ptr(ctx).expect("try body without a frame");
    let exit = unsafe {
        let slot = std::ptr::addr_of_mut!((*top).throw_target);
        jump::arm(slot, || {
            set_scope(top, Scope::Try);
            body();
        })
    };
    match exit {
        BodyExit::Jumped => true,
        BodyExit::Completed { panicked } => {
            if let Some(cause) = panicked {
                unsafe { (*top).panic_payload = Some(cause) };
            }
            false
        }
    }
}

/// Arms the final target around a region (body-plus-catches, then the
/// `finally` body). Both exits continue with the same next step, so the
/// result is not reported.
#[doc(hidden)]
pub fn with_final_armed<F: FnOnce()>(body: F) {
    let ctx = context::current().expect("frame armed without a context");
    let top = top_ptr(ctx).expect("frame armed without a frame");
    let exit = unsafe {
        let slot = std::ptr::addr_of_mut!((*top).final_target);
        jump::arm(slot, body)
    };
    if let BodyExit::Completed {
        panicked: Some(cause),
    } = exit
    {
        // Newest failure wins, like a throw inside finally.
        unsafe { (*top).panic_payload = Some(cause) };
    }
}

/// One `catch (class, e)` clause: a pending exception whose class is
/// derived from `class` becomes caught and the clause body runs.
#[doc(hidden)]
pub fn catch_match(class: &'static Class) -> bool {
    let ctx = context::current().expect("catch without a context");
    let top = top_ptr(ctx).expect("catch without a frame");
    unsafe {
        if (*top).state == ExnState::Pending {
            if let Some(thrown) = (*top).class {
                if thrown.is_derived(class) {
                    (*top).state = ExnState::Caught;
                    (*top).scope = Scope::Catch;
                    tracing::trace!(target: "sigexcept", class = thrown.name(), "caught");
                }
            }
        }
        (*top).state == ExnState::Caught
    }
}

/// The binding for a matched clause.
#[doc(hidden)]
pub fn caught() -> Caught {
    Caught::new()
}

/// Marks the transition into the `finally` block.
#[doc(hidden)]
pub fn enter_finally() {
    let ctx = context::current().expect("finally without a context");
    let top = top_ptr(ctx).expect("finally without a frame");
    unsafe { (*top).scope = Scope::Finally };
}

/// True while the current frame holds an uncaught exception; meant for
/// use inside `finally` via [`pending!`](crate::pending).
#[doc(hidden)]
pub fn pending() -> bool {
    context::current()
        .and_then(top_ptr)
        .map(|top| unsafe { (*top).state == ExnState::Pending })
        .unwrap_or(false)
}

/// The scope the flow is currently executing, [`Scope::Outside`] when no
/// frame exists.
pub fn current_scope() -> Scope {
    context::current()
        .and_then(top_ptr)
        .map(|top| unsafe { (*top).scope })
        .unwrap_or(Scope::Outside)
}

fn lost(class: &'static Class, file: &str, line: u32) {
    diag::diagln(format_args!(
        "{} lost: file \"{}\", line {}.",
        class.name(),
        file,
        line
    ));
}

fn dispatch(top: *mut Frame) -> ! {
    unsafe {
        match (*top).scope {
            Scope::Try => jump::jump((*top).throw_target),
            Scope::Catch | Scope::Finally => jump::jump((*top).final_target),
            Scope::Internal | Scope::Outside => {
                diag::fatal("exception dispatched while no block was active")
            }
        }
    }
}

/// Throws `class` at `file:line` with `data`. Outside any `try` the
/// exception is reported lost and the call returns.
pub(crate) fn throw_raw(class: &'static Class, data: ExnData, file: &'static str, line: u32) {
    let ctx = match context::current() {
        Some(ctx) => ctx,
        None => return lost(class, file, line),
    };
    let top = match top_ptr(ctx) {
        Some(top) => top,
        None => return lost(class, file, line),
    };
    tracing::trace!(target: "sigexcept", class = class.name(), file, line, "throw");
    unsafe {
        (*top).class = Some(class);
        (*top).data = data;
        (*top).file = file;
        (*top).line = line;
        // A fresh throw supersedes an in-flight return.
        (*top).ret_val = None;
        (*top).state = ExnState::Pending;
    }
    dispatch(top)
}

/// Rethrow: keeps the pending class and origin, replaces the data.
pub(crate) fn rethrow(data: ExnData) {
    let ctx = context::current().expect("rethrow outside of a catch block");
    let top = top_ptr(ctx).expect("rethrow outside of a catch block");
    unsafe {
        tracing::trace!(
            target: "sigexcept",
            class = (*top).class.map(|c| c.name()).unwrap_or("?"),
            "rethrow"
        );
        (*top).data = data;
        (*top).ret_val = None;
        (*top).state = ExnState::Pending;
    }
    dispatch(top)
}

/// Overlays the top frame with a return event and enters the `finally`,
/// overruling any pending exception. Invoked by
/// [`try_return!`](crate::try_return).
#[doc(hidden)]
pub fn return_event(value: Box<dyn Any + Send>) -> ! {
    let ctx = context::current()
        .unwrap_or_else(|| panic!("try_return! used outside of an attempt! block"));
    let top =
        top_ptr(ctx).unwrap_or_else(|| panic!("try_return! used outside of an attempt! block"));
    unsafe {
        (*top).class = Some(&class::ReturnEvent);
        (*top).data = ExnData::None;
        (*top).ret_val = Some(value);
        (*top).state = ExnState::Pending;
        jump::jump((*top).final_target)
    }
}

/// Downcasts a return-event value at the `return` site.
#[doc(hidden)]
pub fn unwrap_return<R: 'static>(value: Box<dyn Any + Send>) -> R {
    match value.downcast::<R>() {
        Ok(v) => *v,
        Err(_) => panic!("try_return! value does not match the enclosing function's return type"),
    }
}

/// Pops and resolves the frame after its `finally` body ran.
#[doc(hidden)]
pub fn finally_resolve() -> FrameOutcome {
    let ctx = context::current().expect("finally without a context");
    let mut frame: Box<Frame> = unsafe { (*ctx).frames.pop().expect("finally without a frame") };
    let outermost = unsafe { (*ctx).frames.is_empty() };
    tracing::trace!(
        target: "sigexcept",
        outermost,
        pending = (frame.state == ExnState::Pending),
        "finally"
    );

    if outermost {
        let restored = signals::restore_current(ctx);

        if let Some(cause) = frame.panic_payload.take() {
            context::destroy_current();
            panic::resume_unwind(cause);
        }

        if frame.state == ExnState::Pending {
            let class = frame.class.expect("pending exception without a class");
            if class.is(&class::FailedAssertion) {
                let expr = frame.data.as_str().unwrap_or("?");
                crate::asserts::assert_action(expr, frame.file, frame.line);
            } else if class.is_derived(&class::RuntimeException) && restored {
                context::destroy_current();
                // Re-deliver to the restored disposition; signal 0 (a
                // class that was never trap-stamped) is a no-op and
                // execution continues.
                unsafe {
                    libc::raise(class.signal_number());
                }
            } else if class.is(&class::ReturnEvent) {
                let value = frame.ret_val.take().expect("return event without a value");
                context::destroy_current();
                return FrameOutcome::Return(value);
            } else {
                lost(class, frame.file, frame.line);
            }
        }
        context::destroy_current();
        FrameOutcome::Completed
    } else {
        if let Some(cause) = frame.panic_payload.take() {
            panic::resume_unwind(cause);
        }

        if frame.state == ExnState::Pending {
            let class = frame.class.expect("pending exception without a class");
            if class.is(&class::ReturnEvent) && frame.first {
                return FrameOutcome::Return(
                    frame.ret_val.take().expect("return event without a value"),
                );
            }
            // Propagate into the enclosing frame.
            let top = top_ptr(ctx).expect("propagation without an enclosing frame");
            unsafe {
                (*top).class = frame.class;
                (*top).data = mem::take(&mut frame.data);
                (*top).file = frame.file;
                (*top).line = frame.line;
                (*top).ret_val = frame.ret_val.take();
                (*top).state = ExnState::Pending;
            }
            drop(frame);
            dispatch(top)
        }
        FrameOutcome::Completed
    }
}

/// Writes the pending class and every enclosing `try` site, innermost
/// first.
pub(crate) fn print_try_trace(out: Option<&mut dyn Write>) {
    let ctx = match context::current() {
        Some(ctx) => ctx,
        None => return,
    };
    let mut text = String::new();
    unsafe {
        let name = top_ptr(ctx)
            .and_then(|top| (*top).class)
            .map(|c| c.name())
            .unwrap_or("?");
        #[cfg(feature = "threads")]
        text.push_str(&format!(
            "{} occurred in thread {}:\n",
            name,
            context::flow_id()
        ));
        #[cfg(not(feature = "threads"))]
        text.push_str(&format!("{} occurred:\n", name));
        for frame in (*ctx).frames.iter().rev() {
            text.push_str(&format!(
                "        in 'try' at {}:{}\n",
                frame.try_file, frame.try_line
            ));
        }
    }
    diag::write_block(out, &text);
}
