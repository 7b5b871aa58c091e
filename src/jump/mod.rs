//! Nonlocal-jump seam around a `cc`-compiled sigsetjmp/siglongjmp helper.
//!
//! A destination is armed by [`arm`]: the C helper records a `sigjmp_buf`
//! on its own stack frame, publishes the buffer's address through the
//! given slot, and invokes the callback. While the callback runs, anything
//! holding the slot (including a signal handler) may transfer control back
//! to the arm point with [`jump`]; the helper then reports the entry as
//! jumped instead of completed.
//!
//! Jumping out skips the destructors of everything between the jump site
//! and the arm point. Frames owned by the engine live on the heap and are
//! released by the resolve path, so only the user's in-flight locals leak,
//! which is the documented contract of the construct.
//!
//! Rust panics must not unwind across the helper's C frame; the callback
//! trampoline catches them and hands the payload back to the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use libc::{c_int, c_void};

/// An armed destination: address of a live `sigjmp_buf`, or null.
pub(crate) type RawTarget = *mut c_void;

extern "C" {
    fn sigexcept_frame_enter(
        slot: *mut RawTarget,
        body: unsafe extern "C" fn(*mut c_void),
        payload: *mut c_void,
    ) -> c_int;

    fn sigexcept_frame_jump(env: RawTarget) -> !;
}

/// How an armed region was exited.
pub(crate) enum BodyExit {
    /// The callback ran to its end (possibly by panicking).
    Completed {
        panicked: Option<Box<dyn Any + Send>>,
    },
    /// Somebody entered the destination with [`jump`].
    Jumped,
}

struct CallbackState<F> {
    body: Option<F>,
    panicked: Option<Box<dyn Any + Send>>,
}

unsafe extern "C" fn invoke<F: FnOnce()>(payload: *mut c_void) {
    let state = &mut *(payload as *mut CallbackState<F>);
    let body = state.body.take().expect("armed callback invoked twice");
    if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(body)) {
        state.panicked = Some(cause);
    }
}

/// Arm `*slot` for the duration of `body`.
///
/// # Safety
///
/// `slot` must stay valid for the whole call, and anything that jumps to
/// the published target must do so while `body` is still on the stack.
pub(crate) unsafe fn arm<F: FnOnce()>(slot: *mut RawTarget, body: F) -> BodyExit {
    let mut state = CallbackState {
        body: Some(body),
        panicked: None,
    };
    let rc = sigexcept_frame_enter(slot, invoke::<F>, &mut state as *mut _ as *mut c_void);
    if rc != 0 {
        BodyExit::Jumped
    } else {
        BodyExit::Completed {
            panicked: state.panicked.take(),
        }
    }
}

/// Enter an armed destination. Never returns.
///
/// A null target means the engine's teardown was already in progress when
/// something tried to dispatch through it (for example a trap delivered
/// while `finally` bookkeeping ran). That state cannot be recovered.
pub(crate) fn jump(target: RawTarget) -> ! {
    if target.is_null() {
        crate::diag::fatal("nonlocal jump requested with no armed destination");
    }
    unsafe { sigexcept_frame_jump(target) }
}
