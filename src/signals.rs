//! The signal bridge: translates the five hardware traps into throws.
//!
//! Handlers are installed when a flow pushes its first frame and the
//! previous dispositions are saved; they are restored when the last frame
//! leaves. With `shared-handlers` the dispositions are process-wide and
//! refcounted by the number of flows holding frames, all under the store
//! lock; otherwise every flow saves and restores its own set.
//!
//! The handler re-installs itself on entry (some platforms reset the
//! disposition on delivery), stamps the signal number into the matching
//! class, and throws with file `"?"`, line 0. If the current flow holds
//! no frame the exception is reported as lost, exactly like any other
//! throw outside a `try`.

use libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::class::{
    AbnormalTermination, ArithmeticException, BusError, Class, IllegalInstruction,
    SegmentationFault,
};
use crate::context::Context;
use crate::frame::ExnData;

/// Dispositions in effect before the bridge took over.
pub(crate) struct SavedHandlers {
    abrt: SigAction,
    fpe: SigAction,
    ill: SigAction,
    segv: SigAction,
    bus: SigAction,
}

// SigAction carries raw handler pointers.
unsafe impl Send for SavedHandlers {}

fn translation_action() -> SigAction {
    SigAction::new(
        SigHandler::Handler(translate_signal),
        SaFlags::empty(),
        SigSet::empty(),
    )
}

unsafe fn install_handlers() -> SavedHandlers {
    let action = translation_action();
    SavedHandlers {
        abrt: sigaction(Signal::SIGABRT, &action).expect("sigaction succeeds"),
        fpe: sigaction(Signal::SIGFPE, &action).expect("sigaction succeeds"),
        ill: sigaction(Signal::SIGILL, &action).expect("sigaction succeeds"),
        segv: sigaction(Signal::SIGSEGV, &action).expect("sigaction succeeds"),
        bus: sigaction(Signal::SIGBUS, &action).expect("sigaction succeeds"),
    }
}

unsafe fn restore_handlers(saved: &SavedHandlers) {
    sigaction(Signal::SIGABRT, &saved.abrt).expect("sigaction succeeds");
    sigaction(Signal::SIGFPE, &saved.fpe).expect("sigaction succeeds");
    sigaction(Signal::SIGILL, &saved.ill).expect("sigaction succeeds");
    sigaction(Signal::SIGSEGV, &saved.segv).expect("sigaction succeeds");
    sigaction(Signal::SIGBUS, &saved.bus).expect("sigaction succeeds");
}

extern "C" fn translate_signal(signum: c_int) {
    let class: &'static Class = match signum {
        libc::SIGABRT => &AbnormalTermination,
        libc::SIGFPE => &ArithmeticException,
        libc::SIGILL => &IllegalInstruction,
        libc::SIGSEGV => &SegmentationFault,
        libc::SIGBUS => &BusError,
        _ => return,
    };

    if let Ok(signal) = Signal::try_from(signum) {
        unsafe {
            let _ = sigaction(signal, &translation_action());
        }
    }

    class.stamp_signal(signum);

    crate::engine::throw_raw(class, ExnData::None, "?", 0);
}

#[cfg(all(feature = "threads", feature = "shared-handlers"))]
pub(crate) fn install_current(_ctx: *mut Context) {
    crate::context::with_store(|inner| {
        inner.in_try += 1;
        if inner.in_try == 1 {
            inner.shared_saved = Some(unsafe { install_handlers() });
        }
    });
}

#[cfg(all(feature = "threads", feature = "shared-handlers"))]
pub(crate) fn restore_current(_ctx: *mut Context) -> bool {
    crate::context::with_store(restore_shared)
}

/// Decrements the flows-in-`try` count, restoring the saved dispositions
/// on the 1 -> 0 transition. Caller holds the store lock.
#[cfg(all(feature = "threads", feature = "shared-handlers"))]
pub(crate) fn restore_shared(inner: &mut crate::context::StoreInner) -> bool {
    if inner.in_try > 0 {
        inner.in_try -= 1;
    }
    if inner.in_try == 0 {
        if let Some(saved) = inner.shared_saved.take() {
            unsafe { restore_handlers(&saved) };
            return true;
        }
    }
    false
}

#[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
pub(crate) fn install_current(ctx: *mut Context) {
    unsafe {
        (*ctx).saved = Some(install_handlers());
    }
}

#[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
pub(crate) fn restore_current(ctx: *mut Context) -> bool {
    unsafe { restore_saved(&mut *ctx) }
}

#[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
pub(crate) fn restore_saved(ctx: &mut Context) -> bool {
    match ctx.saved.take() {
        Some(saved) => {
            unsafe { restore_handlers(&saved) };
            true
        }
        None => false,
    }
}

/// Releases the signal accounting still held by a flow that ceased with
/// frames on its stack. Caller holds the store lock.
#[cfg(feature = "threads")]
pub(crate) fn release_orphan(inner: &mut crate::context::StoreInner, ctx: &mut Context) {
    #[cfg(feature = "shared-handlers")]
    {
        let _ = ctx;
        restore_shared(inner);
    }
    #[cfg(not(feature = "shared-handlers"))]
    {
        let _ = inner;
        restore_saved(ctx);
    }
}
