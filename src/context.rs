//! The context store: maps flow identity to the per-flow engine context.
//!
//! With the `threads` feature the store is a process-wide map keyed by
//! `pthread_self`, serialized by a recursive mutex; contexts are created
//! lazily on the first `try` of a flow and removed when its outermost
//! `finally` resolves. Without `threads` the store collapses to a single
//! static slot and the lock disappears.
//!
//! Contexts are handed out as raw pointers: the signal bridge's throw may
//! re-enter the store on the same flow mid-operation, and only the owning
//! flow (or [`cleanup_flow`] for a flow that has ceased) ever touches a
//! context's contents.

use smallvec::SmallVec;
use thiserror::Error;

use crate::frame::Frame;

#[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
use crate::signals::SavedHandlers;

pub(crate) struct Context {
    pub(crate) frames: SmallVec<[Box<Frame>; 4]>,
    /// Previous trap dispositions of this flow (per-flow handler modes).
    #[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
    pub(crate) saved: Option<SavedHandlers>,
}

impl Context {
    fn new() -> Self {
        Context {
            frames: SmallVec::new(),
            #[cfg(not(all(feature = "threads", feature = "shared-handlers")))]
            saved: None,
        }
    }
}

/// Rejected [`cleanup_flow`] requests.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The calling flow named its own id explicitly. A flow cannot have
    /// ceased while it is making this call; pass `-1` from a join handler
    /// instead.
    #[error("cannot clean up the calling flow's own context; pass -1 from a join handler instead")]
    CurrentFlow,
}

#[cfg(feature = "threads")]
mod store {
    use std::cell::UnsafeCell;
    use std::collections::HashMap;

    use lazy_static::lazy_static;

    use super::Context;
    use crate::sync::ReentrantMutex;

    pub(crate) struct StoreInner {
        contexts: HashMap<i64, *mut Context>,
        /// Number of flows currently holding at least one frame.
        #[cfg(feature = "shared-handlers")]
        pub(crate) in_try: usize,
        /// Process-wide dispositions saved on the 0 -> 1 transition.
        #[cfg(feature = "shared-handlers")]
        pub(crate) shared_saved: Option<crate::signals::SavedHandlers>,
    }

    unsafe impl Send for StoreInner {}

    struct Store {
        lock: ReentrantMutex,
        inner: UnsafeCell<StoreInner>,
    }

    unsafe impl Sync for Store {}

    lazy_static! {
        static ref STORE: Store = Store {
            lock: ReentrantMutex::new(),
            inner: UnsafeCell::new(StoreInner {
                contexts: HashMap::new(),
                #[cfg(feature = "shared-handlers")]
                in_try: 0,
                #[cfg(feature = "shared-handlers")]
                shared_saved: None,
            }),
        };
    }

    /// Runs `f` with the store locked. The lock is recursive, so the
    /// signal path may re-enter on the same flow; the guard releases on
    /// drop, so a panic inside `f` cannot strand the lock.
    pub(crate) fn with_store<R>(f: impl FnOnce(&mut StoreInner) -> R) -> R {
        let store = &*STORE;
        let _guard = store.lock.lock();
        f(unsafe { &mut *store.inner.get() })
    }

    impl StoreInner {
        pub(crate) fn lookup(&self, flow: i64) -> Option<*mut Context> {
            self.contexts.get(&flow).copied()
        }

        pub(crate) fn insert_new(&mut self, flow: i64) -> *mut Context {
            let ctx = Box::into_raw(Box::new(Context::new()));
            self.contexts.insert(flow, ctx);
            ctx
        }

        pub(crate) fn remove(&mut self, flow: i64) -> Option<Box<Context>> {
            self.contexts
                .remove(&flow)
                .map(|p| unsafe { Box::from_raw(p) })
        }
    }

    pub(crate) fn flow_id() -> i64 {
        unsafe { libc::pthread_self() as i64 }
    }

    pub(crate) fn current() -> Option<*mut Context> {
        with_store(|inner| inner.lookup(flow_id()))
    }

    pub(crate) fn get_or_create() -> *mut Context {
        with_store(|inner| {
            let flow = flow_id();
            match inner.lookup(flow) {
                Some(ctx) => ctx,
                None => inner.insert_new(flow),
            }
        })
    }

    pub(crate) fn destroy_current() {
        with_store(|inner| {
            inner.remove(flow_id());
        });
    }
}

#[cfg(not(feature = "threads"))]
mod store {
    use std::cell::UnsafeCell;
    use std::ptr;

    use super::Context;

    struct Slot(UnsafeCell<*mut Context>);

    unsafe impl Sync for Slot {}

    static SLOT: Slot = Slot(UnsafeCell::new(ptr::null_mut()));

    pub(crate) fn flow_id() -> i64 {
        0
    }

    pub(crate) fn current() -> Option<*mut Context> {
        let p = unsafe { *SLOT.0.get() };
        if p.is_null() {
            None
        } else {
            Some(p)
        }
    }

    pub(crate) fn get_or_create() -> *mut Context {
        current().unwrap_or_else(|| {
            let ctx = Box::into_raw(Box::new(Context::new()));
            unsafe {
                *SLOT.0.get() = ctx;
            }
            ctx
        })
    }

    pub(crate) fn destroy_current() {
        unsafe {
            let p = *SLOT.0.get();
            if !p.is_null() {
                *SLOT.0.get() = ptr::null_mut();
                drop(Box::from_raw(p));
            }
        }
    }
}

pub(crate) use store::{current, destroy_current, flow_id, get_or_create};

/// Identity of the calling flow as used to key the context store.
#[doc(hidden)]
pub fn current_flow_id() -> i64 {
    flow_id()
}

#[cfg(feature = "threads")]
pub(crate) use store::{with_store, StoreInner};

/// Removes the context of a flow that terminated without resolving its
/// frames (for example, a thread that was killed), restoring any signal
/// state it still accounts for.
///
/// Returns whether a context was found. The named flow must have ceased,
/// and its identifier must not have been reused yet; `-1` names the
/// calling flow (only sound from a join handler or equivalent).
#[cfg(feature = "threads")]
pub fn cleanup_flow(flow: i64) -> Result<bool, CleanupError> {
    let me = flow_id();
    if flow == me {
        return Err(CleanupError::CurrentFlow);
    }
    let flow = if flow == -1 { me } else { flow };

    Ok(with_store(|inner| match inner.remove(flow) {
        Some(mut ctx) => {
            if !ctx.frames.is_empty() {
                crate::signals::release_orphan(inner, &mut ctx);
            }
            drop(ctx);
            true
        }
        None => false,
    }))
}

/// Single-flow builds have nothing to clean up for foreign flows.
#[cfg(not(feature = "threads"))]
pub fn cleanup_flow(_flow: i64) -> Result<bool, CleanupError> {
    Ok(false)
}
