//! Recursive mutex over pthreads.
//!
//! The store lock must be recursive: a trap delivered while the owning
//! flow is inside a store operation reaches the store again through the
//! signal bridge's throw, and a plain mutex would self-deadlock there.
//!
//! Locking hands out a guard that releases on drop, so a panic that
//! unwinds out of a critical section (for example a failed `sigaction`
//! expectation on the install path) cannot leave the process-wide store
//! lock held forever.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

pub(crate) struct ReentrantMutex {
    // Boxed so the pthread mutex never moves after initialization.
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

unsafe impl Send for ReentrantMutex {}
unsafe impl Sync for ReentrantMutex {}

impl ReentrantMutex {
    pub(crate) fn new() -> Self {
        unsafe {
            let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
            libc::pthread_mutexattr_init(attr.as_mut_ptr());
            libc::pthread_mutexattr_settype(attr.as_mut_ptr(), libc::PTHREAD_MUTEX_RECURSIVE);

            let mut mutex = MaybeUninit::<libc::pthread_mutex_t>::uninit();
            libc::pthread_mutex_init(mutex.as_mut_ptr(), attr.as_ptr());
            libc::pthread_mutexattr_destroy(attr.as_mut_ptr());

            ReentrantMutex {
                inner: Box::new(UnsafeCell::new(mutex.assume_init())),
            }
        }
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_> {
        unsafe {
            libc::pthread_mutex_lock(self.inner.get());
        }
        ReentrantMutexGuard { mutex: self }
    }
}

/// Releases one level of the recursive lock on drop, panics included.
pub(crate) struct ReentrantMutexGuard<'a> {
    mutex: &'a ReentrantMutex,
}

impl Drop for ReentrantMutexGuard<'_> {
    fn drop(&mut self) {
        let rc = unsafe { libc::pthread_mutex_unlock(self.mutex.inner.get()) };
        if rc != 0 {
            // Engine bug or foreign misuse; report and keep going.
            crate::diag::diagln(format_args!(
                "internal error: flow attempts to unlock without holding lock"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn same_flow_may_lock_recursively() {
        let m = ReentrantMutex::new();
        let outer = m.lock();
        let inner = m.lock();
        drop(inner);
        drop(outer);
    }

    #[test]
    fn guard_releases_on_panic() {
        let m = Arc::new(ReentrantMutex::new());
        let held = Arc::clone(&m);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = held.lock();
            panic!("inside the critical section");
        }));
        // A leaked lock would hang this foreign flow.
        let other = Arc::clone(&m);
        std::thread::spawn(move || {
            let _guard = other.lock();
        })
        .join()
        .unwrap();
    }

    #[test]
    fn excludes_other_flows() {
        let m = Arc::new(ReentrantMutex::new());
        let shared = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let m = Arc::clone(&m);
            let shared = Arc::clone(&shared);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    let outer = m.lock();
                    let inner = m.lock();
                    let v = shared.load(std::sync::atomic::Ordering::Relaxed);
                    shared.store(v + 1, std::sync::atomic::Ordering::Relaxed);
                    drop(inner);
                    drop(outer);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(shared.load(std::sync::atomic::Ordering::Relaxed), 4000);
    }
}
