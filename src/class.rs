//! The exception class registry: a static tree of classes rooted at
//! [`static@Throwable`], each holding a parent link, a name, and the signal
//! number stamped by the signal bridge when the class corresponds to a
//! hardware trap.

use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::frame::ExnData;

/// An exception class. Instances are `static` singletons declared with
/// [`define_class!`](crate::define_class); identity is address identity.
pub struct Class {
    parent: Option<&'static Class>,
    name: &'static str,
    signal: AtomicI32,
}

impl Class {
    /// Builds a class record. Use [`define_class!`](crate::define_class)
    /// rather than calling this directly; classes must be `static` for
    /// their references to be throwable.
    pub const fn new(parent: Option<&'static Class>, name: &'static str) -> Self {
        Class {
            parent,
            name,
            signal: AtomicI32::new(0),
        }
    }

    /// The class name as written in its declaration.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parent class, absent only for the root.
    pub fn parent(&self) -> Option<&'static Class> {
        self.parent
    }

    /// Identity comparison.
    pub fn is(&'static self, other: &'static Class) -> bool {
        ptr::eq(self, other)
    }

    /// Walks the parent chain: true when `self` is `base` or inherits from
    /// it. The root terminates the walk.
    pub fn is_derived(&'static self, base: &'static Class) -> bool {
        let mut class: &'static Class = self;
        while class.parent.is_some() && !ptr::eq(class, base) {
            class = class.parent.unwrap();
        }
        ptr::eq(class, base)
    }

    /// Signal number stamped by the bridge, 0 when never delivered.
    pub fn signal_number(&self) -> i32 {
        self.signal.load(Ordering::Relaxed)
    }

    pub(crate) fn stamp_signal(&self, signum: i32) {
        // Redundant after the first delivery.
        self.signal.store(signum, Ordering::Relaxed);
    }

    /// Throws an exception of this class from the current location.
    /// Normally invoked through [`throw!`](crate::throw).
    ///
    /// Inside an active `try`, control transfers to the matching handler
    /// chain and this call does not return. Outside any `try` the
    /// exception is reported as lost on the diagnostic stream and
    /// execution continues.
    pub fn throw_with(&'static self, data: ExnData, file: &'static str, line: u32) {
        crate::engine::throw_raw(self, data, file, line);
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("signal", &self.signal_number())
            .finish()
    }
}

/// Root of the class tree; terminates every parent walk.
#[allow(non_upper_case_globals)]
pub static Throwable: Class = Class::new(None, "Throwable");

crate::define_class! {
    /// Base class for everything a program is expected to catch.
    pub Exception: Throwable
}
crate::define_class! {
    /// Raised by the fallible allocation helpers on exhaustion.
    pub OutOfMemoryError: Exception
}
crate::define_class! {
    /// Raised by a failed `affirm!` inside handler scope.
    pub FailedAssertion: Exception
}
crate::define_class! {
    /// Base class of the translated hardware traps.
    pub RuntimeException: Exception
}
crate::define_class! {
    /// Abort trap (SIGABRT).
    pub AbnormalTermination: RuntimeException
}
crate::define_class! {
    /// Floating-point trap (SIGFPE).
    pub ArithmeticException: RuntimeException
}
crate::define_class! {
    /// Illegal-instruction trap (SIGILL).
    pub IllegalInstruction: RuntimeException
}
crate::define_class! {
    /// Segmentation fault (SIGSEGV).
    pub SegmentationFault: RuntimeException
}
crate::define_class! {
    /// Bus error (SIGBUS).
    pub BusError: RuntimeException
}

/// Internal pseudo-class carrying a return through `finally` blocks. Its
/// parent is deliberately none so no user `catch`, not even one on the
/// root, can match it.
#[allow(non_upper_case_globals)]
pub(crate) static ReturnEvent: Class = Class::new(None, "ReturnEvent");
