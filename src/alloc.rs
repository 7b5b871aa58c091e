//! Fallible allocation helpers that raise `OutOfMemoryError` instead of
//! aborting the process.
//!
//! Inside a `try`, an exhausted allocator throws and the helper never
//! returns to its caller. Outside any `try` the exception is lost like
//! every other throw - one diagnostic line - and the failure comes back
//! through the `Result` so execution can continue, the way the original
//! wrappers handed back a null pointer.

use std::alloc::{self, Layout};

use thiserror::Error;

use crate::class::OutOfMemoryError;
use crate::frame::ExnData;

/// Allocator failure reported on the lost path, when no frame was there
/// to catch the thrown `OutOfMemoryError`.
#[derive(Debug, Error)]
#[error("allocation of {size} bytes failed")]
pub struct AllocFailure {
    size: usize,
}

impl AllocFailure {
    /// Number of bytes the failed request asked for.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Boxes `value`, throwing `OutOfMemoryError` when the allocator fails.
#[track_caller]
pub fn try_box<T>(value: T) -> Result<Box<T>, AllocFailure> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }
    unsafe {
        let ptr = alloc::alloc(layout) as *mut T;
        if ptr.is_null() {
            let loc = std::panic::Location::caller();
            OutOfMemoryError.throw_with(ExnData::None, loc.file(), loc.line());
            // Only reachable when the throw was lost.
            return Err(AllocFailure {
                size: layout.size(),
            });
        }
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

/// Reserves `additional` slots, throwing `OutOfMemoryError` on failure.
#[track_caller]
pub fn try_reserve<T>(vec: &mut Vec<T>, additional: usize) -> Result<(), AllocFailure> {
    if vec.try_reserve(additional).is_err() {
        let loc = std::panic::Location::caller();
        OutOfMemoryError.throw_with(ExnData::None, loc.file(), loc.line());
        return Err(AllocFailure {
            size: additional.saturating_mul(std::mem::size_of::<T>()),
        });
    }
    Ok(())
}
