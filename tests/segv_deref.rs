//! A genuine wild write, not a raised signal: the faulting instruction is
//! abandoned by the handler's jump and the program carries on.

use sigexcept::{attempt, SegmentationFault};

#[test]
fn null_write_is_caught_and_survived() {
    let mut hit = false;
    attempt! {
        try {
            unsafe {
                std::ptr::null_mut::<u32>().write_volatile(1);
            }
            unreachable!("the store above faults");
        }
        catch (SegmentationFault, e) {
            hit = e.class().signal_number() == libc::SIGSEGV;
        }
        finally { }
    }
    assert!(hit);
}
