//! Trap translation: each supported signal surfaces as its class.

use sigexcept::{attempt, AbnormalTermination, ArithmeticException, BusError, IllegalInstruction,
    RuntimeException, SegmentationFault};

fn raise(signum: i32) {
    unsafe {
        libc::raise(signum);
    }
}

#[test]
fn segv_is_caught_as_segmentation_fault() {
    let mut message = None;
    attempt! {
        try {
            raise(libc::SIGSEGV);
        }
        catch (SegmentationFault, e) {
            message = Some(e.message());
        }
        finally { }
    }
    assert_eq!(message.unwrap(), "SegmentationFault: file \"?\", line 0.");
}

#[test]
fn fpe_is_caught_as_arithmetic_exception() {
    let mut hit = false;
    attempt! {
        try {
            raise(libc::SIGFPE);
        }
        catch (ArithmeticException, e) {
            hit = e.class().signal_number() == libc::SIGFPE;
        }
        finally { }
    }
    assert!(hit);
}

#[test]
fn ill_is_caught_as_illegal_instruction() {
    let mut hit = false;
    attempt! {
        try {
            raise(libc::SIGILL);
        }
        catch (IllegalInstruction, e) {
            let _ = e;
            hit = true;
        }
        finally { }
    }
    assert!(hit);
}

#[test]
fn bus_is_caught_as_bus_error() {
    let mut hit = false;
    attempt! {
        try {
            raise(libc::SIGBUS);
        }
        catch (BusError, e) {
            let _ = e;
            hit = true;
        }
        finally { }
    }
    assert!(hit);
}

#[test]
fn abort_is_caught_as_abnormal_termination() {
    let mut hit = false;
    attempt! {
        try {
            raise(libc::SIGABRT);
        }
        catch (AbnormalTermination, e) {
            let _ = e;
            hit = true;
        }
        finally { }
    }
    assert!(hit);
}

#[test]
fn traps_match_their_common_parent() {
    let mut classes = Vec::new();
    for signum in [libc::SIGSEGV, libc::SIGILL, libc::SIGFPE] {
        attempt! {
            try {
                raise(signum);
            }
            catch (RuntimeException, e) {
                classes.push(e.class().name());
            }
            finally { }
        }
    }
    assert_eq!(
        classes,
        ["SegmentationFault", "IllegalInstruction", "ArithmeticException"]
    );
}

#[test]
fn execution_continues_after_a_caught_trap() {
    let mut after = 0;
    for _ in 0..10 {
        attempt! {
            try {
                raise(libc::SIGSEGV);
            }
            catch (SegmentationFault, e) {
                let _ = e;
            }
            finally { }
        }
        after += 1;
    }
    assert_eq!(after, 10);
}
