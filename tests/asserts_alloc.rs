//! Assertion macros and the fallible allocation helpers.

use sigexcept::{affirm, attempt, check, define_class, Exception, ExnData, FailedAssertion};

define_class! { ConfigError: Exception }

#[test]
fn failed_affirm_carries_the_expression_text() {
    let mut data = None;
    attempt! {
        try {
            affirm!(2 + 2 == 5);
        }
        catch (FailedAssertion, e) {
            data = Some(e.data());
        }
        finally { }
    }
    assert_eq!(data, Some(ExnData::Str("2 + 2 == 5")));
}

#[test]
fn passing_affirm_is_silent() {
    let mut fell_through = false;
    attempt! {
        try {
            affirm!(1 + 1 == 2);
            fell_through = true;
        }
        catch (FailedAssertion, e) {
            let _ = e;
            unreachable!("the assertion holds");
        }
        finally { }
    }
    assert!(fell_through);
}

#[test]
fn check_surfaces_in_scope() {
    // Debug builds turn the failure into FailedAssertion before the class
    // throw is reached; either way the construct observes a failure.
    let mut observed = false;
    attempt! {
        try {
            check!(false, ConfigError);
        }
        catch (FailedAssertion, e) {
            let _ = e;
            observed = true;
        }
        catch (ConfigError, e) {
            let _ = e;
            observed = true;
        }
        finally { }
    }
    assert!(observed);
}

#[test]
fn passing_check_is_silent() {
    let mut fell_through = false;
    attempt! {
        try {
            check!(true, ConfigError);
            fell_through = true;
        }
        catch (Exception, e) {
            let _ = e;
            unreachable!("the check holds");
        }
        finally { }
    }
    assert!(fell_through);
}

#[test]
fn fallible_allocation_succeeds_inside_a_construct() {
    let mut total = 0usize;
    attempt! {
        try {
            let boxed = sigexcept::fallible::try_box([0u8; 128]).unwrap();
            let mut vec: Vec<u64> = Vec::new();
            sigexcept::fallible::try_reserve(&mut vec, 32).unwrap();
            total = boxed.len() + vec.capacity();
        }
        catch (sigexcept::OutOfMemoryError, e) {
            let _ = e;
            unreachable!("allocations this small do not fail");
        }
        finally { }
    }
    assert!(total >= 128 + 32);
}
