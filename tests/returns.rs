//! Return-through-finally behavior.

use sigexcept::{attempt, affirm, throw, try_return, Exception, ExnData, FailedAssertion, Throwable};

fn plain_return() -> i32 {
    attempt! {
        try {
            try_return!(6);
        }
        catch (Throwable, e) {
            let _ = e;
            unreachable!("a return event is not catchable");
        }
        finally { }
    }
    7
}

#[test]
fn return_is_not_catchable_even_by_the_root() {
    assert_eq!(plain_return(), 6);
}

fn superseded_return() -> i32 {
    attempt! {
        try {
            try_return!(6);
        }
        finally {
            try_return!(7);
        }
    }
    8
}

#[test]
fn later_return_in_finally_supersedes() {
    assert_eq!(superseded_return(), 7);
}

fn nested_order(log: &mut String) -> i32 {
    attempt! {
        try {
            try {
                try {
                    try_return!(1);
                }
                finally {
                    log.push_str("A ");
                }
            }
            finally {
                log.push_str("B ");
            }
        }
        finally {
            log.push_str("C ");
        }
    }
    2
}

#[test]
fn nested_finally_blocks_run_inside_out() {
    let mut log = String::new();
    assert_eq!(nested_order(&mut log), 1);
    assert_eq!(log, "A B C ");
}

fn callee() -> i32 {
    attempt! {
        try {
            try_return!(6);
        }
        catch (Throwable, e) {
            let _ = e;
        }
        finally { }
    }
    0
}

#[test]
fn return_stops_at_its_own_activation() {
    // The callee's return resolves inside the callee; the caller's try
    // keeps running.
    let mut got = 0;
    let mut resumed = false;
    attempt! {
        try {
            got = callee();
            resumed = true;
        }
        finally { }
    }
    assert_eq!(got, 6);
    assert!(resumed);
}

fn assertion_then_return() -> i32 {
    attempt! {
        try {
            affirm!(1 == 2);
        }
        catch (FailedAssertion, e) {
            assert_eq!(e.data(), ExnData::Str("1 == 2"));
            try_return!(8);
        }
        finally { }
    }
    0
}

#[test]
fn return_from_catch_runs_finally() {
    assert_eq!(assertion_then_return(), 8);
}

fn assertion_return_overridden() -> i32 {
    attempt! {
        try {
            affirm!(1 == 2);
        }
        catch (FailedAssertion, e) {
            let _ = e;
            try_return!(8);
        }
        finally {
            try_return!(9);
        }
    }
    0
}

#[test]
fn finally_return_overrides_catch_return() {
    assert_eq!(assertion_return_overridden(), 9);
}

fn returns_through_pending_exception() -> i32 {
    // A return inside finally overrules the still-pending exception.
    attempt! {
        try {
            throw!(Exception, "doomed");
        }
        finally {
            try_return!(3);
        }
    }
    4
}

#[test]
fn return_in_finally_supplants_pending_exception() {
    assert_eq!(returns_through_pending_exception(), 3);
}

fn string_return() -> String {
    attempt! {
        try {
            try_return!(String::from("carried"));
        }
        finally { }
    }
    String::new()
}

#[test]
fn non_integer_values_are_carried() {
    assert_eq!(string_return(), "carried");
}
