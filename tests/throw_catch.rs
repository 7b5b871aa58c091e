//! Core dispatch semantics: matching, ordering, propagation, rethrow.

use sigexcept::{
    attempt, define_class, pending, throw, Exception, ExnData, RuntimeException, Throwable,
};

define_class! { Level1Exception: Exception }
define_class! { Level2Exception: Level1Exception }

#[test]
fn first_matching_clause_wins() {
    let mut order = Vec::new();
    let mut message = None;
    let mut thrown_at = 0;
    attempt! {
        try {
            order.push("try");
            thrown_at = line!(); throw!(Exception, "boom");
            order.push("unreached");
        }
        catch (RuntimeException, e) {
            let _ = e;
            order.push("runtime");
        }
        catch (Exception, e) {
            order.push("exception");
            message = Some(e.message());
        }
        catch (Throwable, e) {
            let _ = e;
            order.push("throwable");
        }
        finally {
            order.push("finally");
        }
    }
    assert_eq!(order, ["try", "exception", "finally"]);
    assert_eq!(
        message.unwrap(),
        format!("Exception: file \"{}\", line {}.", file!(), thrown_at)
    );
}

#[test]
fn matching_follows_inheritance() {
    // Level2 is-a Level1, so the Level1 clause takes it.
    let mut caught = false;
    attempt! {
        try {
            throw!(Level2Exception);
        }
        catch (Level1Exception, e) {
            caught = e.class().is(&Level2Exception);
        }
        finally { }
    }
    assert!(caught);
}

#[test]
fn matching_never_goes_downward() {
    // Level1 is not a Level2; the inner clause must not take it.
    let mut inner_matched = false;
    let mut outer_matched = false;
    attempt! {
        try {
            try {
                throw!(Level1Exception);
            }
            catch (Level2Exception, e) {
                let _ = e;
                inner_matched = true;
            }
            finally { }
        }
        catch (Exception, e) {
            let _ = e;
            outer_matched = true;
        }
        finally { }
    }
    assert!(!inner_matched);
    assert!(outer_matched);
}

#[test]
fn unmatched_exception_propagates_with_origin() {
    let mut seen = None;
    let mut thrown_at = 0;
    attempt! {
        try {
            try {
                thrown_at = line!(); throw!(Level2Exception, "deep");
            }
            catch (RuntimeException, e) {
                let _ = e;
                unreachable!("wrong subtree");
            }
            finally { }
        }
        catch (Level1Exception, e) {
            seen = Some((e.class(), e.file(), e.line(), e.data()));
        }
        finally { }
    }
    let (class, file, line, data) = seen.unwrap();
    assert!(class.is(&Level2Exception));
    assert_eq!(file, file!());
    assert_eq!(line, thrown_at);
    assert_eq!(data, ExnData::Str("deep"));
}

#[test]
fn rethrow_preserves_origin_and_replaces_data() {
    let mut thrown_at = 0;
    let mut outer = None;
    attempt! {
        try {
            try {
                thrown_at = line!(); throw!(Exception, "Hello");
            }
            catch (Exception, e) {
                assert_eq!(e.data(), ExnData::Str("Hello"));
                throw!(e, "there!");
            }
            finally { }
        }
        catch (Exception, e) {
            outer = Some((e.data(), e.line()));
        }
        finally { }
    }
    let (data, line) = outer.unwrap();
    assert_eq!(data, ExnData::Str("there!"));
    assert_eq!(line, thrown_at);
}

#[test]
fn throw_inside_catch_replaces_and_skips_later_clauses() {
    // The original exception is discarded; later clauses of the same try
    // never see the new one.
    let mut trace = Vec::new();
    attempt! {
        try {
            try {
                throw!(Exception);
            }
            catch (Exception, e) {
                let _ = e;
                trace.push("inner-catch");
                throw!(Level1Exception);
            }
            catch (Level1Exception, e) {
                let _ = e;
                trace.push("same-level-catch");
            }
            finally {
                trace.push("inner-finally");
            }
        }
        catch (Level1Exception, e) {
            let _ = e;
            trace.push("outer-catch");
        }
        finally {
            trace.push("outer-finally");
        }
    }
    assert_eq!(
        trace,
        ["inner-catch", "inner-finally", "outer-catch", "outer-finally"]
    );
}

#[test]
fn throw_inside_finally_replaces_pending() {
    let mut got_new = false;
    let mut got_old = false;
    attempt! {
        try {
            try {
                throw!(Level1Exception);
            }
            finally {
                throw!(Level2Exception);
                unreachable!("the finally is left at the throw");
            }
        }
        catch (Level2Exception, e) {
            let _ = e;
            got_new = true;
        }
        catch (Level1Exception, e) {
            let _ = e;
            got_old = true;
        }
        finally { }
    }
    assert!(got_new);
    assert!(!got_old);
}

#[test]
fn pending_reports_unhandled_exception_in_finally() {
    let mut inner_pending = None;
    let mut outer_pending = None;
    attempt! {
        try {
            try {
                throw!(Exception);
            }
            finally {
                inner_pending = Some(pending!());
            }
        }
        catch (Exception, e) {
            let _ = e;
        }
        finally {
            outer_pending = Some(pending!());
        }
    }
    assert_eq!(inner_pending, Some(true));
    assert_eq!(outer_pending, Some(false));
}

#[test]
fn finally_runs_once_on_every_path() {
    // Normal fallthrough, caught exception, and nested throw from catch.
    let mut runs = 0;
    attempt! {
        try { }
        finally { runs += 1; }
    }
    attempt! {
        try { throw!(Exception); }
        catch (Exception, e) { let _ = e; }
        finally { runs += 1; }
    }
    attempt! {
        try {
            try { throw!(Exception); }
            catch (Exception, e) { let _ = e; throw!(Level1Exception); }
            finally { runs += 1; }
        }
        catch (Level1Exception, e) { let _ = e; }
        finally { runs += 1; }
    }
    assert_eq!(runs, 4);
}

#[test]
fn try_trace_names_every_enclosing_site() {
    let mut buf: Vec<u8> = Vec::new();
    attempt! {
        try {
            try {
                throw!(Exception);
            }
            catch (Exception, e) {
                e.print_try_trace(Some(&mut buf));
            }
            finally { }
        }
        finally { }
    }
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("Exception occurred"));
    assert_eq!(text.matches("in 'try' at").count(), 2);
    assert!(text.contains(file!()));
}

#[test]
fn data_kinds_round_through() {
    let mut got = Vec::new();
    for pick in 0..3 {
        attempt! {
            try {
                match pick {
                    0 => throw!(Exception),
                    1 => throw!(Exception, 17),
                    _ => throw!(Exception, format!("n={pick}")),
                }
            }
            catch (Exception, e) {
                got.push(e.data());
            }
            finally { }
        }
    }
    assert_eq!(
        got,
        [
            ExnData::None,
            ExnData::Int(17),
            ExnData::Text(String::from("n=2")),
        ]
    );
}
