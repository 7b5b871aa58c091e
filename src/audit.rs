//! Compile-time-gated static checker for `catch` chains.
//!
//! Active in debug builds. The macro code runs one audit pass per `try`
//! site (once per process) before any user code executes: every clause is
//! reported in declaration order, and a clause that duplicates an earlier
//! class or is already covered by an earlier parent is flagged. A `try`
//! with no clause at all gets its own warning. The clause list lives on
//! the frame and is dropped as soon as the pass finishes.

use crate::class::Class;
use crate::context;
use crate::diag;
use crate::frame::AuditList;

fn with_audit(f: impl FnOnce(&mut Option<AuditList>, &'static str)) {
    let ctx = context::current().expect("audit without a context");
    unsafe {
        let frame = (*ctx)
            .frames
            .last_mut()
            .expect("audit without a frame");
        let file = frame.try_file;
        f(&mut frame.audit, file);
    }
}

#[doc(hidden)]
pub fn audit_begin() {
    with_audit(|list, _| *list = Some(AuditList::new()));
}

#[doc(hidden)]
pub fn audit_clause(class: &'static Class, line: u32) {
    with_audit(|list, file| {
        let list = match list {
            Some(list) => list,
            None => return,
        };
        for &(prev_class, prev_line) in list.iter() {
            if class.is(prev_class) {
                diag::diagln(format_args!(
                    "Duplicate catch({}): file \"{}\", line {}; already caught at line {}.",
                    class.name(),
                    file,
                    line,
                    prev_line
                ));
                return;
            }
            if class.is_derived(prev_class) {
                diag::diagln(format_args!(
                    "Superfluous catch({}): file \"{}\", line {}; already caught by {} at line {}.",
                    class.name(),
                    file,
                    line,
                    prev_class.name(),
                    prev_line
                ));
                return;
            }
        }
        list.push((class, line));
    });
}

#[doc(hidden)]
pub fn audit_end(file: &'static str, line: u32) {
    with_audit(|list, _| {
        if let Some(list) = list.take() {
            if list.is_empty() {
                diag::diagln(format_args!(
                    "Warning: No catch clause(s): file \"{}\", line {}.",
                    file, line
                ));
            }
        }
    });
}
