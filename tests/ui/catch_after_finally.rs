//! Error: clauses cannot follow the finally block

use sigexcept::attempt;

fn main() {
    attempt! {
        try { }
        finally { }
        catch (sigexcept::Exception, e) { let _ = e; }
    }
}
