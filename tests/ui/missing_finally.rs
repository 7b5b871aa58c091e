//! Error: the finally block is mandatory

use sigexcept::attempt;

fn main() {
    attempt! {
        try { }
        catch (sigexcept::Exception, e) { let _ = e; }
    }
}
