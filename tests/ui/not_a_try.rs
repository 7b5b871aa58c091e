//! Error: the construct must start with a try block

use sigexcept::attempt;

fn main() {
    attempt! {
        finally { }
    }
}
