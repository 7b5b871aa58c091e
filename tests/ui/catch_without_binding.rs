//! Error: the catch header needs a binding identifier

use sigexcept::attempt;

fn main() {
    attempt! {
        try { }
        catch (sigexcept::Exception) { }
        finally { }
    }
}
