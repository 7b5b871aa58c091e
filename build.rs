fn main() {
    cc::Build::new()
        .file("src/jump/helpers.c")
        .compile("sigexcept_helpers");
    println!("cargo:rerun-if-changed=src/jump/helpers.c");
}
