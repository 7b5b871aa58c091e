//! An uncaught trap exception re-raises its signal against the restored
//! disposition once the outermost finally has run, so the process dies
//! the platform way at a reproducible point. Exercised in a child
//! process.

use std::os::unix::process::ExitStatusExt;
use std::process::Command;

use sigexcept::attempt;

const CHILD_MARK: &str = "SIGEXCEPT_RERAISE_CHILD";

#[test]
fn uncaught_abort_terminates_after_finally() {
    if std::env::var_os(CHILD_MARK).is_some() {
        child();
        return;
    }

    let exe = std::env::current_exe().expect("test binary path");
    let output = Command::new(exe)
        .args([
            "uncaught_abort_terminates_after_finally",
            "--exact",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_MARK, "1")
        .output()
        .expect("child spawns");

    assert_eq!(output.status.signal(), Some(libc::SIGABRT));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("finally ran"), "stderr: {stderr}");
    assert!(!stderr.contains("survived"), "stderr: {stderr}");
}

fn child() {
    attempt! {
        try {
            unsafe {
                libc::raise(libc::SIGABRT);
            }
        }
        finally {
            eprintln!("finally ran");
        }
    }
    eprintln!("survived");
}
