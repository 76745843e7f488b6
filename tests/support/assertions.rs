//! Assertions over binary output and library results.

use std::process::Output;

use cellar::error::{ErrorKind, Result};

/// Lossy UTF-8 stdout.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy UTF-8 stderr.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "cellar exited with {}:\n{}",
        output.status,
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "cellar unexpectedly succeeded:\n{}",
        stdout(output)
    );
}

pub fn assert_stdout_contains(output: &Output, expected: &str) {
    let text = stdout(output);
    assert!(text.contains(expected), "expected {:?} on stdout:\n{}", expected, text);
}

pub fn assert_stderr_contains(output: &Output, expected: &str) {
    let text = stderr(output);
    assert!(text.contains(expected), "expected {:?} on stderr:\n{}", expected, text);
}

/// Assert a library call failed with `kind`.
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {:?}, got Ok({:?})", kind, value),
        Err(e) => assert_eq!(e.kind(), kind, "unexpected error: {}", e),
    }
}
