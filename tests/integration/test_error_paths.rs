//! Failure modes that must exit non-zero without partial success.

use tempfile::TempDir;

use crate::helpers::{arg, run_cltool, write_text};

#[test]
fn test_missing_first_input_fails_before_output() {
    let output = run_cltool(&["cat", "/no/such/input.txt"], None);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/no/such/input.txt"));
}

#[test]
fn test_missing_later_input_fails() {
    let dir = TempDir::new().unwrap();
    let first = write_text(dir.path(), "a.txt", "a\n");
    let missing = dir.path().join("missing.txt");

    let output = run_cltool(&["cat", arg(&first), arg(&missing)], None);

    assert!(!output.status.success());
}

#[test]
fn test_zero_threads_is_rejected() {
    let output = run_cltool(&["cat", "-t", "0"], Some(b"a\n"));
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_huge_thread_count_is_rejected_without_panic() {
    let output = run_cltool(&["-v", "off", "cat", "-t", "4611686018427387904"], Some(b"a\n"));
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("threads"));
}

#[test]
fn test_unknown_charset_is_rejected() {
    let output = run_cltool(&["cat", "--charset", "klingon"], Some(b"a\n"));
    assert!(!output.status.success());
}

#[test]
fn test_unknown_verbosity_is_rejected() {
    let output = run_cltool(&["-v", "chatty", "cat"], Some(b"a\n"));
    assert!(!output.status.success());
}

#[test]
fn test_numeric_verbosity_is_accepted() {
    let output = run_cltool(&["-v", "-3", "cat"], Some(b"a\n"));
    assert!(output.status.success());
    assert_eq!(output.stdout, b"a\n");
}

#[test]
fn test_negative_progress_interval_is_rejected() {
    let output = run_cltool(&["cat", "-O", "progress.interval=-5"], Some(b"a\n"));
    assert!(!output.status.success());
}

#[test]
fn test_version_flag() {
    let output = run_cltool(&["--version"], None);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("cltool "));
}
