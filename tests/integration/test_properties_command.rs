//! End-to-end tests for the `properties` command.

use tempfile::TempDir;

use crate::helpers::{arg, run_cltool, stdout_of, write_text};

#[test]
fn test_properties_prints_sorted_pairs() {
    let output = run_cltool(&["properties", "-O", "b=2", "-O", "a=1"], None);
    assert_eq!(stdout_of(&output), "a=1\nb=2\n");
}

#[test]
fn test_properties_prints_nothing_without_options() {
    let output = run_cltool(&["properties"], None);
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn test_properties_precedence() {
    let dir = TempDir::new().unwrap();
    let first = write_text(dir.path(), "first.properties", "a=first\nb=first\n");
    let second = write_text(dir.path(), "second.properties", "# comment\nb: second\nc second\n");

    let output = run_cltool(
        &["properties", "-O", "c=pair", "-O", arg(&first), "-O", arg(&second), "-O", "c=last"],
        None,
    );

    assert_eq!(stdout_of(&output), "a=first\nb=second\nc=last\n");
}

#[test]
fn test_properties_get_single_key() {
    let output = run_cltool(&["properties", "-O", "threshold=0.5", "--get", "threshold"], None);
    assert_eq!(stdout_of(&output), "0.5\n");
}

#[test]
fn test_properties_get_missing_key_fails() {
    let output = run_cltool(&["properties", "--get", "absent"], None);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent"));
}

#[test]
fn test_properties_missing_file_fails() {
    // A value without '=' that names no file cannot be loaded.
    let output = run_cltool(&["properties", "-O", "/definitely/not/here.properties"], None);
    assert!(!output.status.success());
}
