//! End-to-end tests for the `batch-cat` command.

use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{arg, numbered_lines, run_cltool, stdout_of, write_text};

#[rstest]
#[case("1", "1")]
#[case("4", "1")]
#[case("4", "7")]
#[case("8", "25")]
#[case("3", "1000")]
fn test_batch_cat_preserves_order(#[case] threads: &str, #[case] batch: &str) {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "in.txt", &numbered_lines(123));

    let output = run_cltool(&["batch-cat", "-t", threads, "-b", batch, arg(&input)], None);

    assert_eq!(stdout_of(&output), numbered_lines(123));
}

#[test]
fn test_batch_cat_reverse_shows_batch_boundaries() {
    let output = run_cltool(
        &["batch-cat", "-t", "2", "-b", "3", "--reverse"],
        Some(b"1\n2\n3\n4\n5\n6\n7\n"),
    );
    assert_eq!(stdout_of(&output), "3\n2\n1\n6\n5\n4\n7\n");
}

#[test]
fn test_batch_cat_skips_empty_lines() {
    let output = run_cltool(&["batch-cat", "-b", "2"], Some(b"a\n\nb\n"));
    assert_eq!(stdout_of(&output), "a\nb\n");
}

#[test]
fn test_batch_cat_rejects_zero_batch_size() {
    let output = run_cltool(&["batch-cat", "-b", "0"], Some(b"a\n"));
    assert!(!output.status.success());
}
