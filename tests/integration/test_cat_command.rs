//! End-to-end tests for the `cat` command.

use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{arg, numbered_lines, run_cltool, stdout_of, write_gzip, write_text};

#[rstest]
#[case("1")]
#[case("2")]
#[case("8")]
fn test_cat_preserves_order_with_random_delays(#[case] threads: &str) {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "in.txt", &numbered_lines(200));

    let output = run_cltool(&["cat", "-t", threads, "--max-delay-ms", "3", arg(&input)], None);

    assert_eq!(stdout_of(&output), numbered_lines(200));
}

#[test]
fn test_cat_reads_stdin_when_no_inputs() {
    let output = run_cltool(&["cat", "-t", "4"], Some(b"x\ny\nz\n"));
    assert_eq!(stdout_of(&output), "x\ny\nz\n");
}

#[test]
fn test_cat_reads_stdin_from_dash() {
    let output = run_cltool(&["cat", "-"], Some(b"only\n"));
    assert_eq!(stdout_of(&output), "only\n");
}

#[test]
fn test_cat_repeated_stdin_is_read_once() {
    let output = run_cltool(&["cat", "-t", "1", "-", "-"], Some(b"abcdef\nghij\n"));
    assert_eq!(stdout_of(&output), "abcdef\nghij\n");
}

#[test]
fn test_cat_stdin_between_files() {
    let dir = TempDir::new().unwrap();
    let first = write_text(dir.path(), "a.txt", "a1\n");
    let last = write_text(dir.path(), "c.txt", "c1\n");

    let output = run_cltool(&["cat", "-t", "2", arg(&first), "-", arg(&last), "-"], Some(b"s1\ns2\n"));

    assert_eq!(stdout_of(&output), "a1\ns1\ns2\nc1\n");
}

#[test]
fn test_cat_decompresses_gzip_input() {
    let dir = TempDir::new().unwrap();
    let input = write_gzip(dir.path(), "in.txt.gz", "alpha\nbeta\ngamma\n");

    let output = run_cltool(&["cat", "-t", "2", arg(&input)], None);

    assert_eq!(stdout_of(&output), "alpha\nbeta\ngamma\n");
}

#[test]
fn test_cat_concatenates_files_in_order() {
    let dir = TempDir::new().unwrap();
    let first = write_text(dir.path(), "a.txt", "a1\na2\n");
    let second = write_gzip(dir.path(), "b.txt.gz", "b1\n");
    let third = write_text(dir.path(), "c.txt", "c1\nc2\n");

    let output = run_cltool(&["cat", "-t", "3", arg(&first), arg(&second), arg(&third)], None);

    assert_eq!(stdout_of(&output), "a1\na2\nb1\nc1\nc2\n");
}

#[test]
fn test_cat_joins_unterminated_last_line_with_next_file() {
    let dir = TempDir::new().unwrap();
    let first = write_text(dir.path(), "a.txt", "a1\na2");
    let second = write_text(dir.path(), "b.txt", "b1\n");

    let output = run_cltool(&["cat", arg(&first), arg(&second)], None);

    assert_eq!(stdout_of(&output), "a1\na2b1\n");
}

#[test]
fn test_cat_skips_empty_lines() {
    let output = run_cltool(&["cat", "-t", "2"], Some(b"a\n\nb\n\n\nc\n"));
    assert_eq!(stdout_of(&output), "a\nb\nc\n");
}

#[test]
fn test_cat_handles_crlf_line_endings() {
    let output = run_cltool(&["cat"], Some(b"a\r\nb\r\n"));
    assert_eq!(stdout_of(&output), "a\nb\n");
}

#[test]
fn test_cat_prefix_from_option() {
    let output = run_cltool(&["cat", "-O", "cat.prefix=>"], Some(b"a\n\nb\n"));
    assert_eq!(stdout_of(&output), ">a\n>b\n");
}

#[test]
fn test_cat_option_pair_overrides_properties_file() {
    let dir = TempDir::new().unwrap();
    let props = write_text(dir.path(), "cat.properties", "cat.prefix = file:\n");

    let from_file = run_cltool(&["cat", "-O", arg(&props)], Some(b"a\n"));
    assert_eq!(stdout_of(&from_file), "file:a\n");

    // Pairs win even when given before the file.
    let overridden = run_cltool(&["cat", "-O", "cat.prefix=pair:", "-O", arg(&props)], Some(b"a\n"));
    assert_eq!(stdout_of(&overridden), "pair:a\n");
}

#[test]
fn test_cat_accepts_xt_alias() {
    let output = run_cltool(&["cat", "--xt", "4"], Some(b"1\n2\n3\n"));
    assert_eq!(stdout_of(&output), "1\n2\n3\n");
}

#[test]
fn test_cat_decodes_latin1_input() {
    let output = run_cltool(&["cat", "--charset", "iso-8859-1"], Some(&[b'c', b'a', b'f', 0xE9, b'\n']));
    assert_eq!(stdout_of(&output), "caf\u{e9}\n");
}

#[test]
fn test_cat_empty_input_produces_no_output() {
    let output = run_cltool(&["cat", "-t", "4"], Some(b""));
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn test_cat_logs_to_stderr_only() {
    let output = run_cltool(&["-v", "fine", "cat"], Some(b"a\n"));
    assert_eq!(stdout_of(&output), "a\n");
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_cat_quiet_when_logging_off() {
    let output = run_cltool(&["-v", "off", "cat"], Some(b"a\n"));
    assert_eq!(stdout_of(&output), "a\n");
    assert!(output.stderr.is_empty(), "{}", String::from_utf8_lossy(&output.stderr));
}
