//! End-to-end tests for the `checksum` command.

use tempfile::TempDir;

use crate::helpers::{arg, run_cltool, stdout_of, write_gzip};

#[test]
fn test_checksum_known_values() {
    let output = run_cltool(&["checksum", "-t", "2"], Some(b"a\n123456789\n"));
    assert_eq!(stdout_of(&output), "e8b7be43\ta\ncbf43926\t123456789\n");
}

#[test]
fn test_checksum_is_independent_of_thread_count() {
    let dir = TempDir::new().unwrap();
    let contents: String = (0..500).map(|i| format!("record {i}\n")).collect();
    let input = write_gzip(dir.path(), "in.txt.gz", &contents);

    let single = stdout_of(&run_cltool(&["checksum", "-t", "1", arg(&input)], None));
    let many = stdout_of(&run_cltool(&["checksum", "-t", "8", arg(&input)], None));

    assert_eq!(single.lines().count(), 500);
    assert_eq!(single, many);
}
