//! Input fixtures and a runner for the cltool binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    path
}

/// Writes `contents` gzip-compressed to `dir/name` and returns the path.
pub fn write_gzip(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("Failed to create fixture");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).expect("Failed to write fixture");
    encoder.finish().expect("Failed to finish gzip fixture");
    path
}

/// `n` numbered lines, each terminated by a newline.
pub fn numbered_lines(n: usize) -> String {
    (0..n).map(|i| format!("line-{i}\n")).collect()
}

/// Runs the cltool binary with `args`, feeding `stdin` if given.
pub fn run_cltool(args: &[&str], stdin: Option<&[u8]>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cltool"))
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run cltool");

    if let Some(bytes) = stdin {
        let mut pipe = child.stdin.take().expect("stdin was piped");
        pipe.write_all(bytes).expect("Failed to write stdin");
    }
    child.wait_with_output().expect("Failed to wait for cltool")
}

/// Stdout of a successful run, panicking with stderr otherwise.
pub fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "cltool failed with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout is not UTF-8")
}

/// Path as a `&str` for command-line arguments.
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("Non UTF-8 temp path")
}
