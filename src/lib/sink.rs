//! Output sinks that write results as text lines.
//!
//! Empty results produce no output at all, not even a newline, which lets a task
//! drop an input line by returning an empty string.

use std::fmt::Display;
use std::io::{self, Write};

use crate::executor::OutputSink;

/// Writes each non-empty result followed by a newline, flushing after every write.
pub struct LineSink<W: Write> {
    writer: W,
    buf: String,
}

impl<W: Write> LineSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, buf: String::new() }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write, R: Display> OutputSink<R> for LineSink<W> {
    fn write(&mut self, result: R) -> io::Result<()> {
        use std::fmt::Write as _;

        self.buf.clear();
        write!(self.buf, "{result}").map_err(io::Error::other)?;
        if !self.buf.is_empty() {
            self.writer.write_all(self.buf.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}

/// Writes each non-empty line of a batch followed by a newline, flushing once per batch.
pub struct BatchSink<W: Write> {
    writer: W,
}

impl<W: Write> BatchSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write, S: AsRef<str>> OutputSink<Vec<S>> for BatchSink<W> {
    fn write(&mut self, batch: Vec<S>) -> io::Result<()> {
        for line in batch.iter().map(AsRef::as_ref).filter(|line| !line.is_empty()) {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}
