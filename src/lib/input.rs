//! Input streams for line-oriented tools.
//!
//! All input files are opened up front and read back to back as a single stream.
//! Each file (or stdin) is sniffed for the gzip magic bytes and decompressed
//! transparently. Files are concatenated byte for byte, so a file without a
//! trailing newline runs into the first line of the next file.
//!
//! [`LineReader`] and [`BatchReader`] turn the stream into input items for the
//! executor. Both serialize concurrent callers with a mutex around the reader.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;
use flate2::read::MultiGzDecoder;
use log::debug;
use parking_lot::Mutex;

use crate::errors::{CltoolError, Result};
use crate::executor::InputSequencer;

/// Read buffer size for input streams.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Name used for standard input in logs and on the command line.
pub const STDIN_PATH: &str = "-";

/// Returns true if the path is "-" or "/dev/stdin".
///
/// # Example
/// ```
/// use cltool_lib::input::is_stdin_path;
///
/// assert!(is_stdin_path("-"));
/// assert!(is_stdin_path("/dev/stdin"));
/// assert!(!is_stdin_path("input.txt"));
/// ```
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    path == Path::new(STDIN_PATH) || path == Path::new("/dev/stdin")
}

/// Wraps `reader` in a buffered reader, decompressing it if it starts with the
/// gzip magic bytes. Multi-member gzip streams are read to the end.
///
/// # Errors
///
/// Returns an error if the first bytes cannot be read.
pub fn maybe_decompress<R>(mut reader: R) -> io::Result<Box<dyn BufRead + Send>>
where
    R: Read + Send + 'static,
{
    let mut magic = Vec::with_capacity(GZIP_MAGIC.len());
    reader.by_ref().take(GZIP_MAGIC.len() as u64).read_to_end(&mut magic)?;
    let is_gzip = magic == GZIP_MAGIC;
    let stream = Cursor::new(magic).chain(reader);

    if is_gzip {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, MultiGzDecoder::new(stream))))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stream)))
    }
}

struct InputSource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    started: bool,
}

/// Several input streams read one after another as a single stream.
///
/// The reader remembers the name of every stream it starts reading, empty ones
/// included, until [`take_started_files`](Self::take_started_files) collects them.
pub struct MultiFileReader {
    sources: VecDeque<InputSource>,
    started_files: Vec<String>,
}

impl MultiFileReader {
    /// Creates a reader over already opened streams, each paired with a display name.
    pub fn new(sources: Vec<(String, Box<dyn BufRead + Send>)>) -> Self {
        let sources = sources
            .into_iter()
            .map(|(name, reader)| InputSource { name, reader, started: false })
            .collect();
        Self { sources, started_files: Vec::new() }
    }

    /// Names of the streams started since the last call, in input order.
    pub fn take_started_files(&mut self) -> Vec<String> {
        std::mem::take(&mut self.started_files)
    }
}

impl Read for MultiFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for MultiFileReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while let Some(source) = self.sources.front_mut() {
            if !source.started {
                debug!("Reading {}", source.name);
                source.started = true;
                self.started_files.push(source.name.clone());
            }
            if !source.reader.fill_buf()?.is_empty() {
                break;
            }
            self.sources.pop_front();
        }
        match self.sources.front_mut() {
            Some(source) => source.reader.fill_buf(),
            None => Ok(&[]),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Some(source) = self.sources.front_mut() {
            source.reader.consume(amt);
        }
    }
}

/// Opens the input files as one concatenated stream.
///
/// An empty list, or the path `-`, reads standard input. Standard input is read
/// at most once; repeating `-` does not read it again. Every file is opened
/// before any is read, so a missing file fails the run before work starts.
///
/// # Errors
///
/// Returns [`CltoolError::InputNotFound`] for a missing file and
/// [`CltoolError::Input`] for any other open or read failure.
pub fn open_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<MultiFileReader> {
    let mut sources: Vec<(String, Box<dyn BufRead + Send>)> = Vec::with_capacity(paths.len().max(1));
    if paths.is_empty() {
        sources.push(open_stdin()?);
    }
    let mut stdin_opened = false;
    for path in paths {
        let path = path.as_ref();
        if is_stdin_path(path) {
            // Standard input can only be consumed once; later mentions add nothing.
            if stdin_opened {
                debug!("Ignoring repeated standard input argument {}", path.display());
            } else {
                sources.push(open_stdin()?);
                stdin_opened = true;
            }
            continue;
        }
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CltoolError::InputNotFound {
                description: "Input file".to_string(),
                path: path.display().to_string(),
            },
            _ => CltoolError::Input(e),
        })?;
        let reader = maybe_decompress(file).map_err(CltoolError::Input)?;
        sources.push((path.display().to_string(), reader));
    }
    Ok(MultiFileReader::new(sources))
}

fn open_stdin() -> Result<(String, Box<dyn BufRead + Send>)> {
    let reader = maybe_decompress(io::stdin()).map_err(CltoolError::Input)?;
    Ok(("<stdin>".to_string(), reader))
}

/// Character encoding used to decode input lines.
///
/// Only ASCII-compatible encodings are accepted, since lines are split on the
/// `\n` byte before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    /// UTF-8, the default.
    #[must_use]
    pub fn utf8() -> Self {
        Self(encoding_rs::UTF_8)
    }

    /// Looks up an encoding by its WHATWG label (e.g. `utf-8`, `latin1`, `shift_jis`).
    ///
    /// # Errors
    ///
    /// Returns [`CltoolError::InvalidParameter`] for unknown labels and for
    /// encodings that are not ASCII-compatible.
    pub fn for_label(label: &str) -> Result<Self> {
        let invalid = |reason: String| CltoolError::InvalidParameter {
            parameter: "charset".to_string(),
            reason,
        };
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| invalid(format!("unknown character set '{label}'")))?;
        if !encoding.is_ascii_compatible() {
            return Err(invalid(format!("{} is not supported for line input", encoding.name())));
        }
        Ok(Self(encoding))
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decodes one line, replacing malformed sequences.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> String {
        if self.0 == encoding_rs::UTF_8 {
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            self.0.decode_without_bom_handling(bytes).0.into_owned()
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl FromStr for Charset {
    type Err = CltoolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::for_label(s)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct LineState<R> {
    reader: R,
    buf: Vec<u8>,
    pending_error: Option<io::Error>,
    lines_read: u64,
}

impl<R: BufRead> LineState<R> {
    fn next_line(&mut self, charset: Charset) -> io::Result<Option<String>> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        self.lines_read += 1;
        Ok(Some(charset.decode(&self.buf)))
    }
}

/// Thread-safe line source; yields one line per call without the line terminator.
pub struct LineReader<R = MultiFileReader> {
    state: Mutex<LineState<R>>,
    charset: Charset,
}

impl<R: BufRead> LineReader<R> {
    /// Creates a line reader decoding with `charset`.
    pub fn new(reader: R, charset: Charset) -> Self {
        let state = LineState { reader, buf: Vec::new(), pending_error: None, lines_read: 0 };
        Self { state: Mutex::new(state), charset }
    }

    /// Reads the next line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        self.state.lock().next_line(self.charset)
    }

    /// Reads up to `max` lines under a single lock.
    ///
    /// A read error after some lines were read is held back and returned by the
    /// next call, so the lines already read are not lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails before any line is read.
    pub fn read_lines(&self, max: usize) -> io::Result<Vec<String>> {
        let mut state = self.state.lock();
        let mut lines = Vec::with_capacity(max);
        while lines.len() < max {
            match state.next_line(self.charset) {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => break,
                Err(e) if lines.is_empty() => return Err(e),
                Err(e) => {
                    state.pending_error = Some(e);
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Number of lines returned so far.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.state.lock().lines_read
    }

    /// Encoding used to decode lines.
    #[must_use]
    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl LineReader<MultiFileReader> {
    /// Names of the input files started since the last call, in input order.
    ///
    /// A file is started by the read that returns its first byte, so after a
    /// line is read this lists every file that line came from (other than one
    /// already reported) and any empty files skipped on the way.
    pub fn take_started_files(&self) -> Vec<String> {
        self.state.lock().reader.take_started_files()
    }
}

impl<R: BufRead> InputSequencer for LineReader<R> {
    type Item = String;

    fn next_input(&self) -> io::Result<Option<String>> {
        self.read_line()
    }
}

/// Thread-safe batch source; yields up to `batch_size` lines per call.
///
/// The final batch may be shorter. An empty batch is never returned.
pub struct BatchReader<R = MultiFileReader> {
    lines: LineReader<R>,
    batch_size: usize,
}

impl<R: BufRead> BatchReader<R> {
    /// Creates a batch reader. A batch size of zero is treated as one.
    pub fn new(lines: LineReader<R>, batch_size: usize) -> Self {
        Self { lines, batch_size: batch_size.max(1) }
    }

    /// Lines per full batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The underlying line reader.
    #[must_use]
    pub fn lines(&self) -> &LineReader<R> {
        &self.lines
    }
}

impl<R: BufRead> InputSequencer for BatchReader<R> {
    type Item = Vec<String>;

    fn next_input(&self) -> io::Result<Option<Vec<String>>> {
        let batch = self.lines.read_lines(self.batch_size)?;
        Ok(if batch.is_empty() { None } else { Some(batch) })
    }
}
