//! Buffered, memory-mapped and compressed readers for exon tables.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "bz2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
#[cfg(feature = "mmap")]
use memchr::memchr;
use memchr::memchr_iter;
#[cfg(feature = "mmap")]
use memmap2::MmapOptions;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "mmap")]
use std::sync::Arc;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::record::{ExonRecord, ExonSet, MIN_FIELDS};

/// Result alias for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// An error that can occur when reading an exon table.
#[derive(Debug)]
pub enum ReaderError {
    /// An I/O error.
    Io(io::Error),
    /// An error that occurred when memory-mapping a file.
    #[cfg(feature = "mmap")]
    Mmap(io::Error),
    /// An error that occurred when decoding a line.
    InvalidEncoding {
        /// The line number where the error occurred.
        line: usize,
        /// The error message.
        message: String,
    },
    /// An error that occurred when parsing a field.
    InvalidField {
        /// The line number where the error occurred.
        line: usize,
        /// The name of the field that could not be parsed.
        field: &'static str,
        /// The error message.
        message: String,
    },
    /// An error that occurred when a record has an unexpected number of fields.
    UnexpectedFieldCount {
        /// The line number where the error occurred.
        line: usize,
        /// The expected number of fields.
        expected: usize,
        /// The actual number of fields.
        actual: usize,
    },
    /// An error that occurred when building a reader.
    Builder(String),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Io(err) => write!(f, "I/O error: {err}"),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => write!(f, "mmap error: {err}"),
            ReaderError::InvalidEncoding { line, message } => {
                write!(f, "invalid UTF-8 at line {line}: {message}")
            }
            ReaderError::InvalidField {
                line,
                field,
                message,
            } => write!(f, "invalid {field} at line {line}: {message}"),
            ReaderError::UnexpectedFieldCount {
                line,
                expected,
                actual,
            } => write!(f, "line {line} had {actual} fields, expected {expected}"),
            ReaderError::Builder(msg) => write!(f, "builder error: {msg}"),
        }
    }
}

impl std::error::Error for ReaderError {
    /// Returns the source error, if any.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Io(err) => Some(err),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    /// Creates a new `ReaderError` from an `io::Error`.
    fn from(err: io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl ReaderError {
    /// Creates a new `ReaderError` for an invalid field.
    pub(crate) fn invalid_field(line: usize, field: &'static str, message: String) -> ReaderError {
        ReaderError::InvalidField {
            line,
            field,
            message,
        }
    }

    /// Creates a new `ReaderError` for an unexpected field count.
    pub(crate) fn unexpected_field_count(
        line: usize,
        expected: usize,
        actual: usize,
    ) -> ReaderError {
        ReaderError::UnexpectedFieldCount {
            line,
            expected,
            actual,
        }
    }

    /// Creates a new `ReaderError` for an invalid encoding.
    #[cfg_attr(not(feature = "mmap"), allow(dead_code))]
    fn invalid_encoding(line: usize, message: impl Into<String>) -> ReaderError {
        ReaderError::InvalidEncoding {
            line,
            message: message.into(),
        }
    }
}

/// The mode to use when reading an exon table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMode {
    /// Read the file line by line. This is the default.
    Default,
    /// Memory-map the file. Requires the `mmap` feature.
    Mmap,
}

/// The compression format of the input file.
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Detect the compression format from the file extension.
    #[default]
    Auto,
    /// No compression.
    None,
    /// Gzip compression.
    Gzip,
    /// Zstandard compression.
    Zstd,
    /// Bzip2 compression.
    Bzip2,
}

/// Detect compression from file extension
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
fn detect_compression_from_extension(path: &Path) -> Compression {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        "gz" => Compression::Gzip,
        "zst" | "zstd" => Compression::Zstd,
        "bz2" | "bzip2" => Compression::Bzip2,
        _ => Compression::None,
    }
}

/// A builder for creating a [`Reader`].
///
/// # Example
///
/// ```rust,no_run
/// use exonwalk::{Reader, ReaderMode};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let exons = Reader::builder()
///         .from_path("exons.bed")
///         .mode(ReaderMode::Default)
///         .buffer_capacity(128 * 1024)
///         .build()?
///         .read_exons()?;
///
///     println!("{} exons", exons.len());
///     Ok(())
/// }
/// ```
pub struct ReaderBuilder {
    source: Option<ReaderSource>,
    mode: ReaderMode,
    buffer_capacity: usize,
    min_fields: usize,
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    compression: Compression,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            source: None,
            mode: ReaderMode::Default,
            buffer_capacity: 64 * 1024,
            min_fields: MIN_FIELDS,
            #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
            compression: Compression::default(),
        }
    }
}

impl ReaderBuilder {
    /// Reads from a filesystem path.
    pub fn from_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(ReaderSource::Path(path.as_ref().into()));
        self
    }

    /// Reads from any `Read` implementation.
    pub fn from_reader<T>(mut self, reader: T) -> Self
    where
        T: Read + Send + 'static,
    {
        self.source = Some(ReaderSource::Reader(Box::new(reader)));
        self
    }

    /// Sets the reading mode.
    pub fn mode(mut self, mode: ReaderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the buffer capacity for the reader.
    ///
    /// The default is 64 KB.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(8 * 1024);
        self
    }

    /// Lines with fewer fields than this are dropped silently.
    ///
    /// Values below [`MIN_FIELDS`] are raised to it; an exon record cannot be
    /// built from fewer fields.
    pub fn min_fields(mut self, count: usize) -> Self {
        self.min_fields = count.max(MIN_FIELDS);
        self
    }

    /// Sets the compression format of the input.
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Builds the `Reader`.
    pub fn build(mut self) -> ReaderResult<Reader> {
        let source = self
            .source
            .take()
            .ok_or_else(|| ReaderError::Builder("ERROR: no input source configured".into()))?;

        match source {
            ReaderSource::Path(path) => match self.mode {
                ReaderMode::Default => {
                    let reader = self.open_path_stream(&path)?;
                    Ok(Reader::from_stream(
                        reader,
                        self.buffer_capacity,
                        self.min_fields,
                    ))
                }
                ReaderMode::Mmap => {
                    #[cfg(feature = "mmap")]
                    {
                        self.build_mmap(&path)
                    }
                    #[cfg(not(feature = "mmap"))]
                    {
                        Err(ReaderError::Builder(
                            "ERROR: enable the `mmap` feature to use mmap mode".into(),
                        ))
                    }
                }
            },
            ReaderSource::Reader(reader) => match self.mode {
                ReaderMode::Default => Ok(Reader::from_stream(
                    reader,
                    self.buffer_capacity,
                    self.min_fields,
                )),
                ReaderMode::Mmap => Err(ReaderError::Builder(
                    "ERROR: mmap mode requires a filesystem path".into(),
                )),
            },
        }
    }

    /// Opens a path as a stream.
    fn open_path_stream(&self, path: &Path) -> ReaderResult<Box<dyn Read + Send>> {
        #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
        {
            let file = File::open(path)?;
            let compression = match self.compression {
                Compression::Auto => detect_compression_from_extension(path),
                other => other,
            };

            return match compression {
                Compression::None | Compression::Auto => Ok(Box::new(file)),
                Compression::Gzip => {
                    #[cfg(feature = "gzip")]
                    {
                        Ok(Box::new(MultiGzDecoder::new(file)))
                    }
                    #[cfg(not(feature = "gzip"))]
                    {
                        Err(ReaderError::Builder(
                            "gzip compression requested but the `gzip` feature is disabled".into(),
                        ))
                    }
                }
                Compression::Zstd => {
                    #[cfg(feature = "zstd")]
                    {
                        Ok(Box::new(ZstdDecoder::new(file)?))
                    }
                    #[cfg(not(feature = "zstd"))]
                    {
                        Err(ReaderError::Builder(
                            "zstd compression requested but the `zstd` feature is disabled".into(),
                        ))
                    }
                }
                Compression::Bzip2 => {
                    #[cfg(feature = "bz2")]
                    {
                        Ok(Box::new(BzDecoder::new(file)))
                    }
                    #[cfg(not(feature = "bz2"))]
                    {
                        Err(ReaderError::Builder(
                            "bzip2 compression requested but the `bz2` feature is disabled".into(),
                        ))
                    }
                }
            };
        }

        #[cfg(not(any(feature = "gzip", feature = "zstd", feature = "bz2")))]
        {
            if path.extension().is_some_and(|ext| {
                matches!(ext.to_str(), Some("gz" | "zst" | "zstd" | "bz2" | "bzip2"))
            }) {
                return Err(ReaderError::Builder(
                    "ERROR: enable compression features to read compressed inputs".into(),
                ));
            }
            Ok(Box::new(File::open(path)?))
        }
    }

    /// Builds a `Reader` over a memory-mapped file.
    #[cfg(feature = "mmap")]
    fn build_mmap(&self, path: &Path) -> ReaderResult<Reader> {
        if path.extension().is_some_and(|ext| {
            matches!(ext.to_str(), Some("gz" | "zst" | "zstd" | "bz2" | "bzip2"))
        }) {
            return Err(ReaderError::Builder(
                "ERROR: compression is only supported in buffered mode".into(),
            ));
        }

        let map = unsafe { MmapOptions::new().map(&File::open(path)?) }.map_err(ReaderError::Mmap)?;

        Ok(Reader {
            inner: InnerSource::Mmap(MmapInner {
                data: map.into(),
                cursor: 0,
            }),
            buffer: String::with_capacity(1024),
            line_number: 0,
            min_fields: self.min_fields,
            skipped: 0,
        })
    }
}

/// Reader source
enum ReaderSource {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Inner reader source
enum InnerSource {
    Buffered(BufReader<Box<dyn Read + Send>>),
    #[cfg(feature = "mmap")]
    Mmap(MmapInner),
}

/// Inner mmap reader source
#[cfg(feature = "mmap")]
struct MmapInner {
    data: Arc<memmap2::Mmap>,
    cursor: usize,
}

/// A reader for tab-separated exon tables.
///
/// Blank lines, `#` comments and `track` / `browser` headers are ignored.
/// Lines with fewer fields than the configured minimum are dropped without an
/// error; every other line yields one [`ExonRecord`] or a parse error.
///
/// # Example
///
/// ```
/// use exonwalk::Reader;
///
/// let data = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/2]\t*\nshort\tline\n";
/// let mut reader = Reader::from_reader(std::io::Cursor::new(data)).unwrap();
/// let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(reader.skipped(), 1);
/// ```
pub struct Reader {
    inner: InnerSource,
    buffer: String,
    line_number: usize,
    min_fields: usize,
    skipped: usize,
}

impl Reader {
    /// Creates a new `ReaderBuilder` to configure a `Reader`.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Creates a new `Reader` from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder().from_path(path).build()
    }

    /// Creates a new `Reader` from a `Read` implementation.
    pub fn from_reader<T>(reader: T) -> ReaderResult<Self>
    where
        T: Read + Send + 'static,
    {
        Self::builder().from_reader(reader).build()
    }

    /// Creates a new memory-mapped `Reader` from a path.
    #[cfg(feature = "mmap")]
    pub fn from_mmap<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder()
            .from_path(path)
            .mode(ReaderMode::Mmap)
            .build()
    }

    pub(crate) fn from_stream(
        reader: Box<dyn Read + Send>,
        buffer_capacity: usize,
        min_fields: usize,
    ) -> Self {
        Self {
            inner: InnerSource::Buffered(BufReader::with_capacity(buffer_capacity, reader)),
            buffer: String::with_capacity(1024),
            line_number: 0,
            min_fields,
            skipped: 0,
        }
    }

    /// Returns the number of the last line read.
    pub fn current_line(&self) -> usize {
        self.line_number
    }

    /// Returns how many lines were dropped for having too few fields.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns an iterator over the remaining records.
    pub fn records(&mut self) -> Records<'_> {
        Records { reader: self }
    }

    /// Reads every remaining record into an [`ExonSet`].
    ///
    /// The first parse error aborts the read.
    pub fn read_exons(mut self) -> ReaderResult<ExonSet> {
        let records = self.records().collect::<ReaderResult<Vec<_>>>()?;
        if self.skipped > 0 {
            log::debug!(
                "skipped {} lines with fewer than {} fields",
                self.skipped,
                self.min_fields
            );
        }
        Ok(ExonSet::new(records))
    }

    /// Parses the remaining lines in parallel, keeping file order.
    #[cfg(feature = "rayon")]
    pub fn par_read_exons(mut self) -> ReaderResult<ExonSet> {
        let mut lines = Vec::new();
        while self.fill_buffer()? {
            self.line_number += 1;
            if should_skip(&self.buffer) {
                continue;
            }
            lines.push((self.line_number, std::mem::take(&mut self.buffer)));
        }

        let min_fields = self.min_fields;
        let parsed = lines
            .par_iter()
            .map(|(line_no, line)| parse_line(line, min_fields, *line_no))
            .collect::<ReaderResult<Vec<_>>>()?;

        Ok(parsed.into_iter().flatten().collect())
    }

    fn next_record(&mut self) -> Option<ReaderResult<ExonRecord>> {
        loop {
            match self.fill_buffer() {
                Ok(true) => {
                    self.line_number += 1;
                    if should_skip(&self.buffer) {
                        continue;
                    }

                    match parse_line(&self.buffer, self.min_fields, self.line_number) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => {
                            self.skipped += 1;
                            continue;
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                Ok(false) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn fill_buffer(&mut self) -> ReaderResult<bool> {
        match &mut self.inner {
            InnerSource::Buffered(reader) => {
                self.buffer.clear();
                let bytes = reader.read_line(&mut self.buffer)?;
                if bytes == 0 {
                    return Ok(false);
                }
                trim_line(&mut self.buffer);
                Ok(true)
            }
            #[cfg(feature = "mmap")]
            InnerSource::Mmap(inner) => {
                if inner.cursor >= inner.data.len() {
                    return Ok(false);
                }

                let data = &inner.data[inner.cursor..];
                let (line_bytes, advance) = match memchr(b'\n', data) {
                    Some(idx) => (&data[..idx], idx + 1),
                    None => (data, data.len()),
                };

                inner.cursor += advance;
                let line = std::str::from_utf8(line_bytes).map_err(|err| {
                    ReaderError::invalid_encoding(self.line_number + 1, err.to_string())
                })?;

                self.buffer.clear();
                self.buffer.push_str(line.trim_end_matches('\r'));

                Ok(true)
            }
        }
    }
}

impl Iterator for Reader {
    type Item = ReaderResult<ExonRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// An iterator over the records of a [`Reader`].
pub struct Records<'a> {
    reader: &'a mut Reader,
}

impl<'a> Iterator for Records<'a> {
    type Item = ReaderResult<ExonRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record()
    }
}

/// Parses one line, returning `Ok(None)` for lines with too few fields.
fn parse_line(
    line: &str,
    min_fields: usize,
    line_number: usize,
) -> ReaderResult<Option<ExonRecord>> {
    let fields = split_fields(line);
    if fields.len() < min_fields {
        return Ok(None);
    }

    ExonRecord::from_fields(&fields, line_number).map(Some)
}

/// Splits a line on tabs, keeping empty fields.
fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(18);
    let mut field_start = 0usize;

    for idx in memchr_iter(b'\t', bytes) {
        fields.push(&line[field_start..idx]);
        field_start = idx + 1;
    }
    fields.push(&line[field_start..]);

    fields
}

/// Trim the line terminator.
fn trim_line(line: &mut String) {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
}

/// Returns `true` if the line should be skipped.
fn should_skip(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track ")
        || trimmed.starts_with("browser ")
}
