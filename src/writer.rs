//! Tab-separated output of groups, relations and walk reports.

use std::fmt;
use std::io::{self, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

#[cfg(feature = "compression")]
use flate2::write::GzEncoder;
#[cfg(feature = "compression")]
use flate2::Compression as GzCompression;

use crate::group::Group;
use crate::relation::Relation;
use crate::walk::ExonReport;

/// Result alias for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;

/// Errors that can occur while writing records.
#[derive(Debug)]
pub enum WriterError {
    /// An I/O error occurred while writing.
    Io(io::Error),
    /// The requested operation cannot be performed with the current feature set.
    Unsupported(String),
}

impl fmt::Display for WriterError {
    /// Formats the writer error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Io(err) => write!(f, "write error: {err}"),
            WriterError::Unsupported(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for WriterError {
    /// Returns the source error, if any.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WriterError {
    /// Creates a new `WriterError` from an `io::Error`.
    fn from(err: io::Error) -> Self {
        WriterError::Io(err)
    }
}

/// Writes result rows as tab-separated lines without a header.
///
/// # Example
///
/// ```
/// use exonwalk::relation::Relation;
/// use exonwalk::Writer;
///
/// let rels = vec![Relation::new("b", "a")];
/// let mut buf = Vec::new();
/// Writer::<Relation>::from_records(&rels, &mut buf).unwrap();
/// assert_eq!(buf, b"a\tb\n");
/// ```
pub struct Writer<F> {
    _marker: PhantomData<F>,
}

impl<F> Writer<F>
where
    F: TargetFormat,
{
    /// Writes a single row.
    pub fn from_record<W: Write>(record: &F, writer: &mut W) -> WriterResult<()> {
        record.write_record(writer)
    }

    /// Writes all provided rows.
    pub fn from_records<W: Write>(records: &[F], writer: &mut W) -> WriterResult<()> {
        for record in records {
            record.write_record(writer)?;
        }
        Ok(())
    }

    /// Opens a path and writes all rows, auto-detecting gzip output from
    /// the `.gz` extension when the `compression` feature is enabled.
    pub fn to_path<P: AsRef<Path>>(path: P, records: &[F]) -> WriterResult<()> {
        let mut writer = open_sink(path.as_ref())?;
        Self::from_records(records, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Opens a buffered output file, gzip-compressed for `.gz` paths.
pub fn open_sink(path: &Path) -> WriterResult<BufWriter<Box<dyn Write>>> {
    let file = std::fs::File::create(path)?;

    #[cfg(feature = "compression")]
    let sink: Box<dyn Write> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzEncoder::new(file, GzCompression::fast()))
    } else {
        Box::new(file)
    };

    #[cfg(not(feature = "compression"))]
    let sink: Box<dyn Write> = {
        if path.extension().is_some_and(|ext| ext == "gz") {
            return Err(WriterError::Unsupported(
                "enable the `compression` feature to write gzip outputs".into(),
            ));
        }
        Box::new(file)
    };

    Ok(BufWriter::with_capacity(64 * 1024, sink))
}

/// Trait implemented by every row type the crate emits.
pub trait TargetFormat {
    /// Writes this row, newline included.
    fn write_record<W: Write>(&self, writer: &mut W) -> WriterResult<()>;
}

impl TargetFormat for Group {
    /// One group per line, names in visit order.
    fn write_record<W: Write>(&self, writer: &mut W) -> WriterResult<()> {
        let mut first = true;
        for name in &self.names {
            if !first {
                writer.write_all(b"\t")?;
            }
            writer.write_all(name.as_bytes())?;
            first = false;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl TargetFormat for Relation {
    fn write_record<W: Write>(&self, writer: &mut W) -> WriterResult<()> {
        writer.write_all(self.first.as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(self.second.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl TargetFormat for ExonReport {
    /// `chrom start end strand exonId seedId counter flags`
    fn write_record<W: Write>(&self, writer: &mut W) -> WriterResult<()> {
        writer.write_all(self.chrom.as_bytes())?;
        writer.write_all(b"\t")?;
        write_u64(writer, self.start)?;
        writer.write_all(b"\t")?;
        write_u64(writer, self.end)?;
        writer.write_all(b"\t")?;
        writer.write_all(self.strand.as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(self.exon_id.as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(self.seed_id.as_bytes())?;
        writer.write_all(b"\t")?;
        write_u64(writer, self.counter as u64)?;
        writer.write_all(b"\t")?;
        write_u64(writer, u64::from(self.flags.bits()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Writes a u64 value to the writer as decimal text.
///
/// Digits are written right to left into a stack buffer.
fn write_u64<W: Write>(writer: &mut W, mut value: u64) -> io::Result<()> {
    let mut buf = [0u8; 20];
    let mut idx = buf.len();
    if value == 0 {
        return writer.write_all(b"0");
    }
    while value > 0 {
        idx -= 1;
        buf[idx] = b'0' + (value % 10) as u8;
        value /= 10;
    }
    writer.write_all(&buf[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_u64_renders_decimal() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 0).unwrap();
        buf.push(b' ');
        write_u64(&mut buf, 2_800_000).unwrap();
        assert_eq!(buf, b"0 2800000");
    }
}
