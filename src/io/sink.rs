//! Durable recording target.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Capture file being written, optionally gzip-compressed.
///
/// Call [`FileSink::finish`] to write the gzip trailer and flush; dropping the
/// sink finishes it on a best-effort basis.
pub enum FileSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl FileSink {
    /// Create (truncating) a capture file.
    pub fn create(path: impl AsRef<Path>, compressed: bool) -> io::Result<Self> {
        let writer = BufWriter::new(File::create(path)?);
        if compressed {
            Ok(FileSink::Gzip(GzEncoder::new(writer, Compression::default())))
        } else {
            Ok(FileSink::Plain(writer))
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, FileSink::Gzip(_))
    }

    /// Flush all buffered data and close the file.
    pub fn finish(self) -> io::Result<()> {
        match self {
            FileSink::Plain(mut writer) => writer.flush(),
            FileSink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileSink::Plain(writer) => writer.write(buf),
            FileSink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileSink::Plain(writer) => writer.flush(),
            FileSink::Gzip(encoder) => encoder.flush(),
        }
    }
}
