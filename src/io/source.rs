//! Readable capture sources.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Byte stream a capture is replayed from.
pub trait LogSource {
    /// Read a single byte; `Ok(None)` at end of stream.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Reposition at the first byte of the stream.
    fn rewind(&mut self) -> io::Result<()>;
}

fn read_buffered_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok([]) => return Ok(None),
            Ok(buf) => {
                let byte = buf[0];
                reader.consume(1);
                return Ok(Some(byte));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

enum Inner {
    Plain(BufReader<File>),
    Gzip(BufReader<MultiGzDecoder<BufReader<File>>>),
}

/// Capture file on disk.
///
/// Compression is detected from the gzip magic bytes, not the file name, so
/// both compressed and plain captures open the same way.
pub struct FileSource {
    path: PathBuf,
    inner: Inner,
}

impl FileSource {
    /// Open a capture for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = Self::open_inner(&path)?;
        Ok(Self { path, inner })
    }

    fn open_inner(path: &Path) -> io::Result<Inner> {
        let mut reader = BufReader::new(File::open(path)?);
        let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

        if is_gzip {
            Ok(Inner::Gzip(BufReader::new(MultiGzDecoder::new(reader))))
        } else {
            Ok(Inner::Plain(reader))
        }
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the capture is gzip-compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(self.inner, Inner::Gzip(_))
    }
}

impl LogSource for FileSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match &mut self.inner {
            Inner::Plain(reader) => read_buffered_byte(reader),
            Inner::Gzip(reader) => read_buffered_byte(reader),
        }
    }

    fn rewind(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Plain(reader) => {
                reader.seek(SeekFrom::Start(0))?;
            }
            // Deflate streams cannot seek; start a fresh decoder instead.
            Inner::Gzip(_) => {
                self.inner = Self::open_inner(&self.path)?;
            }
        }
        Ok(())
    }
}

impl<T: AsRef<[u8]>> LogSource for Cursor<T> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        read_buffered_byte(self)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }
}
