//! Delimiter-terminated record reader.

use std::io;

use super::source::LogSource;

/// Initial buffer capacity in bytes.
pub const MIN_CAPACITY: usize = 128;

/// Amount the buffer grows by when a record does not fit.
pub const GROW_BY: usize = 128;

/// Longest record representable on this platform.
const MAX_RECORD_LEN: usize = isize::MAX as usize;

/// Error type for record reads.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Stream ended before any byte of a new record was read
    #[error("end of stream")]
    EndOfStream,

    /// Underlying stream failed
    #[error("stream read failed: {0}")]
    Stream(#[from] io::Error),

    /// Record would exceed the largest representable length
    #[error("record length overflow")]
    Overflow,
}

/// Reads one delimiter-terminated record at a time.
///
/// The buffer is owned by the reader and reused across calls, so records of
/// similar length do not reallocate. It grows in fixed [`GROW_BY`] steps and
/// never shrinks.
#[derive(Debug)]
pub struct DelimitedReader {
    buf: Vec<u8>,
}

impl DelimitedReader {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MIN_CAPACITY),
        }
    }

    /// Current buffer capacity.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Read bytes up to and including `delimiter`.
    ///
    /// A final record without a delimiter is returned as-is. Fails with
    /// [`ReadError::EndOfStream`] only when no byte was read at all.
    pub fn read_until<S>(&mut self, source: &mut S, delimiter: u8) -> Result<&[u8], ReadError>
    where
        S: LogSource + ?Sized,
    {
        self.buf.clear();

        while let Some(byte) = source.read_byte()? {
            if self.buf.len() >= MAX_RECORD_LEN {
                return Err(ReadError::Overflow);
            }
            if self.buf.len() == self.buf.capacity() {
                self.buf.reserve_exact(GROW_BY);
            }
            self.buf.push(byte);
            if byte == delimiter {
                break;
            }
        }

        if self.buf.is_empty() {
            return Err(ReadError::EndOfStream);
        }
        Ok(&self.buf)
    }

    /// Read one `\n`-terminated line.
    pub fn read_line<S>(&mut self, source: &mut S) -> Result<&[u8], ReadError>
    where
        S: LogSource + ?Sized,
    {
        self.read_until(source, b'\n')
    }
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingSource {
        remaining: Vec<u8>,
    }

    impl LogSource for FailingSource {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            if self.remaining.is_empty() {
                Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream"))
            } else {
                Ok(Some(self.remaining.remove(0)))
            }
        }

        fn rewind(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_lines_including_delimiter() {
        let mut source = Cursor::new(b"first\nsecond\n".to_vec());
        let mut reader = DelimitedReader::new();

        assert_eq!(reader.read_line(&mut source).unwrap(), b"first\n");
        assert_eq!(reader.read_line(&mut source).unwrap(), b"second\n");
        assert!(matches!(
            reader.read_line(&mut source),
            Err(ReadError::EndOfStream)
        ));
    }

    #[test]
    fn test_last_record_without_delimiter() {
        let mut source = Cursor::new(b"a\ntail".to_vec());
        let mut reader = DelimitedReader::new();

        assert_eq!(reader.read_line(&mut source).unwrap(), b"a\n");
        assert_eq!(reader.read_line(&mut source).unwrap(), b"tail");
        assert!(matches!(
            reader.read_line(&mut source),
            Err(ReadError::EndOfStream)
        ));
    }

    #[test]
    fn test_custom_delimiter_then_rest_of_line() {
        let mut source = Cursor::new(b"0.500000 HMD W 1 2 3 0\n".to_vec());
        let mut reader = DelimitedReader::new();

        assert_eq!(reader.read_until(&mut source, b' ').unwrap(), b"0.500000 ");
        assert_eq!(reader.read_line(&mut source).unwrap(), b"HMD W 1 2 3 0\n");
    }

    #[test]
    fn test_grows_in_fixed_steps_without_losing_bytes() {
        let long: Vec<u8> = (0..300).map(|i| b'a' + (i % 26) as u8).collect();
        let mut data = long.clone();
        data.push(b'\n');
        let mut source = Cursor::new(data);
        let mut reader = DelimitedReader::new();
        assert!(reader.capacity() >= MIN_CAPACITY);

        let line = reader.read_line(&mut source).unwrap().to_vec();
        assert_eq!(&line[..300], &long[..]);
        assert_eq!(line[300], b'\n');

        // Linear growth from 128 stays well below what doubling would reach
        assert!(reader.capacity() >= 301);
        assert!(reader.capacity() < 512);
    }

    #[test]
    fn test_buffer_reused_between_records() {
        let mut source = Cursor::new(b"abcdefgh\nabcdefgh\n".to_vec());
        let mut reader = DelimitedReader::new();

        reader.read_line(&mut source).unwrap();
        let capacity = reader.capacity();
        reader.read_line(&mut source).unwrap();
        assert_eq!(reader.capacity(), capacity);
    }

    #[test]
    fn test_stream_error() {
        let mut source = FailingSource {
            remaining: b"partial".to_vec(),
        };
        let mut reader = DelimitedReader::new();

        assert!(matches!(
            reader.read_line(&mut source),
            Err(ReadError::Stream(_))
        ));
    }
}
