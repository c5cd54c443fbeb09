//! Byte-level I/O for capture files.
//!
//! - [`source`]: [`LogSource`], the read-byte/rewind capability playback needs,
//!   with a file implementation that inflates gzip transparently
//! - [`sink`]: [`FileSink`], the durable recording target (plain or gzip)
//! - [`line_reader`]: [`DelimitedReader`], growable-buffer record reader

mod line_reader;
mod sink;
mod source;

pub use line_reader::{DelimitedReader, ReadError, GROW_BY, MIN_CAPACITY};
pub use sink::FileSink;
pub use source::{FileSource, LogSource, GZIP_MAGIC};
