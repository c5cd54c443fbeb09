//! Capture inspection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::codec::{decode, parse_header, DecodeError};
use crate::io::{DelimitedReader, LogSource, ReadError};

/// Statistics about a capture, gathered in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    /// Lines read, including malformed ones
    pub lines: u64,
    /// First recorded time
    pub start_secs: Option<f64>,
    /// Last recorded time
    pub end_secs: Option<f64>,
    /// Lines per opcode (the `INFO LOG` opcode counts as `LOG`)
    pub opcodes: BTreeMap<String, u64>,
    /// Devices declared by `CONFIG` lines, in order of first appearance
    pub devices: Vec<String>,
    /// Lines whose header or fields did not parse
    pub decode_failures: u64,
    /// Recorded time going backwards between consecutive lines
    pub out_of_order: u64,
}

impl LogSummary {
    /// Read `source` to the end and summarize it.
    ///
    /// Malformed lines are counted, not fatal; only a stream error aborts.
    pub fn scan<S: LogSource + ?Sized>(source: &mut S) -> Result<Self, ReadError> {
        let mut summary = Self::default();
        let mut reader = DelimitedReader::new();

        loop {
            let bytes = match reader.read_line(source) {
                Ok(bytes) => bytes,
                Err(ReadError::EndOfStream) => break,
                Err(e) => return Err(e),
            };
            let line = String::from_utf8_lossy(bytes);
            if line.trim().is_empty() {
                continue;
            }
            summary.lines += 1;

            let header = match parse_header(&line) {
                Ok(header) => header,
                Err(e) => {
                    log::debug!("Line {}: {}", summary.lines, e);
                    summary.decode_failures += 1;
                    continue;
                }
            };

            if summary.end_secs.is_some_and(|end| header.elapsed_secs < end) {
                summary.out_of_order += 1;
            }
            summary.start_secs.get_or_insert(header.elapsed_secs);
            summary.end_secs = Some(header.elapsed_secs);
            *summary.opcodes.entry(header.opcode.to_string()).or_default() += 1;

            if header.opcode == "CONFIG" && !summary.devices.iter().any(|d| d == header.device) {
                summary.devices.push(header.device.to_string());
            }

            match decode(header.body) {
                Ok(_) | Err(DecodeError::Ignored(_)) => {}
                Err(e) => {
                    log::debug!("Line {}: {}", summary.lines, e);
                    summary.decode_failures += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Recorded span in seconds.
    pub fn duration_secs(&self) -> f64 {
        match (self.start_secs, self.end_secs) {
            (Some(start), Some(end)) => (end - start).max(0.0),
            _ => 0.0,
        }
    }
}
