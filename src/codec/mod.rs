//! Line protocol for capture files.
//!
//! # Line Format
//!
//! Every event is one whitespace-delimited, `\n`-terminated line:
//!
//! ```text
//! <elapsed_secs> <device|name> <OPCODE> <fields...>
//! ```
//!
//! | Opcode | Fields |
//! |--------|--------|
//! | `CONFIG` | configuration text (newlines written as spaces) |
//! | `LH_POSE` | pos×3 quat×4 (device column holds the beacon id) |
//! | `VELOCITY` / `EXTERNAL_VELOCITY` | linear×3 axis-angle×3 |
//! | `POSE` / `EXTERNAL_POSE` | pos×3 quat×4 |
//! | `LOG` | message (device column is `INFO`) |
//! | `Y` | channel timecode ootx gen |
//! | `W` | channel sensor timecode flag |
//! | `B` | channel sensor timecode plane angle |
//! | `A` | sensor acode timecode length angle beacon |
//! | `C` | sensor timestamp length |
//! | `L` / `R` | axis(`X`/`Y`) sensor acode time_in_sweep timecode length beacon |
//! | `S` | sensor acode time_in_sweep timecode length beacon |
//! | `I` / `i` | mask timecode value×9 id |
//!
//! Continuous values are written with 6 decimal places. `V` is a superseded
//! opcode still present in old captures; it decodes to [`DecodeError::Ignored`].

mod decode;
mod encode;

pub use decode::{decode, decode_record, parse_header, parse_timestamp, Header, Record};
pub use encode::encode;

/// Error type for line decoding.
///
/// All variants are per-line: the caller logs and skips the line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Line has no tokens
    #[error("empty line")]
    Empty,

    /// Line has a subject but no opcode
    #[error("missing opcode after '{0}'")]
    MissingOpcode(String),

    /// Opcode is not part of the protocol
    #[error("unrecognized opcode '{0}'")]
    Unrecognized(String),

    /// Opcode is known but intentionally not decoded
    #[error("opcode '{0}' is ignored")]
    Ignored(String),

    /// Leading elapsed-time token is not a number
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// Fewer fields than the opcode requires
    #[error("'{opcode}' expects {expected} fields, got {found}")]
    MissingFields {
        opcode: String,
        expected: usize,
        found: usize,
    },

    /// Field present but not parseable
    #[error("invalid {field} '{value}' in '{opcode}' line")]
    InvalidField {
        opcode: String,
        field: &'static str,
        value: String,
    },
}
