//! Capture of live tracking events.
//!
//! The [`Recorder`] sits on the pipeline's event path. With no sink
//! configured it returns immediately; otherwise it timestamps each event,
//! drops the high-rate categories switched off in its [`CategoryMask`], and
//! writes the encoded line to the capture file and/or the echo stream.

mod recorder;

pub use recorder::{CategoryMask, Recorder, RecordingSinks, RecordingStats};
