//! Smriti - event recording and playback for motion-tracking pipelines
//!
//! Captures the live event stream of a tracking pipeline (device
//! configuration, optical pulses, IMU samples, solved poses) into a
//! timestamped text log, and replays that log into the same consumer
//! interface that live hardware drives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐          ┌───────────────────────────────┐
//! │ recording::Recorder  │          │ playback::PlaybackScheduler   │
//! │  (mask + fan-out)    │          │  (pre-scan + paced poll)      │
//! └──────────┬───────────┘          └───────────────┬───────────────┘
//!            │ encode                        decode │
//!            ▼                                      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      codec (line protocol)                      │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                      ▲
//!            ▼                                      │
//! ┌──────────────────────┐          ┌───────────────────────────────┐
//! │ io::FileSink         │          │ io::DelimitedReader           │
//! │ (plain or gzip)      │          │ over io::LogSource            │
//! └──────────────────────┘          └───────────────────────────────┘
//! ```
//!
//! # Example: Recording
//!
//! ```no_run
//! use smriti::config::RecordConfig;
//! use smriti::core::{Event, Pose};
//! use smriti::recording::Recorder;
//!
//! let config = RecordConfig {
//!     path: Some("capture.rec.gz".into()),
//!     ..RecordConfig::default()
//! };
//! let mut recorder = Recorder::install(&config);
//! recorder.on_event(&Event::Pose {
//!     device: "HMD".to_string(),
//!     pose: Pose::identity(),
//! });
//! recorder.close()?;
//! # Ok::<(), smriti::Error>(())
//! ```
//!
//! # Example: Playback
//!
//! ```no_run
//! use smriti::config::PlaybackConfig;
//! use smriti::core::NullConsumer;
//! use smriti::playback::PlaybackScheduler;
//!
//! let config = PlaybackConfig {
//!     path: Some("capture.rec.gz".into()),
//!     factor: 0.0,
//!     replay_pose: false,
//! };
//! let mut consumer = NullConsumer;
//! let mut scheduler = PlaybackScheduler::open(&config)?;
//! scheduler.prescan(&mut consumer);
//! while !scheduler.is_finished() {
//!     scheduler.poll(&mut consumer);
//! }
//! # Ok::<(), smriti::Error>(())
//! ```

pub mod clock;
pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod playback;
pub mod recording;
pub mod summary;

#[cfg(test)]
mod test_fixtures;

pub use clock::{Clock, ManualClock, ProcessClock};
pub use codec::{decode, decode_record, encode, DecodeError, Record};
pub use config::{PlaybackConfig, RecordConfig, SmritiConfig};
pub use self::core::{DeviceHandle, Event, EventConsumer};
pub use error::{Error, Result};
pub use playback::{PlaybackScheduler, PlaybackState, PlaybackStats, PollOutcome};
pub use recording::{CategoryMask, Recorder, RecordingStats};
pub use summary::LogSummary;
