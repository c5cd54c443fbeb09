//! Replay of captured logs.
//!
//! [`PlaybackScheduler`] reads a capture (plain or gzip) and feeds it to an
//! [`EventConsumer`](crate::core::EventConsumer) at the recorded pace,
//! scaled by a rate factor. Devices are created through a
//! [`DeviceRegistry`] from the `CONFIG` lines found by the pre-scan.

mod registry;
mod scheduler;

pub use registry::{DeviceRegistry, REPLAY_DRIVER};
pub use scheduler::{
    PlaybackScheduler, PlaybackState, PlaybackStats, PollOutcome, PRESCAN_HORIZON_SECS,
    REPLAY_POSE_PREFIX,
};
