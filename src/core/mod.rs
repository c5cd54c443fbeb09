//! Core abstractions shared by recording and playback.
//!
//! - [`types`]: Poses, velocities and the per-sensor sample payloads
//! - [`event`]: The [`Event`] union that maps one-to-one onto log lines
//! - [`consumer`]: [`EventConsumer`], the interface a tracking pipeline implements

pub mod consumer;
pub mod event;
pub mod types;

pub use consumer::{DeviceHandle, EventConsumer, NullConsumer};
pub use event::{Category, Event};
pub use types::{
    AngleSample, AxisLabel, BeaconLabel, ImuSample, LightCode, Lightcap, Pose, SweepAngle,
    SweepHit, SyncPulse, Velocity,
};
