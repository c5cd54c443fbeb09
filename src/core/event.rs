//! Tracking events, one per log line.

use super::types::{
    AngleSample, ImuSample, LightCode, Lightcap, Pose, SweepAngle, SweepHit, SyncPulse, Velocity,
};

/// High-rate event categories that recording can switch off individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Raw lightcap pulses (`C`)
    RawLight,
    /// Uncalibrated IMU samples (`i`)
    ImuRaw,
    /// Calibrated IMU samples (`I`)
    ImuCal,
    /// Angle and light-code observations (`A`, `L`, `R`, `S`)
    Angle,
}

/// Event produced by a tracked device or the pose solver.
///
/// Each variant encodes to exactly one log line. `device` names refer to
/// devices declared by a [`Event::Config`] line; `name` fields on external
/// poses are free-form and need no declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Opaque configuration blob for a device
    Config { device: String, text: String },
    /// Solved pose of a beacon
    LighthousePose { beacon_id: u8, pose: Pose },
    /// Solved device velocity
    Velocity { device: String, velocity: Velocity },
    /// Solved device pose
    Pose { device: String, pose: Pose },
    /// Pose supplied from outside the tracker
    ExternalPose { name: String, pose: Pose },
    /// Velocity supplied from outside the tracker
    ExternalVelocity { name: String, velocity: Velocity },
    /// Free-text diagnostic
    Info { message: String },
    Sync { device: String, sync: SyncPulse },
    Sweep { device: String, sweep: SweepHit },
    SweepAngle { device: String, sweep: SweepAngle },
    Angle { device: String, angle: AngleSample },
    LightCapRaw { device: String, lightcap: Lightcap },
    LightCode { device: String, light: LightCode },
    Imu {
        device: String,
        calibrated: bool,
        imu: ImuSample,
    },
}

impl Event {
    /// Opcode token written for this event.
    pub fn opcode(&self) -> &'static str {
        match self {
            Event::Config { .. } => "CONFIG",
            Event::LighthousePose { .. } => "LH_POSE",
            Event::Velocity { .. } => "VELOCITY",
            Event::Pose { .. } => "POSE",
            Event::ExternalPose { .. } => "EXTERNAL_POSE",
            Event::ExternalVelocity { .. } => "EXTERNAL_VELOCITY",
            Event::Info { .. } => "LOG",
            Event::Sync { .. } => "Y",
            Event::Sweep { .. } => "W",
            Event::SweepAngle { .. } => "B",
            Event::Angle { .. } => "A",
            Event::LightCapRaw { .. } => "C",
            Event::LightCode { light, .. } => match light.labels() {
                Some((beacon, _)) => beacon.as_str(),
                None if light.is_sync() => "S",
                None => "",
            },
            Event::Imu {
                calibrated: true, ..
            } => "I",
            Event::Imu {
                calibrated: false, ..
            } => "i",
        }
    }

    /// Device declared by a `CONFIG` line that this event belongs to.
    ///
    /// `None` for events keyed by beacon or free-form name.
    pub fn device(&self) -> Option<&str> {
        match self {
            Event::Config { device, .. }
            | Event::Velocity { device, .. }
            | Event::Pose { device, .. }
            | Event::Sync { device, .. }
            | Event::Sweep { device, .. }
            | Event::SweepAngle { device, .. }
            | Event::Angle { device, .. }
            | Event::LightCapRaw { device, .. }
            | Event::LightCode { device, .. }
            | Event::Imu { device, .. } => Some(device),
            Event::LighthousePose { .. }
            | Event::ExternalPose { .. }
            | Event::ExternalVelocity { .. }
            | Event::Info { .. } => None,
        }
    }

    /// Recording category gating this event, if any.
    ///
    /// Events without a category are always recorded.
    pub fn category(&self) -> Option<Category> {
        match self {
            Event::LightCapRaw { .. } => Some(Category::RawLight),
            Event::Imu {
                calibrated: false, ..
            } => Some(Category::ImuRaw),
            Event::Imu {
                calibrated: true, ..
            } => Some(Category::ImuCal),
            Event::Angle { .. } | Event::LightCode { .. } => Some(Category::Angle),
            _ => None,
        }
    }
}
