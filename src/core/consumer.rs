//! EventConsumer trait definition

use super::types::{
    AngleSample, ImuSample, LightCode, Lightcap, Pose, SweepAngle, SweepHit, SyncPulse, Velocity,
};
use crate::error::Result;

/// Handle to a device known to the tracking pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    /// Registry-assigned id, unique per playback session
    pub id: u32,
    /// Device codename as written in the log
    pub name: String,
    /// Identity of the driver that owns the device
    pub driver: &'static str,
}

impl DeviceHandle {
    pub fn new(id: u32, name: impl Into<String>, driver: &'static str) -> Self {
        Self {
            id,
            name: name.into(),
            driver,
        }
    }
}

/// Event consumer implemented by the tracking pipeline.
///
/// Live hardware drivers and playback call the same methods, so a pipeline
/// cannot tell a replayed capture from a live device. Every callback has a
/// no-op default; implement the ones the pipeline cares about.
pub trait EventConsumer {
    /// Hand a device's configuration blob to the pipeline.
    ///
    /// Returning an error rejects the device; playback will not register it.
    fn ingest_config(&mut self, _device: &DeviceHandle, _config: &str) -> Result<()> {
        Ok(())
    }

    /// Announce a device whose configuration was accepted.
    fn add_device(&mut self, _device: &DeviceHandle) {}

    fn on_lighthouse_pose(&mut self, _beacon_id: u8, _pose: &Pose) {}

    fn on_velocity(&mut self, _device: &DeviceHandle, _velocity: &Velocity) {}

    fn on_pose(&mut self, _device: &DeviceHandle, _pose: &Pose) {}

    fn on_external_pose(&mut self, _name: &str, _pose: &Pose) {}

    fn on_external_velocity(&mut self, _name: &str, _velocity: &Velocity) {}

    fn on_info(&mut self, _message: &str) {}

    fn on_sync(&mut self, _device: &DeviceHandle, _sync: &SyncPulse) {}

    fn on_sweep(&mut self, _device: &DeviceHandle, _sweep: &SweepHit) {}

    fn on_sweep_angle(&mut self, _device: &DeviceHandle, _sweep: &SweepAngle) {}

    fn on_angle(&mut self, _device: &DeviceHandle, _angle: &AngleSample) {}

    fn on_lightcap(&mut self, _device: &DeviceHandle, _lightcap: &Lightcap) {}

    fn on_light_code(&mut self, _device: &DeviceHandle, _light: &LightCode) {}

    /// Calibrated IMU sample
    fn on_imu(&mut self, _device: &DeviceHandle, _imu: &ImuSample) {}

    /// Uncalibrated IMU sample
    fn on_raw_imu(&mut self, _device: &DeviceHandle, _imu: &ImuSample) {}
}

/// Consumer that accepts every device and ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsumer;

impl EventConsumer for NullConsumer {}
