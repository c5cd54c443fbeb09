//! Test fixtures for recording and playback tests.

use std::collections::HashSet;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use crate::codec::encode;
use crate::core::{
    AngleSample, DeviceHandle, Event, EventConsumer, ImuSample, LightCode, Lightcap, Pose,
    SweepAngle, SweepHit, SyncPulse, Velocity,
};
use crate::error::{Error, Result};

/// In-memory writer whose clones share one buffer.
///
/// Stands in for stdout as a recording echo sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer that keeps everything playback hands it.
///
/// Delivered callbacks are rebuilt into [`Event`]s carrying the resolved
/// device name, so tests can compare them against what was recorded.
#[derive(Debug, Default)]
pub struct CollectingConsumer {
    /// Devices whose configuration will be refused
    pub reject: HashSet<String>,
    /// Configuration blobs offered, accepted or not
    pub configs: Vec<(String, String)>,
    /// Devices announced through `add_device`
    pub added: Vec<DeviceHandle>,
    /// Delivered events in order
    pub events: Vec<Event>,
}

impl CollectingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer refusing the configuration of `device`.
    pub fn rejecting(device: &str) -> Self {
        let mut consumer = Self::new();
        consumer.reject.insert(device.to_string());
        consumer
    }

    /// Opcodes of the delivered events, in order.
    pub fn opcodes(&self) -> Vec<&'static str> {
        self.events.iter().map(Event::opcode).collect()
    }

    pub fn added_names(&self) -> Vec<&str> {
        self.added.iter().map(|device| device.name.as_str()).collect()
    }
}

impl EventConsumer for CollectingConsumer {
    fn ingest_config(&mut self, device: &DeviceHandle, config: &str) -> Result<()> {
        self.configs.push((device.name.clone(), config.to_string()));
        if self.reject.contains(&device.name) {
            return Err(Error::ConfigIngest {
                device: device.name.clone(),
                reason: "rejected by test consumer".to_string(),
            });
        }
        Ok(())
    }

    fn add_device(&mut self, device: &DeviceHandle) {
        self.added.push(device.clone());
    }

    fn on_lighthouse_pose(&mut self, beacon_id: u8, pose: &Pose) {
        self.events.push(Event::LighthousePose {
            beacon_id,
            pose: *pose,
        });
    }

    fn on_velocity(&mut self, device: &DeviceHandle, velocity: &Velocity) {
        self.events.push(Event::Velocity {
            device: device.name.clone(),
            velocity: *velocity,
        });
    }

    fn on_pose(&mut self, device: &DeviceHandle, pose: &Pose) {
        self.events.push(Event::Pose {
            device: device.name.clone(),
            pose: *pose,
        });
    }

    fn on_external_pose(&mut self, name: &str, pose: &Pose) {
        self.events.push(Event::ExternalPose {
            name: name.to_string(),
            pose: *pose,
        });
    }

    fn on_external_velocity(&mut self, name: &str, velocity: &Velocity) {
        self.events.push(Event::ExternalVelocity {
            name: name.to_string(),
            velocity: *velocity,
        });
    }

    fn on_info(&mut self, message: &str) {
        self.events.push(Event::Info {
            message: message.to_string(),
        });
    }

    fn on_sync(&mut self, device: &DeviceHandle, sync: &SyncPulse) {
        self.events.push(Event::Sync {
            device: device.name.clone(),
            sync: *sync,
        });
    }

    fn on_sweep(&mut self, device: &DeviceHandle, sweep: &SweepHit) {
        self.events.push(Event::Sweep {
            device: device.name.clone(),
            sweep: *sweep,
        });
    }

    fn on_sweep_angle(&mut self, device: &DeviceHandle, sweep: &SweepAngle) {
        self.events.push(Event::SweepAngle {
            device: device.name.clone(),
            sweep: *sweep,
        });
    }

    fn on_angle(&mut self, device: &DeviceHandle, angle: &AngleSample) {
        self.events.push(Event::Angle {
            device: device.name.clone(),
            angle: *angle,
        });
    }

    fn on_lightcap(&mut self, device: &DeviceHandle, lightcap: &Lightcap) {
        self.events.push(Event::LightCapRaw {
            device: device.name.clone(),
            lightcap: *lightcap,
        });
    }

    fn on_light_code(&mut self, device: &DeviceHandle, light: &LightCode) {
        self.events.push(Event::LightCode {
            device: device.name.clone(),
            light: *light,
        });
    }

    fn on_imu(&mut self, device: &DeviceHandle, imu: &ImuSample) {
        self.events.push(Event::Imu {
            device: device.name.clone(),
            calibrated: true,
            imu: *imu,
        });
    }

    fn on_raw_imu(&mut self, device: &DeviceHandle, imu: &ImuSample) {
        self.events.push(Event::Imu {
            device: device.name.clone(),
            calibrated: false,
            imu: *imu,
        });
    }
}

/// Builder for in-memory capture logs.
#[derive(Debug, Default)]
pub struct LogBuilder {
    bytes: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an encoded event.
    pub fn event(mut self, elapsed_secs: f64, event: &Event) -> Self {
        self.bytes
            .extend_from_slice(encode(event, elapsed_secs).as_bytes());
        self
    }

    /// Append a `CONFIG` line for `device`.
    pub fn config(self, elapsed_secs: f64, device: &str) -> Self {
        let event = Event::Config {
            device: device.to_string(),
            text: format!("{{ \"device\": \"{}\" }}", device),
        };
        self.event(elapsed_secs, &event)
    }

    /// Append a raw line body after a formatted timestamp.
    pub fn line(mut self, elapsed_secs: f64, body: &str) -> Self {
        self.bytes
            .extend_from_slice(format!("{:.6} {}\n", elapsed_secs, body).as_bytes());
        self
    }

    /// Append bytes verbatim.
    pub fn raw(mut self, text: &str) -> Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn into_source(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes)
    }
}
