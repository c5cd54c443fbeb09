//! Payload types carried by tracking events.
//!
//! Field widths follow what tracked-device firmware reports: channels and
//! lightcap sensor ids fit in a byte, timecodes are 32-bit sample counters,
//! everything continuous is `f64`.

/// Rigid-body pose: position plus unit quaternion `[w, x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in meters
    pub position: [f64; 3],
    /// Rotation quaternion, scalar first
    pub rotation: [f64; 4],
}

impl Pose {
    /// Create a new pose.
    pub fn new(position: [f64; 3], rotation: [f64; 4]) -> Self {
        Self { position, rotation }
    }

    /// Pose at the origin with no rotation.
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linear and angular velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    /// Linear velocity (m/s)
    pub linear: [f64; 3],
    /// Angular velocity as axis-angle (rad/s)
    pub axis_angle: [f64; 3],
}

impl Velocity {
    /// Create a new velocity.
    pub fn new(linear: [f64; 3], axis_angle: [f64; 3]) -> Self {
        Self { linear, axis_angle }
    }
}

/// Sync pulse from a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncPulse {
    pub channel: u8,
    pub timecode: u32,
    /// OOTX data bit carried by the pulse
    pub ootx: bool,
    pub gen: bool,
}

/// Sweep hit on a single sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepHit {
    pub channel: u8,
    pub sensor_id: u32,
    pub timecode: u32,
    pub flag: bool,
}

/// Sweep hit already converted to an angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepAngle {
    pub channel: u8,
    pub sensor_id: u32,
    pub timecode: u32,
    pub plane: i8,
    /// Angle in radians
    pub angle: f64,
}

/// Per-sensor angle sample (superseded by sweep angles, still recorded).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleSample {
    pub sensor_id: i32,
    pub axis_code: i32,
    pub timecode: u32,
    pub length: f64,
    pub angle: f64,
    pub beacon_id: u32,
}

/// Raw optical pulse as captured by the device, before angle derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lightcap {
    pub sensor_id: u8,
    pub timestamp: u32,
    /// Pulse duration in device ticks
    pub length: u16,
}

/// Which beacon a legacy light code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconLabel {
    Left,
    Right,
}

impl BeaconLabel {
    /// Wire token (`L` / `R`).
    pub fn as_str(self) -> &'static str {
        match self {
            BeaconLabel::Left => "L",
            BeaconLabel::Right => "R",
        }
    }
}

/// Sweep axis of a legacy light code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisLabel {
    X,
    Y,
}

impl AxisLabel {
    /// Wire token (`X` / `Y`).
    pub fn as_str(self) -> &'static str {
        match self {
            AxisLabel::X => "X",
            AxisLabel::Y => "Y",
        }
    }
}

/// Light observation in the legacy "light code" form.
///
/// The beacon and axis labels on the wire are derived from `axis_code`; an
/// axis code of `-1` marks a sync-derived observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightCode {
    pub sensor_id: i32,
    pub axis_code: i32,
    pub time_in_sweep: i32,
    pub timecode: u32,
    pub length: u32,
    pub beacon_id: u32,
}

impl LightCode {
    /// Axis code used for observations derived from a sync pulse.
    pub const SYNC_AXIS_CODE: i32 = -1;

    /// Beacon/axis labels for this axis code, if it names a sweep.
    pub fn labels(&self) -> Option<(BeaconLabel, AxisLabel)> {
        match self.axis_code {
            0 | 2 => Some((BeaconLabel::Left, AxisLabel::X)),
            1 | 3 => Some((BeaconLabel::Left, AxisLabel::Y)),
            4 | 6 => Some((BeaconLabel::Right, AxisLabel::X)),
            5 | 7 => Some((BeaconLabel::Right, AxisLabel::Y)),
            _ => None,
        }
    }

    /// Whether this observation comes from a sync pulse rather than a sweep.
    pub fn is_sync(&self) -> bool {
        self.axis_code == Self::SYNC_AXIS_CODE
    }
}

/// One IMU sample: accelerometer, gyroscope and magnetometer triples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSample {
    pub mask: i32,
    /// `[ax, ay, az, gx, gy, gz, mx, my, mz]`
    pub values: [f64; 9],
    pub timecode: u32,
    pub id: i32,
}

impl ImuSample {
    pub fn accel(&self) -> [f64; 3] {
        [self.values[0], self.values[1], self.values[2]]
    }

    pub fn gyro(&self) -> [f64; 3] {
        [self.values[3], self.values[4], self.values[5]]
    }

    pub fn mag(&self) -> [f64; 3] {
        [self.values[6], self.values[7], self.values[8]]
    }
}
