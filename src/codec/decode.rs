//! Line to event decoding.

use std::str::FromStr;

use super::DecodeError;
use crate::core::{
    AngleSample, Event, ImuSample, LightCode, Lightcap, Pose, SweepAngle, SweepHit, SyncPulse,
    Velocity,
};

/// IMU fields: mask, timecode, nine values, id.
const IMU_FIELDS: usize = 12;
/// Older captures carry no magnetometer: mask, timecode, six values, id.
const IMU_FIELDS_LEGACY: usize = 9;

/// Decoded line with its recorded elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub elapsed_secs: f64,
    pub event: Event,
}

/// Leading tokens of a line, split without decoding the fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header<'a> {
    pub elapsed_secs: f64,
    pub device: &'a str,
    pub opcode: &'a str,
    /// Everything after the timestamp (`<device> <opcode> <fields...>`)
    pub body: &'a str,
}

/// Split off the first whitespace-delimited token.
///
/// The remainder starts right after the single separator following the
/// token, so free-text payloads keep their inner spacing.
fn next_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(|c: char| c.is_ascii_whitespace()) {
        Some(end) => (&s[..end], &s[end + 1..]),
        None => (s, ""),
    }
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(&['\n', '\r'][..])
}

/// Parse an elapsed-time token.
pub fn parse_timestamp(token: &str) -> Result<f64, DecodeError> {
    let token = token.trim();
    token
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .ok_or_else(|| DecodeError::InvalidTimestamp(token.to_string()))
}

/// Split a full line into timestamp, device and opcode.
pub fn parse_header(line: &str) -> Result<Header<'_>, DecodeError> {
    let line = strip_terminator(line);
    let (timestamp, body) = next_token(line);
    if timestamp.is_empty() {
        return Err(DecodeError::Empty);
    }
    let elapsed_secs = parse_timestamp(timestamp)?;

    let (device, rest) = next_token(body);
    if device.is_empty() {
        return Err(DecodeError::Empty);
    }
    let (opcode, _) = next_token(rest);
    if opcode.is_empty() {
        return Err(DecodeError::MissingOpcode(device.to_string()));
    }

    Ok(Header {
        elapsed_secs,
        device,
        opcode,
        body: body.trim_start(),
    })
}

/// Decode a full line, including its leading elapsed time.
pub fn decode_record(line: &str) -> Result<Record, DecodeError> {
    let header = parse_header(line)?;
    Ok(Record {
        elapsed_secs: header.elapsed_secs,
        event: decode(header.body)?,
    })
}

/// Decode a line body (`<device> <opcode> <fields...>`, no timestamp).
pub fn decode(body: &str) -> Result<Event, DecodeError> {
    let body = strip_terminator(body);
    let (device, rest) = next_token(body);
    if device.is_empty() {
        return Err(DecodeError::Empty);
    }
    let (opcode, args) = next_token(rest);
    if opcode.is_empty() {
        return Err(DecodeError::MissingOpcode(device.to_string()));
    }

    let device_name = device.to_string();
    let event = match opcode {
        "CONFIG" => Event::Config {
            device: device_name,
            text: args.to_string(),
        },
        "LH_POSE" => Event::LighthousePose {
            beacon_id: parse_field(opcode, "beacon id", device)?,
            pose: parse_pose(&Fields::new(opcode, args, 7)?)?,
        },
        "VELOCITY" => Event::Velocity {
            device: device_name,
            velocity: parse_velocity(&Fields::new(opcode, args, 6)?)?,
        },
        "POSE" => Event::Pose {
            device: device_name,
            pose: parse_pose(&Fields::new(opcode, args, 7)?)?,
        },
        "EXTERNAL_POSE" => Event::ExternalPose {
            name: device_name,
            pose: parse_pose(&Fields::new(opcode, args, 7)?)?,
        },
        "EXTERNAL_VELOCITY" => Event::ExternalVelocity {
            name: device_name,
            velocity: parse_velocity(&Fields::new(opcode, args, 6)?)?,
        },
        "LOG" if device == "INFO" => Event::Info {
            message: args.to_string(),
        },
        "Y" => {
            let f = Fields::new(opcode, args, 4)?;
            Event::Sync {
                device: device_name,
                sync: SyncPulse {
                    channel: f.get(0, "channel")?,
                    timecode: f.get(1, "timecode")?,
                    ootx: f.flag(2, "ootx")?,
                    gen: f.flag(3, "gen")?,
                },
            }
        }
        "W" => {
            let f = Fields::new(opcode, args, 4)?;
            Event::Sweep {
                device: device_name,
                sweep: SweepHit {
                    channel: f.get(0, "channel")?,
                    sensor_id: f.get(1, "sensor id")?,
                    timecode: f.get(2, "timecode")?,
                    flag: f.flag(3, "flag")?,
                },
            }
        }
        "B" => {
            let f = Fields::new(opcode, args, 5)?;
            Event::SweepAngle {
                device: device_name,
                sweep: SweepAngle {
                    channel: f.get(0, "channel")?,
                    sensor_id: f.get(1, "sensor id")?,
                    timecode: f.get(2, "timecode")?,
                    plane: f.get(3, "plane")?,
                    angle: f.get(4, "angle")?,
                },
            }
        }
        "A" => {
            let f = Fields::new(opcode, args, 6)?;
            Event::Angle {
                device: device_name,
                angle: AngleSample {
                    sensor_id: f.get(0, "sensor id")?,
                    axis_code: f.get(1, "axis code")?,
                    timecode: f.get(2, "timecode")?,
                    length: f.get(3, "length")?,
                    angle: f.get(4, "angle")?,
                    beacon_id: f.get(5, "beacon id")?,
                },
            }
        }
        "C" => {
            let f = Fields::new(opcode, args, 3)?;
            Event::LightCapRaw {
                device: device_name,
                lightcap: Lightcap {
                    sensor_id: f.get(0, "sensor id")?,
                    timestamp: f.get(1, "timestamp")?,
                    length: f.get(2, "length")?,
                },
            }
        }
        "L" | "R" => {
            // Axis label precedes the light code fields
            let f = Fields::new(opcode, args, 7)?;
            Event::LightCode {
                device: device_name,
                light: parse_light_code(&f, 1)?,
            }
        }
        "S" => {
            let f = Fields::new(opcode, args, 6)?;
            Event::LightCode {
                device: device_name,
                light: parse_light_code(&f, 0)?,
            }
        }
        "I" | "i" => Event::Imu {
            device: device_name,
            calibrated: opcode == "I",
            imu: parse_imu(opcode, args)?,
        },
        "V" => return Err(DecodeError::Ignored(opcode.to_string())),
        _ => return Err(DecodeError::Unrecognized(opcode.to_string())),
    };

    Ok(event)
}

fn parse_field<T: FromStr>(opcode: &str, field: &'static str, token: &str) -> Result<T, DecodeError> {
    token.parse().map_err(|_| DecodeError::InvalidField {
        opcode: opcode.to_string(),
        field,
        value: token.to_string(),
    })
}

/// Whitespace-split fields of one line, checked against a minimum count.
///
/// Trailing extra fields are tolerated.
struct Fields<'a> {
    opcode: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(opcode: &'a str, args: &'a str, expected: usize) -> Result<Self, DecodeError> {
        let tokens: Vec<&str> = args.split_ascii_whitespace().collect();
        if tokens.len() < expected {
            return Err(DecodeError::MissingFields {
                opcode: opcode.to_string(),
                expected,
                found: tokens.len(),
            });
        }
        Ok(Self { opcode, tokens })
    }

    fn get<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, DecodeError> {
        parse_field(self.opcode, field, self.tokens[index])
    }

    fn flag(&self, index: usize, field: &'static str) -> Result<bool, DecodeError> {
        Ok(self.get::<u8>(index, field)? != 0)
    }

    fn array<const N: usize>(&self, start: usize, field: &'static str) -> Result<[f64; N], DecodeError> {
        let mut values = [0.0; N];
        for (i, value) in values.iter_mut().enumerate() {
            *value = self.get(start + i, field)?;
        }
        Ok(values)
    }
}

fn parse_pose(f: &Fields<'_>) -> Result<Pose, DecodeError> {
    Ok(Pose {
        position: f.array(0, "position")?,
        rotation: f.array(3, "rotation")?,
    })
}

fn parse_velocity(f: &Fields<'_>) -> Result<Velocity, DecodeError> {
    Ok(Velocity {
        linear: f.array(0, "linear velocity")?,
        axis_angle: f.array(3, "angular velocity")?,
    })
}

fn parse_light_code(f: &Fields<'_>, start: usize) -> Result<LightCode, DecodeError> {
    Ok(LightCode {
        sensor_id: f.get(start, "sensor id")?,
        axis_code: f.get(start + 1, "axis code")?,
        time_in_sweep: f.get(start + 2, "time in sweep")?,
        timecode: f.get(start + 3, "timecode")?,
        length: f.get(start + 4, "length")?,
        beacon_id: f.get(start + 5, "beacon id")?,
    })
}

fn parse_imu(opcode: &str, args: &str) -> Result<ImuSample, DecodeError> {
    let f = Fields::new(opcode, args, IMU_FIELDS_LEGACY)?;
    let count = f.tokens.len();

    let mut values = [0.0; 9];
    let id_index = if count >= IMU_FIELDS {
        values = f.array(2, "imu value")?;
        IMU_FIELDS - 1
    } else if count == IMU_FIELDS_LEGACY {
        let accel_gyro: [f64; 6] = f.array(2, "imu value")?;
        values[..6].copy_from_slice(&accel_gyro);
        IMU_FIELDS_LEGACY - 1
    } else {
        return Err(DecodeError::MissingFields {
            opcode: opcode.to_string(),
            expected: IMU_FIELDS,
            found: count,
        });
    };

    Ok(ImuSample {
        mask: f.get(0, "mask")?,
        timecode: f.get(1, "timecode")?,
        values,
        id: f.get(id_index, "id")?,
    })
}
