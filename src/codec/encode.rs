//! Event to line encoding.

use std::fmt::{self, Write};

use crate::core::{Event, ImuSample, LightCode, Pose, Velocity};

/// Encode an event as one protocol line, terminated by `\n`.
///
/// A [`LightCode`] whose axis code names no sweep (other than the sync code
/// `-1`) is written with empty labels; such a line does not decode back.
pub fn encode(event: &Event, elapsed_secs: f64) -> String {
    let mut line = String::with_capacity(128);
    // Writing into a String cannot fail.
    let _ = write_line(&mut line, event, elapsed_secs);
    line
}

fn write_line(out: &mut String, event: &Event, elapsed_secs: f64) -> fmt::Result {
    write!(out, "{:.6} ", elapsed_secs)?;

    match event {
        Event::Config { device, text } => {
            write!(out, "{} CONFIG {}", device, sanitize(text))?;
        }
        Event::LighthousePose { beacon_id, pose } => {
            write!(out, "{} LH_POSE", beacon_id)?;
            write_pose(out, pose)?;
        }
        Event::Velocity { device, velocity } => {
            write!(out, "{} VELOCITY", device)?;
            write_velocity(out, velocity)?;
        }
        Event::Pose { device, pose } => {
            write!(out, "{} POSE", device)?;
            write_pose(out, pose)?;
        }
        Event::ExternalPose { name, pose } => {
            write!(out, "{} EXTERNAL_POSE", name)?;
            write_pose(out, pose)?;
        }
        Event::ExternalVelocity { name, velocity } => {
            write!(out, "{} EXTERNAL_VELOCITY", name)?;
            write_velocity(out, velocity)?;
        }
        Event::Info { message } => {
            write!(out, "INFO LOG {}", sanitize(message))?;
        }
        Event::Sync { device, sync } => {
            write!(
                out,
                "{} Y {} {} {} {}",
                device,
                sync.channel,
                sync.timecode,
                u8::from(sync.ootx),
                u8::from(sync.gen)
            )?;
        }
        Event::Sweep { device, sweep } => {
            write!(
                out,
                "{} W {} {} {} {}",
                device,
                sweep.channel,
                sweep.sensor_id,
                sweep.timecode,
                u8::from(sweep.flag)
            )?;
        }
        Event::SweepAngle { device, sweep } => {
            write!(
                out,
                "{} B {} {} {} {} {:.6}",
                device, sweep.channel, sweep.sensor_id, sweep.timecode, sweep.plane, sweep.angle
            )?;
        }
        Event::Angle { device, angle } => {
            write!(
                out,
                "{} A {} {} {} {:.6} {:.6} {}",
                device,
                angle.sensor_id,
                angle.axis_code,
                angle.timecode,
                angle.length,
                angle.angle,
                angle.beacon_id
            )?;
        }
        Event::LightCapRaw { device, lightcap } => {
            write!(
                out,
                "{} C {} {} {}",
                device, lightcap.sensor_id, lightcap.timestamp, lightcap.length
            )?;
        }
        Event::LightCode { device, light } => {
            write_light_code(out, device, light)?;
        }
        Event::Imu {
            device,
            calibrated,
            imu,
        } => {
            let opcode = if *calibrated { "I" } else { "i" };
            write!(out, "{} {}", device, opcode)?;
            write_imu(out, imu)?;
        }
    }

    out.push('\n');
    Ok(())
}

/// Line framing relies on newlines appearing only as terminators.
fn sanitize(text: &str) -> String {
    text.replace(&['\n', '\r'][..], " ")
}

fn write_pose(out: &mut String, pose: &Pose) -> fmt::Result {
    for value in pose.position.iter().chain(pose.rotation.iter()) {
        write!(out, " {:.6}", value)?;
    }
    Ok(())
}

fn write_velocity(out: &mut String, velocity: &Velocity) -> fmt::Result {
    for value in velocity.linear.iter().chain(velocity.axis_angle.iter()) {
        write!(out, " {:.6}", value)?;
    }
    Ok(())
}

fn write_light_code(out: &mut String, device: &str, light: &LightCode) -> fmt::Result {
    match light.labels() {
        Some((beacon, axis)) => write!(out, "{} {} {}", device, beacon.as_str(), axis.as_str())?,
        None if light.is_sync() => write!(out, "{} S", device)?,
        None => write!(out, "{}  ", device)?,
    }
    write!(
        out,
        " {} {} {} {} {} {}",
        light.sensor_id,
        light.axis_code,
        light.time_in_sweep,
        light.timecode,
        light.length,
        light.beacon_id
    )
}

fn write_imu(out: &mut String, imu: &ImuSample) -> fmt::Result {
    write!(out, " {} {}", imu.mask, imu.timecode)?;
    for value in &imu.values {
        write!(out, " {:.6}", value)?;
    }
    write!(out, " {}", imu.id)
}
