//! Record-then-replay tests over real capture files.
//!
//! Events are recorded through the `Recorder` into plain and gzip files,
//! then replayed by the `PlaybackScheduler` into a collecting consumer.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use smriti::core::{DeviceHandle, ImuSample, Lightcap, Pose, SyncPulse};
use smriti::io::{FileSink, GZIP_MAGIC};
use smriti::{
    Clock, Error, Event, EventConsumer, ManualClock, PlaybackConfig, PlaybackScheduler, PlaybackState,
    PollOutcome, RecordConfig, Recorder,
};
use tempfile::TempDir;

#[derive(Default)]
struct Collector {
    added: Vec<String>,
    events: Vec<(String, &'static str)>,
}

impl EventConsumer for Collector {
    fn add_device(&mut self, device: &DeviceHandle) {
        self.added.push(device.name.clone());
    }

    fn on_info(&mut self, message: &str) {
        self.events.push((message.to_string(), "LOG"));
    }

    fn on_sync(&mut self, device: &DeviceHandle, _sync: &SyncPulse) {
        self.events.push((device.name.clone(), "Y"));
    }

    fn on_lightcap(&mut self, device: &DeviceHandle, _lightcap: &Lightcap) {
        self.events.push((device.name.clone(), "C"));
    }

    fn on_raw_imu(&mut self, device: &DeviceHandle, _imu: &ImuSample) {
        self.events.push((device.name.clone(), "i"));
    }

    fn on_external_pose(&mut self, name: &str, _pose: &Pose) {
        self.events.push((name.to_string(), "EXTERNAL_POSE"));
    }
}

fn session_events() -> Vec<(f64, Event)> {
    let hmd = || "HMD".to_string();
    vec![
        (
            0.0,
            Event::Config {
                device: hmd(),
                text: "{\n  \"mfgid\": 7\n}".to_string(),
            },
        ),
        (
            0.25,
            Event::Sync {
                device: hmd(),
                sync: SyncPulse {
                    channel: 1,
                    timecode: 1000,
                    ootx: false,
                    gen: false,
                },
            },
        ),
        (
            0.5,
            Event::LightCapRaw {
                device: hmd(),
                lightcap: Lightcap {
                    sensor_id: 3,
                    timestamp: 1200,
                    length: 90,
                },
            },
        ),
        (
            0.75,
            Event::Imu {
                device: hmd(),
                calibrated: false,
                imu: ImuSample::default(),
            },
        ),
        (
            1.0,
            Event::Pose {
                device: hmd(),
                pose: Pose::identity(),
            },
        ),
        (
            1.25,
            Event::Info {
                message: "calibration done".to_string(),
            },
        ),
    ]
}

fn record_session(config: &RecordConfig) -> u64 {
    let clock = ManualClock::new();
    let mut recorder = Recorder::from_config_with_clock(config, Arc::new(clock.clone())).unwrap();
    for (secs, event) in session_events() {
        clock.set(secs);
        recorder.on_event(&event);
    }
    recorder.close().unwrap().lines_written
}

fn replay(path: &Path, factor: f64, replay_pose: bool) -> (Collector, ManualClock) {
    let clock = ManualClock::new();
    let config = PlaybackConfig {
        path: Some(path.to_path_buf()),
        factor,
        replay_pose,
    };
    let mut scheduler = PlaybackScheduler::open_with_clock(&config, Arc::new(clock.clone())).unwrap();
    let mut consumer = Collector::default();

    scheduler.prescan(&mut consumer);
    assert_eq!(scheduler.state(), PlaybackState::Armed);

    while !scheduler.is_finished() {
        if scheduler.poll(&mut consumer) == PollOutcome::NotDue {
            clock.advance(0.1);
        }
    }
    (consumer, clock)
}

fn expected_opcodes() -> Vec<&'static str> {
    vec!["Y", "C", "i", "LOG"]
}

#[test]
fn test_plain_capture_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.rec");
    let config = RecordConfig {
        path: Some(path.clone()),
        ..RecordConfig::default()
    };

    assert_eq!(record_session(&config), 6);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("0.000000 HMD CONFIG {   \"mfgid\": 7 }\n"));
    assert_eq!(text.lines().count(), 6);

    let (consumer, clock) = replay(&path, 1.0, false);
    assert_eq!(consumer.added, vec!["HMD"]);
    let opcodes: Vec<&str> = consumer.events.iter().map(|(_, op)| *op).collect();
    assert_eq!(opcodes, expected_opcodes());
    assert_eq!(consumer.events.last().unwrap().0, "calibration done");
    // Nothing was delivered before its recorded time
    assert!(clock.elapsed_secs() >= 1.25);
}

#[test]
fn test_gzip_capture_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.rec.gz");
    let config = RecordConfig {
        path: Some(path.clone()),
        ..RecordConfig::default()
    };
    assert!(config.compressed());

    record_session(&config);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes[..2], GZIP_MAGIC);

    let (consumer, _clock) = replay(&path, 0.0, true);
    let names: Vec<&str> = consumer.events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["HMD", "HMD", "HMD", "replay_HMD", "calibration done"]);
}

#[test]
fn test_compression_detected_from_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no_suffix.rec");

    let mut sink = FileSink::create(&path, true).unwrap();
    for (secs, event) in session_events() {
        sink.write_all(smriti::encode(&event, secs).as_bytes()).unwrap();
    }
    sink.finish().unwrap();

    let (consumer, _clock) = replay(&path, 0.0, false);
    assert_eq!(consumer.added, vec!["HMD"]);
    assert_eq!(consumer.events.len(), expected_opcodes().len());
}

#[test]
fn test_category_switches_shape_the_capture() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("filtered.rec");
    let config = RecordConfig {
        path: Some(path.clone()),
        rawlight: false,
        imu: false,
        ..RecordConfig::default()
    };

    assert_eq!(record_session(&config), 4);
    let (consumer, _clock) = replay(&path, 0.0, false);
    let opcodes: Vec<&str> = consumer.events.iter().map(|(_, op)| *op).collect();
    assert_eq!(opcodes, vec!["Y", "LOG"]);
}

#[test]
fn test_missing_capture_is_source_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let config = PlaybackConfig {
        path: Some(temp_dir.path().join("absent.rec")),
        ..PlaybackConfig::default()
    };
    assert!(matches!(
        PlaybackScheduler::open(&config),
        Err(Error::SourceUnavailable { .. })
    ));
    assert!(matches!(
        PlaybackScheduler::open(&PlaybackConfig::default()),
        Err(Error::SourceUnavailable { .. })
    ));
}
