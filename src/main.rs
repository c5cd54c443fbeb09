//! Smriti command line: replay, inspect and filter capture files.
//!
//! # Usage
//!
//! ```bash
//! # Replay at recorded speed, re-recording what is delivered
//! smriti play session.rec.gz -o record=replayed.rec
//!
//! # Replay as fast as possible, poses turned into external poses
//! smriti play session.rec --factor 0 --replay-pose
//!
//! # Inspect a capture
//! smriti info session.rec.gz --json
//!
//! # Drop raw light and IMU from a capture, keeping timestamps
//! smriti filter session.rec small.rec.gz -o record-rawlight=0 -o record-imu=0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};

use smriti::codec::{decode_record, DecodeError};
use smriti::core::{
    AngleSample, DeviceHandle, Event, EventConsumer, ImuSample, LightCode, Lightcap, Pose,
    SweepAngle, SweepHit, SyncPulse, Velocity,
};
use smriti::io::{DelimitedReader, FileSource, ReadError};
use smriti::{
    Error, LogSummary, PlaybackScheduler, PollOutcome, Recorder, Result, SmritiConfig,
};

/// Upper bound on a single idle sleep while waiting for the next line.
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "smriti")]
#[command(about = "Record and replay motion-tracking event logs")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Named option, e.g. `-o record-imu=0` (repeatable)
    #[arg(short = 'o', long = "option", global = true, value_name = "NAME=VALUE")]
    options: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture at its recorded pace
    Play {
        /// Capture file (plain or gzip)
        file: PathBuf,

        /// Time factor: 1 is recorded speed, 0 is as fast as possible
        #[arg(short, long)]
        factor: Option<f64>,

        /// Deliver recorded poses as external poses named `replay_<device>`
        #[arg(long)]
        replay_pose: bool,
    },
    /// Print statistics about a capture
    Info {
        /// Capture file (plain or gzip)
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Re-record a capture through the recording category switches
    Filter {
        /// Capture to read
        input: PathBuf,

        /// Capture to write; a `.gz` suffix compresses it
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SmritiConfig::from_file(path)?,
        None => SmritiConfig::default(),
    };
    for option in &args.options {
        config.apply(option)?;
    }

    match args.command {
        Commands::Play {
            file,
            factor,
            replay_pose,
        } => {
            config.playback.path = Some(file);
            if let Some(factor) = factor {
                config.set_option("playback-factor", &factor.to_string())?;
            }
            config.playback.replay_pose |= replay_pose;
            play(&config)
        }
        Commands::Info { file, json } => info(&file, json),
        Commands::Filter { input, output } => {
            config.record.path = Some(output);
            filter(&input, &config)
        }
    }
}

fn open_source(path: &Path) -> Result<FileSource> {
    FileSource::open(path).map_err(|source| Error::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn play(config: &SmritiConfig) -> Result<()> {
    let mut consumer = LoggingConsumer::new(Recorder::install(&config.record));
    let mut scheduler = PlaybackScheduler::open(&config.playback)?;

    scheduler.prescan(&mut consumer);
    while !scheduler.is_finished() {
        if scheduler.poll(&mut consumer) == PollOutcome::NotDue {
            let wait = scheduler
                .time_until_due()
                .map(Duration::from_secs_f64)
                .unwrap_or(MAX_IDLE_SLEEP);
            thread::sleep(wait.min(MAX_IDLE_SLEEP));
        }
    }

    let stats = scheduler.stats();
    println!("Playback Summary");
    println!("================");
    println!("Devices: {}", scheduler.registry().len());
    println!("Lines read: {}", stats.lines_read);
    println!("Dispatched: {}", stats.dispatched);
    println!("Skipped: {}", stats.skipped);
    println!("  Decode errors: {}", stats.decode_errors);
    println!("  Unknown device: {}", stats.unknown_device);
    for (opcode, count) in &consumer.delivered {
        println!("  {:<18} {}", opcode, count);
    }

    let recording = consumer.recorder.close()?;
    if let Some(path) = recording.path {
        println!(
            "Re-recorded {} lines to {}",
            recording.lines_written,
            path.display()
        );
    }
    Ok(())
}

fn info(path: &Path, json: bool) -> Result<()> {
    let mut source = open_source(path)?;
    let compressed = source.is_compressed();
    let summary = LogSummary::scan(&mut source)?;

    if json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Capture Information");
    println!("===================");
    println!("File: {}", path.display());
    println!("Compressed: {}", compressed);
    println!("Lines: {}", summary.lines);
    println!("Duration: {:.3} seconds", summary.duration_secs());
    if let (Some(start), Some(end)) = (summary.start_secs, summary.end_secs) {
        println!("Recorded time: {:.6} .. {:.6}", start, end);
    }
    println!("Devices: {}", summary.devices.join(", "));
    println!("Decode failures: {}", summary.decode_failures);
    if summary.out_of_order > 0 {
        println!("Out-of-order timestamps: {}", summary.out_of_order);
    }
    println!();
    println!("Opcode Breakdown:");
    for (opcode, count) in &summary.opcodes {
        let pct = 100.0 * *count as f64 / summary.lines.max(1) as f64;
        println!("  {:<18} {:>8} ({:.1}%)", opcode, count, pct);
    }
    Ok(())
}

fn filter(input: &Path, config: &SmritiConfig) -> Result<()> {
    let mut source = open_source(input)?;
    let mut recorder = Recorder::from_config(&config.record)?;
    let mut reader = DelimitedReader::new();
    let mut skipped = 0u64;
    let mut line_no = 0u64;

    loop {
        let bytes = match reader.read_line(&mut source) {
            Ok(bytes) => bytes,
            Err(ReadError::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        };
        line_no += 1;
        let line = String::from_utf8_lossy(bytes);
        if line.trim().is_empty() {
            continue;
        }
        match decode_record(&line) {
            Ok(record) => recorder.record_at(&record.event, record.elapsed_secs),
            Err(DecodeError::Ignored(_)) => skipped += 1,
            Err(e) => {
                log::warn!("Skipping line {}: {}", line_no, e);
                skipped += 1;
            }
        }
    }

    let stats = recorder.close()?;
    println!(
        "Wrote {} lines to {} ({} filtered, {} unreadable)",
        stats.lines_written,
        stats
            .path
            .as_deref()
            .unwrap_or_else(|| Path::new("-"))
            .display(),
        stats.lines_filtered,
        skipped
    );
    Ok(())
}

/// Consumer that logs every delivered event and optionally re-records it.
struct LoggingConsumer {
    recorder: Recorder,
    delivered: BTreeMap<&'static str, u64>,
}

impl LoggingConsumer {
    fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            delivered: BTreeMap::new(),
        }
    }

    fn deliver(&mut self, event: Event) {
        log::debug!("{:?}", event);
        *self.delivered.entry(event.opcode()).or_default() += 1;
        self.recorder.on_event(&event);
    }
}

impl EventConsumer for LoggingConsumer {
    fn ingest_config(&mut self, device: &DeviceHandle, config: &str) -> Result<()> {
        self.recorder.on_event(&Event::Config {
            device: device.name.clone(),
            text: config.to_string(),
        });
        Ok(())
    }

    fn add_device(&mut self, device: &DeviceHandle) {
        log::info!("Device {} ({}) ready", device.name, device.id);
    }

    fn on_lighthouse_pose(&mut self, beacon_id: u8, pose: &Pose) {
        self.deliver(Event::LighthousePose {
            beacon_id,
            pose: *pose,
        });
    }

    fn on_velocity(&mut self, device: &DeviceHandle, velocity: &Velocity) {
        self.deliver(Event::Velocity {
            device: device.name.clone(),
            velocity: *velocity,
        });
    }

    fn on_external_pose(&mut self, name: &str, pose: &Pose) {
        self.deliver(Event::ExternalPose {
            name: name.to_string(),
            pose: *pose,
        });
    }

    fn on_external_velocity(&mut self, name: &str, velocity: &Velocity) {
        self.deliver(Event::ExternalVelocity {
            name: name.to_string(),
            velocity: *velocity,
        });
    }

    fn on_info(&mut self, message: &str) {
        log::info!("[playback] {}", message);
        self.deliver(Event::Info {
            message: message.to_string(),
        });
    }

    fn on_sync(&mut self, device: &DeviceHandle, sync: &SyncPulse) {
        self.deliver(Event::Sync {
            device: device.name.clone(),
            sync: *sync,
        });
    }

    fn on_sweep(&mut self, device: &DeviceHandle, sweep: &SweepHit) {
        self.deliver(Event::Sweep {
            device: device.name.clone(),
            sweep: *sweep,
        });
    }

    fn on_sweep_angle(&mut self, device: &DeviceHandle, sweep: &SweepAngle) {
        self.deliver(Event::SweepAngle {
            device: device.name.clone(),
            sweep: *sweep,
        });
    }

    fn on_angle(&mut self, device: &DeviceHandle, angle: &AngleSample) {
        self.deliver(Event::Angle {
            device: device.name.clone(),
            angle: *angle,
        });
    }

    fn on_lightcap(&mut self, device: &DeviceHandle, lightcap: &Lightcap) {
        self.deliver(Event::LightCapRaw {
            device: device.name.clone(),
            lightcap: *lightcap,
        });
    }

    fn on_light_code(&mut self, device: &DeviceHandle, light: &LightCode) {
        self.deliver(Event::LightCode {
            device: device.name.clone(),
            light: *light,
        });
    }

    fn on_imu(&mut self, device: &DeviceHandle, imu: &ImuSample) {
        self.deliver(Event::Imu {
            device: device.name.clone(),
            calibrated: true,
            imu: *imu,
        });
    }

    fn on_raw_imu(&mut self, device: &DeviceHandle, imu: &ImuSample) {
        self.deliver(Event::Imu {
            device: device.name.clone(),
            calibrated: false,
            imu: *imu,
        });
    }
}
