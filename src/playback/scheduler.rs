//! Playback scheduler for replaying a capture into an event consumer.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use super::registry::DeviceRegistry;
use crate::clock::{Clock, ProcessClock};
use crate::codec::{decode, parse_header, parse_timestamp, DecodeError};
use crate::config::PlaybackConfig;
use crate::core::{Event, EventConsumer};
use crate::error::{Error, Result};
use crate::io::{DelimitedReader, FileSource, LogSource, ReadError};

/// Recorded seconds searched for `CONFIG` lines before live dispatch.
pub const PRESCAN_HORIZON_SECS: f64 = 10.0;

/// Name prefix for recorded poses replayed as external poses.
pub const REPLAY_POSE_PREFIX: &str = "replay_";

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Source open, pre-scan not run yet
    Idle,
    /// Collecting device configurations
    PreScanning,
    /// Source rewound, waiting for the first line to fall due
    Armed,
    /// At least one line dispatched
    Dispatching,
    /// End of stream reached
    Exhausted,
    /// Closed externally or after a stream failure
    Closed,
}

/// Result of a single [`PlaybackScheduler::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Next line is not due yet
    NotDue,
    /// One line was delivered to the consumer
    Dispatched,
    /// One line was read and dropped
    Skipped,
    /// Playback is over
    Finished,
}

/// Playback counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Lines read in the live phase
    pub lines_read: u64,
    /// Lines delivered to the consumer
    pub dispatched: u64,
    /// Lines read but not delivered
    pub skipped: u64,
    /// Lines that failed to decode
    pub decode_errors: u64,
    /// Lines naming a device that was never registered
    pub unknown_device: u64,
}

/// Per-session dispatch state.
#[derive(Debug)]
struct Dispatcher {
    registry: DeviceRegistry,
    replay_pose: bool,
    raw_light_seen: bool,
    warned_missing: HashSet<String>,
    stats: PlaybackStats,
}

impl Dispatcher {
    fn new(replay_pose: bool) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            replay_pose,
            raw_light_seen: false,
            warned_missing: HashSet::new(),
            stats: PlaybackStats::default(),
        }
    }

    fn ingest_config(&mut self, consumer: &mut dyn EventConsumer, device: &str, text: &str) {
        let handle = self.registry.fetch_or_create(device);
        match consumer.ingest_config(&handle, text) {
            Ok(()) => {
                if self.registry.register(device) {
                    log::info!("Found {} in playback file...", device);
                    consumer.add_device(&handle);
                }
            }
            Err(e) => log::warn!("Device {} not registered: {}", device, e),
        }
    }

    fn dispatch(&mut self, line_no: u64, line: &str, consumer: &mut dyn EventConsumer) -> PollOutcome {
        let body = line.trim_end_matches(&['\n', '\r'][..]);

        if body.split_ascii_whitespace().nth(1) == Some("C") {
            self.raw_light_seen = true;
        }

        let event = match decode(body) {
            Ok(event) => event,
            Err(DecodeError::Ignored(_)) => return self.skip(),
            Err(e) => {
                log::warn!("Skipping line {}: {}", line_no, e);
                self.stats.decode_errors += 1;
                return self.skip();
            }
        };

        let delivered = match &event {
            // Configurations were consumed by the pre-scan
            Event::Config { .. } | Event::Angle { .. } => false,
            Event::LighthousePose { beacon_id, pose } => {
                consumer.on_lighthouse_pose(*beacon_id, pose);
                true
            }
            Event::ExternalPose { name, pose } => {
                consumer.on_external_pose(name, pose);
                true
            }
            Event::ExternalVelocity { name, velocity } => {
                consumer.on_external_velocity(name, velocity);
                true
            }
            Event::Info { message } => {
                consumer.on_info(message);
                true
            }
            Event::Pose { device, pose } if self.replay_pose => {
                let name = format!("{}{}", REPLAY_POSE_PREFIX, device);
                consumer.on_external_pose(&name, pose);
                true
            }
            Event::Pose { .. } => false,
            Event::LightCode { .. } if self.raw_light_seen => false,
            _ => self.dispatch_device_event(line_no, &event, consumer),
        };

        if delivered {
            self.stats.dispatched += 1;
            PollOutcome::Dispatched
        } else {
            self.skip()
        }
    }

    fn dispatch_device_event(
        &mut self,
        line_no: u64,
        event: &Event,
        consumer: &mut dyn EventConsumer,
    ) -> bool {
        let Some(name) = event.device() else {
            return false;
        };
        let Some(device) = self.registry.get(name) else {
            self.stats.unknown_device += 1;
            if self.warned_missing.insert(name.to_string()) {
                let err = Error::UnknownDevice {
                    name: name.to_string(),
                    line: line_no,
                };
                log::warn!("{}; its lines will be skipped", err);
            }
            return false;
        };

        match event {
            Event::Velocity { velocity, .. } => consumer.on_velocity(device, velocity),
            Event::Sync { sync, .. } => consumer.on_sync(device, sync),
            Event::Sweep { sweep, .. } => consumer.on_sweep(device, sweep),
            Event::SweepAngle { sweep, .. } => consumer.on_sweep_angle(device, sweep),
            Event::LightCapRaw { lightcap, .. } => consumer.on_lightcap(device, lightcap),
            Event::LightCode { light, .. } => consumer.on_light_code(device, light),
            Event::Imu {
                calibrated: true,
                imu,
                ..
            } => consumer.on_imu(device, imu),
            Event::Imu {
                calibrated: false,
                imu,
                ..
            } => consumer.on_raw_imu(device, imu),
            _ => return false,
        }
        true
    }

    fn skip(&mut self) -> PollOutcome {
        self.stats.skipped += 1;
        PollOutcome::Skipped
    }
}

/// Read the elapsed-time token that starts the next line.
///
/// `Ok(None)` at end of stream, including a whitespace-only tail.
fn read_timestamp<S: LogSource>(reader: &mut DelimitedReader, source: &mut S) -> Result<Option<f64>> {
    let token = match reader.read_until(source, b' ') {
        Ok(token) => token,
        Err(ReadError::EndOfStream) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let token = String::from_utf8_lossy(token);
    if token.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(parse_timestamp(&token)?))
}

/// Paced replay of a capture.
///
/// Playback runs in two phases over the same source. [`prescan`] reads the
/// first [`PRESCAN_HORIZON_SECS`] of recorded time and offers every `CONFIG`
/// line to the consumer, registering the devices it accepts. The source is
/// then rewound and each [`poll`] delivers at most one line, once the line's
/// recorded time scaled by the rate factor has passed on the clock.
///
/// Per-line problems (malformed lines, unknown devices) are logged and the
/// line skipped; only end of stream or a stream failure ends playback.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = PlaybackScheduler::open(&config)?;
/// scheduler.prescan(&mut consumer);
/// while !scheduler.is_finished() {
///     if scheduler.poll(&mut consumer) == PollOutcome::NotDue {
///         std::thread::sleep(Duration::from_millis(1));
///     }
/// }
/// ```
///
/// [`prescan`]: PlaybackScheduler::prescan
/// [`poll`]: PlaybackScheduler::poll
pub struct PlaybackScheduler<S: LogSource = FileSource> {
    source: Option<S>,
    reader: DelimitedReader,
    clock: Arc<dyn Clock>,
    rate_factor: f64,
    state: PlaybackState,
    pending: Option<f64>,
    line_no: u64,
    dispatcher: Dispatcher,
}

impl PlaybackScheduler<FileSource> {
    /// Open the capture named by `config`, paced by the process clock.
    pub fn open(config: &PlaybackConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(ProcessClock))
    }

    pub fn open_with_clock(config: &PlaybackConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = config.path.clone().ok_or_else(|| Error::SourceUnavailable {
            path: PathBuf::new(),
            source: io::Error::new(io::ErrorKind::NotFound, "no playback file configured"),
        })?;
        let source = FileSource::open(&path).map_err(|source| Error::SourceUnavailable {
            path: path.clone(),
            source,
        })?;

        log::info!(
            "Using playback file '{}' with time factor of {} (compressed: {})",
            path.display(),
            config.factor,
            source.is_compressed()
        );
        Ok(Self::from_source(
            source,
            config.factor,
            config.replay_pose,
            clock,
        ))
    }
}

fn usable_factor(factor: f64) -> f64 {
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        0.0
    }
}

impl<S: LogSource> PlaybackScheduler<S> {
    /// Schedule playback from an already open source.
    pub fn from_source(source: S, rate_factor: f64, replay_pose: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            source: Some(source),
            reader: DelimitedReader::new(),
            clock,
            rate_factor: usable_factor(rate_factor),
            state: PlaybackState::Idle,
            pending: None,
            line_no: 0,
            dispatcher: Dispatcher::new(replay_pose),
        }
    }

    /// Register the devices declared near the start of the capture.
    ///
    /// Runs once; later calls do nothing. [`poll`](Self::poll) runs it
    /// implicitly if it was not called.
    pub fn prescan(&mut self, consumer: &mut dyn EventConsumer) {
        if self.state != PlaybackState::Idle {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };
        self.state = PlaybackState::PreScanning;

        let mut line_no = 0u64;
        loop {
            let bytes = match self.reader.read_line(source) {
                Ok(bytes) => bytes,
                Err(ReadError::EndOfStream) => break,
                Err(e) => {
                    log::warn!("Pre-scan stopped at line {}: {}", line_no + 1, e);
                    break;
                }
            };
            line_no += 1;

            let line = String::from_utf8_lossy(bytes);
            let header = match parse_header(&line) {
                Ok(header) => header,
                Err(e) => {
                    log::debug!("Pre-scan stopped at line {}: {}", line_no, e);
                    break;
                }
            };
            if header.elapsed_secs > PRESCAN_HORIZON_SECS {
                break;
            }
            if header.opcode != "CONFIG" {
                continue;
            }

            match decode(header.body) {
                Ok(Event::Config { device, text }) => {
                    self.dispatcher.ingest_config(consumer, &device, &text)
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping configuration on line {}: {}", line_no, e),
            }
        }

        match source.rewind() {
            Ok(()) => {
                log::debug!(
                    "Pre-scan registered {} device(s) in {} lines",
                    self.dispatcher.registry.len(),
                    line_no
                );
                self.state = PlaybackState::Armed;
            }
            Err(e) => {
                log::error!("Failed to rewind playback source: {}", e);
                self.shutdown(PlaybackState::Closed);
            }
        }
    }

    /// Deliver the next line if it is due.
    ///
    /// Processes at most one line. Once playback has ended every call
    /// returns [`PollOutcome::Finished`].
    pub fn poll(&mut self, consumer: &mut dyn EventConsumer) -> PollOutcome {
        if self.state == PlaybackState::Idle {
            self.prescan(consumer);
        }
        let Some(source) = self.source.as_mut() else {
            return PollOutcome::Finished;
        };

        let pending = match self.pending {
            Some(pending) => pending,
            None => match read_timestamp(&mut self.reader, source) {
                Ok(Some(pending)) => {
                    self.line_no += 1;
                    self.pending = Some(pending);
                    pending
                }
                Ok(None) => return self.shutdown(PlaybackState::Exhausted),
                Err(Error::Decode(e)) => {
                    log::warn!("Playback stopped at line {}: {}", self.line_no + 1, e);
                    return self.shutdown(PlaybackState::Exhausted);
                }
                Err(e) => {
                    log::error!("Playback source failed: {}", e);
                    return self.shutdown(PlaybackState::Closed);
                }
            },
        };

        if pending * self.rate_factor > self.clock.elapsed_secs() {
            return PollOutcome::NotDue;
        }
        self.pending = None;

        let outcome = match self.reader.read_line(source) {
            Ok(bytes) => {
                self.dispatcher.stats.lines_read += 1;
                let line = String::from_utf8_lossy(bytes);
                self.dispatcher.dispatch(self.line_no, &line, consumer)
            }
            Err(ReadError::EndOfStream) => return self.shutdown(PlaybackState::Exhausted),
            Err(e) => {
                log::error!("Playback source failed: {}", e);
                return self.shutdown(PlaybackState::Closed);
            }
        };
        self.state = PlaybackState::Dispatching;
        outcome
    }

    /// Poll until nothing more is due. Returns the number of lines delivered.
    pub fn drain(&mut self, consumer: &mut dyn EventConsumer) -> u64 {
        let mut dispatched = 0;
        loop {
            match self.poll(consumer) {
                PollOutcome::Dispatched => dispatched += 1,
                PollOutcome::Skipped => {}
                PollOutcome::NotDue | PollOutcome::Finished => return dispatched,
            }
        }
    }

    /// Release the source. Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        self.shutdown(PlaybackState::Closed);
    }

    fn shutdown(&mut self, state: PlaybackState) -> PollOutcome {
        self.pending = None;
        if self.source.take().is_some() {
            let stats = self.dispatcher.stats;
            log::info!(
                "Playback finished: {} lines read, {} dispatched, {} skipped ({} decode errors, {} unknown device)",
                stats.lines_read,
                stats.dispatched,
                stats.skipped,
                stats.decode_errors,
                stats.unknown_device
            );
        }
        if !self.is_finished() {
            self.state = state;
        }
        PollOutcome::Finished
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Exhausted | PlaybackState::Closed
        )
    }

    pub fn rate_factor(&self) -> f64 {
        self.rate_factor
    }

    /// Change the time factor; takes effect on the next poll.
    ///
    /// Negative and non-finite values are treated as zero.
    pub fn set_rate_factor(&mut self, factor: f64) {
        self.rate_factor = usable_factor(factor);
    }

    /// Seconds until the pending line falls due, if one is pending.
    pub fn time_until_due(&self) -> Option<f64> {
        self.pending
            .map(|pending| (pending * self.rate_factor - self.clock.elapsed_secs()).max(0.0))
    }

    /// Recorded time of the line waiting for its turn.
    pub fn pending_timestamp(&self) -> Option<f64> {
        self.pending
    }

    pub fn stats(&self) -> PlaybackStats {
        self.dispatcher.stats
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.dispatcher.registry
    }
}

impl<S: LogSource> Drop for PlaybackScheduler<S> {
    fn drop(&mut self) {
        self.close();
    }
}
