//! Recorder for capturing tracking events to a line log.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::{Clock, ProcessClock};
use crate::codec::encode;
use crate::config::RecordConfig;
use crate::core::{Category, Event};
use crate::error::{Error, Result};
use crate::io::FileSink;

/// Per-category recording switches.
///
/// Only the four high-rate categories can be switched off; everything else
/// is recorded whenever a sink exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMask {
    /// Raw lightcap pulses (`record-rawlight`)
    pub raw_light: bool,
    /// Uncalibrated IMU (`record-imu`)
    pub imu_raw: bool,
    /// Calibrated IMU (`record-cal-imu`)
    pub imu_cal: bool,
    /// Angles and light codes (`record-angle`)
    pub angle: bool,
}

impl CategoryMask {
    /// Record everything.
    pub fn all() -> Self {
        Self {
            raw_light: true,
            imu_raw: true,
            imu_cal: true,
            angle: true,
        }
    }

    /// Whether `event` passes the mask.
    pub fn allows(&self, event: &Event) -> bool {
        match event.category() {
            None => true,
            Some(Category::RawLight) => self.raw_light,
            Some(Category::ImuRaw) => self.imu_raw,
            Some(Category::ImuCal) => self.imu_cal,
            Some(Category::Angle) => self.angle,
        }
    }
}

impl Default for CategoryMask {
    fn default() -> Self {
        Self {
            raw_light: true,
            imu_raw: true,
            imu_cal: false,
            angle: true,
        }
    }
}

impl From<&RecordConfig> for CategoryMask {
    fn from(config: &RecordConfig) -> Self {
        Self {
            raw_light: config.rawlight,
            imu_raw: config.imu,
            imu_cal: config.cal_imu,
            angle: config.angle,
        }
    }
}

/// Destinations for recorded lines.
#[derive(Default)]
pub struct RecordingSinks {
    /// Durable capture file and the path it was created at
    pub file: Option<(PathBuf, FileSink)>,
    /// Live echo of every line
    pub echo: Option<Box<dyn Write + Send>>,
}

impl RecordingSinks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, sink: FileSink) -> Self {
        self.file = Some((path.into(), sink));
        self
    }

    pub fn with_echo(mut self, echo: Box<dyn Write + Send>) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn with_stdout(self) -> Self {
        self.with_echo(Box::new(io::stdout()))
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.echo.is_none()
    }
}

/// Summary of a finished recording session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingStats {
    /// Capture file, if one was written
    pub path: Option<PathBuf>,
    /// Lines written
    pub lines_written: u64,
    /// Events dropped by the category mask
    pub lines_filtered: u64,
}

struct RecordingSession {
    mask: CategoryMask,
    file: Option<FileSink>,
    path: Option<PathBuf>,
    echo: Option<Box<dyn Write + Send>>,
    lines_written: u64,
    lines_filtered: u64,
}

impl RecordingSession {
    /// Write one line to every live sink. A sink that fails is dropped.
    fn write_line(&mut self, line: &[u8]) {
        let mut accepted = false;
        if let Some(file) = self.file.as_mut() {
            match file.write_all(line) {
                Ok(()) => accepted = true,
                Err(e) => {
                    log::warn!("Recording file write failed, closing capture: {}", e);
                    self.file = None;
                }
            }
        }
        if let Some(echo) = self.echo.as_mut() {
            match echo.write_all(line) {
                Ok(()) => accepted = true,
                Err(e) => {
                    log::warn!("Recording echo write failed, disabling echo: {}", e);
                    self.echo = None;
                }
            }
        }
        if accepted {
            self.lines_written += 1;
        }
    }

    fn has_sinks(&self) -> bool {
        self.file.is_some() || self.echo.is_some()
    }

    /// Finish the file and flush the echo; both run, the first error wins.
    fn finish(mut self) -> Result<RecordingStats> {
        let file_result = self.file.take().map_or(Ok(()), FileSink::finish);
        let echo_result = self.echo.as_mut().map_or(Ok(()), |echo| echo.flush());
        let stats = RecordingStats {
            path: self.path,
            lines_written: self.lines_written,
            lines_filtered: self.lines_filtered,
        };
        file_result?;
        echo_result?;
        Ok(stats)
    }
}

/// Event recorder.
///
/// Writes each event as one protocol line stamped with elapsed seconds from
/// its clock. The same bytes go to the capture file and the echo stream, so
/// the two never disagree.
///
/// # Example
///
/// ```ignore
/// use smriti::recording::{CategoryMask, Recorder, RecordingSinks};
///
/// let mut recorder = Recorder::disabled();
/// recorder.configure(CategoryMask::default(), RecordingSinks::none().with_stdout());
/// recorder.on_event(&event);
/// let stats = recorder.close()?;
/// ```
pub struct Recorder {
    session: Option<RecordingSession>,
    /// Stats of a session that ended because every sink failed
    retired: Option<RecordingStats>,
    clock: Arc<dyn Clock>,
}

impl Recorder {
    /// Recorder with no sinks; every event is a no-op.
    pub fn disabled() -> Self {
        Self::with_clock(Arc::new(ProcessClock))
    }

    /// Disabled recorder stamping lines from `clock` once configured.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            session: None,
            retired: None,
            clock,
        }
    }

    /// Open the sinks named by `config`.
    ///
    /// A `.gz` path is written compressed. Fails with
    /// [`Error::SinkUnavailable`] if the capture file cannot be created.
    pub fn from_config(config: &RecordConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(ProcessClock))
    }

    pub fn from_config_with_clock(config: &RecordConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut sinks = RecordingSinks::none();

        if let Some(path) = config.path.as_ref() {
            let compressed = config.compressed();
            let sink = FileSink::create(path, compressed).map_err(|source| {
                Error::SinkUnavailable {
                    path: path.clone(),
                    source,
                }
            })?;
            log::info!(
                "Recording to '{}' Compression: {}",
                path.display(),
                compressed
            );
            sinks = sinks.with_file(path.clone(), sink);
        }

        if config.stdout {
            log::info!("Recording to stdout");
            sinks = sinks.with_stdout();
        }

        let mut recorder = Self::with_clock(clock);
        recorder.configure(CategoryMask::from(config), sinks);
        Ok(recorder)
    }

    /// Like [`Recorder::from_config`], but never fails.
    ///
    /// If the capture file cannot be opened, recording stays off entirely
    /// (no partial echo-only session) and the error is logged.
    pub fn install(config: &RecordConfig) -> Self {
        match Self::from_config(config) {
            Ok(recorder) => recorder,
            Err(e) => {
                log::error!("{}; recording disabled", e);
                Self::disabled()
            }
        }
    }

    /// Replace the mask and sinks.
    ///
    /// Any previous session is closed first. Empty sinks leave the recorder
    /// disabled.
    pub fn configure(&mut self, mask: CategoryMask, sinks: RecordingSinks) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close previous recording: {}", e);
        }
        if sinks.is_empty() {
            return;
        }

        let (path, file) = match sinks.file {
            Some((path, file)) => (Some(path), Some(file)),
            None => (None, None),
        };
        self.session = Some(RecordingSession {
            mask,
            file,
            path,
            echo: sinks.echo,
            lines_written: 0,
            lines_filtered: 0,
        });
    }

    /// Whether any sink is configured.
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// Current category mask, if recording.
    pub fn mask(&self) -> Option<CategoryMask> {
        self.session.as_ref().map(|session| session.mask)
    }

    /// Lines written so far in the current session.
    pub fn lines_written(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |session| session.lines_written)
    }

    /// Record a live event stamped with the current clock value.
    pub fn on_event(&mut self, event: &Event) {
        if self.session.is_none() {
            return;
        }
        let elapsed_secs = self.clock.elapsed_secs();
        self.record_at(event, elapsed_secs);
    }

    /// Record an event with an explicit elapsed time.
    ///
    /// Used when re-recording an existing capture, where the original
    /// timestamps must be kept.
    pub fn record_at(&mut self, event: &Event, elapsed_secs: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.mask.allows(event) {
            session.lines_filtered += 1;
            return;
        }
        let line = encode(event, elapsed_secs);
        session.write_line(line.as_bytes());

        if !session.has_sinks() {
            log::error!("Every recording sink failed; recording disabled");
            if let Some(session) = self.session.take() {
                match session.finish() {
                    Ok(stats) => self.retired = Some(stats),
                    Err(e) => log::warn!("Failed to close recording: {}", e),
                }
            }
        }
    }

    /// Flush and close all sinks.
    ///
    /// Safe to call repeatedly and on a recorder that never recorded;
    /// returns empty stats in that case. After every sink has failed, the
    /// first call returns the stats of the abandoned session.
    pub fn close(&mut self) -> Result<RecordingStats> {
        match self.session.take() {
            Some(session) => session.finish(),
            None => Ok(self.retired.take().unwrap_or_default()),
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close recording: {}", e);
        }
    }
}
