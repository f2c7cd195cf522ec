//! Rangefinder session: shared state and capture scheduling.
//!
//! A session is shared between two actors: the foreground actor feeding
//! pointer events and one-shot commands, and the background scan task.
//! Both go through one [`SessionState`] critical section, so calibration
//! reads/writes and the capture flags can never be observed half-updated.

mod interactive;
mod scanner;

pub use interactive::{CaptureMode, CaptureOutcome};
pub use scanner::DetectionReport;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, Notify};

use crate::calibration::{CalibrationError, CalibrationSummary, MapCalibration};
use crate::capture::{CaptureError, FrameSource, PointerEvent};
use crate::detect::{HsvRange, MarkerLocalizer};
use crate::geometry::PixelPoint;
use crate::measure::MeasurementUpdate;
use crate::settings::RangefinderSettings;

use scanner::ScanTask;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Session errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The requested operation needs configured map corners.
    #[error("map corners are not configured")]
    NotConfigured,
    /// An interactive capture is already active; the new request is a no-op.
    #[error("an interactive capture is already active")]
    CaptureActive,
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// A capture/detect cycle overran its timeout.
    #[error("capture timed out")]
    Timeout,
}

/// Status events published for the shell to render.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent {
    /// An interactive point was accepted; `index` counts from 1.
    PointAccepted { mode: CaptureMode, index: usize },
    /// A manual-measure point fell outside the map and was rejected
    /// without consuming a slot.
    PointRejected { point: PixelPoint },
    CaptureCompleted { mode: CaptureMode },
    CaptureCancelled { mode: CaptureMode },
    /// A scan located the marker and measured its distance.
    Scan(MeasurementUpdate),
    /// A background scan found no usable marker (or its failure was
    /// swallowed, per the unattended-scan contract).
    ScanMiss,
}

/// Configuration for a rangefinder session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between background scan ticks.
    pub scan_interval: Duration,
    /// Timeout for one capture/detect cycle.
    pub capture_timeout: Duration,
    /// HSV range of the marker to detect.
    pub marker_range: HsvRange,
    /// Initial physical map size in kilometers.
    pub map_size_km: f64,
    /// Initial grid square size in kilometers.
    pub grid_size_km: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(3),
            capture_timeout: Duration::from_secs(2),
            marker_range: HsvRange::default(),
            map_size_km: 65.0,
            grid_size_km: 2.0,
        }
    }
}

impl SessionConfig {
    /// Build a config from persisted settings.
    pub fn from_settings(settings: &RangefinderSettings) -> Self {
        Self {
            scan_interval: Duration::from_secs(settings.scan_interval_secs.max(1)),
            capture_timeout: Duration::from_millis(settings.capture_timeout_ms.max(1)),
            marker_range: settings.marker_range,
            map_size_km: settings.map_size_km,
            grid_size_km: settings.grid_size_km,
        }
    }

    /// Set the scan interval.
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Set the capture timeout.
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Set the marker color range.
    pub fn with_marker_range(mut self, range: HsvRange) -> Self {
        self.marker_range = range;
        self
    }
}

/// State shared by the foreground and scan actors. Always accessed through
/// the session's single mutex.
pub(crate) struct SessionState {
    pub(crate) calibration: MapCalibration,
    /// An interactive capture is collecting points.
    pub(crate) measuring: bool,
    /// The background scan is enabled.
    pub(crate) auto_scan: bool,
}

/// Poison-recovering lock. None of the critical sections can leave state
/// half-written, so continuing after a poisoned lock is sound.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Feed and cancel signal of the currently active interactive capture.
pub(crate) struct ActiveCapture {
    pub(crate) points: mpsc::Sender<PixelPoint>,
    /// Observed with priority over buffered points, so a cancel wins even
    /// when enough points are already queued to complete the capture.
    pub(crate) cancel: Arc<Notify>,
}

/// An in-memory rangefinding session over one calibrated map region.
///
/// Owns the calibration, the interactive point capture and the periodic
/// scan task. All state is session-scoped; nothing is persisted.
pub struct RangefinderSession {
    state: Arc<Mutex<SessionState>>,
    frames: Arc<dyn FrameSource>,
    localizer: MarkerLocalizer,
    config: SessionConfig,
    active_capture: Mutex<Option<ActiveCapture>>,
    scan_task: Mutex<Option<ScanTask>>,
    updates_tx: watch::Sender<Option<MeasurementUpdate>>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl RangefinderSession {
    /// Create a session over the given frame source.
    pub fn new(frames: Arc<dyn FrameSource>, config: SessionConfig) -> Self {
        let mut calibration = MapCalibration::new();
        if calibration.set_map_size_km(config.map_size_km).is_err() {
            tracing::warn!(
                map_size_km = config.map_size_km,
                "ignoring invalid configured map size"
            );
        }
        if calibration.set_grid_size_km(config.grid_size_km).is_err() {
            tracing::warn!(
                grid_size_km = config.grid_size_km,
                "ignoring invalid configured grid size"
            );
        }

        let (updates_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(SessionState {
                calibration,
                measuring: false,
                auto_scan: false,
            })),
            localizer: MarkerLocalizer::new(config.marker_range),
            frames,
            config,
            active_capture: Mutex::new(None),
            scan_task: Mutex::new(None),
            updates_tx,
            events_tx,
        }
    }

    /// Feed a pointer event from the shell.
    ///
    /// Release events and events arriving while no interactive capture is
    /// active are discarded.
    pub fn offer_point(&self, event: PointerEvent) {
        if !event.pressed {
            return;
        }
        let active = lock(&self.active_capture);
        match active.as_ref() {
            Some(capture) => {
                if capture.points.try_send(event.point()).is_err() {
                    tracing::debug!("pointer event dropped: capture closing or buffer full");
                }
            }
            None => tracing::debug!("pointer event ignored: no capture active"),
        }
    }

    /// Cancel any active interactive capture.
    ///
    /// The waiting [`RangefinderSession::begin_capture`] call resolves
    /// promptly with [`CaptureOutcome::Cancelled`], discarding buffered
    /// points: the cancel signal is observed before any queued point, so a
    /// capture can never complete once this has been called. A no-op when
    /// nothing is active.
    pub fn cancel_capture(&self) {
        if let Some(capture) = lock(&self.active_capture).take() {
            capture.cancel.notify_one();
            tracing::info!("interactive capture cancel requested");
        }
    }

    /// Whether an interactive capture is collecting points.
    pub fn is_measuring(&self) -> bool {
        lock(&self.state).measuring
    }

    /// Whether the background scan is enabled.
    pub fn auto_scan_enabled(&self) -> bool {
        lock(&self.state).auto_scan
    }

    /// Whether map corners are configured.
    pub fn is_configured(&self) -> bool {
        lock(&self.state).calibration.is_configured()
    }

    /// Overwrite the physical map size. Re-validates positivity even when
    /// the shell already parsed the value.
    pub fn set_map_size_km(&self, value: f64) -> Result<(), CalibrationError> {
        lock(&self.state).calibration.set_map_size_km(value)
    }

    /// Overwrite the physical grid square size.
    pub fn set_grid_size_km(&self, value: f64) -> Result<(), CalibrationError> {
        lock(&self.state).calibration.set_grid_size_km(value)
    }

    /// Current calibration state for status rendering.
    pub fn calibration_summary(&self) -> CalibrationSummary {
        lock(&self.state).calibration.summary()
    }

    /// Watch the most recent measurement, updated by scans and manual
    /// measurements alike.
    pub fn latest(&self) -> watch::Receiver<Option<MeasurementUpdate>> {
        self.updates_tx.subscribe()
    }

    /// Subscribe to status events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }

    pub(crate) fn publish_update(&self, update: MeasurementUpdate) {
        let _ = self.updates_tx.send(Some(update));
    }
}
