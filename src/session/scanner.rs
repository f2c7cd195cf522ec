//! Periodic marker scanning and one-shot detection.
//!
//! The scan loop is a supervised task: it ticks at a fixed interval,
//! observes a stop signal inside the same `select!`, and is awaited on
//! shutdown, so disabling the scan tears it down within one bounded wait.
//! Unattended scan failures are swallowed into a "no marker" outcome;
//! the one-shot [`RangefinderSession::detect_marker`] surfaces them
//! verbatim instead.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::capture::{CaptureError, FrameSource};
use crate::detect::{MarkerLocalizer, MarkerObservation};
use crate::measure::{measure_from_center, Measurement, MeasurementUpdate};

use super::{lock, RangefinderSession, SessionError, SessionEvent, SessionState};

/// Result of one capture/detect cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionReport {
    pub observation: MarkerObservation,
    /// Distance from the map center, when a marker was found.
    pub measurement: Option<Measurement>,
}

/// Handle to the running scan loop.
pub(super) struct ScanTask {
    handle: JoinHandle<()>,
    stop: Arc<Notify>,
}

/// Everything the scan loop needs, detached from the session so the task
/// owns its own clones.
struct ScanWorker {
    state: Arc<Mutex<SessionState>>,
    frames: Arc<dyn FrameSource>,
    localizer: MarkerLocalizer,
    capture_timeout: Duration,
    updates_tx: watch::Sender<Option<MeasurementUpdate>>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl ScanWorker {
    async fn run(self, scan_interval: Duration, stop: Arc<Notify>) {
        let mut ticker = interval(scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(interval_ms = scan_interval.as_millis() as u64, "auto-scan started");

        loop {
            tokio::select! {
                _ = stop.notified() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        tracing::info!("auto-scan stopped");
    }

    async fn tick(&self) {
        match scan_cycle(
            &self.state,
            &self.frames,
            &self.localizer,
            self.capture_timeout,
            true,
        )
        .await
        {
            Ok(report) => {
                // A capture may have started while the frame was in flight;
                // its result must not clobber the interactive state.
                if lock(&self.state).measuring {
                    tracing::debug!("scan result discarded: capture started mid-cycle");
                    return;
                }
                match (report.observation.centroid(), report.measurement) {
                    (Some(centroid), Some(measurement)) => {
                        let update = MeasurementUpdate {
                            measurement,
                            marker: Some(centroid),
                            observed_at: Local::now(),
                        };
                        tracing::debug!(%measurement, ?centroid, "scan located marker");
                        let _ = self.updates_tx.send(Some(update));
                        let _ = self.events_tx.send(SessionEvent::Scan(update));
                    }
                    _ => {
                        tracing::debug!("scan found no marker");
                        let _ = self.events_tx.send(SessionEvent::ScanMiss);
                    }
                }
            }
            // Not a failure: the scan is waiting for corners or yielding to
            // an interactive capture.
            Err(SessionError::NotConfigured) | Err(SessionError::CaptureActive) => {
                tracing::debug!("scan tick skipped");
            }
            // Unattended failures are non-fatal and surface as a miss.
            Err(e) => {
                tracing::warn!(error = %e, "scan cycle failed");
                let _ = self.events_tx.send(SessionEvent::ScanMiss);
            }
        }
    }
}

/// One capture/detect/measure cycle against a consistent calibration
/// snapshot. The frame source runs on the blocking pool under a timeout;
/// an overrun becomes [`SessionError::Timeout`].
///
/// With `yield_to_capture` the cycle bails out with
/// [`SessionError::CaptureActive`] when an interactive capture holds the
/// session; the check shares the snapshot critical section, so a capture
/// cannot slip in between the two.
async fn scan_cycle(
    state: &Arc<Mutex<SessionState>>,
    frames: &Arc<dyn FrameSource>,
    localizer: &MarkerLocalizer,
    capture_timeout: Duration,
    yield_to_capture: bool,
) -> Result<DetectionReport, SessionError> {
    let (region, calibration) = {
        let st = lock(state);
        if yield_to_capture && st.measuring {
            return Err(SessionError::CaptureActive);
        }
        match st.calibration.region() {
            Some(region) => (region, st.calibration.clone()),
            None => return Err(SessionError::NotConfigured),
        }
    };

    let source = Arc::clone(frames);
    let frame = tokio::time::timeout(
        capture_timeout,
        tokio::task::spawn_blocking(move || source.capture(&region)),
    )
    .await
    .map_err(|_| SessionError::Timeout)?
    .map_err(|e| SessionError::Capture(CaptureError::Failed(e.to_string())))??;

    let observation = localizer.locate(&frame);
    let measurement = observation
        .centroid()
        .map(|centroid| measure_from_center(centroid, &calibration));
    Ok(DetectionReport {
        observation,
        measurement,
    })
}

impl RangefinderSession {
    /// Enable the periodic background scan. Idempotent: enabling an already
    /// running scan changes nothing.
    pub fn enable_auto_scan(&self) {
        let mut slot = lock(&self.scan_task);
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            tracing::debug!("auto-scan already enabled");
            return;
        }
        self.state().auto_scan = true;

        let stop = Arc::new(Notify::new());
        let worker = ScanWorker {
            state: Arc::clone(&self.state),
            frames: Arc::clone(&self.frames),
            localizer: self.localizer.clone(),
            capture_timeout: self.config.capture_timeout,
            updates_tx: self.updates_tx.clone(),
            events_tx: self.events_tx.clone(),
        };
        let handle = tokio::spawn(worker.run(self.config.scan_interval, Arc::clone(&stop)));
        *slot = Some(ScanTask { handle, stop });
    }

    /// Disable the background scan and wait for the loop to terminate.
    ///
    /// The stop signal is awaited inside the loop's `select!`, so teardown
    /// completes within one tick even when a cycle is in flight. Idempotent.
    pub async fn disable_auto_scan(&self) {
        let task = lock(&self.scan_task).take();
        let Some(task) = task else {
            tracing::debug!("auto-scan already disabled");
            return;
        };
        self.state().auto_scan = false;
        task.stop.notify_one();
        if task.handle.await.is_err() {
            tracing::warn!("auto-scan task panicked during shutdown");
        }
    }

    /// Run one explicit capture/detect cycle.
    ///
    /// Unlike the background scan, every failure is surfaced verbatim to
    /// the caller: missing calibration, capture errors, and timeouts all
    /// return as typed errors rather than being swallowed.
    pub async fn detect_marker(&self) -> Result<DetectionReport, SessionError> {
        let report = scan_cycle(
            &self.state,
            &self.frames,
            &self.localizer,
            self.config.capture_timeout,
            false,
        )
        .await?;

        match (report.observation.centroid(), report.measurement) {
            (Some(centroid), Some(measurement)) => {
                let update = MeasurementUpdate {
                    measurement,
                    marker: Some(centroid),
                    observed_at: Local::now(),
                };
                tracing::info!(%measurement, ?centroid, "marker detected");
                self.publish_update(update);
                self.emit(SessionEvent::Scan(update));
            }
            _ => tracing::info!(observation = ?report.observation, "no marker detected"),
        }
        Ok(report)
    }
}
