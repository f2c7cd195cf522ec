//! Interactive N-point capture.
//!
//! A capture is an awaited call, not a registered callback: the caller
//! awaits [`RangefinderSession::begin_capture`], the shell feeds pointer
//! events through [`RangefinderSession::offer_point`], and the call resolves
//! once enough points arrived, or promptly on cancellation.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, Notify};

use crate::calibration::CalibrationSummary;
use crate::geometry::{pixel_distance, PixelPoint};
use crate::measure::{measure_between, Measurement, MeasurementUpdate};

use super::{lock, ActiveCapture, RangefinderSession, SessionError, SessionEvent};

/// What an interactive capture is collecting points for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Map corner setup: top-left, then bottom-right.
    Corners,
    /// Two adjacent grid corners, to measure one grid square edge.
    GridEdge,
    /// Two arbitrary points inside the map, measured directly.
    ManualMeasure,
}

impl CaptureMode {
    /// Number of points the mode collects.
    pub const fn required_points(self) -> usize {
        2
    }

    fn requires_configured(self) -> bool {
        matches!(self, CaptureMode::ManualMeasure)
    }
}

/// Result of a completed interactive capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureOutcome {
    /// Corners were set; carries the resulting calibration state.
    Configured(CalibrationSummary),
    /// A grid edge was measured.
    GridMeasured {
        /// Measured edge length in pixels.
        pixel_size: f64,
        /// Map size derived from the measurement, when corners exist.
        map_size_km: Option<f64>,
    },
    /// A manual two-point measurement completed.
    Measured(Measurement),
    /// The capture was cancelled; no state changed.
    Cancelled,
}

/// Clears the capture flags when the capture future finishes or is dropped.
struct CaptureGuard<'a> {
    session: &'a RangefinderSession,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        lock(&self.session.active_capture).take();
        self.session.state().measuring = false;
    }
}

impl RangefinderSession {
    /// Start an interactive capture and wait for it to finish.
    ///
    /// Returns [`SessionError::CaptureActive`] when another capture is
    /// already collecting points (the call is a no-op: no state changes).
    /// [`CaptureMode::ManualMeasure`] additionally requires configured
    /// corners and validates every point against the map bounds, rejecting
    /// out-of-bounds points without consuming a slot.
    pub async fn begin_capture(&self, mode: CaptureMode) -> Result<CaptureOutcome, SessionError> {
        let (tx, mut rx) = mpsc::channel::<PixelPoint>(mode.required_points() * 4);
        let cancelled = Arc::new(Notify::new());
        {
            // Lock order: state, then active_capture.
            let mut st = self.state();
            if st.measuring {
                tracing::debug!(?mode, "capture request ignored: already measuring");
                return Err(SessionError::CaptureActive);
            }
            if mode.requires_configured() && !st.calibration.is_configured() {
                return Err(SessionError::NotConfigured);
            }
            st.measuring = true;
            *lock(&self.active_capture) = Some(ActiveCapture {
                points: tx,
                cancel: Arc::clone(&cancelled),
            });
        }
        let _guard = CaptureGuard { session: self };
        tracing::info!(?mode, "interactive capture started");

        let mut points: Vec<PixelPoint> = Vec::with_capacity(mode.required_points());
        loop {
            let received = tokio::select! {
                biased;
                // The cancel signal outranks points already sitting in the
                // channel; a cancel must never lose to a queued click.
                _ = cancelled.notified() => None,
                point = rx.recv() => point,
            };
            let Some(point) = received else {
                // Cancelled by the shell, or the feed was torn down.
                tracing::info!(?mode, "interactive capture cancelled");
                self.emit(SessionEvent::CaptureCancelled { mode });
                return Ok(CaptureOutcome::Cancelled);
            };

            if mode == CaptureMode::ManualMeasure && !self.state().calibration.contains(point) {
                tracing::warn!(?point, "point outside map bounds rejected");
                self.emit(SessionEvent::PointRejected { point });
                continue;
            }

            points.push(point);
            self.emit(SessionEvent::PointAccepted {
                mode,
                index: points.len(),
            });
            if points.len() == mode.required_points() {
                break;
            }
        }

        let outcome = self.finalize(mode, &points)?;
        self.emit(SessionEvent::CaptureCompleted { mode });
        Ok(outcome)
    }

    fn finalize(
        &self,
        mode: CaptureMode,
        points: &[PixelPoint],
    ) -> Result<CaptureOutcome, SessionError> {
        let mut st = self.state();
        match mode {
            CaptureMode::Corners => {
                st.calibration.set_corners(points[0], points[1])?;
                let summary = st.calibration.summary();
                tracing::info!(
                    width = summary.width,
                    height = summary.height,
                    map_size_km = summary.map_size_km,
                    "map corners configured"
                );
                Ok(CaptureOutcome::Configured(summary))
            }
            CaptureMode::GridEdge => {
                let pixel_size = pixel_distance(points[0], points[1]);
                st.calibration.set_grid_measurement(pixel_size)?;
                let map_size_km = st.calibration.auto_map_size_km();
                tracing::info!(pixel_size, ?map_size_km, "grid square measured");
                Ok(CaptureOutcome::GridMeasured {
                    pixel_size,
                    map_size_km,
                })
            }
            CaptureMode::ManualMeasure => {
                let measurement = measure_between(points[0], points[1], &st.calibration);
                drop(st);
                tracing::info!(%measurement, "manual measurement completed");
                self.publish_update(MeasurementUpdate {
                    measurement,
                    marker: None,
                    observed_at: Local::now(),
                });
                Ok(CaptureOutcome::Measured(measurement))
            }
        }
    }
}
