//! # Map Rangefinder
//!
//! Core engine for estimating real-world distances between locations on a
//! rendered map image, driven by a pixel-to-kilometer calibration.
//!
//! The crate covers the measurement core only: calibration, color-based
//! marker detection, distance computation and capture scheduling. Window
//! management, hotkey binding and all rendering belong to the host shell,
//! which talks to the core through [`RangefinderSession`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use map_rangefinder::{
//!     CaptureMode, FrameSource, PointerEvent, RangefinderSession, SessionConfig,
//! };
//!
//! # fn screen_grabber() -> Arc<dyn FrameSource> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Arc::new(RangefinderSession::new(
//!         screen_grabber(),
//!         SessionConfig::default(),
//!     ));
//!
//!     // Hotkey handler: start corner calibration, then forward clicks.
//!     let capture = {
//!         let session = Arc::clone(&session);
//!         tokio::spawn(async move { session.begin_capture(CaptureMode::Corners).await })
//!     };
//!     session.offer_point(PointerEvent::press(100, 50));
//!     session.offer_point(PointerEvent::press(1700, 850));
//!     let outcome = capture.await??;
//!     println!("calibrated: {:?}", outcome);
//!
//!     // Re-detect the marker every few seconds and render the distance.
//!     session.enable_auto_scan();
//!     let mut latest = session.latest();
//!     latest.changed().await?;
//!     if let Some(update) = *latest.borrow() {
//!         println!("distance: {}", update.measurement);
//!     }
//!     session.disable_auto_scan().await;
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod capture;
pub mod detect;
pub mod geometry;
pub mod logging;
pub mod measure;
pub mod session;
pub mod settings;

pub use calibration::{CalibrationError, CalibrationSummary, MapCalibration};
pub use capture::{CaptureError, CaptureRegion, FrameSource, PointerEvent};
pub use detect::{HsvRange, MarkerLocalizer, MarkerObservation};
pub use geometry::{pixel_distance, PixelPoint};
pub use measure::{measure_between, measure_from_center, Measurement, MeasurementUpdate};
pub use session::{
    CaptureMode, CaptureOutcome, DetectionReport, RangefinderSession, SessionConfig, SessionError,
    SessionEvent,
};
pub use settings::RangefinderSettings;
