//! Calibration model tying a screen rectangle to a physical map size.
//!
//! The model holds the pixel rectangle covering the rendered map and the
//! physical size it spans. The scale can be set directly or derived from a
//! measured grid square: once both corners and a grid measurement exist, the
//! map size is recomputed automatically, regardless of which was set last.

use serde::Serialize;
use thiserror::Error;

use crate::capture::CaptureRegion;
use crate::geometry::PixelPoint;

/// Calibration errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// The map rectangle is empty or inverted.
    #[error("map region is degenerate or inverted")]
    InvalidRegion,
    /// A grid measurement was not a positive pixel distance.
    #[error("grid measurement must be a positive pixel distance")]
    InvalidMeasurement,
    /// A user-supplied size was not a positive number.
    #[error("value must be a positive number")]
    InvalidParameter,
}

/// Compact calibration state for status rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationSummary {
    /// Map width in pixels (0 when unconfigured).
    pub width: i32,
    /// Map height in pixels (0 when unconfigured).
    pub height: i32,
    /// Physical map size in kilometers.
    pub map_size_km: f64,
    /// Whether a grid square has been measured.
    pub grid_measured: bool,
}

/// Configuration for map measurements.
///
/// Lives for one session only; nothing is persisted across runs.
#[derive(Debug, Clone)]
pub struct MapCalibration {
    top_left: Option<PixelPoint>,
    bottom_right: Option<PixelPoint>,
    map_size_km: f64,
    grid_size_km: f64,
    grid_pixel_size: Option<f64>,
}

impl Default for MapCalibration {
    fn default() -> Self {
        Self {
            top_left: None,
            bottom_right: None,
            map_size_km: 65.0,
            grid_size_km: 2.0,
            grid_pixel_size: None,
        }
    }
}

impl MapCalibration {
    /// Create an empty calibration with the default sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both map corners have been set.
    pub fn is_configured(&self) -> bool {
        self.top_left.is_some() && self.bottom_right.is_some()
    }

    /// Whether a grid square has been measured.
    pub fn is_grid_measured(&self) -> bool {
        self.grid_pixel_size.is_some()
    }

    /// Map width in pixels. Zero when unconfigured.
    pub fn width(&self) -> i32 {
        match (self.top_left, self.bottom_right) {
            (Some(tl), Some(br)) => br.x - tl.x,
            _ => 0,
        }
    }

    /// Map height in pixels. Zero when unconfigured.
    pub fn height(&self) -> i32 {
        match (self.top_left, self.bottom_right) {
            (Some(tl), Some(br)) => br.y - tl.y,
            _ => 0,
        }
    }

    /// Top-left corner, if set.
    pub fn top_left(&self) -> Option<PixelPoint> {
        self.top_left
    }

    /// Bottom-right corner, if set.
    pub fn bottom_right(&self) -> Option<PixelPoint> {
        self.bottom_right
    }

    /// Physical map size in kilometers.
    pub fn map_size_km(&self) -> f64 {
        self.map_size_km
    }

    /// Physical size of one grid square in kilometers.
    pub fn grid_size_km(&self) -> f64 {
        self.grid_size_km
    }

    /// Measured pixel length of one grid square edge, if set.
    pub fn grid_pixel_size(&self) -> Option<f64> {
        self.grid_pixel_size
    }

    /// Average of width and height, the dimension used for scale conversion.
    pub fn average_dimension(&self) -> f64 {
        (self.width() + self.height()) as f64 / 2.0
    }

    /// Set both map corners atomically.
    ///
    /// Fails with `InvalidRegion` unless `bottom_right` is strictly greater
    /// than `top_left` on both axes; on failure the previous corners are kept.
    /// When a grid measurement already exists, the map size is recomputed from
    /// it as a side effect.
    pub fn set_corners(
        &mut self,
        top_left: PixelPoint,
        bottom_right: PixelPoint,
    ) -> Result<(), CalibrationError> {
        if bottom_right.x <= top_left.x || bottom_right.y <= top_left.y {
            return Err(CalibrationError::InvalidRegion);
        }
        self.top_left = Some(top_left);
        self.bottom_right = Some(bottom_right);
        self.apply_auto_map_size();
        Ok(())
    }

    /// Store the measured pixel length of one grid square edge.
    ///
    /// When the corners are already configured, the map size is recomputed
    /// immediately, so grid and corner calibration can run in either order.
    pub fn set_grid_measurement(&mut self, pixel_distance: f64) -> Result<(), CalibrationError> {
        if !pixel_distance.is_finite() || pixel_distance <= 0.0 {
            return Err(CalibrationError::InvalidMeasurement);
        }
        self.grid_pixel_size = Some(pixel_distance);
        self.apply_auto_map_size();
        Ok(())
    }

    /// Overwrite the physical map size.
    pub fn set_map_size_km(&mut self, value: f64) -> Result<(), CalibrationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CalibrationError::InvalidParameter);
        }
        self.map_size_km = value;
        Ok(())
    }

    /// Overwrite the physical grid square size.
    pub fn set_grid_size_km(&mut self, value: f64) -> Result<(), CalibrationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CalibrationError::InvalidParameter);
        }
        self.grid_size_km = value;
        Ok(())
    }

    /// Convert a pixel distance to kilometers.
    ///
    /// Returns `0.0` when the map is not configured. This is a deliberate
    /// no-op contract: callers that need to tell "zero distance" apart from
    /// "uncalibrated" must check [`MapCalibration::is_configured`] first.
    pub fn pixels_to_km(&self, pixel_distance: f64) -> f64 {
        if !self.is_configured() {
            return 0.0;
        }
        pixel_distance / self.average_dimension() * self.map_size_km
    }

    /// Map size derived from the grid measurement.
    ///
    /// `None` unless both corners and a grid measurement are set.
    pub fn auto_map_size_km(&self) -> Option<f64> {
        if !self.is_configured() {
            return None;
        }
        let grid_pixel_size = self.grid_pixel_size?;
        Some(self.average_dimension() / grid_pixel_size * self.grid_size_km)
    }

    fn apply_auto_map_size(&mut self) {
        if let Some(km) = self.auto_map_size_km() {
            tracing::info!(map_size_km = km, "map size derived from grid measurement");
            self.map_size_km = km;
        }
    }

    /// Whether a point lies within the map rectangle, bounds inclusive.
    ///
    /// `false` when unconfigured.
    pub fn contains(&self, point: PixelPoint) -> bool {
        match (self.top_left, self.bottom_right) {
            (Some(tl), Some(br)) => {
                tl.x <= point.x && point.x <= br.x && tl.y <= point.y && point.y <= br.y
            }
            _ => false,
        }
    }

    /// Geometric center of the map in region-relative coordinates,
    /// integer-truncated. This is the assumed observer position.
    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.width() / 2, self.height() / 2)
    }

    /// The screen region to capture for marker detection.
    ///
    /// `None` when unconfigured.
    pub fn region(&self) -> Option<CaptureRegion> {
        let (tl, _br) = (self.top_left?, self.bottom_right?);
        Some(CaptureRegion {
            origin: tl,
            width: self.width() as u32,
            height: self.height() as u32,
        })
    }

    /// Compact state for status rendering.
    pub fn summary(&self) -> CalibrationSummary {
        CalibrationSummary {
            width: self.width(),
            height: self.height(),
            map_size_km: self.map_size_km,
            grid_measured: self.is_grid_measured(),
        }
    }
}
