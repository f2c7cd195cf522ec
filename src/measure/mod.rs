//! Distance measurement and presentation.
//!
//! Pixel distances are mapped to physical distances through the calibration
//! and formatted as kilometers with two decimals at or above 1000 m, whole
//! truncated meters below.

use std::fmt;

use chrono::{DateTime, Local};

use crate::calibration::MapCalibration;
use crate::geometry::{pixel_distance, PixelPoint};

/// A physical distance produced by one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Distance in meters.
    pub meters: f64,
}

impl Measurement {
    /// Distance in kilometers.
    pub fn kilometers(&self) -> f64 {
        self.meters / 1000.0
    }

    /// The formatted presentation: `"<d.dd> km"` at or above 1000 m,
    /// otherwise `"<n> m"` with meters truncated toward zero.
    pub fn format(&self) -> String {
        if self.meters >= 1000.0 {
            format!("{:.2} km", self.kilometers())
        } else {
            format!("{} m", self.meters as i64)
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// A published measurement with its provenance, as rendered by the shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementUpdate {
    pub measurement: Measurement,
    /// Detected marker centroid for scan results; `None` for manual
    /// two-point measurements.
    pub marker: Option<PixelPoint>,
    pub observed_at: DateTime<Local>,
}

/// Measure the physical distance between two screen points.
///
/// Uses the calibration's no-op contract: an unconfigured calibration yields
/// a zero-meter measurement.
pub fn measure_between(p1: PixelPoint, p2: PixelPoint, calibration: &MapCalibration) -> Measurement {
    let km = calibration.pixels_to_km(pixel_distance(p1, p2));
    Measurement { meters: km * 1000.0 }
}

/// Measure the distance from the map center to a detected marker.
///
/// The observer is assumed to sit at the map's geometric center; both the
/// marker and the center are in region-relative coordinates.
pub fn measure_from_center(marker: PixelPoint, calibration: &MapCalibration) -> Measurement {
    measure_between(calibration.center(), marker, calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn calibration() -> MapCalibration {
        let mut cal = MapCalibration::new();
        cal.set_corners(PixelPoint::new(0, 0), PixelPoint::new(1000, 500))
            .unwrap();
        cal.set_map_size_km(60.0).unwrap();
        cal
    }

    #[test]
    fn test_format_kilometer_boundary() {
        assert_eq!(Measurement { meters: 1000.0 }.format(), "1.00 km");
        assert_eq!(Measurement { meters: 999.0 }.format(), "999 m");
    }

    #[test]
    fn test_format_truncates_meters() {
        assert_eq!(Measurement { meters: 999.9 }.format(), "999 m");
        assert_eq!(Measurement { meters: 0.4 }.format(), "0 m");
    }

    #[test]
    fn test_format_kilometers_two_decimals() {
        assert_eq!(Measurement { meters: 12340.0 }.format(), "12.34 km");
        assert_eq!(Measurement { meters: 60000.0 }.format(), "60.00 km");
    }

    #[test]
    fn test_two_point_measurement_example() {
        // Worked example: 750 px across a 750 px average dimension of a
        // 60 km map.
        let m = measure_between(
            PixelPoint::new(100, 100),
            PixelPoint::new(100, 850),
            &calibration(),
        );
        assert_relative_eq!(m.meters, 60_000.0);
        assert_eq!(m.format(), "60.00 km");
    }

    #[test]
    fn test_unconfigured_measures_zero() {
        let cal = MapCalibration::new();
        let m = measure_between(PixelPoint::new(0, 0), PixelPoint::new(300, 400), &cal);
        assert_relative_eq!(m.meters, 0.0);
        assert_eq!(m.format(), "0 m");
    }

    #[test]
    fn test_marker_from_center() {
        // Center is (500, 250); a marker 125 px to the right is one sixth of
        // the 750 px average dimension: 10 km.
        let m = measure_from_center(PixelPoint::new(625, 250), &calibration());
        assert_relative_eq!(m.meters, 10_000.0);
        assert_eq!(m.format(), "10.00 km");
    }

    #[test]
    fn test_marker_at_center_is_zero() {
        let cal = calibration();
        let m = measure_from_center(cal.center(), &cal);
        assert_relative_eq!(m.meters, 0.0);
    }
}
