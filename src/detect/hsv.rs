//! Hue-saturation-value color space helpers.
//!
//! Channels use the OpenCV byte scale (`h` in `0..=180`, `s` and `v` in
//! `0..=255`) so color ranges tuned against OpenCV-based tooling carry over
//! unchanged.

use image::Rgb;
use serde::{Deserialize, Serialize};

/// An HSV triple: `[hue, saturation, value]`.
pub type Hsv = [f32; 3];

/// Convert an RGB pixel to HSV on the OpenCV scale.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> Hsv {
    let r = pixel[0] as f32 / 255.0;
    let g = pixel[1] as f32 / 255.0;
    let b = pixel[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        60.0 * ((g - b) / delta % 6.0)
    } else if (max - g).abs() < f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    let h = h_deg / 2.0;
    let s = if max == 0.0 { 0.0 } else { delta / max } * 255.0;
    let v = max * 255.0;
    [h, s, v]
}

/// An inclusive HSV color range used to segment marker pixels.
///
/// The default is tuned for the saturated yellow squad marker, but the range
/// is an ordinary parameter: a range that matches nothing simply yields
/// "no marker found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Lower bound, `[h, s, v]`.
    pub lower: [u8; 3],
    /// Upper bound, `[h, s, v]`.
    pub upper: [u8; 3],
}

impl Default for HsvRange {
    fn default() -> Self {
        Self {
            lower: [20, 100, 100],
            upper: [35, 255, 255],
        }
    }
}

impl HsvRange {
    /// Create a range from explicit bounds.
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Whether an HSV triple falls inside the range, bounds inclusive on all
    /// three channels.
    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|i| self.lower[i] as f32 <= hsv[i] && hsv[i] <= self.upper[i] as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pure_yellow() {
        let [h, s, v] = rgb_to_hsv(Rgb([255, 255, 0]));
        assert_relative_eq!(h, 30.0);
        assert_relative_eq!(s, 255.0);
        assert_relative_eq!(v, 255.0);
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let [h, s, _v] = rgb_to_hsv(Rgb([40, 40, 40]));
        assert_relative_eq!(h, 0.0);
        assert_relative_eq!(s, 0.0);
    }

    #[test]
    fn test_pure_blue_hue() {
        let [h, ..] = rgb_to_hsv(Rgb([0, 0, 255]));
        assert_relative_eq!(h, 120.0);
    }

    #[test]
    fn test_default_range_matches_marker_yellow() {
        let range = HsvRange::default();
        assert!(range.contains(rgb_to_hsv(Rgb([255, 255, 0]))));
        assert!(range.contains(rgb_to_hsv(Rgb([255, 220, 0]))));
        assert!(!range.contains(rgb_to_hsv(Rgb([40, 40, 40]))));
        assert!(!range.contains(rgb_to_hsv(Rgb([0, 0, 255]))));
        // Washed-out yellow is below the saturation floor.
        assert!(!range.contains(rgb_to_hsv(Rgb([255, 255, 220]))));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = HsvRange::new([10, 0, 0], [20, 255, 255]);
        assert!(range.contains([10.0, 0.0, 0.0]));
        assert!(range.contains([20.0, 255.0, 255.0]));
        assert!(!range.contains([20.5, 0.0, 0.0]));
        assert!(!range.contains([9.5, 0.0, 0.0]));
    }
}
