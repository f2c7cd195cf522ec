//! Shared pixel-space geometry types.

use serde::{Deserialize, Serialize};

/// A point in screen pixel coordinates.
///
/// The origin is at the top-left of the screen, X increases rightward,
/// Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    /// Create a new point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points, in pixels.
pub fn pixel_distance(a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_axis_aligned() {
        let a = PixelPoint::new(100, 100);
        let b = PixelPoint::new(100, 850);
        assert_relative_eq!(pixel_distance(a, b), 750.0);
    }

    #[test]
    fn test_distance_diagonal() {
        let a = PixelPoint::new(0, 0);
        let b = PixelPoint::new(3, 4);
        assert_relative_eq!(pixel_distance(a, b), 5.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = PixelPoint::new(-10, 20);
        let b = PixelPoint::new(35, -7);
        assert_relative_eq!(pixel_distance(a, b), pixel_distance(b, a));
    }
}
