//! Marker localization by color segmentation and connected regions.
//!
//! A captured frame is masked against the configured HSV range, the mask is
//! split into 8-connected foreground regions, and the centroid of the
//! largest region is taken as the marker position. Every failure mode here
//! is non-fatal: an empty mask or a zero-mass region both surface as
//! "no marker" to the caller.

use image::RgbImage;

use super::hsv::{rgb_to_hsv, HsvRange};
use crate::geometry::PixelPoint;

/// Outcome of one localization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerObservation {
    /// A marker region was found; `centroid` is relative to the frame origin.
    Found {
        centroid: PixelPoint,
        /// Region area in pixels.
        area: u32,
    },
    /// No pixel matched the color range.
    NotFound,
    /// The selected region had zero mass. Callers treat this like `NotFound`.
    DegenerateRegion,
}

impl MarkerObservation {
    /// Whether a marker was located.
    pub fn is_found(&self) -> bool {
        matches!(self, MarkerObservation::Found { .. })
    }

    /// The marker centroid, if one was found.
    pub fn centroid(&self) -> Option<PixelPoint> {
        match self {
            MarkerObservation::Found { centroid, .. } => Some(*centroid),
            _ => None,
        }
    }
}

/// Accumulated pixel mass of one connected region.
struct Region {
    area: u64,
    sum_x: u64,
    sum_y: u64,
    /// Row-major index of the first pixel encountered, used as a
    /// deterministic tie-break between equal-area regions.
    seed: usize,
}

/// Locates a distinctly colored marker in captured map frames.
#[derive(Debug, Clone)]
pub struct MarkerLocalizer {
    range: HsvRange,
}

impl Default for MarkerLocalizer {
    fn default() -> Self {
        Self::new(HsvRange::default())
    }
}

impl MarkerLocalizer {
    /// Create a localizer for the given color range.
    pub fn new(range: HsvRange) -> Self {
        Self { range }
    }

    /// The configured color range.
    pub fn range(&self) -> HsvRange {
        self.range
    }

    /// Locate the marker in a frame.
    ///
    /// Selects the largest 8-connected region of in-range pixels; when two
    /// regions have equal area, the one whose first pixel comes first in
    /// row-major scan order wins, so the result is deterministic.
    pub fn locate(&self, frame: &RgbImage) -> MarkerObservation {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return MarkerObservation::NotFound;
        }

        let mut mask = vec![false; (width * height) as usize];
        for (x, y, pixel) in frame.enumerate_pixels() {
            if self.range.contains(rgb_to_hsv(*pixel)) {
                mask[(y * width + x) as usize] = true;
            }
        }

        let mut visited = vec![false; mask.len()];
        let mut best: Option<Region> = None;
        for seed in 0..mask.len() {
            if !mask[seed] || visited[seed] {
                continue;
            }
            let region = flood_region(&mask, &mut visited, seed, width, height);
            let replace = match &best {
                None => true,
                // Strict comparison keeps the earlier seed on ties.
                Some(current) => region.area > current.area,
            };
            if replace {
                best = Some(region);
            }
        }

        let Some(region) = best else {
            return MarkerObservation::NotFound;
        };
        if region.area == 0 {
            return MarkerObservation::DegenerateRegion;
        }

        // First geometric moments; integer division truncates toward zero.
        let cx = (region.sum_x / region.area) as i32;
        let cy = (region.sum_y / region.area) as i32;
        tracing::debug!(
            cx,
            cy,
            area = region.area,
            seed = region.seed,
            "marker region selected"
        );
        MarkerObservation::Found {
            centroid: PixelPoint::new(cx, cy),
            area: region.area as u32,
        }
    }
}

/// Flood fill collecting one 8-connected region.
fn flood_region(
    mask: &[bool],
    visited: &mut [bool],
    seed: usize,
    width: u32,
    height: u32,
) -> Region {
    let mut region = Region {
        area: 0,
        sum_x: 0,
        sum_y: 0,
        seed,
    };
    let mut queue = vec![seed];
    visited[seed] = true;

    while let Some(index) = queue.pop() {
        let x = (index as u32 % width) as i64;
        let y = (index as u32 / width) as i64;
        region.area += 1;
        region.sum_x += x as u64;
        region.sum_y += y as u64;

        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let neighbor = (ny as u32 * width + nx as u32) as usize;
                if mask[neighbor] && !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push(neighbor);
                }
            }
        }
    }
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const MARKER: Rgb<u8> = Rgb([255, 255, 0]);
    const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

    fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, _| BACKGROUND)
    }

    #[test]
    fn test_blank_frame_is_not_found() {
        let localizer = MarkerLocalizer::default();
        assert_eq!(localizer.locate(&blank(64, 48)), MarkerObservation::NotFound);
    }

    #[test]
    fn test_empty_frame_is_not_found() {
        let localizer = MarkerLocalizer::default();
        let frame = RgbImage::new(0, 0);
        assert_eq!(localizer.locate(&frame), MarkerObservation::NotFound);
    }

    #[test]
    fn test_solid_square_centroid() {
        let mut frame = blank(100, 80);
        // 11x11 square centered at (45, 35).
        draw_filled_rect_mut(&mut frame, Rect::at(40, 30).of_size(11, 11), MARKER);

        let localizer = MarkerLocalizer::default();
        match localizer.locate(&frame) {
            MarkerObservation::Found { centroid, area } => {
                assert_eq!(centroid, PixelPoint::new(45, 35));
                assert_eq!(area, 121);
            }
            other => panic!("expected marker, got {:?}", other),
        }
    }

    #[test]
    fn test_single_pixel_is_found() {
        let mut frame = blank(30, 30);
        frame.put_pixel(7, 21, MARKER);

        let localizer = MarkerLocalizer::default();
        assert_eq!(
            localizer.locate(&frame).centroid(),
            Some(PixelPoint::new(7, 21))
        );
    }

    #[test]
    fn test_largest_region_wins() {
        let mut frame = blank(120, 120);
        draw_filled_rect_mut(&mut frame, Rect::at(10, 10).of_size(5, 5), MARKER);
        draw_filled_rect_mut(&mut frame, Rect::at(80, 80).of_size(15, 15), MARKER);

        let localizer = MarkerLocalizer::default();
        assert_eq!(
            localizer.locate(&frame).centroid(),
            Some(PixelPoint::new(87, 87))
        );
    }

    #[test]
    fn test_equal_area_tie_breaks_to_scan_order() {
        let mut frame = blank(100, 100);
        // Two 7x7 squares; the one whose first pixel comes first in
        // row-major order must win.
        draw_filled_rect_mut(&mut frame, Rect::at(60, 20).of_size(7, 7), MARKER);
        draw_filled_rect_mut(&mut frame, Rect::at(10, 70).of_size(7, 7), MARKER);

        let localizer = MarkerLocalizer::default();
        assert_eq!(
            localizer.locate(&frame).centroid(),
            Some(PixelPoint::new(63, 23))
        );
    }

    #[test]
    fn test_diagonal_pixels_form_one_region() {
        let mut frame = blank(20, 20);
        frame.put_pixel(5, 5, MARKER);
        frame.put_pixel(6, 6, MARKER);
        frame.put_pixel(7, 7, MARKER);

        let localizer = MarkerLocalizer::default();
        match localizer.locate(&frame) {
            MarkerObservation::Found { centroid, area } => {
                assert_eq!(area, 3);
                assert_eq!(centroid, PixelPoint::new(6, 6));
            }
            other => panic!("expected marker, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_range_ignores_default_marker() {
        // A red-tuned range must not see the yellow marker.
        let localizer = MarkerLocalizer::new(HsvRange::new([0, 100, 100], [10, 255, 255]));
        let mut frame = blank(50, 50);
        draw_filled_rect_mut(&mut frame, Rect::at(20, 20).of_size(9, 9), MARKER);
        assert_eq!(localizer.locate(&frame), MarkerObservation::NotFound);
    }
}
