//! Color-based marker detection on captured map frames.

mod hsv;
mod localizer;

pub use hsv::{rgb_to_hsv, Hsv, HsvRange};
pub use localizer::{MarkerLocalizer, MarkerObservation};
