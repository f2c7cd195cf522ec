//! Map calibration module: mapping a screen rectangle to physical distances.

mod model;

pub use model::{CalibrationError, CalibrationSummary, MapCalibration};
