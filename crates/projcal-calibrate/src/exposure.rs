//! Exposure search.
//!
//! Finds a camera exposure that puts the mean luminance of the frame center
//! in a mid-tone window, so later brackets are centered on usable data.

use crate::camera::Camera;
use crate::{CalibrationError, CalibrationResult};
use projcal_core::Rect;
use tracing::{debug, info};

/// Lowest acceptable mean luminance (8-bit code units).
pub const TARGET_LOW: f32 = 100.0;

/// Highest acceptable mean luminance (8-bit code units).
pub const TARGET_HIGH: f32 = 160.0;

/// Smallest exposure change per step.
pub const MIN_STEP_FACTOR: f32 = 1.5;

/// Captures one frame and returns the mean luminance of its central square.
pub(crate) fn measure_center(camera: &mut dyn Camera) -> CalibrationResult<f32> {
    camera
        .capture()
        .map_err(|e| CalibrationError::CaptureFailure {
            stage: "exposure",
            reason: e.to_string(),
        })?;
    let frame = camera
        .decode_last_capture()
        .map_err(|e| CalibrationError::CaptureFailure {
            stage: "exposure",
            reason: e.to_string(),
        })?;
    let roi = Rect::centered_square(frame.width(), frame.height(), frame.width() / 5);
    Ok(frame.mean_luminance(roi))
}

/// Adjusts the camera exposure until the frame center is mid-gray.
///
/// Returns the exposure left on the camera. Each step scales by at least
/// [`MIN_STEP_FACTOR`], more when the mean is far from the window.
pub fn find_exposure(camera: &mut dyn Camera, max_iterations: usize) -> CalibrationResult<f32> {
    for iteration in 0..max_iterations {
        let mean = measure_center(camera)?;
        let exposure = camera.exposure();
        debug!(iteration, exposure, mean, "exposure step");

        if (TARGET_LOW..=TARGET_HIGH).contains(&mean) {
            info!(exposure, mean, "exposure found");
            return Ok(exposure);
        }

        let mean = mean.max(1.0);
        let next = if mean < TARGET_LOW {
            exposure * MIN_STEP_FACTOR.max(TARGET_LOW / mean)
        } else {
            exposure / MIN_STEP_FACTOR.max(TARGET_HIGH / mean)
        };
        camera.set_exposure(next);
    }

    Err(CalibrationError::ConvergenceFailure {
        stage: "exposure",
        iterations: max_iterations,
    })
}
