//! Bracketed HDR capture.
//!
//! Captures `count` frames centered on the camera's current exposure,
//! `step` stops apart, then merges them into a radiance image through the
//! cached camera response. When the cache is empty the response is first
//! estimated from the same brackets.

use crate::cache::ResponseCache;
use crate::camera::Camera;
use crate::{CalibrationError, CalibrationResult};
use projcal_core::RadianceImage;
use projcal_hdr::{Bracket, CameraResponse, assemble};
use std::path::Path;
use tracing::{debug, info, warn};

/// Where bracket and merged frames go, if anywhere.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    /// Output directory
    pub dir: &'a Path,
    /// File name prefix for this capture
    pub prefix: &'a str,
}

fn capture_failure(reason: impl ToString) -> CalibrationError {
    CalibrationError::CaptureFailure {
        stage: "hdr capture",
        reason: reason.to_string(),
    }
}

/// Captures `count` brackets `step` stops apart around the current exposure.
///
/// The exposure in each [`Bracket`] is the one read back from the camera.
/// The starting exposure is restored on every exit path.
pub fn capture_brackets(
    camera: &mut dyn Camera,
    count: usize,
    step: f32,
    diagnostics: Option<Diagnostics<'_>>,
) -> CalibrationResult<Vec<Bracket>> {
    let start = camera.exposure();
    let result = capture_sequence(camera, start, count.max(1), step, diagnostics);
    camera.set_exposure(start);
    result
}

fn capture_sequence(
    camera: &mut dyn Camera,
    start: f32,
    count: usize,
    step: f32,
    diagnostics: Option<Diagnostics<'_>>,
) -> CalibrationResult<Vec<Bracket>> {
    let factor = 2f32.powf(step);
    let mut requested = start / 2f32.powf(step * (count / 2) as f32);
    let mut brackets = Vec::with_capacity(count);

    for index in 0..count {
        camera.set_exposure(requested);
        let exposure = camera.exposure();
        camera.capture().map_err(capture_failure)?;
        let frame = camera.decode_last_capture().map_err(capture_failure)?;
        debug!(index, exposure, "bracket captured");

        if let Some(d) = diagnostics {
            let path = d.dir.join(format!("{}_ldr_{}.png", d.prefix, index));
            if let Err(e) = camera.write_last_capture(&path) {
                warn!(path = %path.display(), error = %e, "cannot write bracket");
            }
        }

        brackets.push(Bracket::new(frame, exposure));
        requested = exposure * factor;
    }
    Ok(brackets)
}

/// Captures and merges an HDR image.
///
/// Estimates and caches the camera response first if `cache` is empty.
pub fn capture_hdr(
    camera: &mut dyn Camera,
    count: usize,
    step: f32,
    cache: &mut ResponseCache,
    diagnostics: Option<Diagnostics<'_>>,
) -> CalibrationResult<RadianceImage> {
    let brackets = capture_brackets(camera, count, step, diagnostics)?;

    let response = match cache.get() {
        Some(r) => r.clone(),
        None => {
            info!(brackets = brackets.len(), "estimating camera response");
            let r = CameraResponse::estimate(&brackets)?;
            cache.insert(r.clone());
            r
        }
    };

    let image = assemble(&brackets, &response)?;
    if let Some(d) = diagnostics {
        let path = d.dir.join(format!("{}_hdr.hdr", d.prefix));
        if let Err(e) = write_radiance(&image, &path) {
            warn!(path = %path.display(), error = %e, "cannot write HDR image");
        }
    }
    Ok(image)
}

/// Writes a radiance image as a Radiance `.hdr` file.
pub fn write_radiance(image: &RadianceImage, path: &Path) -> CalibrationResult<()> {
    let buffer = image::Rgb32FImage::from_raw(image.width(), image.height(), image.data().to_vec())
        .ok_or_else(|| CalibrationError::Serialization("radiance buffer size mismatch".into()))?;
    buffer
        .save_with_format(path, image::ImageFormat::Hdr)
        .map_err(|e| CalibrationError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraError;
    use approx::assert_relative_eq;
    use projcal_core::LdrFrame;

    // Linear sensor over a uniform scene; records requested exposures
    struct RecordingCamera {
        exposure: f32,
        radiance: f32,
        seen: Vec<f32>,
        fail_at: Option<usize>,
    }

    impl RecordingCamera {
        fn new(exposure: f32, radiance: f32) -> Self {
            Self {
                exposure,
                radiance,
                seen: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl Camera for RecordingCamera {
        fn acquire(&mut self) -> Result<(), CameraError> {
            Ok(())
        }
        fn release(&mut self) {}
        fn is_ready(&self) -> bool {
            true
        }
        fn exposure(&self) -> f32 {
            self.exposure
        }
        fn set_exposure(&mut self, value: f32) {
            self.exposure = value;
        }
        fn capture(&mut self) -> Result<(), CameraError> {
            if self.fail_at == Some(self.seen.len()) {
                return Err(CameraError::Capture("shutter".into()));
            }
            self.seen.push(self.exposure);
            Ok(())
        }
        fn decode_last_capture(&self) -> Result<LdrFrame, CameraError> {
            let code = (255.0 * self.radiance * self.exposure).round().clamp(0.0, 255.0) as u8;
            Ok(LdrFrame::filled(8, 6, [code, code, code]))
        }
        fn write_last_capture(&self, _path: &Path) -> Result<(), CameraError> {
            Ok(())
        }
    }

    #[test]
    fn test_bracket_exposures() {
        let mut cam = RecordingCamera::new(1.0, 0.2);
        let brackets = capture_brackets(&mut cam, 3, 1.0, None).unwrap();
        assert_eq!(brackets.len(), 3);
        assert_relative_eq!(cam.seen[0], 0.5);
        assert_relative_eq!(cam.seen[1], 1.0);
        assert_relative_eq!(cam.seen[2], 2.0);
        assert_eq!(cam.exposure, 1.0);
    }

    #[test]
    fn test_single_bracket_uses_current_exposure() {
        let mut cam = RecordingCamera::new(0.7, 0.2);
        capture_brackets(&mut cam, 1, 1.0, None).unwrap();
        assert_eq!(cam.seen, vec![0.7]);
    }

    #[test]
    fn test_failure_restores_exposure() {
        let mut cam = RecordingCamera::new(1.0, 0.2);
        cam.fail_at = Some(1);
        let mut cache = ResponseCache::new();
        assert!(matches!(
            capture_hdr(&mut cam, 4, 1.0, &mut cache, None),
            Err(CalibrationError::CaptureFailure { .. })
        ));
        assert_eq!(cam.exposure, 1.0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cached_response_is_used() {
        let mut cam = RecordingCamera::new(1.0, 0.2);
        let mut cache = ResponseCache::with_response(CameraResponse::linear());
        let hdr = capture_hdr(&mut cam, 1, 1.0, &mut cache, None).unwrap();
        // code 51 at exposure 1
        assert_relative_eq!(hdr.pixel(0, 0).g, 51.0 / 255.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_cache_is_filled() {
        let mut cam = RecordingCamera::new(1.0, 0.2);
        let mut cache = ResponseCache::new();
        capture_hdr(&mut cam, 3, 1.0, &mut cache, None).unwrap();
        assert!(cache.get().is_some());
    }

    #[test]
    fn test_write_radiance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.hdr");
        let mut img = RadianceImage::new(4, 2);
        img.set_pixel(1, 1, projcal_core::RgbValue::new(0.5, 1.0, 2.0));
        write_radiance(&img, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
