//! Calibration camera collaborator.
//!
//! The pipeline drives a single physical camera through the [`Camera`]
//! trait. The camera is an exclusive resource for the length of a run and
//! is held through a [`CameraLease`], which must be released explicitly;
//! dropping a lease that is still held releases it as a backstop.

use projcal_core::LdrFrame;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Error reported by a camera implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The camera could not be acquired.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// The shutter could not be triggered or the frame was not received.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The last capture could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The last capture could not be written to disk.
    #[error("write failed: {0}")]
    Write(String),
}

/// A still camera with controllable exposure.
pub trait Camera {
    /// Takes exclusive ownership of the device.
    fn acquire(&mut self) -> Result<(), CameraError>;

    /// Gives the device back.
    fn release(&mut self);

    /// Returns true if the device can capture.
    fn is_ready(&self) -> bool;

    /// Current exposure (shutter time, arbitrary units).
    fn exposure(&self) -> f32;

    /// Requests an exposure. The device may round it; read it back with
    /// [`Camera::exposure`].
    fn set_exposure(&mut self, value: f32);

    /// Triggers one capture.
    fn capture(&mut self) -> Result<(), CameraError>;

    /// Decodes the last capture as 8-bit RGB.
    fn decode_last_capture(&self) -> Result<LdrFrame, CameraError>;

    /// Writes the last capture to `path`.
    fn write_last_capture(&self, path: &Path) -> Result<(), CameraError>;
}

/// Exclusive hold on a camera for the length of a run.
///
/// Dereferences to the camera. Call [`CameraLease::release`] on every exit
/// path; `Drop` only releases if that was missed.
pub struct CameraLease<'a> {
    camera: &'a mut dyn Camera,
    held: bool,
}

impl<'a> CameraLease<'a> {
    /// Acquires `camera`.
    pub fn acquire(camera: &'a mut dyn Camera) -> Result<Self, CameraError> {
        camera.acquire()?;
        debug!("camera acquired");
        Ok(Self { camera, held: true })
    }

    /// Releases the camera.
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Returns true while the lease holds the camera.
    pub fn is_held(&self) -> bool {
        self.held
    }

    fn release_inner(&mut self) {
        if self.held {
            self.camera.release();
            self.held = false;
            debug!("camera released");
        }
    }
}

impl<'a> Deref for CameraLease<'a> {
    type Target = dyn Camera + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.camera
    }
}

impl DerefMut for CameraLease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.camera
    }
}

impl Drop for CameraLease<'_> {
    fn drop(&mut self) {
        if self.held {
            warn!("camera lease dropped without explicit release");
            self.release_inner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingCamera {
        acquired: bool,
        releases: usize,
        refuse: bool,
    }

    impl Camera for CountingCamera {
        fn acquire(&mut self) -> Result<(), CameraError> {
            if self.refuse {
                return Err(CameraError::Unavailable("busy".into()));
            }
            self.acquired = true;
            Ok(())
        }
        fn release(&mut self) {
            self.acquired = false;
            self.releases += 1;
        }
        fn is_ready(&self) -> bool {
            true
        }
        fn exposure(&self) -> f32 {
            1.0
        }
        fn set_exposure(&mut self, _value: f32) {}
        fn capture(&mut self) -> Result<(), CameraError> {
            Ok(())
        }
        fn decode_last_capture(&self) -> Result<LdrFrame, CameraError> {
            Ok(LdrFrame::filled(1, 1, [0, 0, 0]))
        }
        fn write_last_capture(&self, _path: &Path) -> Result<(), CameraError> {
            Ok(())
        }
    }

    #[test]
    fn test_explicit_release() {
        let mut cam = CountingCamera::default();
        let lease = CameraLease::acquire(&mut cam).unwrap();
        assert!(lease.is_held());
        lease.release();
        assert!(!cam.acquired);
        assert_eq!(cam.releases, 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let mut cam = CountingCamera::default();
        {
            let mut lease = CameraLease::acquire(&mut cam).unwrap();
            assert!(lease.is_ready());
            lease.set_exposure(2.0);
        }
        assert_eq!(cam.releases, 1);
    }

    #[test]
    fn test_acquire_failure() {
        let mut cam = CountingCamera {
            refuse: true,
            ..Default::default()
        };
        assert!(CameraLease::acquire(&mut cam).is_err());
        assert_eq!(cam.releases, 0);
    }
}
