//! Simulated projector wall and camera.
//!
//! [`SimulatedRig`] stands in for the real collaborators: a scene of
//! rectangular projector footprints seen by a linear 8-bit camera. Each
//! projector emits `crosstalk * (gain * drive) + black` over its footprint,
//! where `drive` is its clear color while the background flash is on.
//! Messages sent through [`SimControl`] update the projectors and are kept
//! in a log.
//!
//! The camera and control plane share the scene, so a message is visible to
//! the next capture.
//!
//! ```rust
//! use projcal_calibrate::Camera;
//! use projcal_calibrate::sim::{SimConfig, SimulatedRig};
//!
//! let rig = SimulatedRig::new(&SimConfig::default());
//! let mut camera = rig.camera();
//! camera.capture().unwrap();
//! let frame = camera.decode_last_capture().unwrap();
//! assert_eq!(frame.width(), 64);
//! ```

use crate::camera::{Camera, CameraError};
use crate::control::{AttrValue, ControlPlane, attr};
use crate::{CalibrationError, CalibrationResult};
use projcal_core::{LdrFrame, Rect, RgbValue};
use projcal_lut::ColorLut;
use projcal_math::{Mat3, saturate};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

/// One simulated projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimProjectorConfig {
    /// Control-plane name
    pub name: String,
    /// Lit area in camera pixels
    pub footprint: Rect,
    /// Radiance per unit drive, per channel
    pub gain: RgbValue,
    /// Radiance at zero drive
    pub black: RgbValue,
    /// Channel bleed applied after the gain
    pub crosstalk: Mat3,
}

impl Default for SimProjectorConfig {
    fn default() -> Self {
        Self {
            name: "projector".to_string(),
            footprint: Rect::new(0, 0, 32, 32),
            gain: RgbValue::splat(0.8),
            black: RgbValue::splat(0.05),
            crosstalk: Mat3::IDENTITY,
        }
    }
}

/// Scene description, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Category the projectors are listed under
    pub category: String,
    /// Radiance reaching every pixel
    pub ambient: f32,
    /// Radial falloff at the frame corners (0 = none)
    pub vignetting: f32,
    /// Sensor gamma (1 = linear)
    pub gamma: f32,
    /// Camera exposure before the first run
    pub initial_exposure: f32,
    /// Projectors in control-plane order
    pub projectors: Vec<SimProjectorConfig>,
}

impl Default for SimConfig {
    /// Two projectors overlapping on a 64x48 frame.
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            category: "camera".to_string(),
            ambient: 0.02,
            vignetting: 0.0,
            gamma: 1.0,
            initial_exposure: 1.0,
            projectors: vec![
                SimProjectorConfig {
                    name: "left".to_string(),
                    footprint: Rect::new(4, 8, 32, 32),
                    ..Default::default()
                },
                SimProjectorConfig {
                    name: "right".to_string(),
                    footprint: Rect::new(28, 8, 32, 32),
                    ..Default::default()
                },
            ],
        }
    }
}

impl SimConfig {
    /// Loads a scene from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CalibrationResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| CalibrationError::Config(e.to_string()))
    }
}

/// Display state of one projector as driven by the control plane.
#[derive(Debug, Clone, PartialEq)]
pub struct SimProjector {
    /// Static description
    pub config: SimProjectorConfig,
    /// `hide` flag
    pub hidden: bool,
    /// `flashBG` flag
    pub flash: bool,
    /// Current clear color
    pub clear: RgbValue,
    /// Last published LUT
    pub lut: Option<ColorLut>,
    /// `activateColorLUT` flag
    pub lut_active: bool,
    /// Last published mixing matrix
    pub mix: Option<Mat3>,
    /// Last published brightness
    pub brightness: Option<f32>,
    /// Last published color temperature
    pub color_temperature: Option<f32>,
}

impl SimProjector {
    fn new(config: SimProjectorConfig) -> Self {
        Self {
            config,
            hidden: false,
            flash: false,
            clear: RgbValue::ZERO,
            lut: None,
            lut_active: false,
            mix: None,
            brightness: None,
            color_temperature: None,
        }
    }

    /// Radiance for a raw drive level.
    pub fn emit(&self, drive: RgbValue) -> RgbValue {
        let lit = self.config.gain * drive;
        self.config.crosstalk * lit + self.config.black
    }

    /// What the projector currently shows: the clear color while flashing,
    /// mid-gray content when visible, nothing when hidden.
    fn drive(&self) -> RgbValue {
        if self.flash {
            self.clear
        } else if self.hidden {
            RgbValue::ZERO
        } else {
            RgbValue::splat(0.5)
        }
    }

    /// Radiance for content `input` after the published corrections.
    ///
    /// The mixing matrix runs first, then the LUT when active.
    pub fn corrected_output(&self, input: RgbValue) -> RgbValue {
        let mut drive = input;
        if let Some(m) = &self.mix {
            drive = m.transform(drive);
        }
        drive = RgbValue::new(saturate(drive.r), saturate(drive.g), saturate(drive.b));
        if let (true, Some(lut)) = (self.lut_active, &self.lut) {
            drive = lut.apply(drive);
        }
        self.emit(drive)
    }
}

/// Shared scene state.
#[derive(Debug)]
pub struct SimScene {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Projector category
    pub category: String,
    /// Ambient radiance
    pub ambient: f32,
    /// Corner falloff
    pub vignetting: f32,
    /// Sensor gamma
    pub gamma: f32,
    /// Projectors
    pub projectors: Vec<SimProjector>,
    /// Current exposure
    pub exposure: f32,
    /// Whether the camera reports ready
    pub ready: bool,
    /// Whether the camera refuses to be acquired
    pub unavailable: bool,
    /// Successful captures so far
    pub captures: usize,
    /// Fail every capture once this many have succeeded
    pub fail_after: Option<usize>,
    /// Camera currently acquired
    pub acquired: bool,
    /// Number of acquisitions
    pub acquire_count: usize,
    /// Number of releases
    pub release_count: usize,
    /// Every message received, in order
    pub log: Vec<(String, String, Vec<AttrValue>)>,
    last_frame: Option<LdrFrame>,
}

impl SimScene {
    fn new(config: &SimConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            category: config.category.clone(),
            ambient: config.ambient,
            vignetting: config.vignetting,
            gamma: config.gamma,
            projectors: config
                .projectors
                .iter()
                .cloned()
                .map(SimProjector::new)
                .collect(),
            exposure: config.initial_exposure,
            ready: true,
            unavailable: false,
            captures: 0,
            fail_after: None,
            acquired: false,
            acquire_count: 0,
            release_count: 0,
            log: Vec::new(),
            last_frame: None,
        }
    }

    /// Projector by name.
    pub fn projector(&self, name: &str) -> Option<&SimProjector> {
        self.projectors.iter().find(|p| p.config.name == name)
    }

    fn vignette(&self, x: u32, y: u32) -> f32 {
        if self.vignetting == 0.0 {
            return 1.0;
        }
        let cx = (self.width as f32 - 1.0) / 2.0;
        let cy = (self.height as f32 - 1.0) / 2.0;
        let dx = (x as f32 - cx) / cx.max(1.0);
        let dy = (y as f32 - cy) / cy.max(1.0);
        (1.0 - self.vignetting * (dx * dx + dy * dy) / 2.0).max(0.0)
    }

    /// Radiance reaching pixel (x, y).
    pub fn radiance(&self, x: u32, y: u32) -> RgbValue {
        let mut sum = RgbValue::splat(self.ambient);
        for p in &self.projectors {
            if p.config.footprint.contains(x, y) {
                sum = sum + p.emit(p.drive());
            }
        }
        sum * self.vignette(x, y)
    }

    fn render(&self) -> LdrFrame {
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        let inv_gamma = 1.0 / self.gamma.max(1e-3);
        for y in 0..self.height {
            for x in 0..self.width {
                let r = self.radiance(x, y) * self.exposure;
                for v in r.to_array() {
                    let code = 255.0 * v.clamp(0.0, 1.0).powf(inv_gamma);
                    data.push(code.round() as u8);
                }
            }
        }
        LdrFrame::from_raw(self.width, self.height, data)
            .unwrap_or_else(|_| LdrFrame::filled(self.width, self.height, [0, 0, 0]))
    }

    fn apply(&mut self, object: &str, attribute: &str, values: &[AttrValue]) {
        let Some(p) = self.projectors.iter_mut().find(|p| p.config.name == object) else {
            warn!(object, "message for unknown projector");
            return;
        };
        let floats: Vec<f32> = values
            .iter()
            .flat_map(|v| match v {
                AttrValue::Floats(f) => f.clone(),
                other => other.as_float().into_iter().collect(),
            })
            .collect();
        let flag = values.first().and_then(AttrValue::as_int).map(|v| v != 0);

        match attribute {
            attr::HIDE => p.hidden = flag.unwrap_or(false),
            attr::FLASH_BG => p.flash = flag.unwrap_or(false),
            attr::CLEAR_COLOR => {
                p.clear = match floats.as_slice() {
                    [r, g, b, ..] => RgbValue::new(*r, *g, *b),
                    _ => RgbValue::ZERO,
                }
            }
            attr::COLOR_LUT => match ColorLut::from_interleaved(&floats) {
                Ok(lut) => p.lut = Some(lut),
                Err(e) => warn!(object, error = %e, "rejected LUT"),
            },
            attr::ACTIVATE_COLOR_LUT => p.lut_active = flag.unwrap_or(false),
            attr::COLOR_MIX_MATRIX => {
                if let [a, b, c, d, e, f, g, h, i] = floats.as_slice() {
                    p.mix = Some(Mat3::from_rows([[*a, *b, *c], [*d, *e, *f], [*g, *h, *i]]));
                } else {
                    warn!(object, len = floats.len(), "rejected mixing matrix");
                }
            }
            attr::BRIGHTNESS => p.brightness = floats.first().copied(),
            attr::COLOR_TEMPERATURE => p.color_temperature = floats.first().copied(),
            _ => debug!(object, attribute, "ignored attribute"),
        }
    }
}

/// A simulated wall with its camera and control plane.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    scene: Rc<RefCell<SimScene>>,
}

impl SimulatedRig {
    /// Builds the scene.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            scene: Rc::new(RefCell::new(SimScene::new(config))),
        }
    }

    /// Camera viewing the scene.
    pub fn camera(&self) -> SimCamera {
        SimCamera {
            scene: Rc::clone(&self.scene),
        }
    }

    /// Control plane reaching the projectors.
    pub fn control(&self) -> SimControl {
        SimControl {
            scene: Rc::clone(&self.scene),
        }
    }

    /// Read access to the scene.
    pub fn scene(&self) -> std::cell::Ref<'_, SimScene> {
        self.scene.borrow()
    }

    /// Write access to the scene, for scripting failures.
    pub fn scene_mut(&self) -> std::cell::RefMut<'_, SimScene> {
        self.scene.borrow_mut()
    }

    /// Makes every capture fail once `n` more have succeeded.
    pub fn fail_capture_after(&self, n: usize) {
        let mut scene = self.scene.borrow_mut();
        scene.fail_after = Some(scene.captures + n);
    }

    /// Output of `projector` for `input` through its published corrections.
    pub fn projector_output(&self, projector: &str, input: RgbValue) -> Option<RgbValue> {
        self.scene
            .borrow()
            .projector(projector)
            .map(|p| p.corrected_output(input))
    }
}

/// [`Camera`] over a [`SimScene`].
#[derive(Debug)]
pub struct SimCamera {
    scene: Rc<RefCell<SimScene>>,
}

impl Camera for SimCamera {
    fn acquire(&mut self) -> Result<(), CameraError> {
        let mut scene = self.scene.borrow_mut();
        if scene.unavailable || scene.acquired {
            return Err(CameraError::Unavailable("simulated camera busy".into()));
        }
        scene.acquired = true;
        scene.acquire_count += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut scene = self.scene.borrow_mut();
        scene.acquired = false;
        scene.release_count += 1;
    }

    fn is_ready(&self) -> bool {
        self.scene.borrow().ready
    }

    fn exposure(&self) -> f32 {
        self.scene.borrow().exposure
    }

    fn set_exposure(&mut self, value: f32) {
        self.scene.borrow_mut().exposure = value;
    }

    fn capture(&mut self) -> Result<(), CameraError> {
        let mut scene = self.scene.borrow_mut();
        if scene.fail_after.is_some_and(|n| scene.captures >= n) {
            return Err(CameraError::Capture("simulated shutter failure".into()));
        }
        let frame = scene.render();
        scene.last_frame = Some(frame);
        scene.captures += 1;
        Ok(())
    }

    fn decode_last_capture(&self) -> Result<LdrFrame, CameraError> {
        self.scene
            .borrow()
            .last_frame
            .clone()
            .ok_or_else(|| CameraError::Decode("no capture yet".into()))
    }

    fn write_last_capture(&self, path: &Path) -> Result<(), CameraError> {
        let frame = self.decode_last_capture()?;
        image::save_buffer_with_format(
            path,
            frame.data(),
            frame.width(),
            frame.height(),
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .map_err(|e| CameraError::Write(e.to_string()))
    }
}

/// [`ControlPlane`] over a [`SimScene`].
#[derive(Debug)]
pub struct SimControl {
    scene: Rc<RefCell<SimScene>>,
}

impl ControlPlane for SimControl {
    fn list_objects_by_category(&self, category: &str) -> Vec<String> {
        let scene = self.scene.borrow();
        if scene.category != category {
            return Vec::new();
        }
        scene
            .projectors
            .iter()
            .map(|p| p.config.name.clone())
            .collect()
    }

    fn send(&self, object: &str, attribute: &str, values: Vec<AttrValue>) {
        let mut scene = self.scene.borrow_mut();
        scene.apply(object, attribute, &values);
        scene
            .log
            .push((object.to_string(), attribute.to_string(), values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Display;

    #[test]
    fn test_flash_shows_clear_color() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let control = rig.control();
        let names = control.list_objects_by_category("camera");
        assert_eq!(names, vec!["left".to_string(), "right".to_string()]);

        let display = Display::new(&control, &names);
        display.flash_all(true);
        display.isolate("left");

        let scene = rig.scene();
        // Left only: 0.8 + 0.05 + ambient
        assert!((scene.radiance(10, 20).g - 0.87).abs() < 1e-5);
        // Overlap adds right's black level
        assert!((scene.radiance(30, 20).g - 0.92).abs() < 1e-5);
        assert!((scene.radiance(1, 1).g - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_capture_and_failure_script() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let mut cam = rig.camera();
        assert!(cam.decode_last_capture().is_err());
        cam.capture().unwrap();
        rig.fail_capture_after(1);
        cam.capture().unwrap();
        assert!(cam.capture().is_err());
        // Ambient only, exposure 1
        assert_eq!(cam.decode_last_capture().unwrap().pixel(0, 0), [5, 5, 5]);
    }

    #[test]
    fn test_acquire_is_exclusive() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let mut a = rig.camera();
        let mut b = rig.camera();
        a.acquire().unwrap();
        assert!(b.acquire().is_err());
        a.release();
        assert!(b.acquire().is_ok());
        assert_eq!(rig.scene().acquire_count, 2);
    }

    #[test]
    fn test_published_corrections() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let control = rig.control();
        let names = vec!["left".to_string()];
        let mut lut = ColorLut::identity();
        lut.rescale(0.5, 0.0);
        Display::new(&control, &names).publish("left", &lut, Some(&Mat3::IDENTITY));

        let out = rig.projector_output("left", RgbValue::ONE).unwrap();
        assert!((out.r - (0.8 * 0.5 + 0.05)).abs() < 1e-5);
        let p = rig.scene();
        assert_eq!(p.projector("left").unwrap().color_temperature, Some(6500.0));
        assert!(rig.projector_output("nobody", RgbValue::ONE).is_none());
    }

    #[test]
    fn test_write_capture() {
        let dir = tempfile::tempdir().unwrap();
        let rig = SimulatedRig::new(&SimConfig::default());
        let mut cam = rig.camera();
        cam.capture().unwrap();
        let path = dir.path().join("frame.png");
        cam.write_last_capture(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_scene_yaml() {
        let cfg: SimConfig = serde_yaml::from_str(
            "width: 32\nprojectors:\n  - name: solo\n    footprint: {x: 2, y: 2, width: 8, height: 8}\n",
        )
        .unwrap();
        assert_eq!(cfg.width, 32);
        assert_eq!(cfg.height, 48);
        assert_eq!(cfg.projectors[0].gain, RgbValue::splat(0.8));
    }
}
