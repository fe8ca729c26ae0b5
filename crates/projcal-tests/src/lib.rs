//! Integration tests for projcal crates.
//!
//! End-to-end calibration runs against the simulated wall, checking what
//! reaches the projectors and what is left behind on failure.

use projcal_calibrate::CalibrationConfig;
use projcal_calibrate::sim::{SimConfig, SimProjectorConfig};
use projcal_core::{Rect, RgbValue};

/// Two overlapping projectors with per-projector gains.
pub fn two_projector_scene(left_gain: f32, right_gain: f32) -> SimConfig {
    SimConfig {
        projectors: vec![
            SimProjectorConfig {
                name: "left".to_string(),
                footprint: Rect::new(4, 8, 32, 32),
                gain: RgbValue::splat(left_gain),
                ..Default::default()
            },
            SimProjectorConfig {
                name: "right".to_string(),
                footprint: Rect::new(28, 8, 32, 32),
                gain: RgbValue::splat(right_gain),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

/// Configuration with few samples per channel.
pub fn quick_config() -> CalibrationConfig {
    CalibrationConfig {
        color_samples: 4,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use projcal_calibrate::sim::SimulatedRig;
    use projcal_calibrate::{
        AttrValue, CalibrationError, CalibrationReport, Calibrator, EqualizationMethod,
        ResponseCache, attr,
    };
    use projcal_core::Channel;
    use projcal_hdr::CameraResponse;
    use projcal_lut::{LUT_SIZE, read_cube_1d, write_cube_1d};
    use tempfile::tempdir;

    fn linear_cache() -> ResponseCache {
        ResponseCache::with_response(CameraResponse::linear())
    }

    fn run(rig: &SimulatedRig, config: CalibrationConfig) -> Result<CalibrationReport, CalibrationError> {
        let mut cache = linear_cache();
        Calibrator::new(config).run(&mut rig.camera(), &rig.control(), &mut cache)
    }

    // Last messages per projector restore the display
    fn assert_display_restored(rig: &SimulatedRig) {
        let scene = rig.scene();
        let names = ["left", "right"];
        let tail = &scene.log[scene.log.len() - 3 * names.len()..];
        for (chunk, name) in tail.chunks(3).zip(names) {
            assert_eq!(chunk[0], (name.to_string(), attr::HIDE.to_string(), vec![AttrValue::Int(0)]));
            assert_eq!(chunk[1], (name.to_string(), attr::FLASH_BG.to_string(), vec![AttrValue::Int(0)]));
            assert_eq!(chunk[2], (name.to_string(), attr::CLEAR_COLOR.to_string(), vec![]));
        }
        for p in &scene.projectors {
            assert!(!p.hidden && !p.flash);
        }
    }

    fn assert_released(rig: &SimulatedRig) {
        let scene = rig.scene();
        assert!(!scene.acquired);
        assert_eq!(scene.acquire_count, scene.release_count);
    }

    #[test]
    fn test_end_to_end_default_scene() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let report = run(&rig, quick_config()).unwrap();

        assert_eq!(report.projectors.len(), 2);
        assert_eq!(report.published_count(), 2);
        assert!(report.mid_exposure > 0.0);

        for p in &report.projectors {
            assert!(p.errors.is_empty(), "{}: {:?}", p.name, p.errors);
            assert!(p.degenerate_channels.is_empty());
            let lut = p.lut.as_ref().unwrap();
            for c in Channel::ALL {
                assert_eq!(lut.channel(c).len(), LUT_SIZE);
                assert!(lut.channel(c).iter().all(|v| v.is_finite()));
                assert!(p.min_values[c] <= p.max_values[c]);
            }
            let m = p.mix_matrix.unwrap();
            assert!(m.inverse().is_some());
            assert!(p.region_area.unwrap() > 0.0);
        }

        let range = report.common_range.unwrap();
        assert!(!range.is_empty());
        for c in Channel::ALL {
            assert!(range.min[c] <= range.max[c]);
        }
    }

    #[test]
    fn test_corrections_reach_projectors() {
        let rig = SimulatedRig::new(&SimConfig::default());
        run(&rig, quick_config()).unwrap();

        let scene = rig.scene();
        for p in &scene.projectors {
            assert!(p.lut.is_some());
            assert!(p.lut_active);
            assert!(p.mix.is_some());
            assert_eq!(p.brightness, Some(1.0));
            assert_eq!(p.color_temperature, Some(6500.0));
        }
        drop(scene);
        assert_display_restored(&rig);
        assert_released(&rig);
    }

    #[test]
    fn test_gain_mismatch_is_equalized() {
        let rig = SimulatedRig::new(&two_projector_scene(0.8, 0.6));
        let config = CalibrationConfig {
            // Keep the unequal overlap out of both masks
            detection_threshold: 1.5,
            ..quick_config()
        };
        let report = run(&rig, config).unwrap();
        assert_eq!(report.published_count(), 2);

        // The brighter projector is pulled down to the dimmer one
        let range = report.common_range.unwrap();
        assert_relative_eq!(range.max_luminance, 0.67, epsilon = 0.02);

        for input in [0.25, 0.5, 1.0] {
            let left = rig.projector_output("left", RgbValue::splat(input)).unwrap();
            let right = rig.projector_output("right", RgbValue::splat(input)).unwrap();
            assert_relative_eq!(left.luminance(), right.luminance(), epsilon = 0.02);
        }
        let full = rig.projector_output("left", RgbValue::ONE).unwrap();
        assert_relative_eq!(full.g, 0.65, epsilon = 0.02);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let a = run(&SimulatedRig::new(&SimConfig::default()), quick_config()).unwrap();
        let b = run(&SimulatedRig::new(&SimConfig::default()), quick_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dead_channel_falls_back() {
        let mut scene = SimConfig::default();
        scene.projectors[1].gain = RgbValue::new(0.8, 0.8, 0.0);
        let rig = SimulatedRig::new(&scene);
        let report = run(&rig, quick_config()).unwrap();

        let left = report.projector("left").unwrap();
        assert!(left.degenerate_channels.is_empty());

        let right = report.projector("right").unwrap();
        assert_eq!(right.degenerate_channels, vec![Channel::Blue]);
        assert!(right.mix_matrix.is_none());
        assert!(right.errors.len() >= 2);
    }

    #[test]
    fn test_capture_failure_restores_display() {
        // Count the captures of a full run, then fail near the end
        let probe = SimulatedRig::new(&SimConfig::default());
        run(&probe, quick_config()).unwrap();
        let total = probe.scene().captures;

        let rig = SimulatedRig::new(&SimConfig::default());
        rig.fail_capture_after(total - 2);
        let err = run(&rig, quick_config()).unwrap_err();
        assert!(matches!(err, CalibrationError::CaptureFailure { .. }), "{err}");

        assert_display_restored(&rig);
        assert_released(&rig);
        assert!(!rig
            .scene()
            .log
            .iter()
            .any(|(_, attribute, _)| attribute == attr::COLOR_LUT));
    }

    #[test]
    fn test_camera_not_ready() {
        let rig = SimulatedRig::new(&SimConfig::default());
        rig.scene_mut().ready = false;
        let err = run(&rig, quick_config()).unwrap_err();
        assert!(matches!(err, CalibrationError::CameraNotReady));
        assert!(rig.scene().log.is_empty());
        assert_released(&rig);
        assert_eq!(rig.scene().acquire_count, 1);
    }

    #[test]
    fn test_camera_unavailable() {
        let rig = SimulatedRig::new(&SimConfig::default());
        rig.scene_mut().unavailable = true;
        let err = run(&rig, quick_config()).unwrap_err();
        assert!(matches!(err, CalibrationError::CameraNotReady));
        assert_eq!(rig.scene().acquire_count, 0);
        assert_eq!(rig.scene().captures, 0);
    }

    #[test]
    fn test_no_projectors() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let config = CalibrationConfig {
            projector_category: "wall".to_string(),
            ..quick_config()
        };
        let err = run(&rig, config).unwrap_err();
        assert!(matches!(err, CalibrationError::NoProjectors { ref category } if category == "wall"));
        assert!(rig.scene().log.is_empty());
        assert_released(&rig);
    }

    #[test]
    fn test_response_estimated_when_cache_empty() {
        let rig = SimulatedRig::new(&SimConfig::default());
        let mut cache = ResponseCache::new();
        let report = Calibrator::new(quick_config())
            .run(&mut rig.camera(), &rig.control(), &mut cache)
            .unwrap();

        assert_eq!(report.published_count(), 2);
        for p in &report.projectors {
            assert!(p.degenerate_channels.is_empty(), "{}", p.name);
            let lut = p.lut.as_ref().unwrap();
            for c in Channel::ALL {
                assert_eq!(lut.channel(c).len(), LUT_SIZE);
                assert!(lut.channel(c).iter().all(|v| v.is_finite()));
                assert!(p.min_values[c] <= p.max_values[c]);
            }
        }

        let response = cache.get().unwrap();
        for c in Channel::ALL {
            let curve = response.curve(c);
            assert_eq!(curve.len(), 256);
            assert!(curve.windows(2).all(|w| w[0] <= w[1]));
        }
        assert_released(&rig);
        assert_display_restored(&rig);
    }

    #[test]
    fn test_unconverged_balance_falls_back_to_mean() {
        let mut scene = SimConfig::default();
        scene.projectors[0].gain = RgbValue::new(0.8, 0.7, 0.4);
        scene.projectors[1].gain = RgbValue::new(0.4, 0.7, 0.8);
        let rig = SimulatedRig::new(&scene);
        let config = CalibrationConfig {
            max_equalization_iterations: 1,
            ..quick_config()
        };
        let report = run(&rig, config).unwrap();

        assert_eq!(report.equalization_method, EqualizationMethod::EqualizeOnly);
        let reason = report.equalization_error.as_deref().unwrap();
        assert!(reason.contains("white balance"), "{reason}");
        assert_eq!(report.published_count(), 2);
        assert!(report.target_white_balance.is_finite());
    }

    #[test]
    fn test_update_response_refills_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crf.json");

        let rig = SimulatedRig::new(&SimConfig::default());
        let mut cache = linear_cache();
        let mid = Calibrator::new(quick_config())
            .update_response(&mut rig.camera(), &rig.control(), &mut cache)
            .unwrap();
        assert!(mid > 0.0);
        assert!(cache.get().is_some());
        assert_ne!(cache.get(), Some(&CameraResponse::linear()));
        assert_display_restored(&rig);
        assert_released(&rig);

        assert!(cache.save(&path).unwrap());
        assert_eq!(ResponseCache::load(&path).unwrap(), cache);
    }

    #[test]
    fn test_report_and_cube_export() {
        let dir = tempdir().unwrap();
        let rig = SimulatedRig::new(&SimConfig::default());
        let report = run(&rig, quick_config()).unwrap();

        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let loaded = CalibrationReport::load(&path).unwrap();
        assert_eq!(loaded, report);

        let p = loaded.projector("left").unwrap();
        let lut = p.lut.as_ref().unwrap();
        let cube = dir.path().join("left.cube");
        write_cube_1d(&cube, lut, Some("left")).unwrap();
        let back = read_cube_1d(&cube).unwrap();
        for c in Channel::ALL {
            for (a, b) in lut.channel(c).iter().zip(back.channel(c)) {
                assert_relative_eq!(a, b, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_equalization_methods_all_publish() {
        for method in EqualizationMethod::ALL {
            let rig = SimulatedRig::new(&two_projector_scene(0.8, 0.7));
            let config = CalibrationConfig {
                equalization: method,
                detection_threshold: 1.5,
                ..quick_config()
            };
            let report = run(&rig, config).unwrap();
            assert_eq!(report.published_count(), 2, "{method}");
            assert!(report.target_white_balance.is_finite());
        }
    }

    #[test]
    fn test_diagnostics_written() {
        let dir = tempdir().unwrap();
        let rig = SimulatedRig::new(&SimConfig::default());
        let config = CalibrationConfig {
            diagnostics_dir: Some(dir.path().join("diag")),
            ..quick_config()
        };
        run(&rig, config).unwrap();

        let diag = dir.path().join("diag");
        assert!(diag.join("left_only_ldr_0.png").exists());
        assert!(diag.join("left_only_hdr.hdr").exists());
        assert!(diag.join("right_others_hdr.hdr").exists());
    }
}
