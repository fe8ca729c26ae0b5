//! Channel cross-talk correction.
//!
//! Driving one channel of a projector also raises the other channels seen by
//! the camera. The mixing matrix records, per driven channel, how much of
//! its response lands on each measured channel relative to that channel's
//! own range:
//!
//! ```text
//! M[j][i] = (high_i[j] - low_i[j]) / (high_j[j] - low_j[j])
//! ```
//!
//! `low` is the second sample of a curve, `high` the last. The correction
//! sent to the projector is `M^-1`, refused when any of its gains exceeds
//! [`MAX_CORRECTION_GAIN`].

use crate::params::Curve;
use crate::{CalibrationError, CalibrationResult};
use projcal_core::Channel;
use projcal_math::Mat3;
use tracing::{debug, warn};

/// Largest absolute element allowed in a correction matrix.
///
/// A nearly dead channel has a tiny own range, which blows up its row of
/// `M` without making the determinant small.
pub const MAX_CORRECTION_GAIN: f32 = 10.0;

/// Builds the raw mixing matrix from three sampled curves.
///
/// Returns `None` if a curve has fewer than two samples.
pub fn mixing_matrix(curves: &[Curve; 3]) -> Option<Mat3> {
    let mut low = [projcal_core::RgbValue::ZERO; 3];
    let mut high = [projcal_core::RgbValue::ZERO; 3];
    for c in Channel::ALL {
        let curve = &curves[c.index()];
        low[c.index()] = curve.get(1)?.measured;
        high[c.index()] = curve.last()?.measured;
    }

    let mut m = Mat3::ZERO;
    for j in 0..3 {
        let own = high[j][j] - low[j][j];
        for i in 0..3 {
            m.m[j][i] = (high[i][j] - low[i][j]) / own;
        }
    }
    Some(m)
}

/// Solves the cross-talk correction for one projector.
pub fn solve_mix(projector: &str, curves: &[Curve; 3]) -> CalibrationResult<Mat3> {
    let singular = || CalibrationError::SingularMixMatrix {
        projector: projector.to_string(),
    };
    let m = mixing_matrix(curves).ok_or_else(singular)?;
    debug!(projector, matrix = ?m.m, "mixing matrix");
    let inv = m.inverse().ok_or_else(singular)?;
    let peak = inv.to_row_major().iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if peak > MAX_CORRECTION_GAIN {
        warn!(projector, peak, "correction gain out of range");
        return Err(singular());
    }
    Ok(inv)
}
