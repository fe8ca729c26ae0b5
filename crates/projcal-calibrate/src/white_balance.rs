//! White balance equalization across projectors.
//!
//! Each projector's balance is its white point divided by its green
//! channel. A common target balance is chosen by one of the
//! [`EqualizationMethod`] strategies; every projector is then corrected by
//! `normalize(target / balance)`.

use crate::config::EqualizationMethod;
use crate::{CalibrationError, CalibrationResult};
use projcal_core::RgbValue;
use tracing::{debug, info};

/// Convergence threshold as a fraction of the dimmest white point.
pub const CONVERGENCE_FRACTION: f32 = 0.01;

/// Balance of a white point, `None` when its green channel is not positive.
pub fn white_balance(white_point: RgbValue) -> Option<RgbValue> {
    (white_point.g > 0.0 && white_point.is_finite()).then(|| white_point / white_point.g)
}

/// Per-channel gain that moves `balance` onto `target`.
pub fn correction(target: RgbValue, balance: RgbValue) -> RgbValue {
    (target / balance).normalize()
}

/// Luminance of `white_point` once balanced against `target`.
pub fn corrected_luminance(white_point: RgbValue, balance: RgbValue, target: RgbValue) -> f32 {
    (white_point * (balance / target).normalize()).luminance()
}

// (white point, balance) pairs usable for equalization
fn balanced(white_points: &[RgbValue]) -> Vec<(RgbValue, RgbValue)> {
    white_points
        .iter()
        .filter_map(|&wp| white_balance(wp).map(|b| (wp, b)))
        .collect()
}

fn min_corrected(projectors: &[(RgbValue, RgbValue)], target: RgbValue) -> (usize, f32) {
    projectors
        .iter()
        .enumerate()
        .map(|(i, (wp, b))| (i, corrected_luminance(*wp, *b, target)))
        .fold((0, f32::MAX), |acc, cur| if cur.1 < acc.1 { cur } else { acc })
}

/// Chooses the common target balance.
///
/// White points with a non-positive green channel are ignored. With no
/// usable white point the neutral balance is returned.
pub fn equalize(
    method: EqualizationMethod,
    white_points: &[RgbValue],
    max_iterations: usize,
) -> CalibrationResult<RgbValue> {
    let projectors = balanced(white_points);
    if projectors.is_empty() {
        return Ok(RgbValue::ONE);
    }

    let target = match method {
        EqualizationMethod::EqualizeOnly => {
            let sum = projectors
                .iter()
                .fold(RgbValue::ZERO, |acc, (_, b)| acc + *b);
            sum / projectors.len() as f32
        }
        EqualizationMethod::WeakestLuminance => projectors
            .iter()
            .min_by(|a, b| a.0.luminance().total_cmp(&b.0.luminance()))
            .map(|(_, b)| *b)
            .unwrap_or(RgbValue::ONE),
        EqualizationMethod::MaximizeMinLuminance => maximize_min_luminance(&projectors, max_iterations)?,
    };

    info!(%method, %target, "target white balance");
    Ok(target)
}

/// Moves the target halfway toward the balance of the dimmest corrected
/// projector until the minimum corrected luminance settles.
///
/// Returns the best target seen, starting from the neutral one.
fn maximize_min_luminance(
    projectors: &[(RgbValue, RgbValue)],
    max_iterations: usize,
) -> CalibrationResult<RgbValue> {
    let target_delta = projectors
        .iter()
        .map(|(wp, _)| wp.luminance() * CONVERGENCE_FRACTION)
        .fold(f32::MAX, f32::min);

    let mut target = RgbValue::ONE;
    let (_, mut best_lum) = min_corrected(projectors, target);
    let mut best = target;

    for iteration in 0..max_iterations {
        let (min_index, previous) = min_corrected(projectors, target);
        target = target * 0.5 + projectors[min_index].1 * 0.5;
        let (_, current) = min_corrected(projectors, target);
        let delta = (current - previous).abs();
        debug!(iteration, %target, current, delta, "white balance step");

        if current > best_lum {
            best_lum = current;
            best = target;
        }
        if delta <= target_delta {
            return Ok(best);
        }
    }

    Err(CalibrationError::ConvergenceFailure {
        stage: "white balance",
        iterations: max_iterations,
    })
}
