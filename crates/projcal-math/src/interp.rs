//! Scalar interpolation helpers.

/// Linear interpolation, extrapolating outside `t` in [0, 1].
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamps to [0, 1]; NaN maps to 0.
#[inline]
pub fn saturate(value: f32) -> f32 {
    if value > 0.0 { value.min(1.0) } else { 0.0 }
}

/// `count` evenly spaced levels covering [0, 1] inclusive.
///
/// ```rust
/// use projcal_math::unit_steps;
///
/// assert_eq!(unit_steps(3), vec![0.0, 0.5, 1.0]);
/// assert_eq!(unit_steps(1), vec![0.0]);
/// ```
pub fn unit_steps(count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
    }
}
