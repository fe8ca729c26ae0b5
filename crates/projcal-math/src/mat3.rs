//! Channel mixing matrix.
//!
//! [`Mat3`] holds a projector's cross-talk matrix and the inverse sent to
//! it as a correction. Rows are output channels and columns are driven
//! channels, so `M * rgb` maps a drive level to the measured color:
//!
//! ```text
//! out_r = m[0][0]*r + m[0][1]*g + m[0][2]*b
//! ```
//!
//! Elements are row-major, which is also the wire order of the
//! `colorMixMatrix` attribute. Heavy lifting (inverse) goes through `glam`.
//!
//! # Usage
//!
//! ```rust
//! use projcal_core::RgbValue;
//! use projcal_math::Mat3;
//!
//! let mix = Mat3::from_rows([
//!     [1.0, 0.1, 0.0],
//!     [0.05, 1.0, 0.05],
//!     [0.0, 0.1, 1.0],
//! ]);
//! let correction = mix.inverse().unwrap();
//! let rgb = correction * (mix * RgbValue::new(0.2, 0.4, 0.6));
//! assert!((rgb.g - 0.4).abs() < 1e-5);
//! ```

use projcal_core::RgbValue;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Determinant magnitude below which a matrix is treated as singular.
///
/// A few ulps of f32 at unit scale.
pub const SINGULAR_EPSILON: f32 = 1e-6;

/// Row-major 3x3 matrix acting on [`RgbValue`] column vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    /// `m[output][input]`
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    /// All zeros.
    pub const ZERO: Self = Self { m: [[0.0; 3]; 3] };

    /// No mixing.
    pub const IDENTITY: Self = Self::diagonal(1.0, 1.0, 1.0);

    /// Matrix from its rows.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Per-channel gains, no cross-talk.
    #[inline]
    pub const fn diagonal(r: f32, g: f32, b: f32) -> Self {
        Self::from_rows([[r, 0.0, 0.0], [0.0, g, 0.0], [0.0, 0.0, b]])
    }

    fn to_glam(self) -> glam::Mat3 {
        // glam is column-major
        glam::Mat3::from_cols_array_2d(&self.m).transpose()
    }

    fn from_glam(g: glam::Mat3) -> Self {
        Self::from_rows(g.transpose().to_cols_array_2d())
    }

    /// Determinant.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.to_glam().determinant()
    }

    /// Inverse, or `None` when the matrix is singular or not finite.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv = Self::from_glam(self.to_glam().inverse());
        inv.is_finite().then_some(inv)
    }

    /// Applies the matrix to a color.
    #[inline]
    pub fn transform(&self, v: RgbValue) -> RgbValue {
        let [r, g, b] = self.m.map(|row| row[0] * v.r + row[1] * v.g + row[2] * v.b);
        RgbValue::new(r, g, b)
    }

    /// Returns true if no element is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|x| x.is_finite())
    }

    /// The nine elements, row by row.
    #[inline]
    pub fn to_row_major(&self) -> [f32; 9] {
        let [a, b, c] = self.m;
        [a[0], a[1], a[2], b[0], b[1], b[2], c[0], c[1], c[2]]
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<RgbValue> for Mat3 {
    type Output = RgbValue;

    #[inline]
    fn mul(self, rhs: RgbValue) -> RgbValue {
        self.transform(rhs)
    }
}

impl Mul for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_glam(self.to_glam() * rhs.to_glam())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_transform_rows_are_outputs() {
        let m = Mat3::from_rows([[1.0, 0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 2.0]]);
        let out = m * RgbValue::new(0.2, 0.4, 0.1);
        assert_abs_diff_eq!(out.r, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(out.g, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(out.b, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_determinant() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_undoes_crosstalk() {
        let m = Mat3::from_rows([[0.9, 0.08, 0.02], [0.05, 0.85, 0.1], [0.0, 0.12, 0.8]]);
        let id = m * m.inverse().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(id.m[i][j], expected, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_singular_and_non_finite() {
        // Second row is twice the first
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 1.0, 1.0]]);
        assert!(m.inverse().is_none());

        let mut n = Mat3::IDENTITY;
        n.m[1][2] = f32::NAN;
        assert!(n.inverse().is_none());
        assert!(Mat3::ZERO.inverse().is_none());
    }

    #[test]
    fn test_tiny_determinant_is_singular() {
        // det = 1e-8, well inside f32 range but below its precision
        assert!(Mat3::diagonal(1e-4, 1e-4, 1.0).inverse().is_none());
        assert!(Mat3::diagonal(1e-2, 1e-2, 1.0).inverse().is_some());
    }

    #[test]
    fn test_row_major_order() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(m.to_row_major(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(Mat3::default(), Mat3::IDENTITY);
    }
}
