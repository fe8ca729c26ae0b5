//! Interpolating splines through measured points.
//!
//! Two kinds are supported:
//!
//! - [`SplineKind::Linear`] - piecewise linear, needs at least 2 knots
//! - [`SplineKind::Akima`] - Akima's local cubic, needs at least 5 knots
//!
//! The Akima variant follows the classic non-periodic formulation: segment
//! slopes are extended by two ghost slopes on each end, and the tangent at
//! each knot is a weighted blend of neighbouring slopes that suppresses
//! overshoot near outliers.
//!
//! Evaluation is restricted to `[x_first, x_last]`; anything outside is an
//! [`SplineError::OutOfDomain`].
//!
//! # Usage
//!
//! ```rust
//! use projcal_math::{Spline, SplineKind};
//!
//! let xs = [0.0, 0.25, 0.5, 0.75, 1.0];
//! let ys = [0.0, 0.25, 0.5, 0.75, 1.0];
//! let s = Spline::fit(&xs, &ys).unwrap();
//! assert_eq!(s.kind(), SplineKind::Akima);
//! assert!((s.eval(0.6).unwrap() - 0.6).abs() < 1e-12);
//! assert!(s.eval(1.5).is_err());
//! ```

use crate::error::{SplineError, SplineResult};
use crate::interp::lerp;

/// Interpolation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplineKind {
    /// Piecewise linear
    Linear,
    /// Akima local cubic
    Akima,
}

impl SplineKind {
    /// Minimum number of knots this kind accepts.
    #[inline]
    pub const fn min_points(self) -> usize {
        match self {
            SplineKind::Linear => 2,
            SplineKind::Akima => 5,
        }
    }

    /// Short lowercase name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            SplineKind::Linear => "linear",
            SplineKind::Akima => "akima",
        }
    }
}

/// Fitted spline ready for evaluation.
#[derive(Debug, Clone)]
pub struct Spline {
    kind: SplineKind,
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Per-segment cubic coefficients (Akima only).
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl Spline {
    /// Piecewise linear interpolation through `(xs, ys)`.
    pub fn linear(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        validate(SplineKind::Linear, xs, ys)?;
        Ok(Self {
            kind: SplineKind::Linear,
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            b: Vec::new(),
            c: Vec::new(),
            d: Vec::new(),
        })
    }

    /// Akima interpolation through `(xs, ys)`.
    pub fn akima(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        validate(SplineKind::Akima, xs, ys)?;
        let n = xs.len();

        // Segment slopes with two ghost slopes on each side; m[k + 2] is the
        // slope of segment k.
        let mut m = vec![0.0f64; n + 3];
        for k in 0..n - 1 {
            m[k + 2] = (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]);
        }
        m[0] = 3.0 * m[2] - 2.0 * m[3];
        m[1] = 2.0 * m[2] - m[3];
        m[n + 1] = 2.0 * m[n] - m[n - 1];
        m[n + 2] = 3.0 * m[n] - 2.0 * m[n - 1];

        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        let mut d = Vec::with_capacity(n - 1);

        for i in 0..n - 1 {
            // Shifted indices into the extended slope table
            let m_im2 = m[i];
            let m_im1 = m[i + 1];
            let m_i = m[i + 2];
            let m_ip1 = m[i + 3];
            let m_ip2 = m[i + 4];

            let ne = (m_ip1 - m_i).abs() + (m_im1 - m_im2).abs();
            if ne == 0.0 {
                b.push(m_i);
                c.push(0.0);
                d.push(0.0);
                continue;
            }

            let h = xs[i + 1] - xs[i];
            let ne_next = (m_ip2 - m_ip1).abs() + (m_i - m_im1).abs();
            let alpha = (m_im1 - m_im2).abs() / ne;
            let t_next = if ne_next == 0.0 {
                m_i
            } else {
                let alpha_next = (m_i - m_im1).abs() / ne_next;
                (1.0 - alpha_next) * m_i + alpha_next * m_ip1
            };

            let bi = (1.0 - alpha) * m_im1 + alpha * m_i;
            b.push(bi);
            c.push((3.0 * m_i - 2.0 * bi - t_next) / h);
            d.push((bi + t_next - 2.0 * m_i) / (h * h));
        }

        Ok(Self {
            kind: SplineKind::Akima,
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            b,
            c,
            d,
        })
    }

    /// Akima when there are enough knots, linear otherwise.
    pub fn fit(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        if xs.len() >= SplineKind::Akima.min_points() {
            Self::akima(xs, ys)
        } else {
            Self::linear(xs, ys)
        }
    }

    /// Interpolation kind actually used.
    #[inline]
    pub fn kind(&self) -> SplineKind {
        self.kind
    }

    /// Inclusive evaluation domain `(x_first, x_last)`.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluates the spline at `x`.
    pub fn eval(&self, x: f64) -> SplineResult<f64> {
        let (min, max) = self.domain();
        if !(x >= min && x <= max) {
            return Err(SplineError::OutOfDomain { x, min, max });
        }

        let i = self.segment(x);
        let dx = x - self.xs[i];
        let y = match self.kind {
            SplineKind::Linear => {
                let h = self.xs[i + 1] - self.xs[i];
                lerp(self.ys[i], self.ys[i + 1], dx / h)
            }
            SplineKind::Akima => {
                self.ys[i] + dx * (self.b[i] + dx * (self.c[i] + self.d[i] * dx))
            }
        };
        Ok(y)
    }

    // Index of the segment containing x; x == x_last maps to the last one.
    fn segment(&self, x: f64) -> usize {
        let last = self.xs.len() - 2;
        match self.xs.partition_point(|&k| k <= x) {
            0 => 0,
            p => (p - 1).min(last),
        }
    }
}

fn validate(kind: SplineKind, xs: &[f64], ys: &[f64]) -> SplineResult<()> {
    if xs.len() != ys.len() {
        return Err(SplineError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.len() < kind.min_points() {
        return Err(SplineError::TooFewPoints {
            kind: kind.name(),
            required: kind.min_points(),
            got: xs.len(),
        });
    }
    if let Some(index) = xs
        .iter()
        .zip(ys)
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(SplineError::NonFinite { index });
    }
    if let Some(index) = xs.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SplineError::NotIncreasing { index: index + 1 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_interpolates() {
        let s = Spline::linear(&[0.0, 1.0, 3.0], &[0.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(s.eval(0.5).unwrap(), 1.0);
        assert_abs_diff_eq!(s.eval(2.0).unwrap(), 2.5);
        assert_abs_diff_eq!(s.eval(3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_akima_reproduces_lines() {
        let xs = [0.0, 0.1, 0.3, 0.6, 0.8, 1.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 0.5).collect();
        let s = Spline::akima(&xs, &ys).unwrap();
        for i in 0..=20 {
            let x = i as f64 / 20.0;
            assert_abs_diff_eq!(s.eval(x).unwrap(), 2.0 * x + 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_akima_passes_through_knots() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [0.0, 0.5, 2.0, 1.5, 3.0, 3.2];
        let s = Spline::akima(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_abs_diff_eq!(s.eval(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_akima_flat_step_does_not_overshoot() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let s = Spline::akima(&xs, &ys).unwrap();
        for i in 0..=50 {
            let y = s.eval(i as f64 / 10.0).unwrap();
            assert!((-1e-12..=1.0 + 1e-12).contains(&y), "overshoot {}", y);
        }
    }

    #[test]
    fn test_fit_picks_kind() {
        let s = Spline::fit(&[0.0, 0.5, 1.0], &[0.0, 0.4, 1.0]).unwrap();
        assert_eq!(s.kind(), SplineKind::Linear);
        let s = Spline::fit(&[0.0, 0.2, 0.4, 0.6, 1.0], &[0.0, 0.2, 0.4, 0.6, 1.0]).unwrap();
        assert_eq!(s.kind(), SplineKind::Akima);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Spline::akima(&[0.0, 1.0], &[0.0, 1.0]).unwrap_err(),
            SplineError::TooFewPoints {
                kind: "akima",
                required: 5,
                got: 2
            }
        );
        assert!(matches!(
            Spline::linear(&[0.0, 0.0, 1.0], &[0.0, 1.0, 2.0]),
            Err(SplineError::NotIncreasing { index: 1 })
        ));
        assert!(matches!(
            Spline::linear(&[0.0, 1.0], &[0.0]),
            Err(SplineError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Spline::linear(&[0.0, f64::NAN], &[0.0, 1.0]),
            Err(SplineError::NonFinite { index: 1 })
        ));
    }

    #[test]
    fn test_out_of_domain() {
        let s = Spline::linear(&[0.2, 0.8], &[0.0, 1.0]).unwrap();
        assert!(matches!(s.eval(0.1), Err(SplineError::OutOfDomain { .. })));
        assert!(matches!(s.eval(f64::NAN), Err(SplineError::OutOfDomain { .. })));
        assert_eq!(s.domain(), (0.2, 0.8));
    }
}
