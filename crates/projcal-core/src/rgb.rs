//! RGB triplets and Rec.709 luminance.
//!
//! [`RgbValue`] is the value type carried through the whole calibration
//! pipeline: measured camera colors, white points, white balances and
//! per-channel min/max levels are all `RgbValue`s.
//!
//! # Usage
//!
//! ```rust
//! use projcal_core::{Channel, RgbValue};
//!
//! let white_point = RgbValue::new(0.9, 1.2, 0.6);
//! let balance = white_point.normalized_to(Channel::Green);
//! assert_eq!(balance[Channel::Green], 1.0);
//!
//! let luma = white_point.luminance();
//! assert!(luma > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// Rec.709 luma weights, red first.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Weighted Rec.709 luminance of an `[r, g, b]` triplet.
///
/// ```
/// use projcal_core::luminance_rec709;
///
/// assert!((luminance_rec709([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
/// assert!((luminance_rec709([0.0, 1.0, 0.0]) - 0.7152).abs() < 1e-6);
/// ```
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    rgb.iter().zip(REC709_LUMA).map(|(v, w)| v * w).sum()
}

/// One of the three projector/camera color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Red channel (index 0)
    Red,
    /// Green channel (index 1)
    Green,
    /// Blue channel (index 2)
    Blue,
}

impl Channel {
    /// All channels in index order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Returns the component index (R=0, G=1, B=2).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    /// Returns the channel for a component index, if in range.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Channel::Red),
            1 => Some(Channel::Green),
            2 => Some(Channel::Blue),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// An immutable RGB triplet with component-wise arithmetic.
///
/// Division is component-wise as well, which is how balances are
/// compared: `target / balance` gives the per-channel correction.
///
/// # Example
///
/// ```rust
/// use projcal_core::RgbValue;
///
/// let a = RgbValue::new(0.5, 1.0, 0.25);
/// let b = RgbValue::splat(2.0);
/// assert_eq!(a * b, RgbValue::new(1.0, 2.0, 0.5));
/// assert_eq!((a / 0.5).normalize(), RgbValue::new(0.5, 1.0, 0.25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RgbValue {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
}

impl RgbValue {
    /// All components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All components one.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a new value.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Creates a value with all components equal.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Creates a value from an `[r, g, b]` array.
    #[inline]
    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Returns the components as an `[r, g, b]` array.
    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Rec.709 luminance: `0.2126*R + 0.7152*G + 0.0722*B`.
    #[inline]
    pub fn luminance(self) -> f32 {
        luminance_rec709(self.to_array())
    }

    /// Largest component.
    #[inline]
    pub fn max_component(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    /// Smallest component.
    #[inline]
    pub fn min_component(self) -> f32 {
        self.r.min(self.g).min(self.b)
    }

    /// Scales so that the largest component becomes 1.
    ///
    /// Returns the value unchanged if the largest component is not positive.
    #[inline]
    pub fn normalize(self) -> Self {
        let max = self.max_component();
        if max > 0.0 {
            self / max
        } else {
            self
        }
    }

    /// Scales so that the given reference component becomes 1.
    ///
    /// Returns the value unchanged if the reference component is zero.
    #[inline]
    pub fn normalized_to(self, channel: Channel) -> Self {
        let reference = self[channel];
        if reference != 0.0 {
            self / reference
        } else {
            self
        }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.r.max(other.r), self.g.max(other.g), self.b.max(other.b))
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.r.min(other.r), self.g.min(other.g), self.b.min(other.b))
    }

    /// Returns true if all components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Returns a copy with one component replaced.
    #[inline]
    pub fn with(mut self, channel: Channel, value: f32) -> Self {
        self[channel] = value;
        self
    }
}

impl fmt::Display for RgbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} / {:.4} / {:.4}", self.r, self.g, self.b)
    }
}

impl Add for RgbValue {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Sub for RgbValue {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul for RgbValue {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f32> for RgbValue {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Div for RgbValue {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self::new(self.r / rhs.r, self.g / rhs.g, self.b / rhs.b)
    }
}

impl Div<f32> for RgbValue {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

impl Index<usize> for RgbValue {
    type Output = f32;

    #[inline]
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("RgbValue index out of bounds: {}", i),
        }
    }
}

impl IndexMut<usize> for RgbValue {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        match i {
            0 => &mut self.r,
            1 => &mut self.g,
            2 => &mut self.b,
            _ => panic!("RgbValue index out of bounds: {}", i),
        }
    }
}

impl Index<Channel> for RgbValue {
    type Output = f32;

    #[inline]
    fn index(&self, c: Channel) -> &f32 {
        &self[c.index()]
    }
}

impl IndexMut<Channel> for RgbValue {
    #[inline]
    fn index_mut(&mut self, c: Channel) -> &mut f32 {
        &mut self[c.index()]
    }
}

impl From<[f32; 3]> for RgbValue {
    fn from(a: [f32; 3]) -> Self {
        Self::from_array(a)
    }
}
