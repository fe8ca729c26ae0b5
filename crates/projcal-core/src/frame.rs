//! Camera frames and radiance images.
//!
//! - [`LdrFrame`] - 8-bit interleaved RGB, as decoded from one camera capture
//! - [`RadianceImage`] - f32 interleaved RGB, as assembled from a bracket set
//!
//! # Memory Layout
//!
//! Both store pixels in **row-major** order, top-to-bottom, with the three
//! components interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  ← Row 0
//!         [R G B R G B R G B ...]  ← Row 1
//! ```
//!
//! # Usage
//!
//! ```rust
//! use projcal_core::{RadianceImage, RgbValue};
//!
//! let mut hdr = RadianceImage::new(4, 4);
//! hdr.set_pixel(1, 1, RgbValue::splat(2.0));
//! assert_eq!(hdr.max_luminance(), 2.0);
//! ```

use crate::{Error, Rect, RegionMask, Result, RgbValue, luminance_rec709};

/// An 8-bit RGB frame decoded from a camera capture.
#[derive(Debug, Clone, PartialEq)]
pub struct LdrFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LdrFrame {
    /// Wraps an interleaved RGB buffer.
    ///
    /// Fails if the buffer length is not `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "empty frame"));
        }
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Creates a frame filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * 3);
        for _ in 0..count {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw interleaved RGB bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixel at (x, y) as `[r, g, b]` codes.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Mean Rec.709 luminance over a rectangle, in 8-bit code units.
    ///
    /// Returns 0 for an empty rectangle.
    pub fn mean_luminance(&self, roi: Rect) -> f32 {
        let roi = match roi.intersect(&Rect::new(0, 0, self.width, self.height)) {
            Some(r) => r,
            None => return 0.0,
        };
        let mut sum = 0.0f64;
        for y in roi.y..roi.bottom() {
            for x in roi.x..roi.right() {
                let [r, g, b] = self.pixel(x, y);
                sum += luminance_rec709([r as f32, g as f32, b as f32]) as f64;
            }
        }
        (sum / roi.area() as f64) as f32
    }
}

/// A floating-point RGB radiance raster.
///
/// Produced by HDR assembly and by differencing two assemblies during
/// region detection. Values are relative radiance and carry no unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RadianceImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl RadianceImage {
    /// Creates an image filled with zeros.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * 3],
        }
    }

    /// Wraps an interleaved RGB buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} floats, got {}", expected, data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw interleaved RGB values.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns true if the image holds at least one pixel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.data.is_empty()
    }

    /// Pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> RgbValue {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        RgbValue::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Sets the pixel at (x, y).
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: RgbValue) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.data[i] = value.r;
        self.data[i + 1] = value.g;
        self.data[i + 2] = value.b;
    }

    /// Iterates pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = RgbValue> + '_ {
        self.data
            .chunks_exact(3)
            .map(|p| RgbValue::new(p[0], p[1], p[2]))
    }

    /// Largest per-pixel Rec.709 luminance (0 for an empty image).
    pub fn max_luminance(&self) -> f32 {
        self.pixels()
            .map(RgbValue::luminance)
            .fold(0.0f32, f32::max)
    }

    /// Clamps every component to be non-negative.
    pub fn clamp_non_negative(&mut self) {
        for v in &mut self.data {
            if !(*v >= 0.0) {
                *v = 0.0;
            }
        }
    }

    /// Returns `self - factor * other`, clamped to non-negative values.
    ///
    /// This is the "only this projector vs. all the others" residual used
    /// to locate one projector's light.
    pub fn subtract_scaled(&self, other: &RadianceImage, factor: f32) -> Result<Self> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::dimension_mismatch(
                (self.width, self.height),
                (other.width, other.height),
            ));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - factor * b).max(0.0))
            .collect();
        Ok(Self {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Mean value over the whole image.
    pub fn mean(&self) -> RgbValue {
        let count = self.pixel_count();
        if count == 0 {
            return RgbValue::ZERO;
        }
        let sum = self.pixels().fold([0.0f64; 3], |acc, p| {
            [acc[0] + p.r as f64, acc[1] + p.g as f64, acc[2] + p.b as f64]
        });
        let n = count as f64;
        RgbValue::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32)
    }

    /// Mean value over a rectangle (zero if the rectangle is empty).
    pub fn mean_in_rect(&self, roi: Rect) -> RgbValue {
        let roi = match roi.intersect(&Rect::new(0, 0, self.width, self.height)) {
            Some(r) => r,
            None => return RgbValue::ZERO,
        };
        let mut sum = [0.0f64; 3];
        for y in roi.y..roi.bottom() {
            for x in roi.x..roi.right() {
                let p = self.pixel(x, y);
                sum[0] += p.r as f64;
                sum[1] += p.g as f64;
                sum[2] += p.b as f64;
            }
        }
        let n = roi.area() as f64;
        RgbValue::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32)
    }

    /// Mean value over the pixels set in a mask.
    ///
    /// Returns zero if the mask does not match the image size or is empty.
    pub fn mean_in_mask(&self, mask: &RegionMask) -> RgbValue {
        if mask.width() != self.width || mask.height() != self.height {
            return RgbValue::ZERO;
        }
        let mut sum = [0.0f64; 3];
        let mut count = 0usize;
        for (p, &inside) in self.pixels().zip(mask.bits()) {
            if inside {
                sum[0] += p.r as f64;
                sum[1] += p.g as f64;
                sum[2] += p.b as f64;
                count += 1;
            }
        }
        if count == 0 {
            return RgbValue::ZERO;
        }
        let n = count as f64;
        RgbValue::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32)
    }
}
