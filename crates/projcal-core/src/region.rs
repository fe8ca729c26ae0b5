//! Regions where one projector's light falls in the camera frame.
//!
//! A region is either a coarse [`BoundingRegion`] (centroid plus half-size)
//! or a per-pixel [`RegionMask`] for irregular projected shapes.

use crate::{Error, RadianceImage, Rect, Result, RgbValue};
use serde::{Deserialize, Serialize};

/// Square region described by its centroid and half the side length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    /// Centroid X in pixels
    pub centroid_x: f32,
    /// Centroid Y in pixels
    pub centroid_y: f32,
    /// Half of the estimated side length in pixels
    pub half_size: f32,
}

impl BoundingRegion {
    /// Estimated area in pixels (`(2 * half_size)^2`).
    #[inline]
    pub fn area(&self) -> f32 {
        let side = 2.0 * self.half_size;
        side * side
    }

    /// Pixel rectangle covered by this region, clipped to the frame.
    pub fn to_rect(&self, frame_width: u32, frame_height: u32) -> Rect {
        Rect::around(
            self.centroid_x,
            self.centroid_y,
            self.half_size,
            frame_width,
            frame_height,
        )
    }
}

/// Per-pixel membership mask with its centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
    centroid: (f32, f32),
    pixel_count: usize,
}

impl RegionMask {
    /// Builds a mask from row-major membership bits.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Result<Self> {
        if bits.len() != width as usize * height as usize {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("mask has {} entries", bits.len()),
            ));
        }
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        let mut pixel_count = 0usize;
        for (i, _) in bits.iter().enumerate().filter(|(_, b)| **b) {
            sum_x += (i % width as usize) as f64;
            sum_y += (i / width as usize) as f64;
            pixel_count += 1;
        }
        let centroid = if pixel_count > 0 {
            (
                (sum_x / pixel_count as f64) as f32,
                (sum_y / pixel_count as f64) as f32,
            )
        } else {
            (0.0, 0.0)
        };
        Ok(Self {
            width,
            height,
            bits,
            centroid,
            pixel_count,
        })
    }

    /// Mask width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major membership bits.
    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of member pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Centroid of the member pixels (0, 0 when empty).
    #[inline]
    pub fn centroid(&self) -> (f32, f32) {
        self.centroid
    }

    /// Returns true if (x, y) is a member pixel.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }
}

/// The detected footprint of one projector.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectorRegion {
    /// Coarse square region
    Bounds(BoundingRegion),
    /// Exact pixel membership
    Mask(RegionMask),
}

impl ProjectorRegion {
    /// Mean radiance of `image` inside this region.
    pub fn mean_of(&self, image: &RadianceImage) -> RgbValue {
        match self {
            ProjectorRegion::Bounds(b) => image.mean_in_rect(b.to_rect(image.width(), image.height())),
            ProjectorRegion::Mask(m) => image.mean_in_mask(m),
        }
    }

    /// Centroid of the region.
    pub fn centroid(&self) -> (f32, f32) {
        match self {
            ProjectorRegion::Bounds(b) => (b.centroid_x, b.centroid_y),
            ProjectorRegion::Mask(m) => m.centroid(),
        }
    }

    /// Approximate area of the region in pixels.
    pub fn area(&self) -> f32 {
        match self {
            ProjectorRegion::Bounds(b) => b.area(),
            ProjectorRegion::Mask(m) => m.pixel_count() as f32,
        }
    }
}
