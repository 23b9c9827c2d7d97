//! Bitmap types shared by the loader, compositor, and cache.
//!
//! A [`Bitmap`] is an RGBA buffer plus the display scale it was produced for,
//! mirroring how the browser pairs a canvas with `devicePixelRatio`.

use image::{Rgba, RgbaImage};

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    /// Centers an `inner`-sized rectangle within `outer`.
    ///
    /// If `inner` is larger than `outer` on an axis, the rectangle starts at 0
    /// on that axis.
    pub fn centered(outer: SizePx, inner: SizePx) -> Self {
        Self {
            x: outer.width.saturating_sub(inner.width) / 2,
            y: outer.height.saturating_sub(inner.height) / 2,
            width: inner.width,
            height: inner.height,
        }
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Returns true if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both sides by `factor`, rounding and keeping each side at least 1.
    pub fn scaled(&self, factor: f32) -> Self {
        let scale = |v: u32| ((v as f32 * factor).round() as u32).max(1);
        Self::new(scale(self.width), scale(self.height))
    }
}

/// A decoded or composed image with its display scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    /// The pixel data in non-premultiplied RGBA.
    pub data: RgbaImage,

    /// The display scale factor the pixels were produced for.
    ///
    /// The logical size of the bitmap is `dimensions / scale`. A background
    /// rasterized for a 2x display at logical 32x32 holds 64x64 pixels.
    pub scale: f32,
}

impl Bitmap {
    pub fn new(data: RgbaImage, scale: f32) -> Self {
        Self { data, scale }
    }

    /// Wraps pixel data produced at scale 1.0.
    pub fn from_image(data: RgbaImage) -> Self {
        Self::new(data, 1.0)
    }

    /// Creates a bitmap filled with a single color.
    ///
    /// `logical` is the size in logical units; the pixel buffer is
    /// `logical * scale`.
    pub fn solid(logical: SizePx, scale: f32, fill: Rgba<u8>) -> Self {
        let pixels = logical.scaled(scale);
        Self::new(RgbaImage::from_pixel(pixels.width, pixels.height, fill), scale)
    }

    /// Returns the pixel dimensions of the bitmap.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    /// Returns the logical size of the bitmap (dimensions / scale).
    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.data.width() as f32 / self.scale,
            self.data.height() as f32 / self.scale,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().is_empty()
    }

    /// Returns the pixel at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.data.get_pixel_checked(x, y).copied()
    }

    /// Returns the pixel at the center of the bitmap.
    pub fn center_pixel(&self) -> Option<Rgba<u8>> {
        self.pixel(self.data.width() / 2, self.data.height() / 2)
    }
}
