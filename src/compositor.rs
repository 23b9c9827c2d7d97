//! Marker icon composition.
//!
//! A marker is the background bitmap with a tinted category icon centered on
//! top. The output is sized from the background's logical size and the
//! display pixel ratio, so the same assets produce sharp markers on any
//! screen density.
//!
//! # Example
//!
//! ```
//! use image::Rgba;
//! use marker_icons::{Bitmap, Compositor, CompositorOptions, SizePx};
//! use palette::Srgb;
//!
//! let background = Bitmap::solid(SizePx::square(32), 1.0, Rgba([255, 255, 255, 255]));
//! let icon = Bitmap::solid(SizePx::square(16), 1.0, Rgba([0, 0, 0, 255]));
//!
//! let compositor = Compositor::new(CompositorOptions { pixel_ratio: 2.0, ..Default::default() });
//! let marker = compositor
//!     .prepare_icon(&background, Some(&icon), Some(Srgb::new(0xd3, 0x2f, 0x2f)))
//!     .unwrap();
//!
//! assert_eq!(marker.dimensions(), SizePx::square(64));
//! assert_eq!(marker.center_pixel(), Some(Rgba([0xd3, 0x2f, 0x2f, 255])));
//! ```

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::bitmap::{Bitmap, RectPx, SizePx};
use crate::error::CompositionError;
use crate::theme::Color;
use crate::tint::tint;

/// Largest side length, in pixels, of a composed marker.
pub const MAX_DIMENSION: u32 = 4096;

// ============================================================================
// CompositorOptions
// ============================================================================

/// Sizing parameters for composed markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorOptions {
    /// Device pixel ratio of the target display.
    pub pixel_ratio: f32,

    /// Size of the icon relative to the background on each axis.
    pub icon_ratio: f32,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            icon_ratio: 0.5,
        }
    }
}

// ============================================================================
// Compositor
// ============================================================================

/// Composes background and icon bitmaps into marker bitmaps.
///
/// Composition is a pure function of the inputs and the options: the same
/// bitmaps and tint always produce the same pixels.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    options: CompositorOptions,
}

impl Compositor {
    pub fn new(options: CompositorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompositorOptions {
        &self.options
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.options.pixel_ratio
    }

    /// Draws `background` at output size and, if given, `icon` tinted with
    /// `tint` centered on top.
    ///
    /// Without an icon the tint has no effect and the result is the
    /// background alone, resampled to the output size.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError`] if a bitmap is empty or has an unusable
    /// scale, or if the output would exceed [`MAX_DIMENSION`].
    pub fn prepare_icon(
        &self,
        background: &Bitmap,
        icon: Option<&Bitmap>,
        tint_color: Option<Color>,
    ) -> Result<Bitmap, CompositionError> {
        check_bitmap(background, "background")?;
        if let Some(icon) = icon {
            check_bitmap(icon, "icon")?;
        }
        let pixel_ratio = self.options.pixel_ratio;
        if !is_valid_scale(pixel_ratio) {
            return Err(CompositionError::InvalidScale {
                role: "output",
                scale: pixel_ratio,
            });
        }

        let (logical_w, logical_h) = background.logical_size();
        let output = SizePx::new(
            ((logical_w * pixel_ratio).round() as u32).max(1),
            ((logical_h * pixel_ratio).round() as u32).max(1),
        );
        if output.width > MAX_DIMENSION || output.height > MAX_DIMENSION {
            return Err(CompositionError::TooLarge {
                width: output.width,
                height: output.height,
                max: MAX_DIMENSION,
            });
        }

        let mut canvas = resample(&background.data, output);

        if let Some(icon) = icon {
            let icon_size = output.scaled(self.options.icon_ratio);
            let colored = match tint_color {
                Some(color) => tint(&icon.data, color),
                None => icon.data.clone(),
            };
            let sized = resample(&colored, icon_size);
            let at = RectPx::centered(output, icon_size);
            composite_over(&mut canvas, &sized, at.x, at.y);
        }

        Ok(Bitmap::new(canvas, pixel_ratio))
    }
}

/// Composes with default options (pixel ratio 1.0, icon at half size).
pub fn prepare_icon(
    background: &Bitmap,
    icon: Option<&Bitmap>,
    tint_color: Option<Color>,
) -> Result<Bitmap, CompositionError> {
    Compositor::default().prepare_icon(background, icon, tint_color)
}

fn is_valid_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0
}

fn check_bitmap(bitmap: &Bitmap, role: &'static str) -> Result<(), CompositionError> {
    if bitmap.is_empty() {
        return Err(CompositionError::EmptyBitmap {
            role,
            width: bitmap.data.width(),
            height: bitmap.data.height(),
        });
    }
    if !is_valid_scale(bitmap.scale) {
        return Err(CompositionError::InvalidScale {
            role,
            scale: bitmap.scale,
        });
    }
    Ok(())
}

/// Returns `image` at `size`, copying it unchanged when it already fits.
fn resample(image: &RgbaImage, size: SizePx) -> RgbaImage {
    if image.dimensions() == (size.width, size.height) {
        image.clone()
    } else {
        imageops::resize(image, size.width, size.height, FilterType::Triangle)
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Draws `src` over `dest` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside `dest` are clipped, including offsets that
/// overflow `u32`.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let (Some(dx), Some(dy)) = (x.checked_add(sx), y.checked_add(sy)) else {
            continue;
        };
        let Some(dst_pixel) = dest.get_pixel_mut_checked(dx, dy) else {
            continue;
        };
        match src_pixel[3] {
            0 => {}
            255 => *dst_pixel = *src_pixel,
            _ => *dst_pixel = source_over(*src_pixel, *dst_pixel),
        }
    }
}

/// Source-over blend of two straight-alpha pixels.
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| -> u8 {
        let out = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        out.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);

    fn background() -> Bitmap {
        Bitmap::solid(SizePx::square(32), 1.0, GREY)
    }

    /// A 16x16 icon: opaque black disc-ish square with a transparent border.
    fn icon() -> Bitmap {
        let mut data = RgbaImage::new(16, 16);
        for (x, y, p) in data.enumerate_pixels_mut() {
            if (2..14).contains(&x) && (2..14).contains(&y) {
                *p = Rgba([0, 0, 0, 255]);
            }
        }
        Bitmap::from_image(data)
    }

    #[test]
    fn background_only_keeps_background_pixels() {
        let out = prepare_icon(&background(), None, None).unwrap();
        assert_eq!(out.dimensions(), SizePx::square(32));
        assert!(out.data.pixels().all(|p| *p == GREY));
    }

    #[test]
    fn tint_without_icon_changes_nothing() {
        let plain = prepare_icon(&background(), None, None).unwrap();
        let tinted = prepare_icon(&background(), None, Some(Srgb::new(255, 0, 0))).unwrap();
        assert_eq!(plain, tinted);
    }

    #[test]
    fn icon_is_tinted_and_centered() {
        let red = Srgb::new(255, 0, 0);
        let out = prepare_icon(&background(), Some(&icon()), Some(red)).unwrap();

        // icon occupies 16x16 at (8, 8); its opaque core is (10..22)
        assert_eq!(out.pixel(16, 16), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(out.pixel(10, 10), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(out.pixel(9, 9), Some(GREY));
        assert_eq!(out.pixel(0, 0), Some(GREY));
        assert_eq!(out.pixel(31, 31), Some(GREY));
    }

    #[test]
    fn untinted_icon_keeps_its_colors() {
        let out = prepare_icon(&background(), Some(&icon()), None).unwrap();
        assert_eq!(out.center_pixel(), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn composition_is_deterministic() {
        let compositor = Compositor::new(CompositorOptions {
            pixel_ratio: 1.5,
            icon_ratio: 0.6,
        });
        let tint = Some(Srgb::new(0x2e, 0x7d, 0x32));
        let a = compositor.prepare_icon(&background(), Some(&icon()), tint).unwrap();
        let b = compositor.prepare_icon(&background(), Some(&icon()), tint).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), SizePx::square(48));
    }

    #[test]
    fn output_follows_logical_size_and_pixel_ratio() {
        let hi_dpi_background = Bitmap::solid(SizePx::square(32), 2.0, WHITE);
        assert_eq!(hi_dpi_background.dimensions(), SizePx::square(64));

        let compositor = Compositor::new(CompositorOptions {
            pixel_ratio: 3.0,
            ..Default::default()
        });
        let out = compositor.prepare_icon(&hi_dpi_background, None, None).unwrap();
        assert_eq!(out.dimensions(), SizePx::square(96));
        assert_eq!(out.scale, 3.0);
        assert_eq!(out.logical_size(), (32.0, 32.0));
    }

    #[test]
    fn solid_icon_is_not_an_error() {
        let solid = Bitmap::solid(SizePx::square(24), 1.0, Rgba([9, 9, 9, 255]));
        let out = prepare_icon(&background(), Some(&solid), Some(Srgb::new(0, 0, 255))).unwrap();
        let center = out.center_pixel().unwrap();
        assert_eq!(center[3], 255);
        assert!(center[2] >= 250 && center[0] <= 5, "got {:?}", center);
    }

    #[test]
    fn empty_bitmaps_are_rejected() {
        let empty = Bitmap::from_image(RgbaImage::new(0, 0));
        assert!(matches!(
            prepare_icon(&empty, None, None),
            Err(CompositionError::EmptyBitmap { role: "background", .. })
        ));
        assert!(matches!(
            prepare_icon(&background(), Some(&empty), None),
            Err(CompositionError::EmptyBitmap { role: "icon", .. })
        ));
    }

    #[test]
    fn invalid_scales_are_rejected() {
        let zero_scale = Bitmap::new(RgbaImage::new(4, 4), 0.0);
        assert!(matches!(
            prepare_icon(&zero_scale, None, None),
            Err(CompositionError::InvalidScale { role: "background", .. })
        ));

        let compositor = Compositor::new(CompositorOptions {
            pixel_ratio: f32::NAN,
            ..Default::default()
        });
        assert!(matches!(
            compositor.prepare_icon(&background(), None, None),
            Err(CompositionError::InvalidScale { role: "output", .. })
        ));
    }

    #[test]
    fn oversized_output_is_rejected() {
        let compositor = Compositor::new(CompositorOptions {
            pixel_ratio: 200.0,
            ..Default::default()
        });
        assert!(matches!(
            compositor.prepare_icon(&background(), None, None),
            Err(CompositionError::TooLarge { max: MAX_DIMENSION, .. })
        ));
    }

    #[test]
    fn composite_clips_at_edges() {
        let mut dest = RgbaImage::from_pixel(4, 4, GREY);
        let src = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 255, 255]));
        composite_over(&mut dest, &src, 2, 2);
        assert_eq!(dest.get_pixel(3, 3).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(1, 1).0, GREY.0);
    }

    #[test]
    fn composite_ignores_offsets_past_u32_max() {
        let mut dest = RgbaImage::from_pixel(2, 2, GREY);
        let src = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 255, 255]));
        composite_over(&mut dest, &src, u32::MAX - 1, u32::MAX);
        composite_over(&mut dest, &src, u32::MAX, 0);
        assert!(dest.pixels().all(|p| *p == GREY));
    }

    #[test]
    fn composite_blends_translucent_pixels() {
        let mut dest = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 128]));
        composite_over(&mut dest, &src, 0, 0);
        let p = dest.get_pixel(0, 0);
        assert!(p[0] > 0 && p[2] > 0);
        assert_eq!(p[3], 255);
    }
}
