//! Recoloring of monochrome marker icons.

use image::{Rgba, RgbaImage};

use crate::theme::Color;

/// Recolors every pixel of `icon` to `color`, keeping its alpha.
///
/// Equivalent to filling a canvas with `color` and drawing the icon with
/// `destination-atop`: the icon's shape survives, its colors do not.
/// Fully transparent pixels also take the tint so that resampling the
/// result never bleeds a foreign color into the edges.
pub fn tint(icon: &RgbaImage, color: Color) -> RgbaImage {
    let mut result = icon.clone();
    for pixel in result.pixels_mut() {
        let a = pixel[3];
        *pixel = Rgba([color.red, color.green, color.blue, a]);
    }
    result
}
