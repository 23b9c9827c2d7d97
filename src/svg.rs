//! SVG detection and rasterization using resvg/usvg.
//!
//! Marker assets are SVG documents. They are rasterized at their intrinsic
//! size multiplied by the display scale, the way a browser draws an SVG
//! `<img>` onto a high-DPI canvas.

use std::path::Path;

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::bitmap::{Bitmap, SizePx};
use crate::compositor::MAX_DIMENSION;
use crate::error::DecodeError;

/// Returns true if the payload should be treated as SVG.
///
/// A payload is SVG if its content type says so, its name ends in `.svg`,
/// or its text starts with an `<svg` or `<?xml` tag.
pub fn is_svg(bytes: &[u8], content_type: Option<&str>, name: &str) -> bool {
    if content_type.is_some_and(|m| m.contains("image/svg")) {
        return true;
    }
    if name
        .split(['?', '#'])
        .next()
        .is_some_and(|path| path.to_ascii_lowercase().ends_with(".svg"))
    {
        return true;
    }
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || text.starts_with("<?xml")
}

/// Rasterizes an SVG document at `scale` times its intrinsic size.
///
/// `resources_dir` resolves relative `href`s for SVGs loaded from disk.
/// Canvases wider or taller than [`MAX_DIMENSION`] are rejected before any
/// pixels are allocated.
pub fn rasterize_svg(
    data: &[u8],
    scale: f32,
    resources_dir: Option<&Path>,
) -> Result<Bitmap, DecodeError> {
    let mut options = Options::default();
    options.resources_dir = resources_dir.map(Path::to_path_buf);

    let tree = Tree::from_data(data, &options)?;

    let svg_size = tree.size();
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(DecodeError::TooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    let pixels = SizePx::new(width, height);

    let mut pixmap = Pixmap::new(width, height).ok_or(DecodeError::EmptyCanvas { width, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(Bitmap::new(pixmap_to_rgba_image(&pixmap, pixels), scale))
}

/// Converts a premultiplied tiny-skia pixmap to a straight-alpha RGBA image.
fn pixmap_to_rgba_image(pixmap: &Pixmap, size: SizePx) -> RgbaImage {
    let mut img = RgbaImage::new(size.width, size.height);
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    img
}
