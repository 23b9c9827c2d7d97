//! Error types for loading, compositing, and configuration.
//!
//! [`LoadError`] and [`CompositionError`] are produced per asset and are
//! absorbed by the preloader, which substitutes a degraded icon instead of
//! failing. [`ConfigError`] is reported before any preload starts.

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Load Errors
// ============================================================================

/// Failure to fetch or decode a single image asset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The asset could not be read from the filesystem.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request could not be completed.
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}{}", status_suffix(.message))]
    HttpStatus {
        url: String,
        status: u16,
        /// Response body text, if the server sent one.
        message: Option<String>,
    },

    /// The payload was fetched but is not a usable image.
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    /// The URL scheme is not one the loader can fetch.
    #[error("unsupported asset source: {0}")]
    UnsupportedSource(String),

    /// The asset manifest has no entry for a category.
    #[error("no icon asset declared for category '{0}'")]
    MissingAsset(String),
}

fn status_suffix(message: &Option<String>) -> String {
    match message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => format!(": {m}"),
        _ => String::new(),
    }
}

/// Reasons an image payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("invalid raster image: {0}")]
    Raster(#[from] image::ImageError),

    /// The SVG parsed but its rasterized canvas would be empty.
    #[error("SVG rasterizes to an empty {width}x{height} canvas")]
    EmptyCanvas { width: u32, height: u32 },

    /// The SVG's intrinsic size at the requested scale exceeds the side limit.
    #[error("SVG rasterizes to a {width}x{height} canvas, over the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}

// ============================================================================
// Composition Errors
// ============================================================================

/// Malformed compositor input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    /// A bitmap has no pixels.
    #[error("{role} bitmap is empty ({width}x{height})")]
    EmptyBitmap {
        role: &'static str,
        width: u32,
        height: u32,
    },

    /// A bitmap's display scale is zero, negative, or not finite.
    #[error("{role} bitmap has invalid scale {scale}")]
    InvalidScale { role: &'static str, scale: f32 },

    /// The composed bitmap would exceed the maximum side length.
    #[error("composed bitmap {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Invalid or unreadable preload configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A color is not a `#rgb` or `#rrggbb` hex code.
    #[error("invalid color for {field}: '{value}'")]
    InvalidColor { field: String, value: String },

    #[error("unknown icon category '{0}'")]
    UnknownCategory(String),

    #[error("unknown color key '{0}'")]
    UnknownColorKey(String),

    #[error("invalid asset location '{location}': {reason}")]
    InvalidAsset { location: String, reason: String },

    /// A numeric option is outside its accepted range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    /// Neither `assets` nor `assetDir` provide a background and direction image.
    #[error("config declares no {0} asset")]
    MissingBaseAsset(&'static str),
}
