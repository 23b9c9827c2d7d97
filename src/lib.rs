//! marker-icons: Status-tinted map marker icons
//!
//! This crate prepares the bitmaps a map renderer draws for device markers.
//! Each of the 22 device categories is combined with each of the four status
//! colors: the category icon is tinted, scaled, and centered on a shared
//! background. The results land in a write-once [`IconCache`].
//!
//! # Example
//!
//! ```no_run
//! use marker_icons::{ColorKey, IconCategory, PreloadConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = PreloadConfig::with_asset_dir("resources/images");
//! config.pixel_ratio = 2.0;
//!
//! // The loader and compositor share the configured pixel ratio
//! let preloader = config.preloader(config.loader()?)?;
//!
//! // Failed loads degrade to plain backgrounds, so this always completes
//! let cache = preloader.run().await;
//! let marker = cache.get(IconCategory::Truck, ColorKey::Success).unwrap();
//! println!("{}x{}", marker.bitmap().data.width(), marker.bitmap().data.height());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! A [`PreloadConfig`] read from JSON builds the manifest, palette, and
//! compositor in one go:
//!
//! ```
//! use marker_icons::PreloadConfig;
//!
//! let config = PreloadConfig::from_json(r#"{ "assetDir": "assets", "theme": "dark" }"#).unwrap();
//! let manifest = config.manifest().unwrap();
//! assert_eq!(manifest.icons.len(), 22);
//! ```

mod bitmap;
mod cache;
mod category;
mod compositor;
mod config;
mod error;
mod loader;
mod manifest;
mod preferences;
mod preload;
mod svg;
mod theme;
mod tint;

pub use bitmap::{Bitmap, RectPx, SizePx};
pub use cache::{ComposedIcon, IconCache, IconKey};
pub use category::{IconCategory, map_icon_key};
pub use compositor::{
    Compositor, CompositorOptions, MAX_DIMENSION, composite_over, prepare_icon,
};
pub use config::{AssetSettings, PlaceholderSettings, PreloadConfig};
pub use error::{CompositionError, ConfigError, DecodeError, LoadError};
pub use loader::{AssetLoader, AssetLoaderBuilder, AssetSource, DEFAULT_TIMEOUT, ImageLoader};
pub use manifest::{AssetManifest, BACKGROUND_FILE, DIRECTION_FILE, ICON_DIR};
pub use preferences::{DARK_MODE, Session};
pub use preload::{DEFAULT_PLACEHOLDER_SIZE, Placeholder, PreloadPhase, Preloader};
pub use svg::{is_svg, rasterize_svg};
pub use theme::{Color, ColorKey, Palette, ThemeMode, parse_hex_color, to_hex, to_rgba};
pub use tint::tint;
