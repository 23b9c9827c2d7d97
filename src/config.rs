//! Serializable preload configuration.
//!
//! A [`PreloadConfig`] describes where the marker assets live and how they
//! are drawn. It is read from JSON and turned into the manifest, palette,
//! and compositor used by a [`Preloader`].
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "assetDir": "resources/images",
//!   "assets": { "icons": { "car": "https://cdn.example.com/car.svg" } },
//!   "theme": "dark",
//!   "pixelRatio": 2.0,
//!   "iconRatio": 0.5,
//!   "placeholder": { "size": 32, "fill": "#ffffff" },
//!   "colors": { "error": "#d32f2f" },
//!   "requestTimeoutMs": 10000
//! }
//! ```
//!
//! Every field is optional except that `assetDir` or `assets` must name a
//! background and a direction image.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bitmap::SizePx;
use crate::category::IconCategory;
use crate::compositor::{Compositor, CompositorOptions, MAX_DIMENSION};
use crate::error::{ConfigError, LoadError};
use crate::loader::{AssetLoader, AssetSource, DEFAULT_TIMEOUT, ImageLoader};
use crate::manifest::AssetManifest;
use crate::preferences::{DARK_MODE, Session};
use crate::preload::{DEFAULT_PLACEHOLDER_SIZE, Placeholder, Preloader};
use crate::theme::{ColorKey, Palette, ThemeMode, parse_hex_color, to_hex};

/// Largest accepted device pixel ratio.
const MAX_PIXEL_RATIO: f32 = 8.0;

// ============================================================================
// Settings
// ============================================================================

/// Explicit asset locations. Each entry is a URL or a path.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssetSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    /// Icon location per category name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub icons: BTreeMap<String, String>,
}

impl AssetSettings {
    pub fn is_empty(&self) -> bool {
        self.background.is_none() && self.direction.is_none() && self.icons.is_empty()
    }
}

/// The blank background used when the real one is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderSettings {
    /// Logical side length.
    #[serde(default = "default_placeholder_size")]
    pub size: u32,

    /// `#rgb` or `#rrggbb` fill color.
    #[serde(default = "default_placeholder_fill")]
    pub fill: String,
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            size: default_placeholder_size(),
            fill: default_placeholder_fill(),
        }
    }
}

fn default_placeholder_size() -> u32 {
    DEFAULT_PLACEHOLDER_SIZE
}

fn default_placeholder_fill() -> String {
    to_hex(Placeholder::default().fill)
}

fn default_pixel_ratio() -> f32 {
    CompositorOptions::default().pixel_ratio
}

fn default_icon_ratio() -> f32 {
    CompositorOptions::default().icon_ratio
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

// ============================================================================
// PreloadConfig
// ============================================================================

/// Complete description of a marker icon preload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct PreloadConfig {
    /// Root path or URL laid out as `background.svg`, `direction.svg`, and
    /// `icon/<category>.svg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<String>,

    /// Explicit locations, overriding the `assetDir` layout.
    #[serde(default, skip_serializing_if = "AssetSettings::is_empty")]
    pub assets: AssetSettings,

    #[serde(default)]
    pub theme: ThemeMode,

    /// Device pixel ratio markers are rendered for.
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,

    /// Icon size relative to the background (0.0-1.0].
    #[serde(default = "default_icon_ratio")]
    pub icon_ratio: f32,

    #[serde(default)]
    pub placeholder: PlaceholderSettings,

    /// Color overrides per status key, as hex codes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<String, String>,

    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            asset_dir: None,
            assets: AssetSettings::default(),
            theme: ThemeMode::default(),
            pixel_ratio: default_pixel_ratio(),
            icon_ratio: default_icon_ratio(),
            placeholder: PlaceholderSettings::default(),
            colors: BTreeMap::new(),
            request_timeout_ms: default_timeout_ms(),
        }
    }
}

impl PreloadConfig {
    /// Creates a config reading assets from `asset_dir`.
    pub fn with_asset_dir(asset_dir: impl Into<String>) -> Self {
        Self {
            asset_dir: Some(asset_dir.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Picks the light or dark theme from the session's `darkMode`
    /// preference, if the session sets one.
    pub fn apply_session(&mut self, session: &Session) {
        if let Some(dark) = session.attribute_preference(DARK_MODE).and_then(Value::as_bool) {
            self.theme = ThemeMode::from_dark_mode(dark);
        }
    }

    /// Checks numeric ranges and color syntax.
    ///
    /// The placeholder must fit within [`MAX_DIMENSION`] once scaled by the
    /// pixel ratio, so it can always be composed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pixel_ratio.is_finite()
            && self.pixel_ratio > 0.0
            && self.pixel_ratio <= MAX_PIXEL_RATIO)
        {
            return Err(ConfigError::OutOfRange {
                field: "pixelRatio",
                expected: "in (0, 8]",
                value: self.pixel_ratio as f64,
            });
        }
        if !(self.icon_ratio.is_finite() && self.icon_ratio > 0.0 && self.icon_ratio <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "iconRatio",
                expected: "in (0, 1]",
                value: self.icon_ratio as f64,
            });
        }
        let placeholder_px = SizePx::square(self.placeholder.size).scaled(self.pixel_ratio);
        if self.placeholder.size == 0 || placeholder_px.width > MAX_DIMENSION {
            return Err(ConfigError::OutOfRange {
                field: "placeholder.size",
                expected: "at least 1 and at most 4096 pixels after pixelRatio scaling",
                value: self.placeholder.size as f64,
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "requestTimeoutMs",
                expected: "positive",
                value: 0.0,
            });
        }
        self.placeholder()?;
        self.palette()?;
        Ok(())
    }

    /// Builds the asset manifest.
    pub fn manifest(&self) -> Result<AssetManifest, ConfigError> {
        let base = match &self.asset_dir {
            Some(dir) => Some(AssetManifest::from_base(&AssetSource::parse(dir)?)?),
            None => None,
        };

        let background = match (&self.assets.background, &base) {
            (Some(location), _) => AssetSource::parse(location)?,
            (None, Some(base)) => base.background.clone(),
            (None, None) => return Err(ConfigError::MissingBaseAsset("background")),
        };
        let direction = match (&self.assets.direction, &base) {
            (Some(location), _) => AssetSource::parse(location)?,
            (None, Some(base)) => base.direction.clone(),
            (None, None) => return Err(ConfigError::MissingBaseAsset("direction")),
        };

        let mut manifest = AssetManifest::new(background, direction);
        if let Some(base) = base {
            manifest.icons = base.icons;
        }
        for (name, location) in &self.assets.icons {
            let category: IconCategory = name.parse()?;
            manifest.icons.insert(category, AssetSource::parse(location)?);
        }
        Ok(manifest)
    }

    /// Builds the palette for the configured theme and overrides.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        let mut palette = Palette::for_mode(self.theme);
        for (name, value) in &self.colors {
            let key: ColorKey = name.parse()?;
            let color = parse_hex_color(value).ok_or_else(|| ConfigError::InvalidColor {
                field: format!("colors.{name}"),
                value: value.clone(),
            })?;
            palette = palette.with_color(key, color);
        }
        Ok(palette)
    }

    pub fn placeholder(&self) -> Result<Placeholder, ConfigError> {
        let fill = parse_hex_color(&self.placeholder.fill).ok_or_else(|| {
            ConfigError::InvalidColor {
                field: "placeholder.fill".into(),
                value: self.placeholder.fill.clone(),
            }
        })?;
        Ok(Placeholder {
            size: self.placeholder.size,
            fill,
        })
    }

    pub fn compositor(&self) -> Compositor {
        Compositor::new(CompositorOptions {
            pixel_ratio: self.pixel_ratio,
            icon_ratio: self.icon_ratio,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Builds an [`AssetLoader`] with the configured timeout and pixel ratio.
    pub fn loader(&self) -> Result<AssetLoader, LoadError> {
        AssetLoader::builder()
            .timeout(self.request_timeout())
            .pixel_ratio(self.pixel_ratio)
            .build()
    }

    /// Builds a fully configured [`Preloader`] around `loader`.
    pub fn preloader<L: ImageLoader>(&self, loader: L) -> Result<Preloader<L>, ConfigError> {
        self.validate()?;
        Ok(Preloader::new(loader, self.manifest()?)
            .with_palette(self.palette()?)
            .with_compositor(self.compositor())
            .with_placeholder(self.placeholder()?))
    }
}
