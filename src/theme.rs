//! Status colors used to tint marker icons.
//!
//! Each [`ColorKey`] is a semantic device status. A [`Palette`] resolves the
//! keys to concrete sRGB colors for a [`ThemeMode`].

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An 8-bit sRGB color.
pub type Color = Srgb<u8>;

// ============================================================================
// ColorKey
// ============================================================================

/// Semantic status color a marker can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    /// Device is online.
    Info,
    Success,
    /// Device is offline.
    Error,
    /// Status is unknown.
    Neutral,
}

impl ColorKey {
    pub const ALL: [ColorKey; 4] = [Self::Info, Self::Success, Self::Error, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Neutral => "neutral",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ConfigError::UnknownColorKey(s.to_string()))
    }
}

// ============================================================================
// ThemeMode
// ============================================================================

/// Which built-in palette to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Material default status colors. This is what markers use unless the
    /// application theme is requested explicitly.
    #[default]
    Material,
    /// Application light theme.
    Light,
    /// Application dark theme.
    Dark,
}

impl ThemeMode {
    /// Picks the application theme for a dark mode preference.
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }
}

// ============================================================================
// Palette
// ============================================================================

/// Material grey 500, used for the neutral status in every theme.
const GREY_500: Color = Srgb::new(0x9e, 0x9e, 0x9e);

/// Concrete color for every [`ColorKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub info: Color,
    pub success: Color,
    pub error: Color,
    pub neutral: Color,
}

impl Palette {
    /// Material default status colors.
    pub fn material() -> Self {
        Self {
            info: Srgb::new(0x02, 0x88, 0xd1),
            success: Srgb::new(0x2e, 0x7d, 0x32),
            error: Srgb::new(0xd3, 0x2f, 0x2f),
            neutral: GREY_500,
        }
    }

    pub fn light() -> Self {
        Self {
            info: Srgb::new(0x1a, 0x73, 0xe8),
            success: Srgb::new(0x34, 0xa8, 0x53),
            error: Srgb::new(0xea, 0x43, 0x35),
            neutral: GREY_500,
        }
    }

    pub fn dark() -> Self {
        Self {
            info: Srgb::new(0x8a, 0xb4, 0xf8),
            success: Srgb::new(0x81, 0xc9, 0x95),
            error: Srgb::new(0xf2, 0x8b, 0x82),
            neutral: GREY_500,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Material => Self::material(),
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    /// Returns the color for a status key.
    pub fn resolve(&self, key: ColorKey) -> Color {
        match key {
            ColorKey::Info => self.info,
            ColorKey::Success => self.success,
            ColorKey::Error => self.error,
            ColorKey::Neutral => self.neutral,
        }
    }

    /// Replaces the color for one key.
    pub fn with_color(mut self, key: ColorKey, color: Color) -> Self {
        match key {
            ColorKey::Info => self.info = color,
            ColorKey::Success => self.success = color,
            ColorKey::Error => self.error = color,
            ColorKey::Neutral => self.neutral = color,
        }
        self
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::material()
    }
}

// ============================================================================
// Color Utilities
// ============================================================================

/// Parses a `#rgb` or `#rrggbb` hex color.
///
/// Anything else, including named colors and hex codes without the leading
/// `#`, is rejected.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let digits = value.strip_prefix('#')?;
    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Srgb::<u8>::from_str(digits).ok()
}

/// Formats a color as `#rrggbb`.
pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Converts a color to an opaque RGBA pixel.
pub fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba([color.red, color.green, color.blue, 255])
}
