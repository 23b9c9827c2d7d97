//! The set of image assets a preload draws from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::category::IconCategory;
use crate::error::ConfigError;
use crate::loader::AssetSource;

/// Asset file name of the marker background.
pub const BACKGROUND_FILE: &str = "background.svg";
/// Asset file name of the direction arrow.
pub const DIRECTION_FILE: &str = "direction.svg";
/// Directory holding per-category icons, relative to the asset root.
pub const ICON_DIR: &str = "icon";

/// Background, direction, and per-category icon sources.
///
/// A category without an entry is not an error here: the preloader treats
/// it as a failed load and draws that category's markers without an icon.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetManifest {
    pub background: AssetSource,
    pub direction: AssetSource,
    pub icons: BTreeMap<IconCategory, AssetSource>,
}

impl AssetManifest {
    /// Creates a manifest with no category icons.
    pub fn new(background: AssetSource, direction: AssetSource) -> Self {
        Self {
            background,
            direction,
            icons: BTreeMap::new(),
        }
    }

    /// Builds a manifest from a directory laid out as
    /// `background.svg`, `direction.svg`, and `icon/<category>.svg`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let icons = IconCategory::ALL
            .into_iter()
            .map(|c| (c, AssetSource::Path(dir.join(ICON_DIR).join(c.file_name()))))
            .collect();
        Self {
            background: AssetSource::Path(dir.join(BACKGROUND_FILE)),
            direction: AssetSource::Path(dir.join(DIRECTION_FILE)),
            icons,
        }
    }

    /// Same layout as [`from_dir`](Self::from_dir), rooted at a path or URL.
    pub fn from_base(base: &AssetSource) -> Result<Self, ConfigError> {
        let mut manifest = Self::new(base.join(BACKGROUND_FILE)?, base.join(DIRECTION_FILE)?);
        for category in IconCategory::ALL {
            let relative = format!("{ICON_DIR}/{}", category.file_name());
            manifest.icons.insert(category, base.join(&relative)?);
        }
        Ok(manifest)
    }

    pub fn with_icon(mut self, category: IconCategory, source: AssetSource) -> Self {
        self.icons.insert(category, source);
        self
    }

    pub fn icon(&self, category: IconCategory) -> Option<&AssetSource> {
        self.icons.get(&category)
    }
}
