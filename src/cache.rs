//! The composed marker icon cache.
//!
//! An [`IconCache`] is produced once by the preloader and read by the map
//! renderer afterwards. Entries are written exactly once while the cache is
//! being built and never change after that.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::str::FromStr;

use crate::bitmap::Bitmap;
use crate::category::{IconCategory, map_icon_key};
use crate::error::ConfigError;
use crate::theme::{Color, ColorKey};

// ============================================================================
// IconKey
// ============================================================================

/// Cache key for one marker: a category drawn in a status color.
///
/// Displays and parses as `"<category>-<color>"`, e.g. `car-error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconKey {
    pub category: IconCategory,
    pub color: ColorKey,
}

impl IconKey {
    pub fn new(category: IconCategory, color: ColorKey) -> Self {
        Self { category, color }
    }

    /// Every declared category/color combination.
    pub fn all() -> impl Iterator<Item = IconKey> {
        IconCategory::ALL.into_iter().flat_map(|category| {
            ColorKey::ALL
                .into_iter()
                .map(move |color| IconKey::new(category, color))
        })
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.color)
    }
}

impl FromStr for IconKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, color) = s
            .rsplit_once('-')
            .ok_or_else(|| ConfigError::UnknownColorKey(s.to_string()))?;
        Ok(Self::new(category.parse()?, color.parse()?))
    }
}

// ============================================================================
// ComposedIcon
// ============================================================================

/// A prepared marker bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedIcon {
    bitmap: Bitmap,
    tint: Color,
    degraded: bool,
}

impl ComposedIcon {
    /// A marker with its category icon drawn in `tint`.
    pub fn full(bitmap: Bitmap, tint: Color) -> Self {
        Self {
            bitmap,
            tint,
            degraded: false,
        }
    }

    /// A background-only marker used when the category icon was unavailable.
    pub fn degraded(bitmap: Bitmap, tint: Color) -> Self {
        Self {
            bitmap,
            tint,
            degraded: true,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// The status color this marker was prepared for.
    pub fn tint(&self) -> Color {
        self.tint
    }

    /// True if the marker lacks its foreground icon.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }
}

// ============================================================================
// IconCache
// ============================================================================

/// Prepared marker bitmaps, plus the plain background and direction arrow.
#[derive(Debug, Clone)]
pub struct IconCache {
    background: Bitmap,
    direction: Bitmap,
    icons: HashMap<IconKey, ComposedIcon>,
}

impl IconCache {
    pub fn get(&self, category: IconCategory, color: ColorKey) -> Option<&ComposedIcon> {
        self.icons.get(&IconKey::new(category, color))
    }

    /// Looks up an entry by its `"<category>-<color>"` key.
    pub fn get_by_key(&self, key: &str) -> Option<&ComposedIcon> {
        let key = key.parse::<IconKey>().ok()?;
        self.icons.get(&key)
    }

    /// Looks up the marker for a backend device category, folding aliases
    /// and unknown categories with [`map_icon_key`].
    pub fn lookup(&self, device_category: &str, color: ColorKey) -> Option<&ComposedIcon> {
        self.get(map_icon_key(device_category), color)
    }

    /// The background alone, as drawn under every marker.
    pub fn background(&self) -> &Bitmap {
        &self.background
    }

    /// The direction arrow overlay.
    pub fn direction(&self) -> &Bitmap {
        &self.direction
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// True if every declared category/color pair has an entry.
    pub fn is_complete(&self) -> bool {
        IconKey::all().all(|key| self.icons.contains_key(&key))
    }

    /// Number of entries drawn without their category icon.
    pub fn degraded_count(&self) -> usize {
        self.icons.values().filter(|icon| icon.is_degraded()).count()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (IconKey, &ComposedIcon)> {
        let mut entries: Vec<_> = self.icons.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries.into_iter()
    }
}

// ============================================================================
// IconCacheBuilder
// ============================================================================

/// Write-once construction of an [`IconCache`].
#[derive(Debug)]
pub(crate) struct IconCacheBuilder {
    background: Bitmap,
    direction: Bitmap,
    icons: HashMap<IconKey, ComposedIcon>,
}

impl IconCacheBuilder {
    pub(crate) fn new(background: Bitmap, direction: Bitmap) -> Self {
        Self {
            background,
            direction,
            icons: HashMap::with_capacity(IconCategory::ALL.len() * ColorKey::ALL.len()),
        }
    }

    /// Stores an entry. Returns `false` and keeps the existing entry if the
    /// key was already written.
    pub(crate) fn insert(&mut self, key: IconKey, icon: ComposedIcon) -> bool {
        match self.icons.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(icon);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub(crate) fn build(self) -> IconCache {
        IconCache {
            background: self.background,
            direction: self.direction,
            icons: self.icons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::SizePx;
    use image::Rgba;
    use palette::Srgb;

    fn bitmap(value: u8) -> Bitmap {
        Bitmap::solid(SizePx::square(2), 1.0, Rgba([value, value, value, 255]))
    }

    #[test]
    fn key_display_and_parse() {
        let key = IconKey::new(IconCategory::Car, ColorKey::Error);
        assert_eq!(key.to_string(), "car-error");
        assert_eq!("car-error".parse::<IconKey>().unwrap(), key);
        assert!("car".parse::<IconKey>().is_err());
        assert!("pickup-error".parse::<IconKey>().is_err());
        assert!("car-warning".parse::<IconKey>().is_err());
    }

    #[test]
    fn all_keys_cover_the_product() {
        let keys: Vec<_> = IconKey::all().collect();
        assert_eq!(keys.len(), 22 * 4);
        assert!(keys.contains(&IconKey::new(IconCategory::Van, ColorKey::Neutral)));
    }

    #[test]
    fn insert_is_write_once() {
        let key = IconKey::new(IconCategory::Bus, ColorKey::Info);
        let tint = Srgb::new(0, 0, 255);
        let mut builder = IconCacheBuilder::new(bitmap(0), bitmap(1));

        assert!(builder.insert(key, ComposedIcon::full(bitmap(10), tint)));
        assert!(!builder.insert(key, ComposedIcon::degraded(bitmap(20), tint)));

        let cache = builder.build();
        let entry = cache.get(IconCategory::Bus, ColorKey::Info).unwrap();
        assert!(!entry.is_degraded());
        assert_eq!(entry.bitmap(), &bitmap(10));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_complete());
    }

    #[test]
    fn lookups_by_key_and_device_category() {
        let tint = Srgb::new(1, 1, 1);
        let mut builder = IconCacheBuilder::new(bitmap(0), bitmap(1));
        builder.insert(
            IconKey::new(IconCategory::Car, ColorKey::Success),
            ComposedIcon::full(bitmap(5), tint),
        );
        builder.insert(
            IconKey::new(IconCategory::Default, ColorKey::Success),
            ComposedIcon::degraded(bitmap(6), tint),
        );
        let cache = builder.build();

        assert!(cache.get_by_key("car-success").is_some());
        assert!(cache.get_by_key("nonsense").is_none());
        assert_eq!(
            cache.lookup("pickup", ColorKey::Success).map(|i| i.bitmap()),
            Some(&bitmap(5))
        );
        assert!(cache.lookup("hovercraft", ColorKey::Success).unwrap().is_degraded());
        assert_eq!(cache.degraded_count(), 1);
        assert_eq!(cache.background(), &bitmap(0));
        assert_eq!(cache.direction(), &bitmap(1));

        let order: Vec<_> = cache.iter().map(|(k, _)| k.category).collect();
        assert_eq!(order, vec![IconCategory::Car, IconCategory::Default]);
    }
}
