//! Device categories that have a dedicated map marker icon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A device category with its own marker icon.
///
/// The set is closed: device categories reported by the tracking backend
/// that have no icon of their own are folded into one of these by
/// [`map_icon_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum IconCategory {
    Animal,
    Bicycle,
    Boat,
    Bus,
    Car,
    Camper,
    Crane,
    Default,
    Finish,
    Helicopter,
    Motorcycle,
    Person,
    Plane,
    Scooter,
    Ship,
    Start,
    Tractor,
    Trailer,
    Train,
    Tram,
    Truck,
    Van,
}

impl IconCategory {
    /// Every category, in declaration order.
    pub const ALL: [IconCategory; 22] = [
        Self::Animal,
        Self::Bicycle,
        Self::Boat,
        Self::Bus,
        Self::Car,
        Self::Camper,
        Self::Crane,
        Self::Default,
        Self::Finish,
        Self::Helicopter,
        Self::Motorcycle,
        Self::Person,
        Self::Plane,
        Self::Scooter,
        Self::Ship,
        Self::Start,
        Self::Tractor,
        Self::Trailer,
        Self::Train,
        Self::Tram,
        Self::Truck,
        Self::Van,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Animal => "animal",
            Self::Bicycle => "bicycle",
            Self::Boat => "boat",
            Self::Bus => "bus",
            Self::Car => "car",
            Self::Camper => "camper",
            Self::Crane => "crane",
            Self::Default => "default",
            Self::Finish => "finish",
            Self::Helicopter => "helicopter",
            Self::Motorcycle => "motorcycle",
            Self::Person => "person",
            Self::Plane => "plane",
            Self::Scooter => "scooter",
            Self::Ship => "ship",
            Self::Start => "start",
            Self::Tractor => "tractor",
            Self::Trailer => "trailer",
            Self::Train => "train",
            Self::Tram => "tram",
            Self::Truck => "truck",
            Self::Van => "van",
        }
    }

    /// Looks up a category by its exact declared name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// File name of the icon asset in an asset directory (`icon/<name>.svg`).
    pub fn file_name(&self) -> String {
        format!("{}.svg", self.as_str())
    }
}

impl fmt::Display for IconCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only declared names are accepted.
///
/// Use [`map_icon_key`] to fold aliases and unknown categories instead.
impl FromStr for IconCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// Canonicalizes a backend device category to the icon used to draw it.
///
/// `offroad` and `pickup` share the car icon, `trolleybus` shares the bus
/// icon, and anything without an icon of its own falls back to
/// [`IconCategory::Default`]. Matching is case-sensitive.
pub fn map_icon_key(category: &str) -> IconCategory {
    match category {
        "offroad" | "pickup" => IconCategory::Car,
        "trolleybus" => IconCategory::Bus,
        other => IconCategory::from_name(other).unwrap_or(IconCategory::Default),
    }
}
