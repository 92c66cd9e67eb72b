#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic zone and coordinate types.
//!
//! Zones are named reference points grouped into behavioral categories
//! ([`ZoneType`]). Users and incidents are placed near these reference
//! points by the simulator. The TOML schema for zone registry files is
//! defined here as [`ZoneRegistryFile`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns `true` if both axes are finite and within the valid
    /// latitude (±90) and longitude (±180) ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Behavioral category of a zone.
///
/// The declaration order is the canonical order used for one-hot encoding
/// of the incident zone type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneType {
    /// Sightseeing areas with heavy visitor traffic
    Touristic,
    /// Dense residential neighborhoods
    Residential,
    /// Office districts, busy on weekdays
    Business,
    /// Outer commuter towns
    Suburbs,
    /// Bar and club districts, busy late at night
    Nightlife,
}

impl ZoneType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Touristic,
            Self::Residential,
            Self::Business,
            Self::Suburbs,
            Self::Nightlife,
        ]
    }
}

/// A named geographic zone with a reference coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Human-readable zone name (e.g., "Bairro Alto").
    pub name: String,
    /// Behavioral category this zone belongs to.
    pub zone_type: ZoneType,
    /// Reference latitude in degrees.
    pub lat: f64,
    /// Reference longitude in degrees.
    pub lon: f64,
}

impl Zone {
    /// Returns the zone's reference point.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A zone registry file, deserialized from TOML.
///
/// ```toml
/// id = "lisbon"
/// name = "Lisbon"
///
/// [[zones]]
/// name = "Bairro Alto"
/// zone_type = "nightlife"
/// lat = 38.7110
/// lon = -9.1453
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRegistryFile {
    /// Unique registry identifier (e.g., `"lisbon"`).
    pub id: String,
    /// Human-readable city name.
    pub name: String,
    /// Zones in declaration order.
    pub zones: Vec<Zone>,
}
