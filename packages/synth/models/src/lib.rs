#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Synthetic entity types for the butterfly simulator.
//!
//! Defines the user and incident taxonomies, the per-case entities built
//! by the generators, the behavioral [`SignalVector`], and the
//! [`PopulationConfig`] that bounds every random draw.

use std::collections::{BTreeMap, BTreeSet};

use butterfly_zone_models::{Coordinate, ZoneType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Opaque social identifier shared between users and incident victims.
pub type SocialId = u32;

/// Kind of app user, which drives where they spend their time.
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
pub enum UserType {
    /// Lives in the suburbs, commutes to the business district
    Local,
    /// Foreign resident living in the city center
    Expat,
    /// Short-term visitor who stays in touristic zones
    Tourist,
}

impl UserType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Local, Self::Expat, Self::Tourist]
    }

    /// Returns the zone type where users of this kind live.
    #[must_use]
    pub const fn home_zone_type(self) -> ZoneType {
        match self {
            Self::Local => ZoneType::Suburbs,
            Self::Expat | Self::Tourist => ZoneType::Residential,
        }
    }
}

/// Kind of reported incident.
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
pub enum IncidentType {
    /// Pickpocketing, bag snatching, and other theft
    Theft,
    /// Physical attack on a person
    Assault,
    /// Lost personal belongings
    LostItem,
    /// Missing person
    Disappearance,
}

impl IncidentType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Theft,
            Self::Assault,
            Self::LostItem,
            Self::Disappearance,
        ]
    }
}

/// A synthetic app user. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Kind of user.
    pub user_type: UserType,
    /// Jittered point inside the user's home zone.
    pub home_location: Coordinate,
    /// Social identifiers of the user's friends. May be empty.
    pub friends: BTreeSet<SocialId>,
    /// Number of platform connections.
    pub connection_count: u32,
    /// Fraction of alerts the user engages with, in `[0, 1]`.
    pub engagement_rate: f64,
}

/// A synthetic reported incident. Immutable once generated.
///
/// `is_weekend` is always `day_of_week >= 5` and `days_since` is always
/// the whole number of days between `occurred_at` and the run's reference
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Kind of incident.
    pub incident_type: IncidentType,
    /// Wall-clock time the incident occurred.
    pub occurred_at: NaiveDateTime,
    /// Hour of day of `occurred_at`, 0-23.
    pub hour_of_day: u32,
    /// Day of week of `occurred_at`, Monday = 0 through Sunday = 6.
    pub day_of_week: u32,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Whole days elapsed between `occurred_at` and the reference time.
    pub days_since: i64,
    /// Jittered incident location.
    pub location: Coordinate,
    /// Zone type the location was drawn from.
    pub zone_type: ZoneType,
    /// Social identifiers of the victim's friends.
    pub victim_friends: BTreeSet<SocialId>,
}

/// Interpretable behavioral signals for a (user, incident) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalVector {
    /// Proximity score, `max(0, 1 - distance / 10 km)`.
    pub geo: f64,
    /// Share of the user's friends that are also the victim's friends.
    pub social: f64,
    /// Unmodeled signal drawn from `[0, 1)`.
    pub noise: f64,
    /// Recency score, `1 - days_since / 90`. Negative past 90 days.
    pub gravity: f64,
}

/// Inclusive integer range used to bound uniform draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    /// Smallest value that can be drawn.
    pub min: u32,
    /// Largest value that can be drawn.
    pub max: u32,
}

impl IntRange {
    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Number of distinct values in the range, or 0 if `min > max`.
    #[must_use]
    pub const fn width(&self) -> u64 {
        if self.min > self.max {
            0
        } else {
            (self.max - self.min) as u64 + 1
        }
    }
}

/// Inclusive float range used to bound uniform draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    /// Smallest value that can be drawn.
    pub min: f64,
    /// Largest value that can be drawn.
    pub max: f64,
}

impl FloatRange {
    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Bounds and weights for every random draw made by the generators.
///
/// Missing keys in a TOML file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Relative frequency of each user type.
    pub user_type_weights: BTreeMap<UserType, f64>,
    /// Relative frequency of each incident type.
    pub incident_type_weights: BTreeMap<IncidentType, f64>,
    /// Size of each friend set.
    pub friend_count: IntRange,
    /// Shared identifier space friend IDs are drawn from.
    pub friend_id_space: IntRange,
    /// Platform connection count.
    pub connections: IntRange,
    /// Engagement rate.
    pub engagement_rate: FloatRange,
    /// Maximum whole days an incident can lie in the past.
    pub max_days_back: u32,
    /// Maximum extra hours an incident can lie in the past.
    pub max_hours_back: u32,
    /// Per-axis jitter, in degrees, applied around zone reference points.
    pub location_jitter_deg: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            user_type_weights: BTreeMap::from([
                (UserType::Local, 0.6),
                (UserType::Expat, 0.2),
                (UserType::Tourist, 0.2),
            ]),
            incident_type_weights: BTreeMap::from([
                (IncidentType::Theft, 0.5),
                (IncidentType::Assault, 0.1),
                (IncidentType::LostItem, 0.35),
                (IncidentType::Disappearance, 0.05),
            ]),
            friend_count: IntRange::new(10, 150),
            friend_id_space: IntRange::new(1000, 10_000),
            connections: IntRange::new(50, 2000),
            engagement_rate: FloatRange::new(0.1, 0.9),
            max_days_back: 30,
            max_hours_back: 23,
            location_jitter_deg: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn home_zone_depends_on_user_type() {
        assert_eq!(UserType::Local.home_zone_type(), ZoneType::Suburbs);
        assert_eq!(UserType::Expat.home_zone_type(), ZoneType::Residential);
        assert_eq!(UserType::Tourist.home_zone_type(), ZoneType::Residential);
    }

    #[test]
    fn incident_type_string_roundtrip() {
        for t in IncidentType::all() {
            assert_eq!(IncidentType::from_str(t.as_ref()).unwrap(), *t);
        }
        assert_eq!(IncidentType::LostItem.to_string(), "LostItem");
    }

    #[test]
    fn int_range_width() {
        assert_eq!(IntRange::new(10, 150).width(), 141);
        assert_eq!(IntRange::new(5, 5).width(), 1);
        assert_eq!(IntRange::new(6, 5).width(), 0);
        assert_eq!(IntRange::new(0, u32::MAX).width(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn default_weights_cover_every_variant() {
        let config = PopulationConfig::default();
        for t in UserType::all() {
            assert!(config.user_type_weights.contains_key(t), "{t} missing");
        }
        for t in IncidentType::all() {
            assert!(config.incident_type_weights.contains_key(t), "{t} missing");
        }
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: PopulationConfig = toml::from_str(
            r"
            max_days_back = 7

            [user_type_weights]
            Local = 1.0
            Tourist = 3.0
            ",
        )
        .unwrap();

        assert_eq!(config.max_days_back, 7);
        assert_eq!(config.user_type_weights.len(), 2);
        assert_eq!(config.user_type_weights[&UserType::Tourist], 3.0);
        assert_eq!(config.friend_count, IntRange::new(10, 150));
        assert_eq!(
            config.incident_type_weights,
            PopulationConfig::default().incident_type_weights
        );
    }
}
