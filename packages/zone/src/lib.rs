#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone catalog for the butterfly simulator.
//!
//! Loads zones from an embedded or user-supplied TOML registry, groups
//! them by [`ZoneType`], and places synthetic users and incidents near a
//! zone's reference point. The catalog is immutable after construction and
//! safe to share across worker threads.

pub mod distance;
pub mod registry;

use std::collections::BTreeMap;
use std::path::Path;

use butterfly_zone_models::{Coordinate, Zone, ZoneRegistryFile, ZoneType};
use rand::Rng;
use rand::seq::IndexedRandom as _;

pub use distance::haversine_km;

/// Errors that can occur while building or querying a zone catalog.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// The catalog is unusable for generation.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// A registry file could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A registry file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZoneError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Read-only registry of zones grouped by type.
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    id: String,
    zones: BTreeMap<ZoneType, Vec<Zone>>,
}

impl ZoneCatalog {
    /// Builds a catalog from a parsed registry file.
    ///
    /// Zones keep their declaration order within each type.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] if the registry has no zones or
    /// any zone carries an invalid coordinate.
    pub fn from_registry(file: ZoneRegistryFile) -> Result<Self, ZoneError> {
        if file.zones.is_empty() {
            return Err(ZoneError::configuration(format!(
                "zone registry '{}' declares no zones",
                file.id
            )));
        }

        let mut zones: BTreeMap<ZoneType, Vec<Zone>> = BTreeMap::new();
        for zone in file.zones {
            if !zone.coordinate().is_valid() {
                return Err(ZoneError::configuration(format!(
                    "zone '{}' has invalid coordinate ({}, {})",
                    zone.name, zone.lat, zone.lon
                )));
            }
            zones.entry(zone.zone_type).or_default().push(zone);
        }

        log::debug!(
            "Built zone catalog '{}' with {} zone types",
            file.id,
            zones.len()
        );

        Ok(Self { id: file.id, zones })
    }

    /// Builds a catalog from one of the embedded registries.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] if no embedded registry has the
    /// given ID.
    pub fn builtin(id: &str) -> Result<Self, ZoneError> {
        let file = registry::find_registry(id)
            .ok_or_else(|| ZoneError::configuration(format!("unknown zone registry '{id}'")))?;
        Self::from_registry(file)
    }

    /// Loads a catalog from a TOML registry file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ZoneError> {
        let contents = std::fs::read_to_string(path)?;
        let file = registry::parse_registry(&contents)?;
        log::info!("Loaded zone registry '{}' from {}", file.id, path.display());
        Self::from_registry(file)
    }

    /// Returns the registry identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the zones of the given type in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] if no zone of this type is
    /// registered.
    pub fn zones_of_type(&self, zone_type: ZoneType) -> Result<&[Zone], ZoneError> {
        self.zones
            .get(&zone_type)
            .filter(|zones| !zones.is_empty())
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ZoneError::configuration(format!(
                    "zone registry '{}' has no {zone_type} zones",
                    self.id
                ))
            })
    }

    /// Returns the zone types that have at least one zone, in canonical
    /// order.
    pub fn zone_types(&self) -> impl Iterator<Item = ZoneType> + '_ {
        self.zones.keys().copied()
    }

    /// Total number of zones across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.values().map(Vec::len).sum()
    }

    /// Returns `true` if the catalog holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every [`ZoneType`] has at least one zone.
    ///
    /// The user and incident location rules can land in any zone type, so
    /// generation must not start with a gap in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] naming the first missing type.
    pub fn validate_complete(&self) -> Result<(), ZoneError> {
        for zone_type in ZoneType::all() {
            self.zones_of_type(*zone_type)?;
        }
        Ok(())
    }

    /// Picks a zone of the given type uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] if no zone of this type exists.
    pub fn random_zone<R: Rng + ?Sized>(
        &self,
        zone_type: ZoneType,
        rng: &mut R,
    ) -> Result<&Zone, ZoneError> {
        let zones = self.zones_of_type(zone_type)?;
        zones.choose(rng).ok_or_else(|| {
            ZoneError::configuration(format!("no {zone_type} zone available"))
        })
    }

    /// Picks a zone of the given type and perturbs its reference point by
    /// an independent `uniform(-jitter, +jitter)` offset on each axis.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Configuration`] if no zone of this type exists
    /// or `jitter` is negative or non-finite.
    pub fn random_location<R: Rng + ?Sized>(
        &self,
        zone_type: ZoneType,
        jitter: f64,
        rng: &mut R,
    ) -> Result<Coordinate, ZoneError> {
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(ZoneError::configuration(format!(
                "location jitter must be a non-negative number, got {jitter}"
            )));
        }

        let zone = self.random_zone(zone_type, rng)?;
        let dlat = rng.random_range(-jitter..=jitter);
        let dlon = rng.random_range(-jitter..=jitter);

        Ok(Coordinate::new(zone.lat + dlat, zone.lon + dlon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    fn zone(name: &str, zone_type: ZoneType, lat: f64, lon: f64) -> Zone {
        Zone {
            name: name.to_string(),
            zone_type,
            lat,
            lon,
        }
    }

    fn partial_catalog() -> ZoneCatalog {
        ZoneCatalog::from_registry(ZoneRegistryFile {
            id: "partial".to_string(),
            name: "Partial".to_string(),
            zones: vec![
                zone("A", ZoneType::Touristic, 10.0, 10.0),
                zone("B", ZoneType::Touristic, 20.0, 20.0),
                zone("C", ZoneType::Nightlife, 30.0, 30.0),
            ],
        })
        .unwrap()
    }

    #[test]
    fn builtin_catalog_is_complete() {
        let catalog = ZoneCatalog::builtin(registry::DEFAULT_REGISTRY).unwrap();
        catalog.validate_complete().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.zone_types().count(), ZoneType::all().len());
    }

    #[test]
    fn zones_of_type_keeps_declaration_order() {
        let catalog = partial_catalog();
        let names: Vec<&str> = catalog
            .zones_of_type(ZoneType::Touristic)
            .unwrap()
            .iter()
            .map(|z| z.name.as_str())
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn unregistered_zone_type_is_configuration_error() {
        let catalog = partial_catalog();
        assert!(matches!(
            catalog.zones_of_type(ZoneType::Business),
            Err(ZoneError::Configuration { .. })
        ));
        assert!(matches!(
            catalog.validate_complete(),
            Err(ZoneError::Configuration { .. })
        ));
    }

    #[test]
    fn unknown_builtin_registry_is_configuration_error() {
        assert!(matches!(
            ZoneCatalog::builtin("atlantis"),
            Err(ZoneError::Configuration { .. })
        ));
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let result = ZoneCatalog::from_registry(ZoneRegistryFile {
            id: "bad".to_string(),
            name: "Bad".to_string(),
            zones: vec![zone("Nowhere", ZoneType::Suburbs, 123.0, 0.0)],
        });
        assert!(matches!(result, Err(ZoneError::Configuration { .. })));
    }

    #[test]
    fn empty_registry_is_rejected() {
        let result = ZoneCatalog::from_registry(ZoneRegistryFile {
            id: "empty".to_string(),
            name: "Empty".to_string(),
            zones: vec![],
        });
        assert!(matches!(result, Err(ZoneError::Configuration { .. })));
    }

    #[test]
    fn random_location_stays_within_jitter() {
        let catalog = partial_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let loc = catalog
                .random_location(ZoneType::Nightlife, 0.01, &mut rng)
                .unwrap();
            assert!((loc.lat - 30.0).abs() <= 0.01, "lat {}", loc.lat);
            assert!((loc.lon - 30.0).abs() <= 0.01, "lon {}", loc.lon);
        }
    }

    #[test]
    fn zero_jitter_returns_reference_point() {
        let catalog = partial_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let loc = catalog
            .random_location(ZoneType::Nightlife, 0.0, &mut rng)
            .unwrap();
        assert_eq!(loc, Coordinate::new(30.0, 30.0));
    }

    #[test]
    fn negative_jitter_is_rejected() {
        let catalog = partial_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(
            catalog
                .random_location(ZoneType::Nightlife, -0.5, &mut rng)
                .is_err()
        );
    }

    #[test]
    fn random_zone_reaches_every_zone_of_a_type() {
        let catalog = partial_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let z = catalog.random_zone(ZoneType::Touristic, &mut rng).unwrap();
            seen.insert(z.name.clone());
        }
        assert_eq!(seen.len(), 2);
    }
}
