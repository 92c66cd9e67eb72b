#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Synthetic world simulator and labeling oracle.
//!
//! A [`World`] bundles the zone catalog, the population bounds, the
//! weighted samplers, and the run's reference time. [`simulate_case`]
//! draws one user and one incident from it, places the user for the
//! incident's hour, extracts behavioral signals, and labels the case.
//!
//! Every draw takes an explicit random stream. Nothing in this crate owns
//! a generator, so a case is fully determined by the stream it is given.

pub mod incident;
pub mod oracle;
pub mod sampling;
pub mod signals;
pub mod user;

use butterfly_synth_models::{Incident, IncidentType, PopulationConfig, SignalVector, User, UserType};
use butterfly_zone::{ZoneCatalog, ZoneError};
use butterfly_zone_models::Coordinate;
use chrono::NaiveDateTime;
use rand::RngCore;

use crate::sampling::{SamplingError, WeightedSampler};
use crate::signals::SignalProvider;

/// Errors that can occur while building a world or simulating a case.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Population bounds are unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// Zone catalog error.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// Weighted sampling error.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

fn configuration(message: impl Into<String>) -> SynthError {
    SynthError::Configuration {
        message: message.into(),
    }
}

/// Immutable simulation context shared by every case of a run.
#[derive(Debug, Clone)]
pub struct World {
    catalog: ZoneCatalog,
    population: PopulationConfig,
    user_types: WeightedSampler<UserType>,
    incident_types: WeightedSampler<IncidentType>,
    now: NaiveDateTime,
}

impl World {
    /// Validates the configuration and builds the samplers.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Zone`] if the catalog lacks a zone type,
    /// [`SynthError::Sampling`] if a weight map is not a distribution, and
    /// [`SynthError::Configuration`] if any range is empty or out of
    /// bounds.
    pub fn new(
        catalog: ZoneCatalog,
        population: PopulationConfig,
        now: NaiveDateTime,
    ) -> Result<Self, SynthError> {
        catalog.validate_complete()?;
        validate_population(&population)?;

        let user_types = WeightedSampler::from_map(&population.user_type_weights)?;
        let incident_types = WeightedSampler::from_map(&population.incident_type_weights)?;

        log::debug!(
            "Simulation world ready: catalog '{}' with {} zones, reference time {now}",
            catalog.id(),
            catalog.len()
        );

        Ok(Self {
            catalog,
            population,
            user_types,
            incident_types,
            now,
        })
    }

    /// The zone catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    /// Population bounds and weights.
    #[must_use]
    pub const fn population(&self) -> &PopulationConfig {
        &self.population
    }

    /// User type sampler.
    #[must_use]
    pub const fn user_types(&self) -> &WeightedSampler<UserType> {
        &self.user_types
    }

    /// Incident type sampler.
    #[must_use]
    pub const fn incident_types(&self) -> &WeightedSampler<IncidentType> {
        &self.incident_types
    }

    /// Reference time incidents are dated against.
    #[must_use]
    pub const fn now(&self) -> NaiveDateTime {
        self.now
    }
}

fn validate_population(population: &PopulationConfig) -> Result<(), SynthError> {
    for (name, range) in [
        ("friend_count", population.friend_count),
        ("friend_id_space", population.friend_id_space),
        ("connections", population.connections),
    ] {
        if range.min > range.max {
            return Err(configuration(format!(
                "{name} range is empty ({}..={})",
                range.min, range.max
            )));
        }
    }

    if u64::from(population.friend_count.max) > population.friend_id_space.width() {
        return Err(configuration(format!(
            "friend_count.max ({}) exceeds the {} IDs in friend_id_space",
            population.friend_count.max,
            population.friend_id_space.width()
        )));
    }

    let engagement = population.engagement_rate;
    if !(engagement.min.is_finite() && engagement.max.is_finite())
        || engagement.min > engagement.max
        || engagement.min < 0.0
        || engagement.max > 1.0
    {
        return Err(configuration(format!(
            "engagement_rate must be a range within [0, 1], got {}..={}",
            engagement.min, engagement.max
        )));
    }

    if population.max_hours_back > 23 {
        return Err(configuration(format!(
            "max_hours_back must be at most 23, got {}",
            population.max_hours_back
        )));
    }

    let jitter = population.location_jitter_deg;
    if !jitter.is_finite() || jitter < 0.0 {
        return Err(configuration(format!(
            "location_jitter_deg must be non-negative, got {jitter}"
        )));
    }

    Ok(())
}

/// Everything derived for one synthetic case.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCase {
    /// The user who would receive the alert.
    pub user: User,
    /// The reported incident.
    pub incident: Incident,
    /// Where the user is at the incident's hour.
    pub user_location: Coordinate,
    /// Distance between the user and the incident.
    pub distance_km: f64,
    /// Composite distance/recency decay.
    pub urgency: f64,
    /// Behavioral signals.
    pub signals: SignalVector,
    /// Ground-truth label.
    pub is_useful: bool,
}

/// Simulates one case from a dedicated random stream.
///
/// The user and incident are drawn independently; the user is then placed
/// according to the incident's hour and weekend flag.
///
/// # Errors
///
/// Returns [`SynthError::Zone`] if a drawn zone type has no zones.
pub fn simulate_case<R: RngCore>(
    world: &World,
    signals: &dyn SignalProvider,
    rng: &mut R,
) -> Result<SimulatedCase, SynthError> {
    let user = user::generate_user(world, rng)?;
    let incident = incident::generate_incident(world, rng)?;

    let user_location =
        user::current_location(world, &user, incident.hour_of_day, incident.is_weekend, rng)?;
    let distance_km = butterfly_zone::haversine_km(user_location, incident.location);
    let urgency = oracle::urgency_score(distance_km, incident.days_since);

    let signals = signals.signals(&user, &incident, distance_km, rng);
    let is_useful = oracle::is_useful(incident.incident_type, urgency, &signals);

    Ok(SimulatedCase {
        user,
        incident,
        user_location,
        distance_km,
        urgency,
        signals,
        is_useful,
    })
}

#[cfg(test)]
pub(crate) fn test_world() -> World {
    let now = chrono::NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    World::new(
        ZoneCatalog::builtin(butterfly_zone::registry::DEFAULT_REGISTRY).unwrap(),
        PopulationConfig::default(),
        now,
    )
    .unwrap()
}
