//! Synthetic user generation and the time-dependent location rule.

use std::collections::BTreeSet;

use butterfly_synth_models::{IntRange, SocialId, User, UserType};
use butterfly_zone_models::{Coordinate, ZoneType};
use rand::Rng;

use crate::{SynthError, World};

/// Which zone type(s) an entity may be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneChoice {
    /// Always this zone type.
    Exactly(ZoneType),
    /// One of two zone types, chosen with equal probability.
    EitherOf(ZoneType, ZoneType),
}

impl ZoneChoice {
    /// Resolves the choice to a single zone type.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> ZoneType {
        match self {
            Self::Exactly(zone_type) => zone_type,
            Self::EitherOf(first, second) => {
                if rng.random_bool(0.5) {
                    first
                } else {
                    second
                }
            }
        }
    }

    /// Returns `true` if `zone_type` is a possible outcome.
    #[must_use]
    pub fn allows(self, zone_type: ZoneType) -> bool {
        match self {
            Self::Exactly(z) => z == zone_type,
            Self::EitherOf(a, b) => a == zone_type || b == zone_type,
        }
    }
}

/// Returns `true` for late-night hours (22:00-04:59).
#[must_use]
pub const fn is_night_hour(hour: u32) -> bool {
    hour >= 22 || hour <= 4
}

/// Returns `true` for office hours (08:00-18:59).
#[must_use]
pub const fn is_office_hour(hour: u32) -> bool {
    hour >= 8 && hour <= 18
}

/// Where a user of the given type is at `hour`, evaluated in precedence
/// order: tourists stay in touristic zones, weekday office hours go to
/// business zones, late nights go to nightlife, and anything else is split
/// between residential and touristic.
#[must_use]
pub const fn current_zone_choice(user_type: UserType, hour: u32, is_weekend: bool) -> ZoneChoice {
    if matches!(user_type, UserType::Tourist) {
        ZoneChoice::Exactly(ZoneType::Touristic)
    } else if !is_weekend && is_office_hour(hour) {
        ZoneChoice::Exactly(ZoneType::Business)
    } else if is_night_hour(hour) {
        ZoneChoice::Exactly(ZoneType::Nightlife)
    } else {
        ZoneChoice::EitherOf(ZoneType::Residential, ZoneType::Touristic)
    }
}

/// Draws a set of distinct social IDs.
///
/// The set size is uniform over `count` and IDs are drawn without
/// replacement from `id_space`. Different users draw from the same space,
/// so overlaps between sets happen naturally.
///
/// # Panics
///
/// Panics if `count.max` exceeds the size of `id_space`. [`World::new`]
/// rejects such configurations.
pub fn draw_friend_set<R: Rng + ?Sized>(
    count: IntRange,
    id_space: IntRange,
    rng: &mut R,
) -> BTreeSet<SocialId> {
    let size = rng.random_range(count.min..=count.max) as usize;
    #[allow(clippy::cast_possible_truncation)]
    let width = id_space.width() as usize;

    rand::seq::index::sample(rng, width, size)
        .into_iter()
        .map(|offset| {
            #[allow(clippy::cast_possible_truncation)]
            let offset = offset as u32;
            id_space.min + offset
        })
        .collect()
}

/// Generates a synthetic user.
///
/// # Errors
///
/// Returns [`SynthError::Zone`] if the home zone type has no zones.
pub fn generate_user<R: Rng + ?Sized>(world: &World, rng: &mut R) -> Result<User, SynthError> {
    let population = world.population();
    let user_type = *world.user_types().sample(rng);

    let home_location = world.catalog().random_location(
        user_type.home_zone_type(),
        population.location_jitter_deg,
        rng,
    )?;

    let friends = draw_friend_set(population.friend_count, population.friend_id_space, rng);
    let connection_count =
        rng.random_range(population.connections.min..=population.connections.max);
    let engagement_rate =
        rng.random_range(population.engagement_rate.min..=population.engagement_rate.max);

    Ok(User {
        user_type,
        home_location,
        friends,
        connection_count,
        engagement_rate,
    })
}

/// Draws where `user` is at the given hour.
///
/// # Errors
///
/// Returns [`SynthError::Zone`] if the chosen zone type has no zones.
pub fn current_location<R: Rng + ?Sized>(
    world: &World,
    user: &User,
    hour: u32,
    is_weekend: bool,
    rng: &mut R,
) -> Result<Coordinate, SynthError> {
    let zone_type = current_zone_choice(user.user_type, hour, is_weekend).resolve(rng);
    Ok(world
        .catalog()
        .random_location(zone_type, world.population().location_jitter_deg, rng)?)
}
