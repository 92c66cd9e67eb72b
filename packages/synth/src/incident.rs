//! Synthetic incident generation.

use butterfly_synth_models::{Incident, IncidentType};
use butterfly_zone_models::ZoneType;
use chrono::{Datelike as _, NaiveDateTime, TimeDelta, Timelike as _};
use rand::Rng;

use crate::user::{ZoneChoice, draw_friend_set, is_night_hour};
use crate::{SynthError, World};

/// Calendar fields derived from an incident timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentTiming {
    /// Hour of day, 0-23.
    pub hour_of_day: u32,
    /// Monday = 0 through Sunday = 6.
    pub day_of_week: u32,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Whole days between the incident and `now`.
    pub days_since: i64,
}

impl IncidentTiming {
    /// Derives the calendar fields of `occurred_at` relative to `now`.
    #[must_use]
    pub fn derive(occurred_at: NaiveDateTime, now: NaiveDateTime) -> Self {
        let day_of_week = occurred_at.weekday().num_days_from_monday();
        Self {
            hour_of_day: occurred_at.hour(),
            day_of_week,
            is_weekend: day_of_week >= 5,
            days_since: (now - occurred_at).num_days(),
        }
    }
}

/// Where an incident of the given type happening at `hour` is placed, in
/// precedence order: assaults, disappearances and anything at night go to
/// nightlife, thefts go to touristic zones, and everything else is split
/// between touristic and residential.
#[must_use]
pub const fn incident_zone_choice(incident_type: IncidentType, hour: u32) -> ZoneChoice {
    match incident_type {
        IncidentType::Assault | IncidentType::Disappearance => {
            ZoneChoice::Exactly(ZoneType::Nightlife)
        }
        _ if is_night_hour(hour) => ZoneChoice::Exactly(ZoneType::Nightlife),
        IncidentType::Theft => ZoneChoice::Exactly(ZoneType::Touristic),
        IncidentType::LostItem => ZoneChoice::EitherOf(ZoneType::Touristic, ZoneType::Residential),
    }
}

/// Generates a synthetic incident that occurred up to
/// `max_days_back` days and `max_hours_back` hours before the world's
/// reference time.
///
/// # Errors
///
/// Returns [`SynthError::Zone`] if the chosen zone type has no zones.
pub fn generate_incident<R: Rng + ?Sized>(
    world: &World,
    rng: &mut R,
) -> Result<Incident, SynthError> {
    let population = world.population();
    let incident_type = *world.incident_types().sample(rng);

    let days_back = rng.random_range(0..=population.max_days_back);
    let hours_back = rng.random_range(0..=population.max_hours_back);
    let occurred_at = world.now()
        - TimeDelta::days(i64::from(days_back))
        - TimeDelta::hours(i64::from(hours_back));

    let timing = IncidentTiming::derive(occurred_at, world.now());

    let zone_type = incident_zone_choice(incident_type, timing.hour_of_day).resolve(rng);
    let location =
        world
            .catalog()
            .random_location(zone_type, population.location_jitter_deg, rng)?;

    let victim_friends = draw_friend_set(population.friend_count, population.friend_id_space, rng);

    Ok(Incident {
        incident_type,
        occurred_at,
        hour_of_day: timing.hour_of_day,
        day_of_week: timing.day_of_week,
        is_weekend: timing.is_weekend,
        days_since: timing.days_since,
        location,
        zone_type,
        victim_friends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_world;
    use chrono::NaiveDate;
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn timing_of_a_saturday() {
        // 2026-10-17 is a Saturday.
        let timing = IncidentTiming::derive(at(2026, 10, 17, 23, 10), at(2026, 10, 20, 9, 0));
        assert_eq!(timing.hour_of_day, 23);
        assert_eq!(timing.day_of_week, 5);
        assert!(timing.is_weekend);
        assert_eq!(timing.days_since, 2);
    }

    #[test]
    fn days_since_floors_partial_days() {
        let now = at(2026, 10, 16, 12, 0);
        assert_eq!(IncidentTiming::derive(at(2026, 10, 16, 1, 0), now).days_since, 0);
        assert_eq!(IncidentTiming::derive(at(2026, 10, 15, 12, 1), now).days_since, 0);
        assert_eq!(IncidentTiming::derive(at(2026, 10, 15, 12, 0), now).days_since, 1);
    }

    #[test]
    fn violent_types_go_to_nightlife_at_any_hour() {
        for hour in 0..24 {
            for t in [IncidentType::Assault, IncidentType::Disappearance] {
                assert_eq!(
                    incident_zone_choice(t, hour),
                    ZoneChoice::Exactly(ZoneType::Nightlife)
                );
            }
        }
    }

    #[test]
    fn night_overrides_type_rule() {
        assert_eq!(
            incident_zone_choice(IncidentType::Theft, 23),
            ZoneChoice::Exactly(ZoneType::Nightlife)
        );
        assert_eq!(
            incident_zone_choice(IncidentType::LostItem, 2),
            ZoneChoice::Exactly(ZoneType::Nightlife)
        );
    }

    #[test]
    fn daytime_rules() {
        assert_eq!(
            incident_zone_choice(IncidentType::Theft, 14),
            ZoneChoice::Exactly(ZoneType::Touristic)
        );
        assert_eq!(
            incident_zone_choice(IncidentType::LostItem, 14),
            ZoneChoice::EitherOf(ZoneType::Touristic, ZoneType::Residential)
        );
    }

    #[test]
    fn generated_incidents_hold_their_invariants() {
        let world = test_world();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..1000 {
            let incident = generate_incident(&world, &mut rng).unwrap();
            assert_eq!(
                incident.is_weekend,
                incident.day_of_week == 5 || incident.day_of_week == 6,
                "{incident:?}"
            );
            assert!(incident.day_of_week <= 6);
            assert!((0..=30).contains(&incident.days_since));
            assert_eq!(
                incident.days_since,
                (world.now() - incident.occurred_at).num_days()
            );
            assert!(
                incident_zone_choice(incident.incident_type, incident.hour_of_day)
                    .allows(incident.zone_type),
                "{incident:?}"
            );
            assert!((10..=150).contains(&incident.victim_friends.len()));
        }
    }
}
