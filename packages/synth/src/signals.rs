//! Behavioral signal extraction.
//!
//! Signals are produced behind the [`SignalProvider`] trait so the
//! heuristic stand-in can later be swapped for a learned scorer without
//! touching the generators or the oracle.

use std::collections::BTreeSet;

use butterfly_synth_models::{Incident, SignalVector, SocialId, User};
use rand::{Rng as _, RngCore};

/// Distance, in kilometers, at which the geo score reaches zero.
pub const GEO_RADIUS_KM: f64 = 10.0;

/// Age, in days, at which the gravity score reaches zero.
pub const GRAVITY_HORIZON_DAYS: f64 = 90.0;

/// Source of behavioral signals for a (user, incident) pair.
pub trait SignalProvider: Send + Sync {
    /// Short identifier used in logs (e.g., `"heuristic"`).
    fn name(&self) -> &str;

    /// Computes the signal vector. Any randomness must come from `rng`.
    fn signals(
        &self,
        user: &User,
        incident: &Incident,
        distance_km: f64,
        rng: &mut dyn RngCore,
    ) -> SignalVector;
}

/// Rule-based signal provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSignals;

impl SignalProvider for HeuristicSignals {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn signals(
        &self,
        user: &User,
        incident: &Incident,
        distance_km: f64,
        rng: &mut dyn RngCore,
    ) -> SignalVector {
        SignalVector {
            geo: geo_score(distance_km),
            social: social_score(&user.friends, &incident.victim_friends),
            noise: rng.random(),
            gravity: gravity_score(incident.days_since),
        }
    }
}

/// Share of `friends` that also appear in `victim_friends`; 0 when the
/// user has no friends.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn social_score(friends: &BTreeSet<SocialId>, victim_friends: &BTreeSet<SocialId>) -> f64 {
    if friends.is_empty() {
        return 0.0;
    }
    let shared = friends.intersection(victim_friends).count();
    shared as f64 / friends.len() as f64
}

/// Linear recency decay. Not clamped: incidents older than
/// [`GRAVITY_HORIZON_DAYS`] score below zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gravity_score(days_since: i64) -> f64 {
    1.0 - days_since as f64 / GRAVITY_HORIZON_DAYS
}

/// Linear proximity decay, zero from [`GEO_RADIUS_KM`] onward.
#[must_use]
pub fn geo_score(distance_km: f64) -> f64 {
    (1.0 - distance_km / GEO_RADIUS_KM).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use butterfly_synth_models::{IncidentType, UserType};
    use butterfly_zone_models::{Coordinate, ZoneType};
    use chrono::NaiveDate;
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    fn user(friends: &[SocialId]) -> User {
        User {
            user_type: UserType::Local,
            home_location: Coordinate::new(0.0, 0.0),
            friends: friends.iter().copied().collect(),
            connection_count: 100,
            engagement_rate: 0.5,
        }
    }

    fn incident(days_since: i64, victim_friends: &[SocialId]) -> Incident {
        Incident {
            incident_type: IncidentType::Theft,
            occurred_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            hour_of_day: 12,
            day_of_week: 3,
            is_weekend: false,
            days_since,
            location: Coordinate::new(0.0, 0.0),
            zone_type: ZoneType::Touristic,
            victim_friends: victim_friends.iter().copied().collect(),
        }
    }

    #[test]
    fn social_overlap_share() {
        let friends = BTreeSet::from([1, 2, 3, 4]);
        let victim = BTreeSet::from([3, 4, 5]);
        assert!((social_score(&friends, &victim) - 0.5).abs() < f64::EPSILON);
        assert!((social_score(&friends, &friends) - 1.0).abs() < f64::EPSILON);
        assert!(social_score(&friends, &BTreeSet::new()).abs() < f64::EPSILON);
    }

    #[test]
    fn social_score_without_friends_is_zero() {
        assert!(social_score(&BTreeSet::new(), &BTreeSet::from([1])).abs() < f64::EPSILON);
    }

    #[test]
    fn gravity_is_unclamped() {
        assert!((gravity_score(0) - 1.0).abs() < f64::EPSILON);
        assert!((gravity_score(45) - 0.5).abs() < f64::EPSILON);
        assert!(gravity_score(90).abs() < f64::EPSILON);
        assert!((gravity_score(180) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn geo_decays_to_zero_at_radius() {
        assert!((geo_score(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((geo_score(2.5) - 0.75).abs() < f64::EPSILON);
        assert!(geo_score(10.0).abs() < f64::EPSILON);
        assert!(geo_score(25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn heuristic_signals_combine_rules() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let signals = HeuristicSignals.signals(&user(&[1, 2]), &incident(9, &[2, 7]), 5.0, &mut rng);
        assert!((signals.geo - 0.5).abs() < f64::EPSILON);
        assert!((signals.social - 0.5).abs() < f64::EPSILON);
        assert!((signals.gravity - 0.9).abs() < 1e-12);
        assert!((0.0..1.0).contains(&signals.noise));
    }

    #[test]
    fn noise_comes_from_the_supplied_stream() {
        let u = user(&[1]);
        let i = incident(0, &[1]);
        let a = HeuristicSignals.signals(&u, &i, 1.0, &mut ChaCha8Rng::seed_from_u64(3));
        let b = HeuristicSignals.signals(&u, &i, 1.0, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
