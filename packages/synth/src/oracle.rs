//! Ground-truth labeling oracle.
//!
//! The thresholds below define the ground truth the classifier learns.
//! Every comparison is strict.

use butterfly_synth_models::{IncidentType, SignalVector};

/// Distance offset, in kilometers, that keeps urgency finite at zero
/// distance.
pub const URGENCY_DISTANCE_OFFSET_KM: f64 = 0.1;

/// Composite decay of distance and recency:
/// `1 / (distance_km + 0.1) * 1 / (days_since + 1)`.
///
/// Strictly positive for non-negative inputs and strictly decreasing in
/// both arguments.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn urgency_score(distance_km: f64, days_since: i64) -> f64 {
    (1.0 / (distance_km + URGENCY_DISTANCE_OFFSET_KM)) * (1.0 / (days_since as f64 + 1.0))
}

/// Decides whether an alert for this case would be useful.
///
/// Only `geo`, `social` and `gravity` are read from `signals`; the noise
/// signal never influences the label.
#[must_use]
pub fn is_useful(incident_type: IncidentType, urgency: f64, signals: &SignalVector) -> bool {
    let SignalVector {
        geo,
        social,
        gravity,
        ..
    } = *signals;

    match incident_type {
        IncidentType::Disappearance => true,
        IncidentType::Assault => geo > 0.8 || urgency > 0.5 || social > 0.3,
        IncidentType::Theft => (geo > 0.9 && gravity > 0.5) || (urgency > 0.7 && social > 0.1),
        IncidentType::LostItem => urgency > 0.9 && geo > 0.95,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(geo: f64, social: f64, gravity: f64) -> SignalVector {
        SignalVector {
            geo,
            social,
            noise: 0.5,
            gravity,
        }
    }

    #[test]
    fn disappearance_is_always_useful() {
        for (urgency, geo, social, gravity) in [
            (0.0, 0.0, 0.0, -1.0),
            (0.01, 0.2, 0.0, 0.0),
            (10.0, 1.0, 1.0, 1.0),
        ] {
            assert!(is_useful(
                IncidentType::Disappearance,
                urgency,
                &signals(geo, social, gravity)
            ));
        }
    }

    #[test]
    fn assault_geo_branch() {
        assert!(is_useful(
            IncidentType::Assault,
            0.1,
            &signals(0.85, 0.1, 0.0)
        ));
    }

    #[test]
    fn assault_branches_and_boundaries() {
        assert!(is_useful(IncidentType::Assault, 0.51, &signals(0.0, 0.0, 0.0)));
        assert!(is_useful(IncidentType::Assault, 0.0, &signals(0.0, 0.31, 0.0)));
        // Thresholds are exclusive.
        assert!(!is_useful(IncidentType::Assault, 0.5, &signals(0.8, 0.3, 1.0)));
    }

    #[test]
    fn theft_without_any_branch_is_not_useful() {
        assert!(!is_useful(
            IncidentType::Theft,
            0.2,
            &signals(0.5, 0.05, 0.9)
        ));
    }

    #[test]
    fn theft_branches() {
        assert!(is_useful(IncidentType::Theft, 0.0, &signals(0.91, 0.0, 0.51)));
        assert!(!is_useful(IncidentType::Theft, 0.0, &signals(0.91, 0.0, 0.5)));
        assert!(is_useful(IncidentType::Theft, 0.71, &signals(0.0, 0.11, 0.0)));
        assert!(!is_useful(IncidentType::Theft, 0.71, &signals(0.0, 0.1, 0.0)));
    }

    #[test]
    fn lost_item_needs_both_conditions() {
        assert!(is_useful(
            IncidentType::LostItem,
            0.95,
            &signals(0.96, 0.0, 0.0)
        ));
        assert!(!is_useful(IncidentType::LostItem, 0.95, &signals(0.95, 0.0, 0.0)));
        assert!(!is_useful(IncidentType::LostItem, 0.9, &signals(0.99, 1.0, 1.0)));
    }

    #[test]
    fn noise_does_not_change_the_label() {
        for t in IncidentType::all() {
            let mut s = signals(0.85, 0.2, 0.6);
            let baseline = is_useful(*t, 0.6, &s);
            for noise in [0.0, 0.25, 0.999] {
                s.noise = noise;
                assert_eq!(is_useful(*t, 0.6, &s), baseline, "{t} noise {noise}");
            }
        }
    }

    #[test]
    fn urgency_is_positive_and_decreasing_in_distance() {
        let distances = [0.0, 0.05, 0.5, 1.0, 3.0, 10.0, 100.0];
        for days in [0, 1, 7, 30] {
            let scores: Vec<f64> = distances.iter().map(|d| urgency_score(*d, days)).collect();
            assert!(scores.iter().all(|s| *s > 0.0));
            for pair in scores.windows(2) {
                assert!(pair[0] > pair[1], "days {days}: {scores:?}");
            }
        }
    }

    #[test]
    fn urgency_is_decreasing_in_days_since() {
        for distance in [0.0, 0.4, 2.0, 12.0] {
            let scores: Vec<f64> = (0..40).map(|d| urgency_score(distance, d)).collect();
            for pair in scores.windows(2) {
                assert!(pair[0] > pair[1], "distance {distance}");
            }
        }
    }

    #[test]
    fn urgency_at_origin() {
        assert!((urgency_score(0.0, 0) - 10.0).abs() < 1e-12);
        assert!((urgency_score(0.9, 1) - 0.5).abs() < 1e-12);
    }
}
