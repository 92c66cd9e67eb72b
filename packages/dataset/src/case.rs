//! Flat per-case records.

use butterfly_synth::SimulatedCase;
use butterfly_synth_models::{IncidentType, UserType};
use butterfly_zone_models::ZoneType;
use serde::{Deserialize, Serialize};

use crate::DatasetError;
use crate::encode::{FeatureSource, FeatureValue};
use crate::schema::{self, FeatureLayout};

/// One assembled row before encoding: every numeric feature, the raw
/// categorical values, and the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Distance between user and incident, in kilometers.
    pub distance_km: f64,
    /// Whole days since the incident.
    pub days_since_incident: i64,
    /// Hour of day the incident occurred.
    pub hour_of_day: u32,
    /// User engagement rate.
    pub user_engagement_rate: f64,
    /// Size of the user's friend set.
    pub user_num_friends: usize,
    /// User connection count.
    pub user_connections: u32,
    /// Composite distance/recency decay.
    pub urgency_score: f64,
    /// User type.
    pub user_type: UserType,
    /// Incident type.
    pub incident_type: IncidentType,
    /// Monday = 0 through Sunday = 6.
    pub day_of_week: u32,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Zone type of the incident location.
    pub incident_zone_type: ZoneType,
    /// Ground-truth label.
    pub is_useful: bool,
}

impl CaseRecord {
    /// Categorical features a record can render.
    pub const CATEGORICAL_FEATURES: &[&str] = &[
        schema::USER_TYPE,
        schema::INCIDENT_TYPE,
        schema::DAY_OF_WEEK,
        schema::IS_WEEKEND,
        schema::INCIDENT_ZONE_TYPE,
    ];

    /// Pass-through features a record can supply as a number.
    pub const PASSTHROUGH_FEATURES: &[&str] = &[schema::IS_WEEKEND];

    /// Checks that every feature `layout` declares can be read from a record.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Configuration`] naming the first feature a
    /// record has no value for.
    pub fn check_layout(layout: &FeatureLayout) -> Result<(), DatasetError> {
        if let Some(name) = layout
            .numeric()
            .iter()
            .find(|name| !schema::NUMERIC_FEATURES.contains(&name.as_str()))
        {
            return Err(DatasetError::configuration(format!(
                "numeric feature '{name}' is not produced by the simulation"
            )));
        }

        for feature in layout.categorical() {
            let known = if feature.passthrough {
                Self::PASSTHROUGH_FEATURES
            } else {
                Self::CATEGORICAL_FEATURES
            };
            if !known.contains(&feature.name.as_str()) {
                return Err(DatasetError::configuration(format!(
                    "categorical feature '{}' is not produced by the simulation (expected one of {})",
                    feature.name,
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }
}

impl From<&SimulatedCase> for CaseRecord {
    fn from(case: &SimulatedCase) -> Self {
        Self {
            distance_km: case.distance_km,
            days_since_incident: case.incident.days_since,
            hour_of_day: case.incident.hour_of_day,
            user_engagement_rate: case.user.engagement_rate,
            user_num_friends: case.user.friends.len(),
            user_connections: case.user.connection_count,
            urgency_score: case.urgency,
            user_type: case.user.user_type,
            incident_type: case.incident.incident_type,
            day_of_week: case.incident.day_of_week,
            is_weekend: case.incident.is_weekend,
            incident_zone_type: case.incident.zone_type,
            is_useful: case.is_useful,
        }
    }
}

impl FeatureSource for CaseRecord {
    fn numeric(&self, name: &str) -> Option<FeatureValue> {
        Some(match name {
            schema::DISTANCE_KM => FeatureValue::Float(self.distance_km),
            schema::DAYS_SINCE_INCIDENT => FeatureValue::Int(self.days_since_incident),
            schema::HOUR_OF_DAY => FeatureValue::Int(i64::from(self.hour_of_day)),
            schema::USER_ENGAGEMENT_RATE => FeatureValue::Float(self.user_engagement_rate),
            schema::USER_NUM_FRIENDS => {
                FeatureValue::Int(i64::try_from(self.user_num_friends).ok()?)
            }
            schema::USER_CONNECTIONS => FeatureValue::Int(i64::from(self.user_connections)),
            schema::URGENCY_SCORE => FeatureValue::Float(self.urgency_score),
            schema::IS_WEEKEND => FeatureValue::flag(self.is_weekend),
            _ => return None,
        })
    }

    fn categorical(&self, name: &str) -> Option<String> {
        Some(match name {
            schema::USER_TYPE => self.user_type.to_string(),
            schema::INCIDENT_TYPE => self.incident_type.to_string(),
            schema::DAY_OF_WEEK => self.day_of_week.to_string(),
            schema::IS_WEEKEND => u8::from(self.is_weekend).to_string(),
            schema::INCIDENT_ZONE_TYPE => self.incident_zone_type.to_string(),
            _ => return None,
        })
    }
}
