//! Feature layout and the `FeatureSchema` sidecar.
//!
//! A [`FeatureLayout`] declares the numeric features and the categorical
//! features with their value domains. Expanding it yields the
//! [`FeatureSchema`], the flat column order shared with the training and
//! inference stages.

use std::collections::BTreeSet;
use std::path::Path;

use butterfly_synth_models::{IncidentType, UserType};
use butterfly_zone_models::ZoneType;
use serde::{Deserialize, Serialize};

use crate::DatasetError;

/// Distance between user and incident, in kilometers.
pub const DISTANCE_KM: &str = "distance_km";
/// Whole days since the incident.
pub const DAYS_SINCE_INCIDENT: &str = "days_since_incident";
/// Hour of day the incident occurred.
pub const HOUR_OF_DAY: &str = "hour_of_day";
/// User engagement rate.
pub const USER_ENGAGEMENT_RATE: &str = "user_engagement_rate";
/// Size of the user's friend set.
pub const USER_NUM_FRIENDS: &str = "user_num_friends";
/// User connection count.
pub const USER_CONNECTIONS: &str = "user_connections";
/// Composite distance/recency decay.
pub const URGENCY_SCORE: &str = "urgency_score";

/// User type categorical feature.
pub const USER_TYPE: &str = "user_type";
/// Incident type categorical feature.
pub const INCIDENT_TYPE: &str = "incident_type";
/// Day of week categorical feature (Monday = 0).
pub const DAY_OF_WEEK: &str = "day_of_week";
/// Weekend flag, passed through unexpanded.
pub const IS_WEEKEND: &str = "is_weekend";
/// Incident zone type categorical feature.
pub const INCIDENT_ZONE_TYPE: &str = "incident_zone_type";

/// Label column, always last in the row table.
pub const LABEL_COLUMN: &str = "is_useful";

/// Numeric features in table order.
pub const NUMERIC_FEATURES: &[&str] = &[
    DISTANCE_KM,
    DAYS_SINCE_INCIDENT,
    HOUR_OF_DAY,
    USER_ENGAGEMENT_RATE,
    USER_NUM_FRIENDS,
    USER_CONNECTIONS,
    URGENCY_SCORE,
];

/// A categorical feature and its declared value domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    /// Feature name, used as the one-hot column prefix.
    pub name: String,
    /// Declared values, in column order.
    pub values: Vec<String>,
    /// Emit the raw value as a single column instead of expanding it.
    #[serde(default)]
    pub passthrough: bool,
}

impl CategoricalFeature {
    /// A feature expanded into one column per value.
    #[must_use]
    pub fn one_hot<I, S>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            name: name.to_string(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
            passthrough: false,
        }
    }

    /// An already-binary feature emitted as-is.
    #[must_use]
    pub fn passthrough(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: vec!["0".to_string(), "1".to_string()],
            passthrough: true,
        }
    }

    /// Column name for one value of this feature.
    #[must_use]
    pub fn column_name(&self, value: &str) -> String {
        one_hot_column(&self.name, value)
    }

    /// Columns this feature contributes, in order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        if self.passthrough {
            vec![self.name.clone()]
        } else {
            self.values.iter().map(|v| self.column_name(v)).collect()
        }
    }
}

/// Builds the `{feature}_{value}` column name.
#[must_use]
pub fn one_hot_column(feature: &str, value: &str) -> String {
    format!("{feature}_{value}")
}

/// The categorical features emitted by default, in table order.
#[must_use]
pub fn default_categorical_features() -> Vec<CategoricalFeature> {
    vec![
        CategoricalFeature::one_hot(USER_TYPE, UserType::all()),
        CategoricalFeature::one_hot(INCIDENT_TYPE, IncidentType::all()),
        CategoricalFeature::one_hot(DAY_OF_WEEK, 0..7),
        CategoricalFeature::passthrough(IS_WEEKEND),
        CategoricalFeature::one_hot(INCIDENT_ZONE_TYPE, ZoneType::all()),
    ]
}

/// Validated numeric and categorical feature declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    numeric: Vec<String>,
    categorical: Vec<CategoricalFeature>,
}

impl FeatureLayout {
    /// Validates a layout.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Configuration`] if a categorical feature has
    /// an empty domain or two features would emit the same column name.
    pub fn new(
        numeric: Vec<String>,
        categorical: Vec<CategoricalFeature>,
    ) -> Result<Self, DatasetError> {
        for feature in &categorical {
            if feature.values.is_empty() {
                return Err(DatasetError::configuration(format!(
                    "categorical feature '{}' declares no values",
                    feature.name
                )));
            }
        }

        let layout = Self {
            numeric,
            categorical,
        };

        let mut seen = BTreeSet::new();
        for column in layout.columns() {
            if column == LABEL_COLUMN || !seen.insert(column.clone()) {
                return Err(DatasetError::configuration(format!(
                    "column '{column}' is declared more than once"
                )));
            }
        }

        Ok(layout)
    }

    /// The layout with the standard numeric features and `categorical`.
    ///
    /// # Errors
    ///
    /// See [`FeatureLayout::new`].
    pub fn standard(categorical: Vec<CategoricalFeature>) -> Result<Self, DatasetError> {
        Self::new(
            NUMERIC_FEATURES.iter().map(ToString::to_string).collect(),
            categorical,
        )
    }

    /// Numeric feature names in table order.
    #[must_use]
    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    /// Categorical features in table order.
    #[must_use]
    pub fn categorical(&self) -> &[CategoricalFeature] {
        &self.categorical
    }

    /// All feature columns, label excluded.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.numeric
            .iter()
            .cloned()
            .chain(self.categorical.iter().flat_map(CategoricalFeature::columns))
            .collect()
    }

    /// The flat column contract for this layout.
    #[must_use]
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema {
            numerical_features: self.numeric.clone(),
            one_hot_columns: self
                .categorical
                .iter()
                .flat_map(CategoricalFeature::columns)
                .collect(),
        }
    }
}

/// Column-order contract between the generator and every downstream
/// consumer.
///
/// `one_hot_columns` lists the expanded categorical columns in emission
/// order, pass-through columns included at their slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Numeric features to be scaled downstream.
    pub numerical_features: Vec<String>,
    /// Expanded categorical columns.
    #[serde(alias = "categorical_features_one_hot")]
    pub one_hot_columns: Vec<String>,
}

impl FeatureSchema {
    /// Feature columns in table order, label excluded.
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        self.numerical_features
            .iter()
            .chain(&self.one_hot_columns)
            .map(String::as_str)
    }

    /// Number of feature columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.numerical_features.len() + self.one_hot_columns.len()
    }

    /// Full row table header, label last.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.feature_columns()
            .chain(std::iter::once(LABEL_COLUMN))
            .map(ToString::to_string)
            .collect()
    }

    /// Reads a sidecar file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
