#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Training dataset generation for butterfly alerts.
//!
//! Drives the simulator for N cases, one-hot encodes every case against a
//! [`schema::FeatureLayout`], and writes the row table plus the
//! [`schema::FeatureSchema`] sidecar that training and inference read back.
//! The same encoding rules are exposed to the inference side through
//! [`inference::InferenceEncoder`].

pub mod case;
pub mod config;
pub mod encode;
pub mod generator;
pub mod inference;
pub mod progress;
pub mod schema;
pub mod writer;

use std::path::PathBuf;

use butterfly_synth::SynthError;
use butterfly_zone::ZoneError;

pub use config::GeneratorConfig;
pub use generator::DatasetGenerator;
pub use schema::{FeatureLayout, FeatureSchema};

/// Errors that can occur while generating, encoding, or writing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The generator configuration or feature layout is unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// A required column could not be resolved.
    #[error("Schema mismatch: column '{column}' cannot be resolved")]
    SchemaMismatch {
        /// The offending column.
        column: String,
    },

    /// A categorical value is outside its declared domain.
    #[error("Unknown category '{value}' for feature '{feature}'")]
    UnknownCategory {
        /// Categorical feature name.
        feature: String,
        /// The undeclared value.
        value: String,
    },

    /// Simulation error.
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// Zone catalog error.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DatasetError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Outcome of a completed generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Seed the run was derived from.
    pub seed: u64,
    /// Rows written to the table.
    pub rows: usize,
    /// Rows labeled useful.
    pub useful: usize,
    /// Rows that carried at least one undeclared categorical value.
    pub rows_with_unknown_categories: usize,
    /// Path of the row table.
    pub table_path: PathBuf,
    /// Path of the sidecar.
    pub schema_path: PathBuf,
}

impl GenerationSummary {
    /// Share of rows labeled useful, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn useful_ratio(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.useful as f64 / self.rows as f64
        }
    }
}
