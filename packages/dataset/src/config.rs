//! Generator configuration.
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! defaults below. CLI flags override individual fields after loading.

use std::path::{Path, PathBuf};

use butterfly_synth_models::PopulationConfig;
use butterfly_zone::{ZoneCatalog, registry::DEFAULT_REGISTRY};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::DatasetError;
use crate::encode::UnknownCategoryPolicy;
use crate::schema::{CategoricalFeature, FeatureLayout, default_categorical_features};

/// Default number of generated rows.
pub const DEFAULT_DATASET_SIZE: usize = 50_000;

/// Where the outputs land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, created if missing.
    pub dir: PathBuf,
    /// Row table file name.
    pub table_filename: String,
    /// Sidecar file name.
    pub schema_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/generated"),
            table_filename: "lisbon_expert_data.csv".to_string(),
            schema_filename: "feature_config.json".to_string(),
        }
    }
}

/// Which zone catalog to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSource {
    /// Embedded registry identifier.
    pub registry: String,
    /// External registry file; takes precedence over `registry`.
    pub file: Option<PathBuf>,
}

impl Default for ZoneSource {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            file: None,
        }
    }
}

/// Everything a generation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of rows to generate.
    pub dataset_size: usize,
    /// Run seed. Drawn once and logged when absent.
    pub seed: Option<u64>,
    /// Time incidents are dated against. Defaults to the local clock.
    pub reference_time: Option<NaiveDateTime>,
    /// Output locations.
    pub output: OutputConfig,
    /// Zone catalog source.
    pub zones: ZoneSource,
    /// Population bounds and weights.
    pub population: PopulationConfig,
    /// Categorical features in table order.
    pub categorical_features: Vec<CategoricalFeature>,
    /// Handling of categorical values outside their domain.
    pub unknown_category: UnknownCategoryPolicy,
    /// Worker threads. Uses rayon's global pool when absent.
    pub threads: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dataset_size: DEFAULT_DATASET_SIZE,
            seed: None,
            reference_time: None,
            output: OutputConfig::default(),
            zones: ZoneSource::default(),
            population: PopulationConfig::default(),
            categorical_features: default_categorical_features(),
            unknown_category: UnknownCategoryPolicy::default(),
            threads: None,
        }
    }
}

impl GeneratorConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Toml`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, DatasetError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded generator configuration from {}", path.display());
        Ok(config)
    }

    /// Reads `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`GeneratorConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, DatasetError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Resolves the configured zone catalog.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Zone`] if the registry is unknown or the
    /// file is invalid.
    pub fn zone_catalog(&self) -> Result<ZoneCatalog, DatasetError> {
        let catalog = match &self.zones.file {
            Some(path) => ZoneCatalog::load(path)?,
            None => ZoneCatalog::builtin(&self.zones.registry)?,
        };
        Ok(catalog)
    }

    /// Validated feature layout.
    ///
    /// # Errors
    ///
    /// See [`FeatureLayout::standard`].
    pub fn feature_layout(&self) -> Result<FeatureLayout, DatasetError> {
        FeatureLayout::standard(self.categorical_features.clone())
    }

    /// Full path of the row table.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.table_filename)
    }

    /// Full path of the sidecar.
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.schema_filename)
    }
}
