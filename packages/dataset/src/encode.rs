//! One-hot row encoding.
//!
//! [`RowEncoder`] turns any [`FeatureSource`] into a flat row that follows
//! a [`FeatureLayout`] column for column. Generated cases and raw
//! inference requests go through the same expansion rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DatasetError;
use crate::schema::FeatureLayout;

/// A single cell of an encoded row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    /// Counts, flags, and one-hot indicators.
    Int(i64),
    /// Continuous measurements.
    Float(f64),
}

impl FeatureValue {
    /// The numeric value as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// A one-hot indicator cell.
    #[must_use]
    pub const fn flag(set: bool) -> Self {
        Self::Int(if set { 1 } else { 0 })
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Anything that can supply raw feature values by name.
pub trait FeatureSource {
    /// Value of a numeric or pass-through feature.
    fn numeric(&self, name: &str) -> Option<FeatureValue>;

    /// Raw value of a categorical feature, rendered as a string.
    fn categorical(&self, name: &str) -> Option<String>;
}

/// What to do with a categorical value outside the declared domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Emit an all-zero block for the feature.
    #[default]
    ZeroBlock,
    /// Fail with [`DatasetError::UnknownCategory`].
    Reject,
}

/// What to do when a source has no value for a declared feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Treat the feature as present with value zero.
    Zero,
    /// Fail with [`DatasetError::SchemaMismatch`].
    #[default]
    Reject,
}

/// An encoded row plus bookkeeping about how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    /// Cells in layout column order.
    pub values: Vec<FeatureValue>,
    /// Categorical features whose value fell outside the domain and were
    /// emitted as all-zero blocks.
    pub unknown_categories: Vec<(String, String)>,
}

/// Expands sources into rows following a layout.
#[derive(Debug, Clone, Copy)]
pub struct RowEncoder<'a> {
    layout: &'a FeatureLayout,
    unknown_category: UnknownCategoryPolicy,
    missing_value: MissingValuePolicy,
}

impl<'a> RowEncoder<'a> {
    /// An encoder with the default policies: unknown categories become
    /// all-zero blocks and missing values are rejected.
    #[must_use]
    pub fn new(layout: &'a FeatureLayout) -> Self {
        Self {
            layout,
            unknown_category: UnknownCategoryPolicy::default(),
            missing_value: MissingValuePolicy::default(),
        }
    }

    /// Sets the unknown-category policy.
    #[must_use]
    pub const fn unknown_category(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category = policy;
        self
    }

    /// Sets the missing-value policy.
    #[must_use]
    pub const fn missing_value(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_value = policy;
        self
    }

    /// The layout rows are encoded against.
    #[must_use]
    pub const fn layout(&self) -> &'a FeatureLayout {
        self.layout
    }

    fn missing(&self, column: &str) -> Result<FeatureValue, DatasetError> {
        match self.missing_value {
            MissingValuePolicy::Zero => Ok(FeatureValue::Int(0)),
            MissingValuePolicy::Reject => Err(DatasetError::SchemaMismatch {
                column: column.to_string(),
            }),
        }
    }

    /// Encodes one source.
    ///
    /// Each expanded feature contributes one indicator per declared value,
    /// exactly one of which is set when the source's value is in the
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::SchemaMismatch`] for a missing value under
    /// [`MissingValuePolicy::Reject`] and [`DatasetError::UnknownCategory`]
    /// for an out-of-domain value under [`UnknownCategoryPolicy::Reject`].
    pub fn encode(&self, source: &dyn FeatureSource) -> Result<EncodedRow, DatasetError> {
        let mut values = Vec::with_capacity(self.layout.columns().len());
        let mut unknown_categories = Vec::new();

        for name in self.layout.numeric() {
            let value = match source.numeric(name) {
                Some(v) => v,
                None => self.missing(name)?,
            };
            values.push(value);
        }

        for feature in self.layout.categorical() {
            if feature.passthrough {
                let value = match source.numeric(&feature.name) {
                    Some(v) => v,
                    None => self.missing(&feature.name)?,
                };
                values.push(value);
                continue;
            }

            let Some(raw) = source.categorical(&feature.name) else {
                self.missing(&feature.name)?;
                values.extend(feature.values.iter().map(|_| FeatureValue::flag(false)));
                continue;
            };

            if !feature.values.contains(&raw) {
                match self.unknown_category {
                    UnknownCategoryPolicy::ZeroBlock => {
                        log::debug!(
                            "Value '{raw}' is not declared for feature '{}', emitting zeros",
                            feature.name
                        );
                        unknown_categories.push((feature.name.clone(), raw.clone()));
                    }
                    UnknownCategoryPolicy::Reject => {
                        return Err(DatasetError::UnknownCategory {
                            feature: feature.name.clone(),
                            value: raw,
                        });
                    }
                }
            }

            values.extend(
                feature
                    .values
                    .iter()
                    .map(|declared| FeatureValue::flag(*declared == raw)),
            );
        }

        Ok(EncodedRow {
            values,
            unknown_categories,
        })
    }
}
