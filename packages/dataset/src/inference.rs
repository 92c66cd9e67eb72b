//! Encoding raw inference requests into model input vectors.
//!
//! A request is a flat JSON object of field to value. Fields are matched
//! by declared feature name with the same naming rule the generator uses:
//! numeric and pass-through features by name, and a categorical feature
//! `f` with value `v` onto the `f_v` indicator column. The resulting
//! vector follows the persisted model column order.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::DatasetError;
use crate::encode::UnknownCategoryPolicy;
use crate::schema::{FeatureLayout, FeatureSchema};

/// Renders a raw value the way generated rows render it.
///
/// Integral numbers lose their fractional part and booleans become `1` or
/// `0`. Returns `None` for nulls, arrays, and objects.
#[must_use]
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(u8::from(*b).to_string()),
        Value::Number(n) => Some(n.as_i64().map_or_else(
            || {
                n.as_f64().map_or_else(
                    || n.to_string(),
                    |f| {
                        if f.fract().abs() < f64::EPSILON && f.abs() < 1e15 {
                            format!("{f:.0}")
                        } else {
                            f.to_string()
                        }
                    },
                )
            },
            |i| i.to_string(),
        )),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric reading of a raw value. Booleans count as `1`/`0` and numeric
/// strings are parsed.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a persisted model column order: a JSON array of column names.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a string array.
pub fn load_model_columns(path: &Path) -> Result<Vec<String>, DatasetError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Turns raw requests into vectors in model column order.
///
/// Built from the [`FeatureLayout`] the sidecar was produced with, so
/// request fields are matched against declared feature names. Fields that
/// name no feature are ignored unless a model column asks for them.
#[derive(Debug, Clone)]
pub struct InferenceEncoder {
    layout: FeatureLayout,
    schema: FeatureSchema,
    model_columns: Vec<String>,
    unknown_category: UnknownCategoryPolicy,
}

impl InferenceEncoder {
    /// An encoder for `layout` emitting `model_columns` in order.
    #[must_use]
    pub fn new(layout: FeatureLayout, model_columns: Vec<String>) -> Self {
        let schema = layout.schema();
        Self {
            layout,
            schema,
            model_columns,
            unknown_category: UnknownCategoryPolicy::default(),
        }
    }

    /// An encoder whose output order is the layout's own column order.
    #[must_use]
    pub fn in_schema_order(layout: FeatureLayout) -> Self {
        let model_columns = layout.columns();
        Self::new(layout, model_columns)
    }

    /// Sets the unknown-category policy.
    #[must_use]
    pub const fn unknown_category(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category = policy;
        self
    }

    /// The column contract this encoder follows.
    #[must_use]
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// The output column order.
    #[must_use]
    pub fn model_columns(&self) -> &[String] {
        &self.model_columns
    }

    /// Verifies that a saved sidecar matches this encoder's layout.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::SchemaMismatch`] naming the first column
    /// where the two disagree.
    pub fn check_schema(&self, sidecar: &FeatureSchema) -> Result<(), DatasetError> {
        if *sidecar == self.schema {
            return Ok(());
        }
        let ours: Vec<&str> = self.schema.feature_columns().collect();
        let theirs: Vec<&str> = sidecar.feature_columns().collect();
        let column = ours
            .iter()
            .zip(&theirs)
            .find(|(a, b)| a != b)
            .map(|(a, _)| *a)
            .or_else(|| ours.get(theirs.len()).copied())
            .or_else(|| theirs.get(ours.len()).copied())
            .unwrap_or("<feature grouping>");
        Err(DatasetError::SchemaMismatch {
            column: column.to_string(),
        })
    }

    /// Encodes one request.
    ///
    /// Numeric features absent from the request are zero. Indicator columns
    /// default to zero and the matching one is set per categorical field.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::SchemaMismatch`] if a model column is neither
    /// a schema column nor a numeric request field, or if a numeric feature
    /// has a non-numeric value. Returns [`DatasetError::UnknownCategory`]
    /// for an undeclared categorical value under
    /// [`UnknownCategoryPolicy::Reject`].
    pub fn encode(&self, raw: &Map<String, Value>) -> Result<Vec<f64>, DatasetError> {
        let mut cells: BTreeMap<String, f64> = BTreeMap::new();

        for name in self.layout.numeric() {
            let value = match raw.get(name) {
                None | Some(Value::Null) => 0.0,
                Some(value) => numeric_value(value).ok_or_else(|| DatasetError::SchemaMismatch {
                    column: name.clone(),
                })?,
            };
            cells.insert(name.clone(), value);
        }
        for column in &self.schema.one_hot_columns {
            cells.insert(column.clone(), 0.0);
        }

        for feature in self.layout.categorical() {
            let Some(value) = raw.get(&feature.name) else {
                continue;
            };

            if feature.passthrough {
                let flag = numeric_value(value).ok_or_else(|| DatasetError::SchemaMismatch {
                    column: feature.name.clone(),
                })?;
                cells.insert(feature.name.clone(), flag);
                continue;
            }

            let Some(rendered) = render_value(value) else {
                continue;
            };
            if feature.values.contains(&rendered) {
                cells.insert(feature.column_name(&rendered), 1.0);
                continue;
            }

            match self.unknown_category {
                UnknownCategoryPolicy::ZeroBlock => {
                    log::warn!(
                        "Value '{rendered}' is not declared for feature '{}', emitting zeros",
                        feature.name
                    );
                }
                UnknownCategoryPolicy::Reject => {
                    return Err(DatasetError::UnknownCategory {
                        feature: feature.name.clone(),
                        value: rendered,
                    });
                }
            }
        }

        self.model_columns
            .iter()
            .map(|column| {
                cells
                    .get(column)
                    .copied()
                    .or_else(|| raw.get(column).and_then(numeric_value))
                    .ok_or_else(|| DatasetError::SchemaMismatch {
                        column: column.clone(),
                    })
            })
            .collect()
    }

    /// Parses and encodes a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Json`] if the input is not valid JSON and
    /// [`DatasetError::SchemaMismatch`] if it is not an object, otherwise
    /// see [`InferenceEncoder::encode`].
    pub fn encode_json(&self, input: &str) -> Result<Vec<f64>, DatasetError> {
        match serde_json::from_str::<Value>(input)? {
            Value::Object(raw) => self.encode(&raw),
            _ => Err(DatasetError::SchemaMismatch {
                column: "<request is not a JSON object>".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::encode::RowEncoder;
    use crate::generator::DatasetGenerator;
    use crate::progress::null_progress;
    use crate::schema::{CategoricalFeature, default_categorical_features};
    use serde_json::json;

    fn layout() -> FeatureLayout {
        FeatureLayout::new(
            vec!["distance_km".to_string(), "hour_of_day".to_string()],
            vec![
                CategoricalFeature::one_hot("user_type", ["Local", "Tourist"]),
                CategoricalFeature::one_hot("day_of_week", [0, 6]),
                CategoricalFeature::passthrough("is_weekend"),
            ],
        )
        .unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn encodes_in_schema_order() {
        let encoder = InferenceEncoder::in_schema_order(layout());
        let vector = encoder
            .encode(&object(json!({
                "distance_km": 0.5,
                "hour_of_day": 23,
                "user_type": "Tourist",
                "day_of_week": 6,
                "is_weekend": true,
            })))
            .unwrap();
        assert_eq!(vector, [0.5, 23.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_numeric_is_zero() {
        let encoder = InferenceEncoder::in_schema_order(layout());
        let vector = encoder
            .encode(&object(json!({"hour_of_day": 2, "user_type": "Local"})))
            .unwrap();
        assert_eq!(vector, [0.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn follows_model_column_order() {
        let encoder = InferenceEncoder::new(
            layout(),
            vec![
                "is_weekend".to_string(),
                "user_type_Tourist".to_string(),
                "distance_km".to_string(),
                "extra_signal".to_string(),
            ],
        );
        let vector = encoder
            .encode(&object(json!({
                "distance_km": 3.25,
                "user_type": "Tourist",
                "is_weekend": 0,
                "extra_signal": 0.75,
            })))
            .unwrap();
        assert_eq!(vector, [0.0, 1.0, 3.25, 0.75]);
    }

    #[test]
    fn unresolvable_model_column_is_schema_mismatch() {
        let encoder = InferenceEncoder::new(layout(), vec!["mystery".to_string()]);
        let result = encoder.encode(&object(json!({"distance_km": 1.0})));
        assert!(matches!(
            result,
            Err(DatasetError::SchemaMismatch { column }) if column == "mystery"
        ));
    }

    #[test]
    fn unknown_category_policy() {
        let request = object(json!({"user_type": "Pirate"}));

        let lenient = InferenceEncoder::in_schema_order(layout());
        let vector = lenient.encode(&request).unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));

        let strict = lenient.unknown_category(UnknownCategoryPolicy::Reject);
        assert!(matches!(
            strict.encode(&request),
            Err(DatasetError::UnknownCategory { feature, value }) if feature == "user_type" && value == "Pirate"
        ));
    }

    #[test]
    fn fields_sharing_a_feature_prefix_are_ignored() {
        let strict = InferenceEncoder::in_schema_order(
            FeatureLayout::standard(default_categorical_features()).unwrap(),
        )
        .unknown_category(UnknownCategoryPolicy::Reject);

        let vector = strict
            .encode(&object(json!({
                "incident_type": "Theft",
                "incident": "INC-42",
                "user": "u-7",
                "day": "Friday",
            })))
            .unwrap();

        let theft = strict
            .model_columns()
            .iter()
            .position(|c| c == "incident_type_Theft")
            .unwrap();
        assert!((vector[theft] - 1.0).abs() < f64::EPSILON);
        assert!((vector.iter().sum::<f64>() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sidecar_must_match_layout() {
        let encoder = InferenceEncoder::in_schema_order(layout());
        assert!(encoder.check_schema(&layout().schema()).is_ok());

        let mut stale = layout().schema();
        stale.one_hot_columns[1] = "user_type_Expat".to_string();
        assert!(matches!(
            encoder.check_schema(&stale),
            Err(DatasetError::SchemaMismatch { column }) if column == "user_type_Tourist"
        ));

        stale = layout().schema();
        stale.one_hot_columns.pop();
        assert!(matches!(
            encoder.check_schema(&stale),
            Err(DatasetError::SchemaMismatch { column }) if column == "is_weekend"
        ));
    }

    #[test]
    fn renders_like_generated_rows() {
        assert_eq!(render_value(&json!(4)).as_deref(), Some("4"));
        assert_eq!(render_value(&json!(4.0)).as_deref(), Some("4"));
        assert_eq!(render_value(&json!(0.5)).as_deref(), Some("0.5"));
        assert_eq!(render_value(&json!(true)).as_deref(), Some("1"));
        assert_eq!(render_value(&json!("Local")).as_deref(), Some("Local"));
        assert_eq!(render_value(&Value::Null), None);
    }

    #[test]
    fn non_object_request_is_rejected() {
        let encoder = InferenceEncoder::in_schema_order(layout());
        assert!(matches!(
            encoder.encode_json("[1, 2]"),
            Err(DatasetError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            encoder.encode_json("{not json"),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn model_columns_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_columns.json");
        std::fs::write(&path, r#"["distance_km", "is_weekend"]"#).unwrap();
        assert_eq!(
            load_model_columns(&path).unwrap(),
            ["distance_km", "is_weekend"]
        );
    }

    #[test]
    fn generated_rows_and_requests_encode_identically() {
        let generator = DatasetGenerator::new(GeneratorConfig {
            dataset_size: 200,
            seed: Some(11),
            reference_time: chrono::NaiveDate::from_ymd_opt(2026, 10, 16)
                .and_then(|d| d.and_hms_opt(14, 30, 0)),
            ..GeneratorConfig::default()
        })
        .unwrap();
        let records = generator.generate_records(&null_progress()).unwrap();
        let row_encoder = RowEncoder::new(generator.layout());
        let encoder = InferenceEncoder::in_schema_order(generator.layout().clone());

        for record in &records {
            let expected: Vec<f64> = row_encoder
                .encode(record)
                .unwrap()
                .values
                .iter()
                .map(|v| v.as_f64())
                .collect();
            let request = object(serde_json::to_value(record).unwrap());
            assert_eq!(encoder.encode(&request).unwrap(), expected);
        }
    }
}
