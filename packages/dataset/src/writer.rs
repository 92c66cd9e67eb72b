//! Row table and sidecar output.
//!
//! Each file is written to `<name>.partial` next to its target and renamed
//! into place only after a successful flush. A [`PartialFile`] that is
//! dropped without being committed removes its partial file, so a failed
//! run never leaves anything that looks complete.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use crate::DatasetError;
use crate::encode::FeatureValue;
use crate::schema::FeatureSchema;

/// Suffix of in-progress output files.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// One encoded row and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    /// Feature cells in schema column order.
    pub features: Vec<FeatureValue>,
    /// Ground-truth label.
    pub is_useful: bool,
}

/// An output file under construction.
struct PartialFile {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn create(target: &Path) -> Result<(Self, File), DatasetError> {
        let Some(name) = target.file_name() else {
            return Err(DatasetError::configuration(format!(
                "output path {} has no file name",
                target.display()
            )));
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut partial_name = name.to_os_string();
        partial_name.push(PARTIAL_SUFFIX);
        let partial = target.with_file_name(partial_name);
        let file = File::create(&partial)?;

        Ok((
            Self {
                partial,
                target: target.to_path_buf(),
                committed: false,
            },
            file,
        ))
    }

    fn commit(mut self) -> Result<(), DatasetError> {
        std::fs::rename(&self.partial, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.partial) {
                log::warn!(
                    "Failed to remove partial output {}: {e}",
                    self.partial.display()
                );
            }
        }
    }
}

fn stage_table(
    path: &Path,
    schema: &FeatureSchema,
    rows: &[LabeledRow],
) -> Result<PartialFile, DatasetError> {
    let (guard, file) = PartialFile::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record(schema.header())?;

    let columns: Vec<&str> = schema.feature_columns().collect();
    for row in rows {
        if row.features.len() != columns.len() {
            let column = columns
                .get(row.features.len())
                .map_or_else(|| format!("<extra column {}>", columns.len()), ToString::to_string);
            return Err(DatasetError::SchemaMismatch { column });
        }
        writer.write_record(
            row.features
                .iter()
                .map(ToString::to_string)
                .chain(std::iter::once(u8::from(row.is_useful).to_string())),
        )?;
    }

    writer.flush()?;
    Ok(guard)
}

fn stage_schema(path: &Path, schema: &FeatureSchema) -> Result<PartialFile, DatasetError> {
    let (guard, file) = PartialFile::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, schema)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(guard)
}

/// Writes the row table as CSV with header `schema.header()`.
///
/// # Errors
///
/// Returns [`DatasetError::SchemaMismatch`] if a row's width differs from
/// the schema, or an I/O or CSV error if writing fails. The target is left
/// untouched on error.
pub fn write_table(
    path: &Path,
    schema: &FeatureSchema,
    rows: &[LabeledRow],
) -> Result<(), DatasetError> {
    stage_table(path, schema, rows)?.commit()?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes the sidecar as pretty-printed JSON.
///
/// # Errors
///
/// Returns an I/O or JSON error if writing fails. The target is left
/// untouched on error.
pub fn write_schema(path: &Path, schema: &FeatureSchema) -> Result<(), DatasetError> {
    stage_schema(path, schema)?.commit()?;
    log::info!("Wrote feature schema to {}", path.display());
    Ok(())
}

/// Writes the row table and the sidecar as a pair.
///
/// Both files are fully written and flushed before either is renamed into
/// place. If the sidecar cannot be committed after the table was, the new
/// table is removed again so no table is left beside a stale sidecar.
///
/// # Errors
///
/// See [`write_table`] and [`write_schema`].
pub fn write_dataset(
    table_path: &Path,
    schema_path: &Path,
    schema: &FeatureSchema,
    rows: &[LabeledRow],
) -> Result<(), DatasetError> {
    let table = stage_table(table_path, schema, rows)?;
    let sidecar = stage_schema(schema_path, schema)?;

    table.commit()?;
    if let Err(e) = sidecar.commit() {
        if let Err(remove) = std::fs::remove_file(table_path) {
            log::warn!(
                "Failed to remove {} after sidecar error: {remove}",
                table_path.display()
            );
        }
        return Err(e);
    }

    log::info!(
        "Wrote {} rows to {} and feature schema to {}",
        rows.len(),
        table_path.display(),
        schema_path.display()
    );
    Ok(())
}
