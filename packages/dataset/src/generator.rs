//! Dataset orchestration.
//!
//! Case `i` of a run is simulated from its own `ChaCha8Rng`, seeded with
//! the run seed and switched to stream `i`. Cases are produced on the rayon
//! pool and collected in index order, so a run's rows depend only on the
//! seed, the reference time, and the configuration.

use std::sync::Arc;

use butterfly_synth::signals::{HeuristicSignals, SignalProvider};
use butterfly_synth::{World, simulate_case};
use chrono::NaiveDateTime;
use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::case::CaseRecord;
use crate::config::GeneratorConfig;
use crate::encode::RowEncoder;
use crate::progress::ProgressCallback;
use crate::schema::{FeatureLayout, FeatureSchema};
use crate::writer::{self, LabeledRow};
use crate::{DatasetError, GenerationSummary};

/// Produces labeled, encoded training rows from a configuration.
pub struct DatasetGenerator {
    config: GeneratorConfig,
    world: World,
    layout: FeatureLayout,
    signals: Arc<dyn SignalProvider>,
    seed: u64,
}

impl std::fmt::Debug for DatasetGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetGenerator")
            .field("seed", &self.seed)
            .field("signals", &self.signals.name())
            .field("dataset_size", &self.config.dataset_size)
            .finish_non_exhaustive()
    }
}

impl DatasetGenerator {
    /// Validates the whole configuration before any row is produced.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Configuration`] for an unusable layout, a
    /// feature the simulation does not produce, or a zero thread count, [`DatasetError::Zone`] if the catalog cannot be
    /// resolved, and [`DatasetError::Synth`] for invalid population bounds
    /// or weights.
    pub fn new(config: GeneratorConfig) -> Result<Self, DatasetError> {
        if config.threads == Some(0) {
            return Err(DatasetError::configuration("threads must be at least 1"));
        }

        let layout = config.feature_layout()?;
        CaseRecord::check_layout(&layout)?;
        let catalog = config.zone_catalog()?;
        let now = config
            .reference_time
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let world = World::new(catalog, config.population.clone(), now)?;

        let seed = config.seed.unwrap_or_else(|| {
            let seed = rand::random();
            log::info!("No seed configured, drew {seed} (pass --seed {seed} to replay)");
            seed
        });

        Ok(Self {
            config,
            world,
            layout,
            signals: Arc::new(HeuristicSignals),
            seed,
        })
    }

    /// Replaces the behavioral signal strategy.
    #[must_use]
    pub fn with_signal_provider(mut self, signals: Arc<dyn SignalProvider>) -> Self {
        self.signals = signals;
        self
    }

    /// The run seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The reference time incidents are dated against.
    #[must_use]
    pub const fn reference_time(&self) -> NaiveDateTime {
        self.world.now()
    }

    /// The configuration this generator was built from.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The validated feature layout.
    #[must_use]
    pub const fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// The sidecar for this run.
    #[must_use]
    pub fn schema(&self) -> FeatureSchema {
        self.layout.schema()
    }

    fn case_rng(&self, index: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index);
        rng
    }

    /// Simulates case `index` of the run.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Synth`] if the simulation fails.
    pub fn generate_case(&self, index: u64) -> Result<CaseRecord, DatasetError> {
        let mut rng = self.case_rng(index);
        let case = simulate_case(&self.world, self.signals.as_ref(), &mut rng)?;
        Ok(CaseRecord::from(&case))
    }

    /// Simulates every case of the run, in index order.
    ///
    /// # Errors
    ///
    /// Returns the first simulation error, or
    /// [`DatasetError::Configuration`] if the worker pool cannot be built.
    pub fn generate_records(
        &self,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<CaseRecord>, DatasetError> {
        let size = self.config.dataset_size;
        progress.set_total(size as u64);

        let produce = || {
            (0..size)
                .into_par_iter()
                .map(|index| {
                    let record = self.generate_case(index as u64);
                    progress.inc(1);
                    record
                })
                .collect::<Result<Vec<_>, _>>()
        };

        match self.config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| DatasetError::configuration(format!("worker pool: {e}")))?
                .install(produce),
            None => produce(),
        }
    }

    /// Encodes records against the layout.
    ///
    /// Returns the rows and the number of rows that carried an undeclared
    /// categorical value.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownCategory`] under the reject policy
    /// and [`DatasetError::SchemaMismatch`] if a layout feature has no
    /// value on a record.
    pub fn encode_records(
        &self,
        records: &[CaseRecord],
    ) -> Result<(Vec<LabeledRow>, usize), DatasetError> {
        let encoder = RowEncoder::new(&self.layout).unknown_category(self.config.unknown_category);
        let mut unknown_rows = 0;
        let mut first_unknown = None;

        let rows = records
            .iter()
            .map(|record| {
                let encoded = encoder.encode(record)?;
                if let Some(unknown) = encoded.unknown_categories.first() {
                    unknown_rows += 1;
                    if first_unknown.is_none() {
                        first_unknown = Some(unknown.clone());
                    }
                }
                Ok(LabeledRow {
                    features: encoded.values,
                    is_useful: record.is_useful,
                })
            })
            .collect::<Result<Vec<_>, DatasetError>>()?;

        if let Some((feature, value)) = first_unknown {
            log::warn!(
                "{unknown_rows} row(s) carried categorical values outside their declared domain \
                 (first: {feature}='{value}'); those blocks were emitted as all zeros"
            );
        }

        Ok((rows, unknown_rows))
    }

    /// Runs the full pipeline: simulate, encode, and write both outputs.
    ///
    /// # Errors
    ///
    /// Returns any simulation, encoding, or write error. No output file is
    /// left behind on failure.
    pub fn run(
        &self,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<GenerationSummary, DatasetError> {
        log::info!(
            "Generating {} cases (seed {}, reference time {})",
            self.config.dataset_size,
            self.seed,
            self.reference_time()
        );

        let records = self.generate_records(progress)?;
        progress.set_message("Encoding rows".to_string());
        let (rows, rows_with_unknown_categories) = self.encode_records(&records)?;

        let useful = rows.iter().filter(|r| r.is_useful).count();
        let summary = GenerationSummary {
            seed: self.seed,
            rows: rows.len(),
            useful,
            rows_with_unknown_categories,
            table_path: self.config.table_path(),
            schema_path: self.config.schema_path(),
        };
        log::info!(
            "Label balance: {useful} useful / {} not useful ({:.1}% useful)",
            summary.rows - useful,
            summary.useful_ratio() * 100.0
        );

        progress.set_message("Writing outputs".to_string());
        writer::write_dataset(
            &summary.table_path,
            &summary.schema_path,
            &self.schema(),
            &rows,
        )?;

        progress.finish(format!("Generated {} rows", summary.rows));
        Ok(summary)
    }
}
