#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `butterfly` command-line tool.
//!
//! Generates the labeled training table and its feature schema, prints the
//! schema for a configuration, and encodes raw inference requests against
//! a saved schema. Running without a subcommand opens an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`butterfly_cli_utils::init_logger`])
//! so that log lines and progress bars never fight for the terminal.

mod interactive;

use std::io::Read as _;
use std::path::{Path, PathBuf};

use butterfly_cli_utils::{IndicatifProgress, MultiProgress};
use butterfly_dataset::encode::UnknownCategoryPolicy;
use butterfly_dataset::inference::{InferenceEncoder, load_model_columns};
use butterfly_dataset::{DatasetGenerator, FeatureSchema, GenerationSummary, GeneratorConfig};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "butterfly", about = "Synthetic training data for butterfly alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the labeled row table and its feature schema
    Generate(GenerateArgs),
    /// Print the feature schema a configuration produces
    Schema {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Encode a raw JSON request into a model input vector
    Encode {
        /// TOML configuration the dataset was generated with
        #[arg(long)]
        config: Option<PathBuf>,
        /// Feature schema sidecar written by `generate`
        #[arg(long)]
        schema: PathBuf,
        /// JSON array with the model's column order (defaults to schema order)
        #[arg(long)]
        columns: Option<PathBuf>,
        /// JSON object with the raw request, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
        /// Fail on categorical values missing from the schema
        #[arg(long)]
        strict: bool,
    },
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of rows to generate
    #[arg(long)]
    rows: Option<usize>,
    /// Run seed, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Directory the table and schema are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,
    /// Time incidents are dated against, e.g. `2026-10-16T14:30:00`
    #[arg(long)]
    reference_time: Option<NaiveDateTime>,
}

impl GenerateArgs {
    fn load_config(&self) -> Result<GeneratorConfig, Box<dyn std::error::Error>> {
        let mut config = GeneratorConfig::load_or_default(self.config.as_deref())?;
        if let Some(rows) = self.rows {
            config.dataset_size = rows;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir.clone_from(dir);
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(time) = self.reference_time {
            config.reference_time = Some(time);
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = butterfly_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate(args)) => {
            let config = args.load_config()?;
            generate(config, &multi)?;
        }
        Some(Commands::Schema { config }) => {
            let config = GeneratorConfig::load_or_default(config.as_deref())?;
            let schema = config.feature_layout()?.schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(Commands::Encode {
            config,
            schema,
            columns,
            input,
            strict,
        }) => {
            let config = GeneratorConfig::load_or_default(config.as_deref())?;
            let encoder = encoder(&config, &schema, columns.as_deref(), strict)?;
            let vector = encoder.encode_json(&read_input(&input)?)?;
            println!("{}", serde_json::to_string(&vector)?);
        }
        None => interactive::run(&multi)?,
    }

    Ok(())
}

/// Runs a full generation with a progress bar and prints the summary.
fn generate(
    config: GeneratorConfig,
    multi: &MultiProgress,
) -> Result<GenerationSummary, Box<dyn std::error::Error>> {
    let generator = DatasetGenerator::new(config)?;
    let progress = IndicatifProgress::cases_bar(multi, "Generating cases");
    let summary = generator.run(&progress)?;

    println!();
    println!("Rows:    {}", summary.rows);
    println!(
        "Useful:  {} ({:.1}%)",
        summary.useful,
        summary.useful_ratio() * 100.0
    );
    println!("Seed:    {}", summary.seed);
    println!("Table:   {}", summary.table_path.display());
    println!("Schema:  {}", summary.schema_path.display());

    Ok(summary)
}

/// Builds the request encoder for a configuration, after checking that the
/// saved sidecar was produced by the same feature layout.
fn encoder(
    config: &GeneratorConfig,
    schema_path: &Path,
    columns_path: Option<&Path>,
    strict: bool,
) -> Result<InferenceEncoder, Box<dyn std::error::Error>> {
    let layout = config.feature_layout()?;
    let encoder = match columns_path {
        Some(path) => InferenceEncoder::new(layout, load_model_columns(path)?),
        None => InferenceEncoder::in_schema_order(layout),
    };
    encoder.check_schema(&FeatureSchema::load(schema_path)?)?;

    Ok(if strict {
        encoder.unknown_category(UnknownCategoryPolicy::Reject)
    } else {
        encoder
    })
}

fn read_input(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}
