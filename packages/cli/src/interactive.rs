//! Interactive menu for the `butterfly` tool.
//!
//! Lets users generate a dataset or inspect the schema without memorizing
//! CLI flags.

use std::path::PathBuf;

use butterfly_cli_utils::MultiProgress;
use butterfly_dataset::GeneratorConfig;
use butterfly_dataset::config::DEFAULT_DATASET_SIZE;
use dialoguer::{Confirm, Input, Select};

use crate::GenerateArgs;

enum Action {
    Generate,
    Schema,
}

impl Action {
    const ALL: &[Self] = &[Self::Generate, Self::Schema];

    const fn label(&self) -> &'static str {
        match self {
            Self::Generate => "Generate training dataset",
            Self::Schema => "Show feature schema",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if user input, configuration, or generation fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Butterfly Training Data");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Generate => generate(multi),
        Action::Schema => {
            let schema = GeneratorConfig::default().feature_layout()?.schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn generate(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let rows: usize = Input::new()
        .with_prompt("Number of rows")
        .default(DEFAULT_DATASET_SIZE)
        .interact_text()?;

    let seed_str: String = Input::new()
        .with_prompt("Seed (leave empty for random)")
        .allow_empty(true)
        .interact_text()?;

    let seed: Option<u64> = if seed_str.trim().is_empty() {
        None
    } else {
        Some(
            seed_str
                .trim()
                .parse()
                .map_err(|e| format!("Invalid seed '{seed_str}': {e}"))?,
        )
    };

    let default_dir = GeneratorConfig::default().output.dir;
    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default(default_dir.display().to_string())
        .interact_text()?;

    let args = GenerateArgs {
        rows: Some(rows),
        seed,
        output_dir: Some(PathBuf::from(output_dir.trim())),
        ..GenerateArgs::default()
    };
    let config = args.load_config()?;

    if config.table_path().exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Overwrite?",
                config.table_path().display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            log::info!("Leaving existing dataset in place");
            return Ok(());
        }
    }

    crate::generate(config, multi)?;
    Ok(())
}
