use std::fmt;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use reliability::{
    Config,
    render::{csv, ranked_rows, text_table},
};
use tracing::instrument;

use super::load_dataset;

#[derive(Debug, Parser)]
#[command(about = "Print the FMEA worksheet ranked by risk priority number")]
pub struct Fmea {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl Fmea {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let dataset = load_dataset(config)?;
        let table = dataset.fmea();

        if table.is_empty() {
            println!("No FMEA records found.");
            return Ok(());
        }

        match self.output {
            OutputFormat::Table => print!("{}", text_table(table)),
            OutputFormat::Csv => print!("{}", csv(table)),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), &ranked_rows(table))
                    .context("failed to render json output")?;
                println!();
            }
        }
        Ok(())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}
