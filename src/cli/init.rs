use std::path::{Path, PathBuf};

use clap::Parser;
use reliability::{Config, Dataset};
use tracing::instrument;

use super::{
    DEFAULT_CONFIG,
    terminal::{Tone, paint},
};

const DATASET_FILE: &str = "dataset.toml";

#[derive(Debug, Parser, Default)]
#[command(about = "Write a default configuration and the reference dataset")]
pub struct Init {
    /// Overwrite existing files
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument]
    pub fn run(self) -> anyhow::Result<()> {
        self.write_into(Path::new("."))?;

        println!("{}", paint("✅ Initialized reliability analysis", Tone::Done));
        println!("  Created: {DEFAULT_CONFIG}");
        println!("  Created: {DATASET_FILE}");
        println!();
        println!("Next steps:");
        println!("  Edit {DATASET_FILE} to describe your system, then run 'coolrel run'");

        Ok(())
    }

    /// Writes the configuration and the reference dataset into `dir`.
    ///
    /// The configuration names the dataset relative to `dir`.
    pub(super) fn write_into(&self, dir: &Path) -> anyhow::Result<()> {
        let config_path = dir.join(DEFAULT_CONFIG);
        let dataset_path = dir.join(DATASET_FILE);

        if !self.force {
            for path in [&config_path, &dataset_path] {
                if path.exists() {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
            }
        }

        let dataset = Dataset::reference()
            .to_toml()
            .map_err(|e| anyhow::anyhow!("Failed to serialize dataset: {e}"))?;
        std::fs::write(&dataset_path, dataset)
            .map_err(|e| anyhow::anyhow!("Failed to create {DATASET_FILE}: {e}"))?;

        let config = Config {
            dataset: Some(PathBuf::from(DATASET_FILE)),
            ..Config::default()
        };
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {DEFAULT_CONFIG}: {e}"))?;

        tracing::debug!("initialized {}", dir.display());
        Ok(())
    }
}
