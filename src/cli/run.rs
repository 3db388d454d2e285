use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use reliability::{Analysis, Artifacts, Config, DiagramOutcome};
use tracing::instrument;

use super::terminal::{Tone, is_narrow, paint};

/// Number of digest characters shown in the summary.
const DIGEST_PREFIX: usize = 12;

#[derive(Debug, Parser, Default)]
#[command(about = "Run the full analysis and write all artifacts")]
pub struct Run {
    /// Graph layout executable (overrides the configuration)
    #[arg(long, value_name = "PATH")]
    layout_tool: Option<PathBuf>,

    /// Directory for intermediate files (overrides the configuration)
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,

    /// Seconds to wait for the layout tool before giving up
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Do not attempt to render the diagram
    #[arg(long)]
    no_diagram: bool,

    /// Exit with status 2 if the diagram could not be rendered
    #[arg(long)]
    strict: bool,
}

impl Run {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: Config) -> anyhow::Result<()> {
        let config = self.apply_overrides(config);

        let mut analysis =
            Analysis::from_config(config).context("failed to prepare the analysis")?;
        if self.no_diagram {
            analysis = analysis.without_diagram();
        }

        let artifacts = analysis.run().context("analysis failed")?;
        Self::print_summary(&artifacts);

        // The text artifacts are complete; only --strict turns a skipped
        // diagram into a failing exit code.
        if self.strict && artifacts.diagram_skipped() {
            process::exit(2);
        }

        Ok(())
    }

    /// Layers the command-line flags over the loaded configuration.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(tool) = &self.layout_tool {
            config.layout_tool.clone_from(tool);
        }
        if let Some(scratch_dir) = &self.scratch_dir {
            config.scratch_dir.clone_from(scratch_dir);
        }
        if self.timeout.is_some() {
            config.tool_timeout_secs = self.timeout;
        }
        config
    }

    fn print_summary(artifacts: &Artifacts) {
        let rows = [
            ("Outline", artifacts.outline.path(), artifacts.outline.sha256()),
            ("FMEA", artifacts.fmea.path(), artifacts.fmea.sha256()),
            ("Report", artifacts.report.path(), artifacts.report.sha256()),
        ];

        println!("Artifacts");
        println!("{}", paint("─────────", Tone::Detail));

        if is_narrow() {
            for (name, path, _) in rows {
                println!("{name}: {}", path.display());
            }
        } else {
            let width = rows
                .iter()
                .map(|(_, path, _)| path.display().to_string().chars().count())
                .max()
                .unwrap_or(0);
            for (name, path, digest) in rows {
                let path = path.display().to_string();
                let digest = &digest[..DIGEST_PREFIX.min(digest.len())];
                println!("{name:<8} {path:<width$}  {}", paint(digest, Tone::Detail));
            }
        }

        println!();

        match &artifacts.diagram {
            DiagramOutcome::Rendered(path) => {
                println!("Diagram: {} ✅", paint(&path.display().to_string(), Tone::Done));
            }
            DiagramOutcome::Disabled => {
                println!("Diagram: {}", paint("disabled", Tone::Detail));
            }
            DiagramOutcome::Skipped(error) => {
                println!("Diagram: {} ⚠️", paint("skipped", Tone::Skipped));
                println!("  {error}");
                for step in error.remediation() {
                    println!("{}", paint(&format!("  - {step}"), Tone::Detail));
                }
            }
        }
    }
}
