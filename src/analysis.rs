//! The end-to-end analysis run
//!
//! An [`Analysis`] writes the fault tree outline, the FMEA export, the
//! diagram, and the combined report into the output directory. The text
//! artifacts are the product: failing to write one is an error. The diagram
//! is best-effort: any [`DiagramError`] is logged with remediation steps and
//! recorded in the returned [`Artifacts`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    diagram::{DiagramError, DiagramRenderer},
    domain::{Config, Dataset, DatasetError},
    render::{csv, outline_text},
    report::{Report, ReportOptions},
};

/// Errors that abort an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The dataset file could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        /// The output directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A text artifact could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// The artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// A written text artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    sha256: String,
}

impl Artifact {
    /// Where the artifact was written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex-encoded SHA-256 digest of the artifact's contents.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

/// What happened to the diagram.
#[derive(Debug)]
pub enum DiagramOutcome {
    /// The diagram was written to this path.
    Rendered(PathBuf),
    /// Rendering failed; the run carried on without it.
    Skipped(DiagramError),
    /// Diagram rendering was turned off.
    Disabled,
}

/// Everything an analysis run produced.
#[derive(Debug)]
pub struct Artifacts {
    /// Text outline of the fault tree.
    pub outline: Artifact,
    /// Ranked FMEA export.
    pub fmea: Artifact,
    /// Combined report.
    pub report: Artifact,
    /// The diagram, if one was produced.
    pub diagram: DiagramOutcome,
}

impl Artifacts {
    /// The text artifacts, in the order they were written.
    #[must_use]
    pub fn text(&self) -> [&Artifact; 3] {
        [&self.outline, &self.fmea, &self.report]
    }

    /// Whether the diagram was attempted and failed.
    #[must_use]
    pub const fn diagram_skipped(&self) -> bool {
        matches!(self.diagram, DiagramOutcome::Skipped(_))
    }
}

/// A configured analysis run.
#[derive(Debug, Clone)]
pub struct Analysis {
    config: Config,
    dataset: Dataset,
    renderer: Option<DiagramRenderer>,
}

impl Analysis {
    /// Creates a run over the given dataset.
    #[must_use]
    pub fn new(config: Config, dataset: Dataset) -> Self {
        let renderer = Some(DiagramRenderer::from_config(&config));
        Self {
            config,
            dataset,
            renderer,
        }
    }

    /// Creates a run over the dataset named in the configuration, or the
    /// reference data if none is named.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured dataset cannot be loaded.
    pub fn from_config(config: Config) -> Result<Self, AnalysisError> {
        let dataset = match &config.dataset {
            Some(path) => Dataset::load(path)?,
            None => Dataset::reference(),
        };
        Ok(Self::new(config, dataset))
    }

    /// Skips the diagram entirely.
    #[must_use]
    pub fn without_diagram(mut self) -> Self {
        self.renderer = None;
        self
    }

    /// Runs the analysis and writes all artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory or any text artifact cannot be
    /// written. Diagram failures are not errors; see
    /// [`Artifacts::diagram`].
    #[instrument(skip(self), fields(output_dir = %self.config.output_dir.display()))]
    pub fn run(&self) -> Result<Artifacts, AnalysisError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| AnalysisError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let tree = self.dataset.tree();
        let outline = write_artifact(
            self.config.outline_path(),
            &outline_text(tree, self.config.outline_style),
        )?;

        let diagram = self.render_diagram();

        let fmea = write_artifact(self.config.fmea_path(), &csv(self.dataset.fmea()))?;

        let report = Report::assemble(
            &self.dataset,
            ReportOptions {
                outline_style: self.config.outline_style,
                action_threshold: self.config.action_threshold,
            },
        );
        let report = write_artifact(self.config.report_path(), &report.render())?;

        Ok(Artifacts {
            outline,
            fmea,
            report,
            diagram,
        })
    }

    fn render_diagram(&self) -> DiagramOutcome {
        let Some(renderer) = &self.renderer else {
            tracing::info!("diagram rendering disabled");
            return DiagramOutcome::Disabled;
        };

        match renderer.render(self.dataset.tree(), &self.config.diagram_path()) {
            Ok(path) => {
                tracing::info!("wrote {}", path.display());
                DiagramOutcome::Rendered(path)
            }
            Err(error) => {
                tracing::warn!("skipping diagram: {error}");
                for step in error.remediation() {
                    tracing::warn!("  - {step}");
                }
                DiagramOutcome::Skipped(error)
            }
        }
    }
}

fn write_artifact(path: PathBuf, content: &str) -> Result<Artifact, AnalysisError> {
    if let Err(source) = fs::write(&path, content) {
        return Err(AnalysisError::Write { path, source });
    }
    tracing::info!("wrote {}", path.display());

    let sha256 = format!("{:x}", Sha256::digest(content.as_bytes()));
    Ok(Artifact { path, sha256 })
}
