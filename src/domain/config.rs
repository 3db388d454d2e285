use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Style of the text outline of the fault tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutlineStyle {
    /// Box-drawing connectors (`├──`, `└──`).
    #[default]
    Connectors,
    /// Two spaces per depth level.
    Indent,
}

/// Configuration for a reliability analysis run.
///
/// Every setting is passed explicitly to the components that need it; nothing
/// here is written into the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Directory the artifacts are written to.
    ///
    /// Created if it does not exist.
    pub output_dir: PathBuf,

    /// Directory for intermediate files produced while rendering the diagram.
    ///
    /// Must be writable. It is created if missing, but its permissions are
    /// never changed.
    pub scratch_dir: PathBuf,

    /// The graph layout executable.
    ///
    /// A bare name (the default, `dot`) is resolved by the operating system;
    /// anything else is used as a path.
    pub layout_tool: PathBuf,

    /// Output format passed to the layout tool as `-T<format>`.
    ///
    /// Also used as the diagram's file extension.
    pub image_format: String,

    /// Font for diagram nodes and edges, if any.
    pub font: Option<String>,

    /// How long to wait for the layout tool before killing it, in seconds.
    ///
    /// `None` waits indefinitely.
    pub tool_timeout_secs: Option<u64>,

    /// Style of the text outline.
    pub outline_style: OutlineStyle,

    /// FMEA records with an RPN strictly above this are called out in the
    /// report recommendations.
    pub action_threshold: u16,

    /// Dataset file to analyse instead of the compiled-in reference data.
    pub dataset: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            scratch_dir: default_scratch_dir(),
            layout_tool: default_layout_tool(),
            image_format: default_image_format(),
            font: None,
            tool_timeout_secs: None,
            outline_style: OutlineStyle::default(),
            action_threshold: default_action_threshold(),
            dataset: None,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the layout tool timeout, if one is configured.
    #[must_use]
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    /// Path of the text outline artifact.
    #[must_use]
    pub fn outline_path(&self) -> PathBuf {
        self.output_dir.join("cooling_fta.txt")
    }

    /// Path of the FMEA export artifact.
    #[must_use]
    pub fn fmea_path(&self) -> PathBuf {
        self.output_dir.join("cooling_fmea.csv")
    }

    /// Path of the diagram artifact.
    #[must_use]
    pub fn diagram_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("cooling_fta.{}", self.image_format))
    }

    /// Path of the combined report artifact.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("analysis_report.txt")
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("scratch")
}

fn default_layout_tool() -> PathBuf {
    PathBuf::from("dot")
}

fn default_image_format() -> String {
    "png".to_string()
}

const fn default_action_threshold() -> u16 {
    100
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_output_dir")]
        output_dir: PathBuf,

        #[serde(default = "default_scratch_dir")]
        scratch_dir: PathBuf,

        #[serde(default = "default_layout_tool")]
        layout_tool: PathBuf,

        #[serde(default = "default_image_format")]
        image_format: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        font: Option<String>,

        /// Seconds; omitted means no timeout.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_timeout_secs: Option<u64>,

        #[serde(default)]
        outline_style: OutlineStyle,

        #[serde(default = "default_action_threshold")]
        action_threshold: u16,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        dataset: Option<PathBuf>,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                output_dir,
                scratch_dir,
                layout_tool,
                image_format,
                font,
                tool_timeout_secs,
                outline_style,
                action_threshold,
                dataset,
            } => Self {
                output_dir,
                scratch_dir,
                layout_tool,
                image_format,
                font,
                tool_timeout_secs,
                outline_style,
                action_threshold,
                dataset,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            output_dir: config.output_dir,
            scratch_dir: config.scratch_dir,
            layout_tool: config.layout_tool,
            image_format: config.image_format,
            font: config.font,
            tool_timeout_secs: config.tool_timeout_secs,
            outline_style: config.outline_style,
            action_threshold: config.action_threshold,
            dataset: config.dataset,
        }
    }
}
