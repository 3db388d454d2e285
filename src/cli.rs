use std::path::{Path, PathBuf};

mod dot;
mod fmea;
mod init;
mod run;
mod terminal;
mod tree;

use anyhow::Context;
use clap::ArgAction;
use dot::Dot;
use fmea::Fmea;
use init::Init;
use reliability::Config;
use run::Run;
use tracing::instrument;
use tree::Tree;

/// Configuration file picked up from the working directory when `--config`
/// is not given.
const DEFAULT_CONFIG: &str = "coolrel.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file [default: ./coolrel.toml if present]
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory to write the artifacts to (overrides the configuration)
    #[arg(short, long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = self.load_config()?;

        self.command
            .unwrap_or_else(|| Command::Run(Run::default()))
            .run(config)
    }

    #[instrument(level = "debug", skip(self))]
    fn load_config(&self) -> anyhow::Result<Config> {
        resolve_config(
            self.config.as_deref(),
            Path::new(DEFAULT_CONFIG),
            self.output_dir.as_deref(),
        )
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Loads `explicit` if given, otherwise `default` if it exists, otherwise the
/// built-in defaults. An explicit file that cannot be loaded is an error.
fn resolve_config(
    explicit: Option<&Path>,
    default: &Path,
    output_dir: Option<&Path>,
) -> anyhow::Result<Config> {
    let mut config = match explicit {
        Some(path) => load_config_file(path)?,
        None if default.exists() => load_config_file(default)?,
        None => {
            tracing::debug!("no {} found, using defaults", default.display());
            Config::default()
        }
    };

    if let Some(output_dir) = output_dir {
        config.output_dir = output_dir.to_path_buf();
    }
    Ok(config)
}

fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    Config::load(path)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Run the full analysis and write all artifacts (default)
    Run(Run),

    /// Print the fault tree outline
    Tree(Tree),

    /// Print the FMEA worksheet ranked by risk priority number
    Fmea(Fmea),

    /// Print the Graphviz description of the fault tree
    Dot(Dot),

    /// Write a default configuration and the reference dataset to the
    /// working directory
    Init(Init),
}

impl Command {
    fn run(self, config: Config) -> anyhow::Result<()> {
        match self {
            Self::Run(command) => command.run(config)?,
            Self::Tree(command) => command.run(&config)?,
            Self::Fmea(command) => command.run(&config)?,
            Self::Dot(command) => command.run(&config)?,
            Self::Init(command) => command.run()?,
        }
        Ok(())
    }
}

/// Loads the dataset named in the configuration, or the reference data.
fn load_dataset(config: &Config) -> anyhow::Result<reliability::Dataset> {
    match &config.dataset {
        Some(path) => reliability::Dataset::load(path)
            .with_context(|| format!("failed to load dataset {}", path.display())),
        None => Ok(reliability::Dataset::reference()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use reliability::Dataset;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn explicit_config_that_fails_to_load_is_an_error() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("absent.toml");
        let default = tmp.path().join(DEFAULT_CONFIG);

        let error = resolve_config(Some(&missing), &default, None).unwrap_err();

        assert!(error.to_string().contains("absent.toml"));
    }

    #[test]
    fn invalid_default_config_is_an_error() {
        let tmp = tempdir().unwrap();
        let default = tmp.path().join(DEFAULT_CONFIG);
        std::fs::write(&default, "output_dir = [").unwrap();

        assert!(resolve_config(None, &default, None).is_err());
    }

    #[test]
    fn missing_default_config_falls_back_to_defaults() {
        let tmp = tempdir().unwrap();

        let config = resolve_config(None, &tmp.path().join(DEFAULT_CONFIG), None).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn default_config_is_picked_up_when_present() {
        let tmp = tempdir().unwrap();
        let default = tmp.path().join(DEFAULT_CONFIG);
        let saved = Config {
            image_format: "svg".to_string(),
            ..Config::default()
        };
        saved.save(&default).unwrap();

        let config = resolve_config(None, &default, None).unwrap();

        assert_eq!(config.image_format, "svg");
    }

    #[test]
    fn output_dir_flag_overrides_the_config() {
        let tmp = tempdir().unwrap();
        let default = tmp.path().join(DEFAULT_CONFIG);
        let saved = Config {
            output_dir: PathBuf::from("from-file"),
            ..Config::default()
        };
        saved.save(&default).unwrap();

        let config = resolve_config(None, &default, Some(Path::new("from-flag"))).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("from-flag"));
    }

    #[test]
    fn run_is_the_default_command() {
        let cli = Cli::try_parse_from(["coolrel", "-o", "out"]).unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["coolrel", "tree", "-c", "alt.toml", "-vv"]).unwrap();

        assert!(matches!(cli.command, Some(Command::Tree(_))));
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn init_output_loads_back() {
        let tmp = tempdir().unwrap();

        Init::default().write_into(tmp.path()).unwrap();

        let config = Config::load(&tmp.path().join(DEFAULT_CONFIG)).unwrap();
        let dataset_path = config.dataset.clone().unwrap();
        let dataset = Dataset::load(&tmp.path().join(dataset_path)).unwrap();
        assert_eq!(dataset, Dataset::reference());
    }
}
