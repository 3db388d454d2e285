use clap::{Parser, ValueEnum};
use reliability::{Config, OutlineStyle, render::outline};
use tracing::instrument;

use super::load_dataset;

#[derive(Debug, Parser)]
#[command(about = "Print the fault tree outline")]
pub struct Tree {
    /// Outline style (defaults to the configured style)
    #[arg(long, value_enum)]
    style: Option<Style>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Style {
    /// Box-drawing connectors
    Connectors,
    /// Two spaces per level
    Indent,
}

impl From<Style> for OutlineStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Connectors => Self::Connectors,
            Style::Indent => Self::Indent,
        }
    }
}

impl Tree {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let dataset = load_dataset(config)?;
        let style = self.style.map_or(config.outline_style, OutlineStyle::from);

        for line in outline(dataset.tree(), style) {
            println!("{line}");
        }
        Ok(())
    }
}
