use clap::Parser;
use reliability::{
    Config,
    render::{DotOptions, to_dot},
};
use tracing::instrument;

use super::load_dataset;

#[derive(Debug, Parser)]
#[command(about = "Print the Graphviz description of the fault tree")]
pub struct Dot {}

impl Dot {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let dataset = load_dataset(config)?;
        let options = DotOptions {
            font: config.font.clone(),
        };

        print!("{}", to_dot(dataset.tree(), &options));
        Ok(())
    }
}
