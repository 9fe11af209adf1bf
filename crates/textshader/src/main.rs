mod cli;
mod config;
mod panel;
mod run;

use anyhow::{Context, Result};
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let load_config = || {
        config::load(cli.config.as_deref(), cli.endpoint.as_deref())
            .context("failed to load configuration")
    };

    match cli.command {
        Command::Render(args) => run::render(load_config()?, args),
        Command::Generate(args) => run::generate(load_config()?, args),
        Command::Calc(args) => run::calc(args),
        Command::Config => run::show_config(&load_config()?),
    }
}
