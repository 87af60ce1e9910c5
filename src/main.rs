//! Pitchpage CLI
//!
//! Runs the bot's request handling locally against files.

use clap::Parser;
use env_logger::Env;
use log::info;

use pitchpage::cli::{commands, Cli, Commands};
use pitchpage::config::BotConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Pitchpage v{}", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Audio { input, out, sender } => commands::audio(config, &input, &out, &sender),
        Commands::Write { text, out, sender } => commands::write(config, &text, &out, &sender),
        Commands::Config => commands::print_config(&config),
    }
}
