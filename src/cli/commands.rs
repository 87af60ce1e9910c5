//! CLI Command Implementations
//!
//! Each command builds a dispatcher from the resolved config and runs one
//! request against a `DirectorySink`.

use std::path::Path;

use anyhow::{bail, Context};
use log::info;

use crate::bot::{DirectorySink, Dispatcher, Outcome, UserIdentity};
use crate::cli::SenderArgs;
use crate::config::BotConfig;

fn identity(sender: &SenderArgs) -> UserIdentity {
    UserIdentity::new(sender.user.clone(), sender.username.clone())
}

fn report(outcome: Outcome, out: &Path) -> anyhow::Result<()> {
    match outcome {
        Outcome::Delivered { deliveries } => {
            println!("Delivered {} item(s) to {}", deliveries, out.display());
            Ok(())
        }
        Outcome::Ignored => {
            println!("Nothing to do.");
            Ok(())
        }
        Outcome::Failed { code } => bail!("request failed ({})", code),
    }
}

/// Process one audio file through the voice effect.
pub fn audio(config: BotConfig, input: &Path, out: &Path, sender: &SenderArgs) -> anyhow::Result<()> {
    info!("Processing audio: {}", input.display());

    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.wav")
        .to_string();

    let dispatcher = Dispatcher::new(config).context("starting dispatcher")?;
    let mut sink = DirectorySink::new(out)?;
    report(dispatcher.handle_audio(&mut sink, &bytes, &name, &identity(sender)), out)
}

/// Render text into pages.
pub fn write(config: BotConfig, text: &[String], out: &Path, sender: &SenderArgs) -> anyhow::Result<()> {
    let body = text.join(" ").replace("\\n", "\n");
    info!("Rendering {} characters", body.chars().count());

    let dispatcher = Dispatcher::new(config).context("starting dispatcher")?;
    let mut sink = DirectorySink::new(out)?;
    let message = format!("/write {}", body);
    report(dispatcher.handle_write(&mut sink, &message, &identity(sender)), out)
}

/// Print the effective configuration.
pub fn print_config(config: &BotConfig) -> anyhow::Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}
