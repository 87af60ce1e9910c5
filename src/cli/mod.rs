//! CLI Module
//!
//! Local driver for the dispatcher: requests come from files and arguments,
//! deliveries land in an output directory.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pitchpage - chorus voice effect and handwritten-page renderer
#[derive(Parser, Debug)]
#[command(name = "pitchpage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file (environment variables still override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Sender details used in captions
#[derive(clap::Args, Debug, Clone)]
pub struct SenderArgs {
    /// First name shown in captions
    #[arg(long, default_value = "Local")]
    pub user: String,

    /// Username shown after the @ in channel captions
    #[arg(long)]
    pub username: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the voice effect to an audio file
    #[command(name = "audio")]
    Audio {
        /// Input WAV or MP3 file
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        #[command(flatten)]
        sender: SenderArgs,
    },

    /// Render text onto template pages
    #[command(name = "write")]
    Write {
        /// Text to render; use "\n" in the shell string for line breaks
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        #[command(flatten)]
        sender: SenderArgs,
    },

    /// Print the effective configuration as JSON
    #[command(name = "config")]
    Config,
}
