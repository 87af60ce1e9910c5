//! Pitchpage - voice effect and page rendering for a broadcast bot
//!
//! Two independent engines, each run once per inbound request:
//! 1. Audio Effect Engine - layers pitch-shifted copies of a clip over the original
//! 2. Page Layout & Render Engine - wraps text and draws it onto template pages
//!
//! # Architecture
//!
//! - `engine`: waveform type, decoding of uploads, WAV export
//! - `dsp`: STFT, phase-vocoder pitch shift, layered mix
//! - `render`: fonts, word wrap, pagination, page encoding
//! - `bot`: request dispatcher and output sinks
//! - `config`: file and environment configuration

pub mod bot;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod render;

pub use error::{PitchPageError, Result};
