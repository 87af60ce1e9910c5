//! Audio Engine Module
//!
//! Waveform storage plus decoding of uploads and WAV export.

pub mod io;
pub mod waveform;

pub use io::{
    base_filename, decode_audio, detect_container, export_wav, filtered_filename, AudioContainer, ExportedFile,
    WavFormat,
};
pub use waveform::Waveform;
