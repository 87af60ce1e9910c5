//! Audio decoding and export for Pitchpage
//!
//! Everything works on in-memory buffers: uploads arrive as bytes and the
//! processed clip leaves as an [`ExportedFile`] that can be delivered more
//! than once. WAV goes through hound, MP3 through minimp3.
//!
//! Decoded audio keeps its native sample rate and is downmixed to mono.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use crate::engine::waveform::Waveform;
use crate::error::{PitchPageError, Result};

/// Suffix appended to the stem of the uploaded file name
pub const FILTERED_SUFFIX: &str = "_filtered";

// ============================================================================
// Exported file
// ============================================================================

/// Encoded bytes paired with the file name they should be delivered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl ExportedFile {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        ExportedFile {
            bytes,
            filename: filename.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Sample encoding used when writing WAV output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavFormat {
    /// 16-bit PCM, samples clamped to [-1, 1]
    #[default]
    Pcm16,
    /// 24-bit PCM, samples clamped to [-1, 1]
    Pcm24,
    /// 32-bit IEEE float, written unclamped
    Float32,
}

impl WavFormat {
    fn spec(self, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavFormat::Pcm16 => (16, SampleFormat::Int),
            WavFormat::Pcm24 => (24, SampleFormat::Int),
            WavFormat::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Container formats recognised from the first bytes of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Wav,
    Mp3,
    Ogg,
    Unknown,
}

/// Sniff the container from magic bytes
pub fn detect_container(bytes: &[u8]) -> AudioContainer {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        AudioContainer::Wav
    } else if bytes.starts_with(b"OggS") {
        AudioContainer::Ogg
    } else if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
        AudioContainer::Mp3
    } else {
        AudioContainer::Unknown
    }
}

/// Decode an uploaded clip into a mono waveform
///
/// # Errors
/// * `Decode` - If the bytes are empty, malformed, or decode to no samples
/// * `UnsupportedFormat` - If the container is recognised but not supported
pub fn decode_audio(bytes: &[u8]) -> Result<Waveform> {
    if bytes.is_empty() {
        return Err(PitchPageError::decode("input is empty"));
    }

    let waveform = match detect_container(bytes) {
        AudioContainer::Wav => decode_wav(bytes)?,
        AudioContainer::Mp3 => decode_mp3(bytes)?,
        AudioContainer::Ogg => {
            return Err(PitchPageError::UnsupportedFormat {
                format: "Ogg (convert voice notes to WAV or MP3)".to_string(),
            })
        }
        AudioContainer::Unknown => {
            return Err(PitchPageError::decode("unrecognised audio container"));
        }
    };

    if waveform.is_empty() {
        return Err(PitchPageError::decode("audio contains no samples"));
    }

    log::debug!(
        "Decoded {} samples at {} Hz ({:.2}s)",
        waveform.len(),
        waveform.sample_rate(),
        waveform.duration_secs()
    );

    Ok(waveform)
}

fn decode_wav(bytes: &[u8]) -> Result<Waveform> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| PitchPageError::Decode {
        reason: format!("Failed to read WAV header: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(PitchPageError::decode("WAV declares zero channels"));
    }
    if spec.sample_rate == 0 {
        return Err(PitchPageError::decode("WAV declares a sample rate of 0 Hz"));
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    Waveform::new(downmix(&interleaved, channels), spec.sample_rate)
}

fn decode_mp3(bytes: &[u8]) -> Result<Waveform> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut mono = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 0 || frame.sample_rate <= 0 {
                    continue;
                }
                let rate = frame.sample_rate as u32;
                if sample_rate == 0 {
                    sample_rate = rate;
                } else if rate != sample_rate {
                    return Err(PitchPageError::decode(format!(
                        "MP3 sample rate changes mid-stream ({} Hz to {} Hz)",
                        sample_rate, rate
                    )));
                }
                let frame_f32: Vec<f32> = frame.data.iter().map(|&v| v as f32 / 32768.0).collect();
                mono.extend(downmix(&frame_f32, frame.channels));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => {
                return Err(PitchPageError::decode(format!("MP3 frame error: {:?}", e)));
            }
        }
    }

    if sample_rate == 0 {
        return Err(PitchPageError::decode("no MP3 frames found"));
    }

    Waveform::new(mono, sample_rate)
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    fn bad<E: std::error::Error + Send + Sync + 'static>(what: &str, e: E) -> PitchPageError {
        PitchPageError::Decode {
            reason: format!("Failed to read {} samples: {}", what, e),
            source: Some(Box::new(e)),
        }
    }

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| bad("float", e)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| bad("8-bit", e)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| bad("16-bit", e)),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| bad("24-bit", e)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| bad("32-bit int", e)),
        (SampleFormat::Int, bits) => Err(PitchPageError::UnsupportedFormat {
            format: format!("{}-bit integer audio", bits),
        }),
    }
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ============================================================================
// Export
// ============================================================================

/// Last path segment of an uploaded file name
///
/// Platforms report uploads as `voice/file_12.oga`; only `file_12.oga` is
/// used when the file is sent on.
pub fn base_filename(original_name: &str) -> &str {
    original_name.rsplit('/').next().unwrap_or(original_name)
}

/// Derive the delivered file name from the uploaded one
///
/// `voice/file_12.oga` becomes `file_12_filtered.wav`.
pub fn filtered_filename(original_name: &str) -> String {
    let stem = Path::new(base_filename(original_name))
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("audio");
    format!("{}{}.wav", stem, FILTERED_SUFFIX)
}

/// Encode a waveform as a mono WAV file in memory
///
/// # Errors
/// * `Encode` - If hound fails to write the stream
pub fn export_wav(waveform: &Waveform, filename: impl Into<String>, format: WavFormat) -> Result<ExportedFile> {
    let spec = format.spec(waveform.sample_rate());
    let mut cursor = Cursor::new(Vec::with_capacity(44 + waveform.len() * 4));

    let encode_err = |e: hound::Error| PitchPageError::Encode {
        reason: format!("WAV write failed: {}", e),
    };

    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
        match format {
            WavFormat::Pcm16 => {
                for &sample in waveform.samples() {
                    let scaled = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
                    writer.write_sample(scaled).map_err(encode_err)?;
                }
            }
            WavFormat::Pcm24 => {
                for &sample in waveform.samples() {
                    let scaled = (sample.clamp(-1.0, 1.0) * 8388607.0).round() as i32;
                    writer.write_sample(scaled).map_err(encode_err)?;
                }
            }
            WavFormat::Float32 => {
                for &sample in waveform.samples() {
                    writer.write_sample(sample).map_err(encode_err)?;
                }
            }
        }
        writer.finalize().map_err(encode_err)?;
    }

    Ok(ExportedFile::new(cursor.into_inner(), filename))
}
