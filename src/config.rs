//! Configuration for the dispatcher and both engines
//!
//! Settings are resolved in three steps:
//! 1. Default values
//! 2. Optional JSON config file
//! 3. Environment variables

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsp::{MixPolicy, DEFAULT_PITCH_STEPS};
use crate::engine::WavFormat;
use crate::error::{PitchPageError, Result};
use crate::render::RenderSettings;

/// Broadcast channel identifier
pub const ENV_CHANNEL_ID: &str = "PITCHPAGE_CHANNEL_ID";
/// Path to the TrueType/OpenType font
pub const ENV_FONT: &str = "PITCHPAGE_FONT";
/// Path to the background template
pub const ENV_TEMPLATE: &str = "PITCHPAGE_TEMPLATE";
/// Comma-separated semitone steps, e.g. `4,-3`
pub const ENV_PITCH_STEPS: &str = "PITCHPAGE_PITCH_STEPS";

/// Largest accepted shift in either direction (two octaves)
///
/// Shifting by `s` semitones stretches the clip by `2^(s/12)` before
/// resampling, so the bound also caps the per-request buffer size.
pub const MAX_PITCH_STEP: i32 = 24;

/// Complete bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Where every result is re-published; `None` disables broadcasting
    pub channel_id: Option<String>,
    /// Semitone steps layered on top of the original clip
    pub pitch_steps: Vec<i32>,
    pub mix_policy: MixPolicy,
    pub wav_format: WavFormat,
    pub render: RenderSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            channel_id: None,
            pitch_steps: DEFAULT_PITCH_STEPS.to_vec(),
            mix_policy: MixPolicy::default(),
            wav_format: WavFormat::default(),
            render: RenderSettings::default(),
        }
    }
}

impl BotConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => BotConfig::from_file(path)?,
            None => BotConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PitchPageError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: BotConfig = serde_json::from_str(&content)?;
        log::debug!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(channel) = non_empty(ENV_CHANNEL_ID) {
            self.channel_id = Some(channel.trim().to_string());
        }
        if let Some(font) = non_empty(ENV_FONT) {
            self.render.font_path = Some(PathBuf::from(font));
        }
        if let Some(template) = non_empty(ENV_TEMPLATE) {
            self.render.template_path = Some(PathBuf::from(template));
        }
        if let Some(steps) = non_empty(ENV_PITCH_STEPS) {
            self.pitch_steps = parse_steps(&steps)?;
        }
        Ok(())
    }

    /// Reject values that would only fail later at render time
    pub fn validate(&self) -> Result<()> {
        if !(self.render.font_size > 0.0) {
            return Err(PitchPageError::Config {
                reason: format!("font_size must be positive, got {}", self.render.font_size),
            });
        }
        if !(1..=100).contains(&self.render.jpeg_quality) {
            return Err(PitchPageError::Config {
                reason: format!("jpeg_quality must be 1-100, got {}", self.render.jpeg_quality),
            });
        }
        if let Some(step) = self.pitch_steps.iter().find(|s| !(-MAX_PITCH_STEP..=MAX_PITCH_STEP).contains(*s)) {
            return Err(PitchPageError::Config {
                reason: format!("pitch step {} is outside -{1}..={1}", step, MAX_PITCH_STEP),
            });
        }
        if self.channel_id.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(PitchPageError::Config {
                reason: "channel_id is set but empty".to_string(),
            });
        }
        Ok(())
    }

    /// Pretty JSON form of the effective configuration
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse `"4,-3"` into semitone steps
pub fn parse_steps(value: &str) -> Result<Vec<i32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>().map_err(|e| PitchPageError::Config {
                reason: format!("invalid pitch step '{}': {}", s, e),
            })
        })
        .collect()
}

/// Lookup over a fixed map, handy for tests and embedding
pub fn map_lookup(vars: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
    move |key| vars.get(key).cloned()
}
