//! Audio configuration for the production synthesis backend.
//!
//! Hosts can construct an [`AudioConfig`] directly, rely on the defaults, or
//! ship one as a JSON file and load it with [`AudioConfig::from_json_file`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sample rate used when none is configured (44.1 kHz standard).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default render buffer size in frames.
/// Smaller = lower latency but higher CPU usage.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Settings applied to every synthesis unit the backend creates.
///
/// Unknown JSON fields are rejected; missing fields fall back to the
/// defaults, so a config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Synthesis and output sample rate in Hz.
    pub sample_rate: u32,

    /// Frames rendered per chunk on the playback path.
    pub buffer_size: usize,

    /// Maximum simultaneous voices per channel unit.
    pub max_polyphony: usize,

    /// Whether the synthesizer applies its reverb and chorus effects.
    pub reverb_and_chorus: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_polyphony: 64,
            reverb_and_chorus: true,
        }
    }
}

impl AudioConfig {
    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON for
    /// this structure.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read audio config: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse audio config: {}", path.display()))
    }
}
