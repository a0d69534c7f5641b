//! Production synthesis backend: rustysynth rendering through rodio output.
//!
//! Each sampler owns an independent output stream and synthesizer so that
//! per-channel instrument changes never disturb other channels and note
//! events need no cross-channel synchronization. The 16 units of a session
//! load the same soundfont file; parsed fonts are shared through a weakly
//! held cache so the file is parsed once per session, not once per unit.

use crate::audio::backend::{Sampler, SamplerBackend};
use crate::config::AudioConfig;
use anyhow::{anyhow, bail, Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// A preset listed from a soundfont: its (bank, program) address and
/// display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetInfo {
    pub bank: u8,
    pub program: u8,
    pub name: String,
}

/// Weakly held cache of parsed soundfonts, keyed by path.
///
/// Weak entries let a font drop as soon as the last unit using it stops.
struct FontCache {
    fonts: Mutex<HashMap<PathBuf, Weak<SoundFont>>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the parsed font for `path`, reading the file only when no
    /// live copy exists.
    fn load(&self, path: &Path) -> Result<Arc<SoundFont>> {
        let mut fonts = self
            .fonts
            .lock()
            .map_err(|_| anyhow!("soundfont cache lock poisoned"))?;

        if let Some(font) = fonts.get(path).and_then(Weak::upgrade) {
            return Ok(font);
        }

        let mut reader = BufReader::new(
            File::open(path)
                .with_context(|| format!("failed to open soundfont: {}", path.display()))?,
        );
        let font = Arc::new(
            SoundFont::new(&mut reader)
                .map_err(|e| anyhow!("failed to parse soundfont {}: {:?}", path.display(), e))?,
        );
        fonts.insert(path.to_path_buf(), Arc::downgrade(&font));
        Ok(font)
    }
}

/// Factory for rustysynth-backed samplers.
///
/// One backend serves every session in a registry; all units it creates
/// share its [`AudioConfig`] and its font cache.
pub struct SynthBackend {
    config: AudioConfig,
    cache: Arc<FontCache>,
}

impl SynthBackend {
    /// Creates a backend whose units use `config`.
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            cache: Arc::new(FontCache::new()),
        }
    }

    /// Lists every preset in the soundfont at `path`, sorted by
    /// (bank, program).
    ///
    /// Lets hosts offer an instrument picker before selecting a
    /// (bank, program) pair on a channel.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn presets(&self, path: &Path) -> Result<Vec<PresetInfo>> {
        let font = self.cache.load(path)?;
        let mut presets: Vec<PresetInfo> = font
            .get_presets()
            .iter()
            .map(|preset| PresetInfo {
                bank: preset.get_bank_number() as u8,
                program: preset.get_patch_number() as u8,
                name: preset.get_name().to_string(),
            })
            .collect();
        presets.sort_by_key(|p| (p.bank, p.program));
        Ok(presets)
    }
}

impl SamplerBackend for SynthBackend {
    fn create_sampler(&self, channel: u8) -> Box<dyn Sampler> {
        Box::new(SynthSampler::new(
            channel,
            self.config.clone(),
            Arc::clone(&self.cache),
        ))
    }
}

/// Audio source that pulls samples from a sampler's synthesizer slot.
/// Implements rodio's Source trait; renders silence while the slot is
/// empty, so a started unit is audible (as silence) before any instrument
/// is loaded.
struct SynthSource {
    /// Synthesizer slot shared with the control side.
    synth: Arc<Mutex<Option<Synthesizer>>>,
    sample_rate: u32,
    /// Left channel buffer.
    left_buf: Vec<f32>,
    /// Right channel buffer.
    right_buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current output channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<Option<Synthesizer>>>, sample_rate: u32, buffer_size: usize) -> Self {
        Self {
            synth,
            sample_rate,
            left_buf: vec![0.0; buffer_size],
            right_buf: vec![0.0; buffer_size],
            buf_pos: buffer_size, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        // Render a new buffer when the current one is exhausted
        if self.buf_pos >= self.left_buf.len() {
            let mut rendered = false;
            if let Ok(mut slot) = self.synth.lock() {
                if let Some(synth) = slot.as_mut() {
                    synth.render(&mut self.left_buf, &mut self.right_buf);
                    rendered = true;
                }
            }
            if !rendered {
                self.left_buf.fill(0.0);
                self.right_buf.fill(0.0);
            }
            self.buf_pos = 0;
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// One rustysynth synthesizer playing to its own rodio output stream.
struct SynthSampler {
    /// Channel slot this unit is bound to (0-15), fixed at creation.
    channel: u8,
    config: AudioConfig,
    cache: Arc<FontCache>,
    /// Font currently loaded into the synthesizer slot, if any.
    font: Option<(PathBuf, Arc<SoundFont>)>,
    /// Shared with the playback source; `None` until an instrument loads.
    synth: Arc<Mutex<Option<Synthesizer>>>,
    /// Output stream and handle, held while started. Dropping the stream
    /// detaches playback.
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl SynthSampler {
    fn new(channel: u8, config: AudioConfig, cache: Arc<FontCache>) -> Self {
        Self {
            channel,
            config,
            cache,
            font: None,
            synth: Arc::new(Mutex::new(None)),
            stream: None,
        }
    }

    fn settings(&self) -> SynthesizerSettings {
        let mut settings = SynthesizerSettings::new(self.config.sample_rate as i32);
        settings.maximum_polyphony = self.config.max_polyphony as usize;
        settings.enable_reverb_and_chorus = self.config.reverb_and_chorus;
        settings
    }

    /// Sends a raw MIDI message to this unit's channel, if a synthesizer
    /// is loaded.
    fn send_midi(&self, command: i32, data1: i32, data2: i32) {
        if let Ok(mut slot) = self.synth.lock() {
            if let Some(synth) = slot.as_mut() {
                synth.process_midi_message(self.channel as i32, command, data1, data2);
            }
        }
    }
}

impl Sampler for SynthSampler {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let (stream, handle) = OutputStream::try_default().context("failed to open audio output")?;
        let source = SynthSource::new(
            Arc::clone(&self.synth),
            self.config.sample_rate,
            self.config.buffer_size,
        );
        handle
            .play_raw(source)
            .context("failed to start audio playback")?;

        self.stream = Some((stream, handle));
        Ok(())
    }

    fn load_instrument(&mut self, source: &Path, bank: u8, program: u8) -> Result<()> {
        let font = self.cache.load(source)?;

        let exists = font.get_presets().iter().any(|preset| {
            preset.get_bank_number() == bank as i32 && preset.get_patch_number() == program as i32
        });
        if !exists {
            bail!(
                "soundfont {} has no preset for bank {} program {}",
                source.display(),
                bank,
                program
            );
        }

        // Within one session the font never changes, so a reselect on a
        // loaded unit keeps its synthesizer; the caller follows up with a
        // program change.
        let same_font = matches!(&self.font, Some((path, _)) if path == source);
        if !same_font {
            let settings = self.settings();
            let synth = Synthesizer::new(&font, &settings)
                .map_err(|e| anyhow!("failed to create synthesizer: {:?}", e))?;
            let mut slot = self
                .synth
                .lock()
                .map_err(|_| anyhow!("synthesizer slot lock poisoned"))?;
            *slot = Some(synth);
            drop(slot);
            self.font = Some((source.to_path_buf(), font));
        }

        Ok(())
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        if let Ok(mut slot) = self.synth.lock() {
            if let Some(synth) = slot.as_mut() {
                synth.note_on(self.channel as i32, note as i32, velocity as i32);
            }
        }
    }

    fn note_off(&mut self, note: u8) {
        if let Ok(mut slot) = self.synth.lock() {
            if let Some(synth) = slot.as_mut() {
                synth.note_off(self.channel as i32, note as i32);
            }
        }
    }

    fn all_notes_off(&mut self) {
        // This synthesizer serves only this unit's channel, so a global
        // note-off cannot leak into other channels.
        if let Ok(mut slot) = self.synth.lock() {
            if let Some(synth) = slot.as_mut() {
                synth.note_off_all(true);
            }
        }
    }

    fn program_change(&mut self, bank: u8, program: u8) {
        // Bank select (CC 0) followed by program change
        self.send_midi(0xB0, 0x00, bank as i32);
        self.send_midi(0xC0, program as i32, 0);
    }

    fn set_volume(&mut self, volume: u8) {
        // Control change 7 is volume
        self.send_midi(0xB0, 7, volume as i32);
    }

    fn set_pan(&mut self, pan: u8) {
        // Control change 10 is pan
        self.send_midi(0xB0, 10, pan as i32);
    }

    fn stop(&mut self) {
        if self.stream.take().is_none() {
            return;
        }
        if let Ok(mut slot) = self.synth.lock() {
            *slot = None;
        }
        self.font = None;
    }
}
