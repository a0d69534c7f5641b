//! Collaborator contract between the control plane and the synthesis stack.
//!
//! The control plane never talks to rustysynth or rodio directly: each
//! channel slot drives one [`Sampler`], and a [`SamplerBackend`] mints the
//! samplers. Keeping the seam a trait lets tests script every collaborator
//! call and inject failures at any channel.

use anyhow::Result;
use std::path::Path;

/// One synthesis resource bound to a single channel slot.
///
/// Fallible methods report `anyhow::Error`; the control plane collapses
/// them into its stable error kinds and never inspects the cause beyond
/// the result. All methods are called from the control context. `note_on`
/// and `note_off` are signal sends: they must not allocate in the steady
/// state or block on audio-thread timing.
pub trait Sampler {
    /// Acquires the audio-rendering resource and attaches it to an output.
    /// After success the unit renders silence until an instrument is loaded.
    fn start(&mut self) -> Result<()>;

    /// Loads the instrument at (bank, program) from the soundfont at
    /// `source`. On failure the previously loaded instrument, if any, must
    /// remain intact.
    fn load_instrument(&mut self, source: &Path, bank: u8, program: u8) -> Result<()>;

    /// Triggers `note` (0-127) at `velocity` (0-127) on this unit's channel.
    fn note_on(&mut self, note: u8, velocity: u8);

    /// Releases `note` on this unit's channel.
    fn note_off(&mut self, note: u8);

    /// Stops every sounding note on this unit's channel.
    fn all_notes_off(&mut self);

    /// Re-sends the (bank, program) selection so an already-running
    /// resource re-synchronizes.
    fn program_change(&mut self, bank: u8, program: u8);

    /// Channel volume, CC 7 semantics (0-127).
    fn set_volume(&mut self, volume: u8);

    /// Channel pan, CC 10 semantics (0 = left, 64 = center, 127 = right).
    fn set_pan(&mut self, pan: u8);

    /// Detaches and releases the rendering resource. Idempotent: stopping
    /// an already-stopped unit is a no-op.
    fn stop(&mut self);
}

/// Factory for samplers. One backend serves every session in a registry.
pub trait SamplerBackend {
    /// Creates the synthesis unit for channel slot `channel` (0-15).
    /// Creation itself is infallible; resource acquisition happens in
    /// [`Sampler::start`].
    fn create_sampler(&self, channel: u8) -> Box<dyn Sampler>;
}
