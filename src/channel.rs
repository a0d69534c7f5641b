//! One channel slot: fixed index, current selection, and its synthesis unit.

use crate::audio::Sampler;
use crate::error::{Error, Result};
use std::path::Path;

/// Default channel volume (CC 7).
pub const DEFAULT_VOLUME: u8 = 100;

/// Default pan position (centered).
pub const DEFAULT_PAN: u8 = 64;

/// A single channel slot bound to one synthesis unit.
///
/// The channel owns its sampler exclusively. It is either fully started
/// (resource acquired, instrument loaded) or fully stopped; callers never
/// observe a half-initialized unit.
pub struct Channel {
    /// Channel index (0-15), fixed at creation.
    index: u8,
    bank: u8,
    program: u8,
    volume: u8,
    pan: u8,
    started: bool,
    sampler: Box<dyn Sampler>,
}

impl Channel {
    pub(crate) fn new(index: u8, sampler: Box<dyn Sampler>) -> Self {
        Self {
            index,
            bank: 0,
            program: 0,
            volume: DEFAULT_VOLUME,
            pan: DEFAULT_PAN,
            started: false,
            sampler,
        }
    }

    /// Channel index within the session (0-15).
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Currently selected (bank, program).
    pub fn selection(&self) -> (u8, u8) {
        (self.bank, self.program)
    }

    /// Channel volume (0-127).
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Pan position (0 = left, 64 = center, 127 = right).
    pub fn pan(&self) -> u8 {
        self.pan
    }

    /// Whether the channel's rendering resource is live.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Acquires the rendering resource. The unit renders silence until an
    /// instrument is loaded.
    pub(crate) fn start(&mut self) -> Result<()> {
        self.sampler.start().map_err(Error::EngineStartFailure)?;
        self.started = true;
        Ok(())
    }

    /// Loads the instrument at (bank, program) from `source`.
    ///
    /// On success the channel's sounding notes are released and a program
    /// change re-synchronizes the running resource. On failure the previous
    /// selection and any sounding notes are untouched.
    pub(crate) fn load_instrument(&mut self, source: &Path, bank: u8, program: u8) -> Result<()> {
        self.sampler
            .load_instrument(source, bank, program)
            .map_err(Error::InstrumentLoadFailure)?;

        // Swap policy: sounding notes never carry across an instrument
        // change, but only a successful load silences them.
        self.sampler.all_notes_off();
        self.sampler.program_change(bank, program);
        self.bank = bank;
        self.program = program;
        Ok(())
    }

    pub(crate) fn note_on(&mut self, note: u8, velocity: u8) {
        self.sampler.note_on(note, velocity);
    }

    pub(crate) fn note_off(&mut self, note: u8) {
        self.sampler.note_off(note);
    }

    pub(crate) fn all_notes_off(&mut self) {
        self.sampler.all_notes_off();
    }

    pub(crate) fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        self.sampler.set_volume(volume);
    }

    pub(crate) fn set_pan(&mut self, pan: u8) {
        self.pan = pan;
        self.sampler.set_pan(pan);
    }

    /// Releases the rendering resource. Safe to call repeatedly.
    pub(crate) fn stop(&mut self) {
        self.sampler.stop();
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SamplerBackend;
    use crate::testing::{MockBackend, SamplerEvent};
    use std::sync::Arc;

    fn channel_with_backend() -> (Arc<MockBackend>, Channel) {
        let backend = Arc::new(MockBackend::new());
        let channel = Channel::new(5, backend.create_sampler(5));
        (backend, channel)
    }

    #[test]
    fn test_new_channel_defaults() {
        let (_backend, channel) = channel_with_backend();
        assert_eq!(channel.index(), 5);
        assert_eq!(channel.selection(), (0, 0));
        assert_eq!(channel.volume(), DEFAULT_VOLUME);
        assert_eq!(channel.pan(), DEFAULT_PAN);
        assert!(!channel.is_started());
    }

    #[test]
    fn test_start_failure_maps_to_engine_start_failure() {
        let (backend, mut channel) = channel_with_backend();
        backend.fail_start_on(5);

        let result = channel.start();
        assert!(matches!(result, Err(Error::EngineStartFailure(_))));
        assert!(!channel.is_started());
    }

    #[test]
    fn test_load_success_releases_notes_and_resyncs_program() {
        let (backend, mut channel) = channel_with_backend();
        channel.start().unwrap();
        backend.take_events();

        channel
            .load_instrument(Path::new("font.sf2"), 8, 40)
            .unwrap();
        assert_eq!(channel.selection(), (8, 40));
        assert_eq!(
            backend.take_events(),
            vec![
                SamplerEvent::LoadInstrument {
                    channel: 5,
                    source: "font.sf2".into(),
                    bank: 8,
                    program: 40,
                },
                SamplerEvent::AllNotesOff { channel: 5 },
                SamplerEvent::ProgramChange {
                    channel: 5,
                    bank: 8,
                    program: 40,
                },
            ]
        );
    }

    #[test]
    fn test_load_failure_keeps_prior_state_and_sends_nothing() {
        let (backend, mut channel) = channel_with_backend();
        channel.start().unwrap();
        channel
            .load_instrument(Path::new("font.sf2"), 0, 12)
            .unwrap();
        backend.take_events();

        backend.fail_load_on(5);
        let result = channel.load_instrument(Path::new("font.sf2"), 0, 99);
        assert!(matches!(result, Err(Error::InstrumentLoadFailure(_))));
        assert_eq!(channel.selection(), (0, 12));
        // No note release, no program change after a failed load.
        assert_eq!(backend.take_events(), Vec::new());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (backend, mut channel) = channel_with_backend();
        channel.start().unwrap();
        assert_eq!(backend.live_units(), 1);

        channel.stop();
        channel.stop();
        assert!(!channel.is_started());
        assert_eq!(backend.live_units(), 0);
    }

    #[test]
    fn test_volume_and_pan_update_state_and_signal_sampler() {
        let (backend, mut channel) = channel_with_backend();
        channel.start().unwrap();
        backend.take_events();

        channel.set_volume(90);
        channel.set_pan(32);
        assert_eq!(channel.volume(), 90);
        assert_eq!(channel.pan(), 32);
        assert_eq!(
            backend.take_events(),
            vec![
                SamplerEvent::SetVolume {
                    channel: 5,
                    volume: 90,
                },
                SamplerEvent::SetPan {
                    channel: 5,
                    pan: 32,
                },
            ]
        );
    }
}
