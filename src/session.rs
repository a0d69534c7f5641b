//! A loaded soundfont and the 16 channel units created from it.

use crate::audio::SamplerBackend;
use crate::channel::Channel;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of channel slots per session, fixed by the MIDI channel space.
pub const CHANNEL_COUNT: usize = 16;

/// Identifier of a loaded session.
///
/// Positive, strictly increasing, and never reused within a registry's
/// lifetime, so a stale id held by a host can never alias a later session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The raw id value, for hosts that marshal ids over a wire.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of 16 channels created from a single soundfont load.
///
/// Sessions are created all-or-nothing and torn down together; only
/// per-channel instrument reselection and mix changes mutate one in place.
/// Channel index `i` is always sequence position `i`.
pub struct Session {
    source: PathBuf,
    channels: Vec<Channel>,
}

impl Session {
    /// Starts 16 channels in order 0..15 and loads (bank, program) into
    /// each from the soundfont at `source`.
    ///
    /// All-or-nothing: on the first failure every already-started unit is
    /// stopped and released before the triggering error is returned, so no
    /// partially populated session ever reaches the registry.
    pub(crate) fn create(
        backend: &dyn SamplerBackend,
        source: &Path,
        bank: u8,
        program: u8,
    ) -> Result<Self> {
        let mut channels: Vec<Channel> = Vec::with_capacity(CHANNEL_COUNT);

        for index in 0..CHANNEL_COUNT as u8 {
            let mut channel = Channel::new(index, backend.create_sampler(index));
            let outcome = channel
                .start()
                .and_then(|()| channel.load_instrument(source, bank, program));

            if let Err(err) = outcome {
                tracing::warn!(
                    "session creation failed at channel {}, rolling back {} started channels: {}",
                    index,
                    channels.len(),
                    err
                );
                channel.stop();
                for started in &mut channels {
                    started.stop();
                }
                return Err(err);
            }
            channels.push(channel);
        }

        Ok(Self {
            source: source.to_path_buf(),
            channels,
        })
    }

    /// Path of the soundfont this session was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Always [`CHANNEL_COUNT`].
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The channel at `index`, if it is in range.
    pub fn channel(&self, index: u8) -> Option<&Channel> {
        self.channels.get(index as usize)
    }

    /// Reselects the instrument on one channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] if `channel` is outside 0-15;
    /// [`Error::InstrumentLoadFailure`] if the (bank, program) pair cannot
    /// be loaded, in which case the channel keeps its previous instrument.
    pub(crate) fn select_instrument(&mut self, channel: u8, bank: u8, program: u8) -> Result<()> {
        let Self { source, channels } = self;
        channels
            .get_mut(channel as usize)
            .ok_or(Error::InvalidChannel(channel))?
            .load_instrument(source, bank, program)
    }

    /// Triggers `note` at `velocity` on `channel`.
    ///
    /// Out-of-range channels are ignored: note events may race with a
    /// teardown on the caller's side.
    pub(crate) fn play_note(&mut self, channel: u8, note: u8, velocity: u8) {
        if let Some(ch) = self.channels.get_mut(channel as usize) {
            ch.note_on(note, velocity);
        }
    }

    /// Releases `note` on `channel`. Same out-of-range policy as
    /// [`Session::play_note`].
    pub(crate) fn stop_note(&mut self, channel: u8, note: u8) {
        if let Some(ch) = self.channels.get_mut(channel as usize) {
            ch.note_off(note);
        }
    }

    /// Sets the volume (CC 7) for one channel.
    pub(crate) fn set_channel_volume(&mut self, channel: u8, volume: u8) -> Result<()> {
        self.channels
            .get_mut(channel as usize)
            .ok_or(Error::InvalidChannel(channel))?
            .set_volume(volume);
        Ok(())
    }

    /// Sets the pan (CC 10) for one channel.
    pub(crate) fn set_channel_pan(&mut self, channel: u8, pan: u8) -> Result<()> {
        self.channels
            .get_mut(channel as usize)
            .ok_or(Error::InvalidChannel(channel))?
            .set_pan(pan);
        Ok(())
    }

    /// Releases every sounding note on all channels.
    pub(crate) fn all_notes_off(&mut self) {
        for channel in &mut self.channels {
            channel.all_notes_off();
        }
    }

    /// Stops all 16 units. Idempotent; never fails.
    pub(crate) fn dispose(&mut self) {
        for channel in &mut self.channels {
            channel.stop();
        }
    }
}
