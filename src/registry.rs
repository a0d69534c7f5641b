//! The session registry: entry point for every control operation.
//!
//! One registry instance per process is the expected shape, but nothing
//! here is global; hosts own the registry and hand it to whatever owns
//! their control surface.

use crate::audio::SamplerBackend;
use crate::error::{Error, Result};
use crate::session::{Session, SessionId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Owns every loaded session and issues session identifiers.
///
/// Control operations take `&mut self`, so the borrow checker serializes
/// them: at most one control operation is ever in flight. Hosts that
/// dispatch from several threads wrap the registry in their own lock.
///
/// Dropping the registry tears down every remaining session, so audio
/// resources cannot outlive it.
pub struct SessionRegistry {
    backend: Arc<dyn SamplerBackend>,
    sessions: HashMap<SessionId, Session>,
    next_id: SessionId,
}

impl SessionRegistry {
    /// Creates an empty registry that mints samplers from `backend`.
    pub fn new(backend: Arc<dyn SamplerBackend>) -> Self {
        Self {
            backend,
            sessions: HashMap::new(),
            next_id: SessionId::first(),
        }
    }

    /// Loads the soundfont at `source`, creating a session with 16 started
    /// channels all selecting (bank, program).
    ///
    /// Identifiers start at 1 and are never reused: a creation failure
    /// still consumes the id it was assigned. Validation failures are
    /// detected before the id is assigned and before any resource is
    /// touched.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] for an empty path or out-of-range
    /// bank/program; [`Error::EngineStartFailure`] or
    /// [`Error::InstrumentLoadFailure`] from the channel that failed, after
    /// every started channel has been rolled back.
    pub fn load(&mut self, source: &Path, bank: u8, program: u8) -> Result<SessionId> {
        if source.as_os_str().is_empty() {
            return Err(Error::InvalidArguments("soundfont path is empty".into()));
        }
        check_data_byte("bank", bank)?;
        check_data_byte("program", program)?;

        let id = self.next_id;
        self.next_id = id.next();

        let session = Session::create(self.backend.as_ref(), source, bank, program)?;
        tracing::info!(
            "loaded soundfont session {} from {}",
            id,
            source.display()
        );
        self.sessions.insert(id, session);
        Ok(id)
    }

    /// Reselects the instrument on one channel of a session.
    ///
    /// # Errors
    ///
    /// In detection order: [`Error::InvalidArguments`],
    /// [`Error::SessionNotFound`], [`Error::InvalidChannel`],
    /// [`Error::InstrumentLoadFailure`].
    pub fn select_instrument(
        &mut self,
        id: SessionId,
        channel: u8,
        bank: u8,
        program: u8,
    ) -> Result<()> {
        check_data_byte("bank", bank)?;
        check_data_byte("program", program)?;
        self.session_mut(id)?.select_instrument(channel, bank, program)
    }

    /// Triggers `note` at `velocity` on a session channel.
    ///
    /// An unknown session or out-of-range channel is a silent success, not
    /// an error: note events legitimately race with unload on the caller's
    /// side, and a release arriving after disposal must not fail.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`] for out-of-range note/velocity.
    pub fn play_note(&mut self, id: SessionId, channel: u8, note: u8, velocity: u8) -> Result<()> {
        check_data_byte("note", note)?;
        check_data_byte("velocity", velocity)?;
        if let Some(session) = self.sessions.get_mut(&id) {
            session.play_note(channel, note, velocity);
        }
        Ok(())
    }

    /// Releases `note` on a session channel. Same policy as
    /// [`SessionRegistry::play_note`].
    pub fn stop_note(&mut self, id: SessionId, channel: u8, note: u8) -> Result<()> {
        check_data_byte("note", note)?;
        if let Some(session) = self.sessions.get_mut(&id) {
            session.stop_note(channel, note);
        }
        Ok(())
    }

    /// Sets the volume (CC 7) for one channel of a session.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArguments`], [`Error::SessionNotFound`], or
    /// [`Error::InvalidChannel`].
    pub fn set_channel_volume(&mut self, id: SessionId, channel: u8, volume: u8) -> Result<()> {
        check_data_byte("volume", volume)?;
        self.session_mut(id)?.set_channel_volume(channel, volume)
    }

    /// Sets the pan (CC 10) for one channel of a session. Same error
    /// contract as [`SessionRegistry::set_channel_volume`].
    pub fn set_channel_pan(&mut self, id: SessionId, channel: u8, pan: u8) -> Result<()> {
        check_data_byte("pan", pan)?;
        self.session_mut(id)?.set_channel_pan(channel, pan)
    }

    /// Releases every sounding note in a session. Unknown sessions are
    /// ignored, matching the note-path policy.
    pub fn all_notes_off(&mut self, id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.all_notes_off();
        }
    }

    /// Unloads a session, releasing all 16 channels before the entry is
    /// gone from the registry.
    ///
    /// # Errors
    ///
    /// [`Error::SessionNotFound`] if `id` is not loaded, including when it
    /// was already unloaded.
    pub fn unload(&mut self, id: SessionId) -> Result<()> {
        self.sessions
            .get_mut(&id)
            .ok_or(Error::SessionNotFound(id))?
            .dispose();
        self.sessions.remove(&id);
        tracing::info!("unloaded soundfont session {}", id);
        Ok(())
    }

    /// Disposes every session and empties the registry. Always succeeds;
    /// afterwards every previously issued id behaves as unloaded.
    pub fn teardown(&mut self) {
        let count = self.sessions.len();
        for (_, mut session) in self.sessions.drain() {
            session.dispose();
        }
        if count > 0 {
            tracing::info!("tore down {} soundfont sessions", count);
        }
    }

    /// The session mapped to `id`, for hosts that inspect channel state.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Number of currently loaded sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session> {
        self.sessions.get_mut(&id).ok_or(Error::SessionNotFound(id))
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Validates a 7-bit MIDI data field (0-127).
fn check_data_byte(field: &str, value: u8) -> Result<()> {
    if value > 127 {
        return Err(Error::InvalidArguments(format!(
            "{} {} out of range (0-127)",
            field, value
        )));
    }
    Ok(())
}
