//! Error taxonomy for the control surface.
//!
//! Every failing operation returns one of these stable kinds so callers can
//! tell bad input apart from resource exhaustion and from a missing session.
//! The synthesis collaborators report failures as `anyhow::Error`; the
//! control plane collapses them into [`Error::EngineStartFailure`] or
//! [`Error::InstrumentLoadFailure`] and never widens the set.

use crate::session::SessionId;
use thiserror::Error;

/// Result alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by control operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A request field was out of range or missing. Detected before any
    /// resource is touched, so a rejected request has no side effects.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The audio-rendering resource could not be acquired.
    #[error("failed to start audio engine: {0:#}")]
    EngineStartFailure(anyhow::Error),

    /// The soundfont, or the requested (bank, program) within it, could not
    /// be loaded. One kind for every underlying cause: malformed file,
    /// missing preset, I/O error.
    #[error("failed to load instrument: {0:#}")]
    InstrumentLoadFailure(anyhow::Error),

    /// Channel index outside 0-15 on a control operation.
    #[error("channel {0} is out of range (0-15)")]
    InvalidChannel(u8),

    /// No session is registered under the given id.
    #[error("soundfont session {0} not found")]
    SessionNotFound(SessionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_distinct() {
        let invalid = Error::InvalidChannel(16);
        assert_eq!(invalid.to_string(), "channel 16 is out of range (0-15)");

        let missing = Error::SessionNotFound(SessionId::from(7));
        assert_eq!(missing.to_string(), "soundfont session 7 not found");
    }

    #[test]
    fn test_collaborator_errors_keep_their_cause_in_the_message() {
        let err = Error::InstrumentLoadFailure(anyhow::anyhow!("no such preset"));
        assert!(err.to_string().contains("no such preset"));
    }
}
