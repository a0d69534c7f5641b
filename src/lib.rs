//! sfhost - session and channel lifecycle management for polyphonic
//! soundfont playback.
//!
//! A [`SessionRegistry`] loads soundfont files into sessions of 16
//! independent MIDI channels, each bound to its own synthesis unit, and
//! routes note and instrument-select commands to the right channel. The
//! registry is the control surface: hosts own one instance and drive it
//! from a single control context.
//!
//! Synthesis runs behind the [`Sampler`]/[`SamplerBackend`] traits. The
//! production backend renders through rustysynth and plays to the default
//! output via rodio:
//!
//! ```no_run
//! use sfhost::{AudioConfig, SessionRegistry, SynthBackend};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> sfhost::Result<()> {
//!     let backend = Arc::new(SynthBackend::new(AudioConfig::default()));
//!     let mut registry = SessionRegistry::new(backend);
//!
//!     let id = registry.load(Path::new("assets/example.sf2"), 0, 0)?;
//!     registry.select_instrument(id, 5, 0, 40)?;
//!     registry.play_note(id, 5, 60, 100)?;
//!     registry.stop_note(id, 5, 60)?;
//!     registry.unload(id)?;
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod channel;
pub mod config;
pub mod error;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the control surface and the backend seam
pub use audio::{PresetInfo, Sampler, SamplerBackend, SynthBackend};
pub use channel::Channel;
pub use config::AudioConfig;
pub use error::{Error, Result};
pub use registry::SessionRegistry;
pub use session::{Session, SessionId, CHANNEL_COUNT};
