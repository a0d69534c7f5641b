//! Synthesis backend seam and the production rustysynth/rodio stack.
//!
//! The control plane drives each channel through the [`Sampler`] trait and
//! mints units from a [`SamplerBackend`]. The production implementation in
//! [`engine`] renders through rustysynth and plays to the default output
//! via rodio; tests substitute a scripted backend behind the same traits.

pub mod backend;
pub mod engine;

pub use backend::{Sampler, SamplerBackend};
pub use engine::{PresetInfo, SynthBackend};
