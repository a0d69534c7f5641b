//! Scripted sampler backend for control-plane tests.
//!
//! Records every collaborator call and injects `start`/`load` failures at
//! chosen channel indices, so tests can observe rollback, release
//! accounting, and signal ordering without an audio device.

use crate::audio::{Sampler, SamplerBackend};
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Installs a stderr subscriber so `RUST_LOG=debug cargo test` shows the
/// control plane's tracing output. Call at the top of a test while
/// debugging; repeated calls are harmless.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerEvent {
    Start { channel: u8 },
    LoadInstrument { channel: u8, source: String, bank: u8, program: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff { channel: u8 },
    ProgramChange { channel: u8, bank: u8, program: u8 },
    SetVolume { channel: u8, volume: u8 },
    SetPan { channel: u8, pan: u8 },
    Stop { channel: u8 },
}

#[derive(Default)]
struct MockState {
    events: Vec<SamplerEvent>,
    /// Channel indices whose `start` calls fail.
    fail_start_on: HashSet<u8>,
    /// Channel indices whose `load_instrument` calls fail.
    fail_load_on: HashSet<u8>,
    /// Units currently holding a rendering resource.
    live: usize,
}

/// Backend whose samplers record everything into a shared script state.
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Makes `start` fail on the given channel index until cleared.
    pub fn fail_start_on(&self, channel: u8) {
        self.state.lock().unwrap().fail_start_on.insert(channel);
    }

    /// Makes `load_instrument` fail on the given channel index until
    /// cleared.
    pub fn fail_load_on(&self, channel: u8) {
        self.state.lock().unwrap().fail_load_on.insert(channel);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_start_on.clear();
        state.fail_load_on.clear();
    }

    /// All events recorded so far, oldest first.
    pub fn events(&self) -> Vec<SamplerEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Drains and returns the recorded events.
    pub fn take_events(&self) -> Vec<SamplerEvent> {
        std::mem::take(&mut self.state.lock().unwrap().events)
    }

    /// Number of units currently holding a rendering resource. Zero means
    /// nothing leaked.
    pub fn live_units(&self) -> usize {
        self.state.lock().unwrap().live
    }
}

impl SamplerBackend for MockBackend {
    fn create_sampler(&self, channel: u8) -> Box<dyn Sampler> {
        Box::new(MockSampler {
            channel,
            started: false,
            state: Arc::clone(&self.state),
        })
    }
}

struct MockSampler {
    channel: u8,
    started: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockSampler {
    fn record(&self, event: SamplerEvent) {
        self.state.lock().unwrap().events.push(event);
    }
}

impl Sampler for MockSampler {
    fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start_on.contains(&self.channel) {
            return Err(anyhow!("injected start failure on channel {}", self.channel));
        }
        state.events.push(SamplerEvent::Start { channel: self.channel });
        state.live += 1;
        self.started = true;
        Ok(())
    }

    fn load_instrument(&mut self, source: &Path, bank: u8, program: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_load_on.contains(&self.channel) {
            return Err(anyhow!("injected load failure on channel {}", self.channel));
        }
        state.events.push(SamplerEvent::LoadInstrument {
            channel: self.channel,
            source: source.display().to_string(),
            bank,
            program,
        });
        Ok(())
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        self.record(SamplerEvent::NoteOn {
            channel: self.channel,
            note,
            velocity,
        });
    }

    fn note_off(&mut self, note: u8) {
        self.record(SamplerEvent::NoteOff {
            channel: self.channel,
            note,
        });
    }

    fn all_notes_off(&mut self) {
        self.record(SamplerEvent::AllNotesOff {
            channel: self.channel,
        });
    }

    fn program_change(&mut self, bank: u8, program: u8) {
        self.record(SamplerEvent::ProgramChange {
            channel: self.channel,
            bank,
            program,
        });
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(SamplerEvent::SetVolume {
            channel: self.channel,
            volume,
        });
    }

    fn set_pan(&mut self, pan: u8) {
        self.record(SamplerEvent::SetPan {
            channel: self.channel,
            pan,
        });
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.events.push(SamplerEvent::Stop { channel: self.channel });
        if self.started {
            state.live -= 1;
            self.started = false;
        }
    }
}
