//! Shared test doubles for session integration tests

#![allow(dead_code)]

use murmur_session::audio::{AudioBackend, AudioSink};
use murmur_session::surface::MessageSurface;
use murmur_common::{Error, Result, TrackId, Vibe};
use std::sync::{Arc, Mutex};

/// Shared view into a fake sink's state, surviving the move into the engine
#[derive(Clone, Default)]
pub struct Probe(Arc<Mutex<ProbeState>>);

#[derive(Default)]
pub struct ProbeState {
    pub gain: f32,
    pub playing: bool,
    pub stopped: bool,
}

impl Probe {
    pub fn gain(&self) -> f32 {
        self.0.lock().unwrap().gain
    }

    pub fn playing(&self) -> bool {
        self.0.lock().unwrap().playing
    }

    pub fn stopped(&self) -> bool {
        self.0.lock().unwrap().stopped
    }

    pub fn is_live(&self) -> bool {
        let state = self.0.lock().unwrap();
        state.playing && !state.stopped
    }
}

pub struct FakeSink {
    probe: Probe,
    deaf: bool,
}

impl AudioSink for FakeSink {
    fn play(&mut self) -> Result<()> {
        if self.deaf {
            return Err(Error::PlaybackUnavailable("deaf backend".to_string()));
        }
        self.probe.0.lock().unwrap().playing = true;
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) {
        self.probe.0.lock().unwrap().gain = gain.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.probe.gain()
    }

    fn stop(&mut self) {
        let mut state = self.probe.0.lock().unwrap();
        state.playing = false;
        state.stopped = true;
    }
}

/// In-memory backend recording every opened track with a probe
#[derive(Clone, Default)]
pub struct FakeBackend {
    opened: Arc<Mutex<Vec<(TrackId, Probe)>>>,
    pub deaf: bool,
}

impl AudioBackend for FakeBackend {
    type Sink = FakeSink;

    fn open_loop(&self, track: &TrackId) -> FakeSink {
        let probe = Probe::default();
        self.opened
            .lock()
            .unwrap()
            .push((track.clone(), probe.clone()));
        FakeSink {
            probe,
            deaf: self.deaf,
        }
    }
}

impl FakeBackend {
    /// Backend whose sinks refuse to play (platform policy blocked audio)
    pub fn silent() -> Self {
        Self {
            deaf: true,
            ..Self::default()
        }
    }

    pub fn probe(&self, index: usize) -> Probe {
        self.opened.lock().unwrap()[index].1.clone()
    }

    pub fn opened_track(&self, index: usize) -> TrackId {
        self.opened.lock().unwrap()[index].0.clone()
    }

    pub fn opened_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Indices of sinks that are playing and not stopped
    pub fn live_indices(&self) -> Vec<usize> {
        let opened = self.opened.lock().unwrap();
        opened
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.is_live())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Surface that records everything shown for later assertions
#[derive(Clone, Default)]
pub struct RecordingSurface {
    state: Arc<Mutex<SurfaceLog>>,
}

#[derive(Default)]
pub struct SurfaceLog {
    pub vibes: Vec<Vibe>,
    pub messages: Vec<String>,
    pub hides: usize,
}

impl RecordingSurface {
    pub fn vibes(&self) -> Vec<Vibe> {
        self.state.lock().unwrap().vibes.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn hides(&self) -> usize {
        self.state.lock().unwrap().hides
    }
}

impl MessageSurface for RecordingSurface {
    fn set_vibe(&mut self, vibe: Vibe) {
        self.state.lock().unwrap().vibes.push(vibe);
    }

    fn show(&mut self, text: &str) {
        self.state.lock().unwrap().messages.push(text.to_string());
    }

    fn hide(&mut self) {
        self.state.lock().unwrap().hides += 1;
    }
}
