//! Audio output seam
//!
//! The crossfade engine drives audio through these traits rather than a
//! concrete device, so the state machine can be exercised against in-memory
//! fakes while production runs on the rodio backend.
//!
//! Degraded mode: when the platform refuses audio output, sinks still track
//! their volume and looping state; only `play()` reports
//! `Error::PlaybackUnavailable`. The engine logs that and keeps fading
//! silently, so state-machine correctness never depends on a working device.

use murmur_common::{Result, TrackId};

pub mod rodio_backend;

pub use rodio_backend::RodioBackend;

/// A live, loopable audio source with a mutable volume in [0.0, 1.0].
///
/// Owned exclusively by the engine while live; `stop()` releases the
/// underlying resource and the handle is dead afterwards.
pub trait AudioSink: Send + 'static {
    /// Begin playback.
    ///
    /// `Err(PlaybackUnavailable)` is tolerated by the caller: the fade
    /// proceeds logically but audibly silent.
    fn play(&mut self) -> Result<()>;

    /// Apply a volume. Values are clamped to [0.0, 1.0].
    fn set_volume(&mut self, gain: f32);

    /// Last applied volume
    fn volume(&self) -> f32;

    /// Stop playback and release the resource
    fn stop(&mut self);
}

/// Opens tracks as loopable sinks
pub trait AudioBackend: Send + 'static {
    type Sink: AudioSink;

    /// Open `track` as a looping source at volume 0, not yet playing.
    ///
    /// Never fails: an unopenable track yields a degraded sink whose
    /// `play()` reports the problem.
    fn open_loop(&self, track: &TrackId) -> Self::Sink;
}
