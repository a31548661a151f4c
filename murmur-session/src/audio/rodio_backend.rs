//! rodio-backed audio output
//!
//! Each track becomes a paused `rodio::Sink` carrying an infinitely-repeated
//! decoder source. If the platform provides no output device, or a file
//! cannot be decoded, the backend hands out degraded sinks that keep full
//! volume bookkeeping but report `PlaybackUnavailable` on `play()`.

use crate::audio::{AudioBackend, AudioSink};
use murmur_common::{Error, ProfileSet, Result, TrackId};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Audio backend built on rodio
pub struct RodioBackend {
    /// None when no output device was available at startup
    handle: Option<OutputStreamHandle>,
    sounds_dir: PathBuf,
}

impl RodioBackend {
    /// Open the default output device.
    ///
    /// Returns the backend and the `OutputStream`, which the caller must
    /// keep alive for the life of the session (dropping it silences all
    /// sinks). A missing device is degraded mode, not an error.
    pub fn new(sounds_dir: PathBuf) -> (Self, Option<OutputStream>) {
        match OutputStream::try_default() {
            Ok((stream, handle)) => (
                Self {
                    handle: Some(handle),
                    sounds_dir,
                },
                Some(stream),
            ),
            Err(e) => {
                warn!("No audio output device, running silent: {}", e);
                (
                    Self {
                        handle: None,
                        sounds_dir,
                    },
                    None,
                )
            }
        }
    }

    /// Log any profile tracks that don't resolve to a readable file.
    ///
    /// Missing files degrade to silent playback at fade time; surfacing them
    /// at startup makes that easier to diagnose.
    pub fn preflight(&self, profiles: &ProfileSet) {
        for profile in profiles.iter() {
            for track in &profile.tracks {
                let path = self.sounds_dir.join(track.as_str());
                if !path.is_file() {
                    warn!("Track {} not found at {}", track, path.display());
                }
            }
        }
    }

    fn try_open(&self, track: &TrackId) -> Result<rodio::Sink> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| Error::PlaybackUnavailable("no output device".to_string()))?;

        let path = self.sounds_dir.join(track.as_str());
        let file = File::open(&path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::PlaybackUnavailable(format!("cannot decode {}: {}", track, e)))?
            .repeat_infinite();

        let sink = rodio::Sink::try_new(handle)
            .map_err(|e| Error::PlaybackUnavailable(format!("cannot create sink: {}", e)))?;
        sink.pause();
        sink.set_volume(0.0);
        sink.append(source);
        Ok(sink)
    }
}

impl AudioBackend for RodioBackend {
    type Sink = RodioSink;

    fn open_loop(&self, track: &TrackId) -> RodioSink {
        match self.try_open(track) {
            Ok(sink) => {
                debug!("Opened looping sink for {}", track);
                RodioSink {
                    sink: Some(sink),
                    gain: 0.0,
                    track: track.clone(),
                }
            }
            Err(e) => {
                warn!("Degraded (silent) sink for {}: {}", track, e);
                RodioSink {
                    sink: None,
                    gain: 0.0,
                    track: track.clone(),
                }
            }
        }
    }
}

/// A looping rodio sink, possibly degraded to volume bookkeeping only
pub struct RodioSink {
    sink: Option<rodio::Sink>,
    gain: f32,
    track: TrackId,
}

impl AudioSink for RodioSink {
    fn play(&mut self) -> Result<()> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(Error::PlaybackUnavailable(format!(
                "no playable source for {}",
                self.track
            ))),
        }
    }

    fn set_volume(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.gain);
        }
    }

    fn volume(&self) -> f32 {
        self.gain
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
