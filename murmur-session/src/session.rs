//! Session controller
//!
//! Thin orchestration over the core components: journal input flows through
//! the classifier and the message gate; vibe changes and manual skips route
//! into the crossfade engine; mute toggles re-apply volumes without touching
//! ramp state. The controller also owns the two timers that are not the
//! engine's: the typing-idle debounce and the message-bubble auto-hide.
//!
//! All work runs on one logical task; suspension happens only at timer and
//! channel boundaries.

use crate::audio::AudioBackend;
use crate::classifier::classify;
use crate::engine::CrossfadeEngine;
use crate::gate::MessageGate;
use crate::selector::TrackSelector;
use crate::surface::MessageSurface;
use murmur_common::events::{EventBus, SessionEvent};
use murmur_common::{ProfileSet, SessionConfig, Vibe};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

/// User-facing commands accepted by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Journal text appended (one input line / keystroke burst)
    Text(String),
    /// Re-pick a track within the active vibe
    Skip,
    /// Flip the global mute flag
    ToggleMute,
}

/// One running journaling session
pub struct Session<B: AudioBackend, M: MessageSurface> {
    config: SessionConfig,
    profiles: ProfileSet,
    gate: MessageGate,
    selector: TrackSelector,
    engine: CrossfadeEngine<B>,
    surface: M,
    events: EventBus,

    active_vibe: Vibe,
    muted: bool,
    journal: String,

    /// Pending typing-idle classification trigger
    idle_deadline: Option<Instant>,
    /// Pending bubble auto-hide
    bubble_deadline: Option<Instant>,
}

impl<B: AudioBackend, M: MessageSurface> Session<B, M> {
    pub fn new(
        config: SessionConfig,
        profiles: ProfileSet,
        selector: TrackSelector,
        engine: CrossfadeEngine<B>,
        surface: M,
        events: EventBus,
    ) -> Self {
        let gate = MessageGate::new(config.message_cooldown());
        Self {
            config,
            profiles,
            gate,
            selector,
            engine,
            surface,
            events,
            active_vibe: Vibe::Calm,
            muted: false,
            journal: String::new(),
            idle_deadline: None,
            bubble_deadline: None,
        }
    }

    /// Run the session until the command channel closes.
    ///
    /// Starts the soft ambient bed immediately, then loops over commands and
    /// the two timers.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        let bed = self.selector.select(self.active_vibe);
        info!("Starting ambient bed: {}", bed);
        self.surface.set_vibe(self.active_vibe);
        self.engine.begin(bed.clone(), self.config.ambient_bed_level);
        self.events.emit_lossy(SessionEvent::TrackStarted {
            vibe: self.active_vibe,
            track: bed,
            timestamp: chrono::Utc::now(),
        });

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = tokio::time::sleep_until(self.idle_deadline.unwrap_or_else(Instant::now)),
                    if self.idle_deadline.is_some() =>
                {
                    self.idle_deadline = None;
                    self.trigger_classification();
                }
                _ = tokio::time::sleep_until(self.bubble_deadline.unwrap_or_else(Instant::now)),
                    if self.bubble_deadline.is_some() =>
                {
                    self.bubble_deadline = None;
                    self.surface.hide();
                }
            }
        }
        info!("Session command channel closed, shutting down");
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Text(text) => self.handle_text(&text),
            SessionCommand::Skip => self.skip(),
            SessionCommand::ToggleMute => self.toggle_mute(),
        }
    }

    /// Append journal text. Sentence-ending punctuation triggers
    /// classification immediately; otherwise the idle debounce timer is
    /// (re)armed.
    fn handle_text(&mut self, text: &str) {
        self.journal.push_str(text);
        self.journal.push('\n');

        let sentence_end = text
            .trim_end()
            .chars()
            .last()
            .map_or(false, |c| matches!(c, '.' | '?' | '!'));

        if sentence_end {
            self.idle_deadline = None;
            self.trigger_classification();
        } else {
            self.idle_deadline = Some(Instant::now() + self.config.idle_debounce());
        }
    }

    /// Classify the accumulated journal and act on the gate's decision
    fn trigger_classification(&mut self) {
        let result = classify(&self.profiles, &self.journal);
        debug!(
            "Classified vibe={} intensity={:?}",
            result.vibe, result.intensity
        );

        let decision = self
            .gate
            .on_classification(&result, self.active_vibe, Instant::now());

        if decision.vibe_changed {
            self.set_vibe(result.vibe);
        }

        if let Some(message) = decision.message {
            self.surface.show(&message);
            self.events.emit_lossy(SessionEvent::MessageShown {
                text: message,
                timestamp: chrono::Utc::now(),
            });
            self.bubble_deadline = Some(Instant::now() + self.config.message_visible());
        }
    }

    /// Switch the active vibe and crossfade to one of its tracks
    fn set_vibe(&mut self, vibe: Vibe) {
        let old = self.active_vibe;
        self.active_vibe = vibe;
        self.surface.set_vibe(vibe);
        self.events.emit_lossy(SessionEvent::VibeChanged {
            old,
            new: vibe,
            timestamp: chrono::Utc::now(),
        });

        let track = self.selector.select(vibe);
        self.events.emit_lossy(SessionEvent::TrackStarted {
            vibe,
            track: track.clone(),
            timestamp: chrono::Utc::now(),
        });
        // Completion is observable on the event bus; the receiver is not
        // needed here
        let _ = self.engine.start_crossfade(track, self.config.crossfade());
    }

    /// Manual skip: crossfade to a fresh pick within the current vibe.
    /// Rapid skips supersede each other inside the engine.
    fn skip(&mut self) {
        let track = self.selector.select(self.active_vibe);
        info!("Skip: crossfading to {}", track);
        self.events.emit_lossy(SessionEvent::TrackStarted {
            vibe: self.active_vibe,
            track: track.clone(),
            timestamp: chrono::Utc::now(),
        });
        let _ = self.engine.start_crossfade(track, self.config.crossfade());
    }

    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.engine.set_muted(self.muted);
        self.events.emit_lossy(SessionEvent::MuteChanged {
            muted: self.muted,
            timestamp: chrono::Utc::now(),
        });

        let confirmation = if self.muted {
            "Silent mode on."
        } else {
            "Sound on."
        };
        self.surface.show(confirmation);
        self.bubble_deadline = Some(Instant::now() + self.config.status_visible());
    }
}
