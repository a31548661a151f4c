//! Event types for the Murmur session
//!
//! # Architecture
//!
//! Murmur uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting for
//!   observability surfaces and tests
//! - **Command channels** (tokio::mpsc): user commands → session controller
//! - **Shared state** (Arc<Mutex<T>>): the crossfade engine's playback state
//!
//! Events are notifications, not control flow: the session never waits on
//! its own events, and a bus with no subscribers is fine.

use crate::vibe::{TrackId, Vibe};
use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted by the session as it reacts to journal input
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Active vibe changed (the only trigger for a classification-driven
    /// crossfade)
    VibeChanged {
        old: Vibe,
        new: Vibe,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track began playing (ambient bed at startup, or an incoming
    /// crossfade source)
    TrackStarted {
        vibe: Vibe,
        track: TrackId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A crossfade ramp started toward the given track
    CrossfadeStarted {
        track: TrackId,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A crossfade ramp ran to completion; the track is now the sole live
    /// source. A superseded fade never emits this.
    CrossfadeCompleted {
        track: TrackId,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A supportive message passed the cooldown gate and was shown
    MessageShown {
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Global mute flag flipped
    MuteChanged {
        muted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast event bus for session events
///
/// Thin wrapper over tokio::broadcast:
/// - Non-blocking publish (slow subscribers don't block the session)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscribers case
    pub fn emit_lossy(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!("No subscribers for event: {:?}", e.0);
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
