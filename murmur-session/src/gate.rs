//! Debounce and message gate
//!
//! Decides, given a classification result and recent history, whether the
//! active vibe should change and whether a supportive message may be shown.
//! Messages are rate-limited by a cooldown so they never feel spammy.

use murmur_common::{ClassificationResult, IntensityLevel, Vibe};
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of running a classification result through the gate
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    /// The classified vibe differs from the active one; the caller must
    /// update the active vibe and start a crossfade. This is the only
    /// classification-driven trigger for a track change.
    pub vibe_changed: bool,

    /// Supportive message to show, if the cooldown has elapsed and the text
    /// was intense enough
    pub message: Option<String>,
}

/// Cooldown gate for supportive messages
///
/// The cooldown check and the timestamp update happen in one `&mut self`
/// call, so two triggers arriving in the same scheduling window cannot both
/// pass. Under the single-threaded cooperative model this is sufficient; a
/// multi-threaded port must put a lock around the gate.
pub struct MessageGate {
    cooldown: Duration,
    last_message_at: Option<Instant>,
}

impl MessageGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_message_at: None,
        }
    }

    /// Evaluate a classification result against the active vibe and the
    /// message cooldown.
    ///
    /// The timestamp is updated exactly once, and only when a message is
    /// actually emitted. Low-intensity text never emits, regardless of
    /// cooldown state.
    pub fn on_classification(
        &mut self,
        result: &ClassificationResult,
        active_vibe: Vibe,
        now: Instant,
    ) -> GateDecision {
        let vibe_changed = result.vibe != active_vibe;

        let cooled = self
            .last_message_at
            .map_or(true, |last| now.duration_since(last) > self.cooldown);

        let message = if cooled && result.intensity != IntensityLevel::Low {
            self.last_message_at = Some(now);
            Some(result.message.clone())
        } else {
            None
        };

        GateDecision {
            vibe_changed,
            message,
        }
    }
}
