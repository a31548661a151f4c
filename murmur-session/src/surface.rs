//! Output surfaces
//!
//! The session presents two things: the active vibe (a single
//! mutually-exclusive style tag on the root container) and a supportive
//! message bubble that fades in, lingers, then hides. Both sit behind a
//! trait so tests can record what was shown.

use murmur_common::Vibe;

/// Where vibe state and supportive messages are rendered
pub trait MessageSurface: Send + 'static {
    /// Replace the root container's vibe tag (`vibe-anxious`, `vibe-calm`, ...)
    fn set_vibe(&mut self, vibe: Vibe);

    /// Show a message; replaces any message currently visible
    fn show(&mut self, text: &str);

    /// Hide the currently visible message (bubble auto-hide timer)
    fn hide(&mut self);
}

/// Terminal rendering of the surface
///
/// A scrolling terminal has no real "hide", so hiding is a no-op; messages
/// simply scroll away.
#[derive(Default)]
pub struct TerminalSurface;

impl TerminalSurface {
    pub fn new() -> Self {
        Self
    }
}

impl MessageSurface for TerminalSurface {
    fn set_vibe(&mut self, vibe: Vibe) {
        println!("  ~ {} ~", vibe.tag());
    }

    fn show(&mut self, text: &str) {
        println!("  {}", text);
    }

    fn hide(&mut self) {}
}
