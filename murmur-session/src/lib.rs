//! # Murmur Session Library
//!
//! Core of the ambient journaling companion: vibe classification over
//! free-text input, a cooldown-gated supportive message channel, and the
//! crossfade engine that keeps exactly one ambient track audible through
//! vibe changes, manual skips, and mute toggles.

pub mod audio;
pub mod classifier;
pub mod engine;
pub mod gate;
pub mod selector;
pub mod session;
pub mod surface;

pub use engine::CrossfadeEngine;
pub use session::{Session, SessionCommand};
