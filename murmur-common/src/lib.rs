//! # Murmur Common Library
//!
//! Shared code for the Murmur ambient journaling companion:
//! - Error types
//! - Event types (SessionEvent enum) and the EventBus
//! - Runtime configuration loading
//! - Vibe data model (profiles, classification result types)

pub mod config;
pub mod error;
pub mod events;
pub mod vibe;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use vibe::{ClassificationResult, IntensityLevel, ProfileSet, TrackId, Vibe, VibeProfile};
