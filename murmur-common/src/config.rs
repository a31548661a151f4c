//! Configuration loading
//!
//! All tunables live in [`SessionConfig`] with compiled defaults matching the
//! shipped profile set. An optional TOML file overrides individual values and
//! may replace the vibe profile set wholesale. Loading happens once at
//! startup; the resulting values are read-only afterwards.

use crate::vibe::{ProfileSet, VibeProfile};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Runtime tunables for a session
///
/// Durations are stored in milliseconds to match the TOML surface; accessor
/// methods hand out `Duration` for the timer-driven code paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Minimum gap between supportive messages
    pub message_cooldown_ms: u64,

    /// Typing-idle period after which classification runs without a
    /// sentence-ending keystroke
    pub idle_debounce_ms: u64,

    /// Default crossfade duration
    pub crossfade_ms: u64,

    /// Volume ramp tick size
    pub fade_tick_ms: u64,

    /// Ambient-mix ceiling for the incoming track, deliberately below full
    /// scale
    pub fade_ceiling: f32,

    /// Volume of the soft ambient bed started at launch
    pub ambient_bed_level: f32,

    /// How long a supportive message stays visible
    pub message_visible_ms: u64,

    /// How long a mute-toggle confirmation stays visible
    pub status_visible_ms: u64,

    /// Event bus channel capacity
    pub event_bus_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            message_cooldown_ms: 24_000,
            idle_debounce_ms: 2_000,
            crossfade_ms: 3_200,
            fade_tick_ms: 50,
            fade_ceiling: 0.8,
            ambient_bed_level: 0.12,
            message_visible_ms: 6_000,
            status_visible_ms: 2_000,
            event_bus_capacity: 100,
        }
    }
}

impl SessionConfig {
    pub fn message_cooldown(&self) -> Duration {
        Duration::from_millis(self.message_cooldown_ms)
    }

    pub fn idle_debounce(&self) -> Duration {
        Duration::from_millis(self.idle_debounce_ms)
    }

    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    pub fn fade_tick(&self) -> Duration {
        Duration::from_millis(self.fade_tick_ms)
    }

    pub fn message_visible(&self) -> Duration {
        Duration::from_millis(self.message_visible_ms)
    }

    pub fn status_visible(&self) -> Duration {
        Duration::from_millis(self.status_visible_ms)
    }

    /// Validate value ranges; fatal at startup
    pub fn validate(&self) -> Result<()> {
        if self.fade_tick_ms == 0 {
            return Err(Error::Config("fade_tick_ms must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.fade_ceiling) || self.fade_ceiling == 0.0 {
            return Err(Error::Config(format!(
                "fade_ceiling must be in (0.0, 1.0], got {}",
                self.fade_ceiling
            )));
        }
        if !(0.0..=1.0).contains(&self.ambient_bed_level) {
            return Err(Error::Config(format!(
                "ambient_bed_level must be in [0.0, 1.0], got {}",
                self.ambient_bed_level
            )));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be > 0".to_string()));
        }
        Ok(())
    }
}

/// On-disk configuration file shape
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    session: SessionConfig,

    /// Optional full replacement for the built-in vibe profiles
    #[serde(default)]
    profiles: Vec<VibeProfile>,
}

/// Load configuration and profiles
///
/// With no file, returns compiled defaults and the built-in profile set.
/// With a file, `[session]` keys override defaults individually and a
/// non-empty `[[profiles]]` list replaces the built-in set. Both results are
/// validated; any violation is a fatal `Error::Config`.
pub fn load(path: Option<&Path>) -> Result<(SessionConfig, ProfileSet)> {
    let (config, profiles) = match path {
        None => (SessionConfig::default(), ProfileSet::builtin()),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
                Error::Config(format!("Invalid config file {}: {}", path.display(), e))
            })?;
            let profiles = if file.profiles.is_empty() {
                ProfileSet::builtin()
            } else {
                ProfileSet::from_profiles(file.profiles)?
            };
            (file.session, profiles)
        }
    };

    config.validate()?;
    profiles.validate()?;
    Ok((config, profiles))
}
