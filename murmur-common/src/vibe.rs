//! Vibe data model
//!
//! The five ambient moods, their keyword/message/track profiles, and the
//! types produced by classification. Profiles are loaded once at startup
//! (built-in defaults, optionally overridden from the config file) and are
//! read-only for the process lifetime.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five vibes, in canonical order.
///
/// The order matters: the classifier checks profiles in this order and the
/// first keyword match wins. Ambiguous text that mentions several moods
/// resolves to the earliest vibe here; this tie-break is deliberate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vibe {
    Anxious,
    Sad,
    Calm,
    Focused,
    Happy,
}

impl Vibe {
    /// All vibes in canonical (classifier priority) order
    pub const ALL: [Vibe; 5] = [
        Vibe::Anxious,
        Vibe::Sad,
        Vibe::Calm,
        Vibe::Focused,
        Vibe::Happy,
    ];

    /// Lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Anxious => "anxious",
            Vibe::Sad => "sad",
            Vibe::Calm => "calm",
            Vibe::Focused => "focused",
            Vibe::Happy => "happy",
        }
    }

    /// Style tag for UI surfaces (`vibe-anxious`, `vibe-calm`, ...)
    ///
    /// Exactly one tag is active on the root container at a time.
    pub fn tag(&self) -> String {
        format!("vibe-{}", self.as_str())
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anxious" => Ok(Vibe::Anxious),
            "sad" => Ok(Vibe::Sad),
            "calm" => Ok(Vibe::Calm),
            "focused" => Ok(Vibe::Focused),
            "happy" => Ok(Vibe::Happy),
            other => Err(Error::Config(format!("Unknown vibe: {}", other))),
        }
    }
}

/// Text-shape intensity estimate, used to gate supportive messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

/// Output of a single classification call (not persisted)
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub vibe: Vibe,
    pub message: String,
    pub intensity: IntensityLevel,
}

/// Identifier for a playable audio resource (path relative to the sounds root)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        TrackId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-vibe profile: keywords that select it, one supportive message, and a
/// non-empty pool of ambient tracks to shuffle between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeProfile {
    pub vibe: Vibe,
    pub keywords: Vec<String>,
    pub message: String,
    pub tracks: Vec<TrackId>,
}

/// The complete, ordered set of vibe profiles.
///
/// Always holds exactly one profile per vibe, in canonical order.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: Vec<VibeProfile>,
}

/// Fallback message returned when no keyword matches
pub const FALLBACK_MESSAGE: &str = "You\u{2019}re doing fine. Keep writing.";

impl ProfileSet {
    /// Built-in default profile set (five vibes, two tracks each)
    pub fn builtin() -> Self {
        let profiles = vec![
            VibeProfile {
                vibe: Vibe::Anxious,
                keywords: str_vec(&[
                    "worried", "nervous", "scared", "panic", "pressure", "overthink",
                    "anxious", "stressed", "overwhelmed", "tense", "fear", "uneasy",
                ]),
                message: "You\u{2019}re allowed to feel overwhelmed. Let\u{2019}s slow down together for a moment.".to_string(),
                tracks: track_vec(&["sounds/anxious_1.wav", "sounds/anxious_2.wav"]),
            },
            VibeProfile {
                vibe: Vibe::Sad,
                keywords: str_vec(&[
                    "sad", "lonely", "cry", "hurt", "empty", "down", "depressed",
                    "heartbroken", "blue", "upset", "drained",
                ]),
                message: "Your feelings make sense. You don\u{2019}t have to hold them alone right now.".to_string(),
                tracks: track_vec(&["sounds/sad_1.wav", "sounds/sad_2.wav"]),
            },
            VibeProfile {
                vibe: Vibe::Calm,
                keywords: str_vec(&[
                    "peace", "quiet", "soft", "relaxed", "present", "grounded",
                    "breathe", "still", "ease", "gentle", "soothed", "centered",
                ]),
                message: "There\u{2019}s a gentle ease in your words. Stay close to this softness.".to_string(),
                tracks: track_vec(&["sounds/calm_1.wav", "sounds/calm_2.wav"]),
            },
            VibeProfile {
                vibe: Vibe::Focused,
                keywords: str_vec(&[
                    "work", "goal", "build", "progress", "learning", "improving",
                    "studying", "creating", "organize", "plan", "focus", "clarity",
                ]),
                message: "You\u{2019}re organizing your thoughts beautifully. Keep your pace; you\u{2019}re doing fine.".to_string(),
                tracks: track_vec(&["sounds/focused_1.wav", "sounds/focused_2.wav"]),
            },
            VibeProfile {
                vibe: Vibe::Happy,
                keywords: str_vec(&[
                    "happy", "joy", "excited", "grateful", "love", "content",
                    "smile", "glowing", "bright", "delighted", "cheerful",
                ]),
                message: "It\u{2019}s warm to see this light in your words. Let it linger.".to_string(),
                tracks: track_vec(&["sounds/happy_1.wav", "sounds/happy_2.wav"]),
            },
        ];
        ProfileSet { profiles }
    }

    /// Build a profile set from explicit profiles (e.g. the config file).
    ///
    /// Profiles may arrive in any order; they are re-sorted into canonical
    /// order. Validation is the caller's next step.
    pub fn from_profiles(mut profiles: Vec<VibeProfile>) -> Result<Self> {
        for vibe in Vibe::ALL {
            let count = profiles.iter().filter(|p| p.vibe == vibe).count();
            if count == 0 {
                return Err(Error::Config(format!("Missing profile for vibe '{}'", vibe)));
            }
            if count > 1 {
                return Err(Error::Config(format!(
                    "Duplicate profile for vibe '{}'",
                    vibe
                )));
            }
        }
        profiles.sort_by_key(|p| Vibe::ALL.iter().position(|v| *v == p.vibe));
        // Keywords are matched against lowercased text; normalize here so
        // config-supplied profiles behave like the built-in set
        for profile in &mut profiles {
            for keyword in &mut profile.keywords {
                *keyword = keyword.to_lowercase();
            }
        }
        Ok(ProfileSet { profiles })
    }

    /// Startup validation: every vibe must have a non-empty track pool and at
    /// least one keyword.
    ///
    /// Runs once before the session starts so an empty pool can never turn a
    /// later track selection into a silent no-op crossfade.
    pub fn validate(&self) -> Result<()> {
        for profile in &self.profiles {
            if profile.tracks.is_empty() {
                return Err(Error::Config(format!(
                    "Vibe '{}' has an empty track pool",
                    profile.vibe
                )));
            }
            if profile.keywords.is_empty() {
                return Err(Error::Config(format!(
                    "Vibe '{}' has no keywords",
                    profile.vibe
                )));
            }
        }
        Ok(())
    }

    /// Profile for a vibe
    pub fn get(&self, vibe: Vibe) -> &VibeProfile {
        // Canonical order is enforced by construction
        &self.profiles[Vibe::ALL.iter().position(|v| *v == vibe).unwrap_or(0)]
    }

    /// Profiles in canonical (classifier priority) order
    pub fn iter(&self) -> impl Iterator<Item = &VibeProfile> {
        self.profiles.iter()
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn track_vec(items: &[&str]) -> Vec<TrackId> {
    items.iter().map(|s| TrackId::new(*s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_is_valid() {
        let set = ProfileSet::builtin();
        assert!(set.validate().is_ok());
    }

    #[test]
    fn builtin_set_has_two_tracks_per_vibe() {
        let set = ProfileSet::builtin();
        for vibe in Vibe::ALL {
            assert_eq!(set.get(vibe).tracks.len(), 2, "vibe {}", vibe);
        }
    }

    #[test]
    fn canonical_order_matches_all() {
        let set = ProfileSet::builtin();
        let order: Vec<Vibe> = set.iter().map(|p| p.vibe).collect();
        assert_eq!(order, Vibe::ALL.to_vec());
    }

    #[test]
    fn from_profiles_rejects_missing_vibe() {
        let mut profiles: Vec<VibeProfile> =
            ProfileSet::builtin().iter().cloned().collect();
        profiles.retain(|p| p.vibe != Vibe::Focused);

        let err = ProfileSet::from_profiles(profiles).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn from_profiles_restores_canonical_order() {
        let mut profiles: Vec<VibeProfile> =
            ProfileSet::builtin().iter().cloned().collect();
        profiles.reverse();

        let set = ProfileSet::from_profiles(profiles).unwrap();
        let order: Vec<Vibe> = set.iter().map(|p| p.vibe).collect();
        assert_eq!(order, Vibe::ALL.to_vec());
    }

    #[test]
    fn validate_rejects_empty_track_pool() {
        let mut profiles: Vec<VibeProfile> =
            ProfileSet::builtin().iter().cloned().collect();
        profiles[2].tracks.clear();

        let set = ProfileSet::from_profiles(profiles).unwrap();
        let err = set.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn vibe_round_trips_through_str() {
        for vibe in Vibe::ALL {
            assert_eq!(vibe.as_str().parse::<Vibe>().unwrap(), vibe);
        }
    }

    #[test]
    fn vibe_tag_format() {
        assert_eq!(Vibe::Anxious.tag(), "vibe-anxious");
        assert_eq!(Vibe::Calm.tag(), "vibe-calm");
    }
}
