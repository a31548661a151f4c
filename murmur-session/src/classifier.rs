//! Vibe classification
//!
//! Pure functions over journal text: keyword-based vibe matching and a
//! text-shape intensity estimate. No side effects, no failure modes; empty
//! text falls back to calm at low intensity.

use murmur_common::vibe::FALLBACK_MESSAGE;
use murmur_common::{ClassificationResult, IntensityLevel, ProfileSet, Vibe};

/// Classify journal text into a (vibe, message, intensity) triple.
///
/// Matching is case-insensitive substring search, checked against profiles in
/// canonical vibe order; the first profile with any matching keyword wins.
/// Longer inputs may match several vibes, so the fixed order is the
/// tie-break. No match returns the calm fallback.
pub fn classify(profiles: &ProfileSet, text: &str) -> ClassificationResult {
    let lowered = text.to_lowercase();
    let intensity = estimate_intensity(text);

    for profile in profiles.iter() {
        if profile.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            return ClassificationResult {
                vibe: profile.vibe,
                message: profile.message.clone(),
                intensity,
            };
        }
    }

    ClassificationResult {
        vibe: Vibe::Calm,
        message: FALLBACK_MESSAGE.to_string(),
        intensity,
    }
}

/// Estimate intensity from text shape alone.
///
/// score = min(len, 600)/600 + 0.5 * exclamation_count + 0.4 * caps_runs,
/// where caps_runs counts maximal runs of 3+ consecutive ASCII uppercase
/// letters. high > 1.2, medium > 0.5, else low.
pub fn estimate_intensity(text: &str) -> IntensityLevel {
    let len = text.chars().count().min(600) as f32;
    let exclamations = text.chars().filter(|c| *c == '!').count() as f32;
    let caps = caps_runs(text) as f32;

    let score = len / 600.0 + exclamations * 0.5 + caps * 0.4;
    if score > 1.2 {
        IntensityLevel::High
    } else if score > 0.5 {
        IntensityLevel::Medium
    } else {
        IntensityLevel::Low
    }
}

/// Count maximal runs of 3 or more consecutive ASCII uppercase letters
fn caps_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut run_len = 0;
    for c in text.chars() {
        if c.is_ascii_uppercase() {
            run_len += 1;
            if run_len == 3 {
                runs += 1;
            }
        } else {
            run_len = 0;
        }
    }
    runs
}
