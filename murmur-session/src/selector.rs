//! Track selection
//!
//! Uniform-random pick from a vibe's track pool. The RNG is seedable so
//! shuffle order is reproducible in tests and via the `--seed` flag.

use murmur_common::{ProfileSet, Result, TrackId, Vibe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random track selector over the loaded profile set
pub struct TrackSelector {
    profiles: ProfileSet,
    rng: StdRng,
}

impl TrackSelector {
    /// Build a selector, validating every pool up front.
    ///
    /// An empty track pool is a fatal `Error::Config` here, at startup, so
    /// selection itself can never turn into a silent no-op crossfade.
    pub fn new(profiles: ProfileSet, seed: Option<u64>) -> Result<Self> {
        profiles.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { profiles, rng })
    }

    /// Uniform-random track from the vibe's pool.
    ///
    /// Pools are non-empty by construction (validated in `new`).
    pub fn select(&mut self, vibe: Vibe) -> TrackId {
        let pool = &self.profiles.get(vibe).tracks;
        pool[self.rng.gen_range(0..pool.len())].clone()
    }
}
