//! Seed management for zone generation
//!
//! Every subsystem that needs randomness draws from its own stream, derived
//! from the world seed, the zone id and a purpose tag. Streams never share
//! state, so adding draws to one (say, loot) cannot shift another (terrain).

use std::fmt;

use rand::RngCore;

/// Fallback state for seeds that hash to zero.
const ZERO_SEED_REPLACEMENT: u32 = 0x9E37_79B9;

/// Hash a string seed into a nonzero 32-bit state (rolling polynomial, base 31).
///
/// The hash runs over UTF-16 code units, so a character outside the Basic
/// Multilingual Plane contributes both halves of its surrogate pair.
pub fn hash_seed(seed: &str) -> u32 {
    let hash = seed
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    if hash == 0 {
        ZERO_SEED_REPLACEMENT
    } else {
        hash
    }
}

/// Deterministic pseudo-random stream keyed by a string seed.
///
/// The same seed string always yields the same sequence. The generator is a
/// small 32-bit mixing function (mulberry32), cheap enough to be created per
/// zone and per purpose. Ranges, coin flips and shuffles go through
/// [`rand::Rng`] and [`rand::seq::SliceRandom`] on top of the `RngCore` impl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: &str) -> Self {
        Self::from_state(hash_seed(seed))
    }

    pub fn from_state(state: u32) -> Self {
        Self {
            state: if state == 0 { ZERO_SEED_REPLACEMENT } else { state },
        }
    }

    fn mix(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.mix()) / 4_294_967_296.0
    }

    /// Weighted selection: one draw scaled by the total weight, subtracted
    /// cumulatively; the first entry that brings the remainder to `<= 0` wins.
    /// Zero (or negative) total weight falls back to the first entry.
    pub fn weighted_pick<'a, T>(
        &mut self,
        entries: &'a [T],
        weight: impl Fn(&T) -> f64,
    ) -> Option<&'a T> {
        let first = entries.first()?;
        let total: f64 = entries.iter().map(|e| weight(e).max(0.0)).sum();
        if total <= 0.0 {
            return Some(first);
        }

        let mut remainder = self.next_f64() * total;
        for entry in entries {
            remainder -= weight(entry).max(0.0);
            if remainder <= 0.0 {
                return Some(entry);
            }
        }
        entries.last()
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.mix()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.mix());
        let lo = u64::from(self.mix());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.mix().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// What a derived stream is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeedPurpose {
    /// Cellular-automata terrain synthesis
    Terrain,
    /// Content population
    Loot,
    /// Quality tiers rolled on first harvest
    Quality,
    /// Tie-breaking during exploration
    Explore,
}

impl SeedPurpose {
    pub fn tag(&self) -> &'static str {
        match self {
            SeedPurpose::Terrain => "terrain",
            SeedPurpose::Loot => "loot",
            SeedPurpose::Quality => "quality",
            SeedPurpose::Explore => "explore",
        }
    }
}

/// Seeds for all per-zone random streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSeeds {
    /// World-tile seed the zone belongs to
    pub world: String,
    /// Zone identifier
    pub zone_id: String,
}

impl ZoneSeeds {
    pub fn new(world: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            zone_id: zone_id.into(),
        }
    }

    /// Seed string for a purpose: world seed, zone id and tag concatenated.
    pub fn seed_string(&self, purpose: SeedPurpose) -> String {
        format!("{}:{}:{}", self.world, self.zone_id, purpose.tag())
    }

    /// Fresh stream for a purpose.
    pub fn rng(&self, purpose: SeedPurpose) -> SeededRng {
        SeededRng::new(&self.seed_string(purpose))
    }

    /// Stream keyed by an additional discriminator (e.g. an instance id).
    pub fn rng_for(&self, purpose: SeedPurpose, key: &str) -> SeededRng {
        SeededRng::new(&format!("{}:{}", self.seed_string(purpose), key))
    }
}

impl fmt::Display for ZoneSeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneSeeds {{ world: {}, zone: {} }}", self.world, self.zone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRng::new("abc");
        let mut b = SeededRng::new("abc");
        for _ in 0..500 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_floats_in_unit_interval() {
        let mut rng = SeededRng::new("bounds");
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_hash_is_nonzero() {
        assert_ne!(hash_seed(""), 0);
        assert_ne!(hash_seed("abc"), 0);
        // 31 * 'a' + ... is a plain rolling hash
        assert_eq!(hash_seed("a"), 'a' as u32);
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        // U+1F600 is the surrogate pair D83D DE00
        assert_eq!(hash_seed("\u{1F600}"), 0xD83D * 31 + 0xDE00);
        assert_eq!(hash_seed("\u{e9}"), 0xE9);
    }

    #[test]
    fn test_purposes_get_different_streams() {
        let seeds = ZoneSeeds::new("world-7", "cave_1");
        let mut terrain = seeds.rng(SeedPurpose::Terrain);
        let mut loot = seeds.rng(SeedPurpose::Loot);
        let t: Vec<u32> = (0..8).map(|_| terrain.next_u32()).collect();
        let l: Vec<u32> = (0..8).map(|_| loot.next_u32()).collect();
        assert_ne!(t, l);
    }

    #[test]
    fn test_weighted_pick_zero_total_falls_back_to_first() {
        let mut rng = SeededRng::new("w");
        let entries = [("a", 0.0), ("b", 0.0)];
        let picked = rng.weighted_pick(&entries, |e| e.1).unwrap();
        assert_eq!(picked.0, "a");
    }

    #[test]
    fn test_weighted_pick_never_returns_zero_weight_entry() {
        let mut rng = SeededRng::new("w2");
        let entries = [("never", 0.0), ("always", 5.0)];
        for _ in 0..200 {
            assert_eq!(rng.weighted_pick(&entries, |e| e.1).unwrap().0, "always");
        }
        let empty: [(&str, f64); 0] = [];
        assert!(rng.weighted_pick(&empty, |e| e.1).is_none());
    }

    #[test]
    fn test_gen_range_bounds() {
        let mut rng = SeededRng::new("range");
        for _ in 0..1000 {
            let v = rng.gen_range(3..=6usize);
            assert!((3..=6).contains(&v));
        }
        assert_eq!(rng.gen_range(4..=4usize), 4);
    }

    #[test]
    fn test_same_seed_same_shuffle() {
        let mut a: Vec<u32> = (0..32).collect();
        let mut b = a.clone();
        a.shuffle(&mut SeededRng::new("order"));
        b.shuffle(&mut SeededRng::new("order"));
        assert_eq!(a, b);
        assert_ne!(a, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_preserves_elements() {
        let mut rng = SeededRng::new("shuffle");
        let mut items: Vec<u32> = (0..20).collect();
        items.shuffle(&mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
