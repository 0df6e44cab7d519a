//! Process-global hash perturbation.
//!
//! Every value's `hash` vtable entry incorporates a per-process "hash oracle": a
//! 32-bit seed plus a 16384-entry random table, generated once from OS entropy at
//! process start and never changed thereafter. This discourages external code
//! from relying on hash order being stable across runs, while leaving hashes
//! stable *within* a single process (required by the dictionary implementations
//! the object model sits on top of).
//!
//! Grounded on the same `rand_chacha`-seeded-once-per-process shape the teacher
//! crate uses for its own deterministic-but-unpredictable identifiers.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;

const TABLE_SIZE: usize = 16384;

/// A process-wide hash perturbation source.
///
/// `seed` is mixed into every kind's hash computation; `table` is indexed by the
/// low bits of a raw hash to add a second, less predictable perturbation. Neither
/// field is ever read by anything outside [`HashOracle::perturb`].
pub struct HashOracle {
    seed: u64,
    table: Box<[u64; TABLE_SIZE]>,
}

impl HashOracle {
    /// Generates a fresh oracle from OS entropy.
    ///
    /// Called exactly once per process, during `Engine::new`.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = ChaCha12Rng::from_entropy();
        let seed = rng.next_u64();
        let mut table = Box::new([0u64; TABLE_SIZE]);
        for slot in table.iter_mut() {
            *slot = rng.next_u64();
        }
        Self { seed, table }
    }

    /// For tests that need reproducible hash sequences rather than OS entropy.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut table = Box::new([0u64; TABLE_SIZE]);
        for slot in table.iter_mut() {
            *slot = rng.next_u64();
        }
        Self { seed, table }
    }

    /// Perturbs a raw, deterministic hash of a value's payload.
    ///
    /// `raw` should already be equal for any two values the vtable's
    /// `compareEqual` considers equal (including boxed/unboxed pairs of the same
    /// scalar) — perturbation happens after that invariant is established, not
    /// before.
    #[must_use]
    pub fn perturb(&self, raw: u64) -> u64 {
        let table_index = (raw as usize) % TABLE_SIZE;
        raw.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ self.seed
            ^ self.table[table_index]
    }
}

impl Default for HashOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_oracle_is_deterministic_for_equal_inputs() {
        let oracle = HashOracle::from_seed(42);
        assert_eq!(oracle.perturb(7), oracle.perturb(7));
    }

    #[test]
    fn distinct_seeds_usually_disagree() {
        let a = HashOracle::from_seed(1);
        let b = HashOracle::from_seed(2);
        assert_ne!(a.perturb(123), b.perturb(123));
    }
}
