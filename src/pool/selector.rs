//! Connection selection.
//!
//! The pool is addressed by slot index; choosing a slot is a uniform random
//! draw so concurrent producers spread over the broker instances without
//! sharing any cursor. The random source is injectable so selection can be
//! made reproducible in tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniformly distributed slot indices.
pub trait IndexPicker: Send {
    /// Returns an index in `0..len`. Only called with `len > 0`.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Production picker using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngPicker;

impl IndexPicker for ThreadRngPicker {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Deterministic picker backed by a seeded ChaCha8 stream.
///
/// Two pickers created with the same seed produce the same sequence.
#[derive(Debug, Clone)]
pub struct SeededPicker {
    rng: ChaCha8Rng,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl IndexPicker for SeededPicker {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

impl<F> IndexPicker for F
where
    F: FnMut(usize) -> usize + Send,
{
    fn pick_index(&mut self, len: usize) -> usize {
        self(len)
    }
}

/// Draws a slot index for a pool of `len` slots.
///
/// Returns `None` for an empty pool. Out-of-range answers from a custom
/// picker are folded back into range.
pub fn pick_slot(picker: &mut dyn IndexPicker, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(picker.pick_index(len) % len)
}
