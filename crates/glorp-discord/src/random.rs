//! Injectable randomness for greetings, reply picks, and presence rotation.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// Uniform in `[0, 1)`.
    fn roll(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// OS-seeded generator used in production.
pub struct SystemRandom {
    rng: Mutex<StdRng>,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn roll(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random::<f64>()
    }

    fn pick(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..len)
    }
}

/// Pick one entry of a non-empty static table.
pub fn choose<'a>(random: &dyn RandomSource, items: &[&'a str]) -> &'a str {
    items[random.pick(items.len()).min(items.len() - 1)]
}

#[cfg(test)]
pub(crate) mod fixed {
    use super::RandomSource;

    /// Always rolls `roll` and picks `index` (clamped to the table).
    pub struct FixedRandom {
        pub roll: f64,
        pub index: usize,
    }

    impl FixedRandom {
        /// Never triggers probabilistic rules; picks the first entry.
        pub fn quiet() -> Self {
            Self {
                roll: 0.99,
                index: 0,
            }
        }
    }

    impl RandomSource for FixedRandom {
        fn roll(&self) -> f64 {
            self.roll
        }

        fn pick(&self, len: usize) -> usize {
            self.index.min(len.saturating_sub(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_source_stays_in_range() {
        let random = SystemRandom::new();
        for _ in 0..200 {
            let r = random.roll();
            assert!((0.0..1.0).contains(&r));
            assert!(random.pick(3) < 3);
        }
    }

    #[test]
    fn choose_uses_picked_index() {
        let random = fixed::FixedRandom {
            roll: 0.0,
            index: 1,
        };
        assert_eq!(choose(&random, &["a", "b", "c"]), "b");
    }
}
