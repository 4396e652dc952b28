use rand::rngs::StdRng;
use rand::Rng as _;

/// Randomness consumed by the ghost tie-breaks and the autopilot.
pub trait RandomSource {
    /// Uniform index in `0..len`; 0 when `len <= 1`.
    fn pick_index(&mut self, len: usize) -> usize;

    fn coin_flip(&mut self) -> bool {
        self.pick_index(2) == 0
    }
}

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }
}

impl RandomSource for Rng {
    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    fn coin_flip(&mut self) -> bool {
        self.bool(0.5)
    }
}

impl RandomSource for StdRng {
    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.random_range(0..len)
    }

    fn coin_flip(&mut self) -> bool {
        self.random_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn same_seed_repeats_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut rng = Rng::new(7);
        let mut std_rng = StdRng::seed_from_u64(7);
        for len in 0..12usize {
            for _ in 0..50 {
                let idx = rng.pick_index(len);
                let std_idx = std_rng.pick_index(len);
                assert!(idx < len.max(1));
                assert!(std_idx < len.max(1));
            }
        }
    }

    #[test]
    fn coin_flip_produces_both_sides() {
        let mut rng = Rng::new(11);
        let flips: Vec<bool> = (0..100).map(|_| rng.coin_flip()).collect();
        assert!(flips.iter().any(|f| *f));
        assert!(flips.iter().any(|f| !*f));
    }
}
