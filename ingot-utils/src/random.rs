//! Deterministic Xoroshiro128++ random source.

// Ratios used in the mix functions
const GOLDEN_RATIO_64: u64 = 0x9E37_79B9_7F4A_7C15;
const SILVER_RATIO_64: u64 = 0x6A09_E667_F3BC_C909;

/// Xoroshiro128++ seeded the same way as the game's `RandomSupport`.
#[derive(Debug, Clone)]
pub struct Xoroshiro {
    seed_lo: u64,
    seed_hi: u64,
}

impl Xoroshiro {
    /// Creates a random source from a 64 bit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let (lo, hi) = Self::upgrade_seed_to_128_bit(seed);
        Self::new(mix_stafford_13(lo), mix_stafford_13(hi))
    }

    fn new(lo: u64, hi: u64) -> Self {
        let (lo, hi) = if (lo | hi) == 0 {
            (GOLDEN_RATIO_64, SILVER_RATIO_64)
        } else {
            (lo, hi)
        };
        Self {
            seed_lo: lo,
            seed_hi: hi,
        }
    }

    fn upgrade_seed_to_128_bit(seed: u64) -> (u64, u64) {
        let lo = seed ^ SILVER_RATIO_64;
        let hi = lo.wrapping_add(GOLDEN_RATIO_64);
        (lo, hi)
    }

    fn next(&mut self, bits: u64) -> u64 {
        self.next_random() >> (64 - bits)
    }

    /// The next raw 64 bit output.
    pub fn next_random(&mut self) -> u64 {
        let l = self.seed_lo;
        let m = self.seed_hi;
        let n = l.wrapping_add(m).rotate_left(17).wrapping_add(l);
        let m = m ^ l;
        self.seed_lo = l.rotate_left(49) ^ m ^ (m << 21);
        self.seed_hi = m.rotate_left(28);
        n
    }

    /// The next 32 bit integer.
    pub fn next_i32(&mut self) -> i32 {
        self.next_random() as i32
    }

    /// A uniformly distributed integer in `0..bound`. `bound` must be positive.
    pub fn next_i32_bounded(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0, "bound must be positive");
        let mut l = (self.next_i32() as u64) & 0xFFFF_FFFF;
        let mut m = l.wrapping_mul(bound as u64);
        let mut n = m & 0xFFFF_FFFF;
        if n < bound as u64 {
            let i = ((!bound).wrapping_add(1) as u64) % (bound as u64);
            while n < i {
                l = (self.next_i32() as u64) & 0xFFFF_FFFF;
                m = l.wrapping_mul(bound as u64);
                n = m & 0xFFFF_FFFF;
            }
        }
        (m >> 32) as i32
    }

    /// A float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.next(24) as f32 * 5.960_464_5e-8
    }

    /// A double in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next(53) as f64 * 1.110_223e-16
    }

    /// A random boolean.
    pub fn next_bool(&mut self) -> bool {
        (self.next_random() & 1) != 0
    }

    /// A triangular distribution around `center`.
    pub fn triangle(&mut self, center: f64, spread: f64) -> f64 {
        center + spread * (self.next_f64() - self.next_f64())
    }
}

fn mix_stafford_13(z: u64) -> u64 {
    let z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let mut a = Xoroshiro::from_seed(42);
        let mut b = Xoroshiro::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_random(), b.next_random());
        }
    }

    #[test]
    fn test_bounded_in_range() {
        let mut random = Xoroshiro::from_seed(7);
        for bound in 1..40 {
            let value = random.next_i32_bounded(bound);
            assert!((0..bound).contains(&value));
        }
    }

    #[test]
    fn test_unit_floats() {
        let mut random = Xoroshiro::from_seed(0);
        for _ in 0..100 {
            let f = random.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
    }
}
