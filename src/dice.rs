//! Tabletop-style random helpers shared by every generation pass.

use rand::Rng;

/// Inclusive-range rolls, "one in N" checks and dice sums on top of any [`Rng`].
pub trait Dice: Rng {
    /// Uniform integer in `lo..=hi`. A reversed or empty range yields `lo`.
    fn roll(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            lo
        } else {
            self.gen_range(lo..=hi)
        }
    }

    /// True with probability `1/n`; always true for `n <= 1`.
    fn one_in(&mut self, n: i32) -> bool {
        n <= 1 || self.gen_range(0..n) == 0
    }

    /// Sum of `count` rolls of a `sides`-sided die.
    fn dice(&mut self, count: i32, sides: i32) -> i32 {
        (0..count.max(0)).map(|_| self.roll(1, sides.max(1))).sum()
    }

    /// Uniform index into a collection of `len` items.
    fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.gen_range(0..len))
        }
    }
}

impl<R: Rng + ?Sized> Dice for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = rng.roll(-2, 2);
            assert!((-2..=2).contains(&v));
        }
        assert_eq!(rng.roll(5, 3), 5);
    }

    #[test]
    fn test_dice_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..1000 {
            let v = rng.dice(3, 4);
            assert!((3..=12).contains(&v));
        }
        assert_eq!(rng.dice(0, 6), 0);
    }

    #[test]
    fn test_one_in_degenerate() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(rng.one_in(1));
        assert!(rng.one_in(0));
        assert_eq!(rng.index(0), None);
    }
}
