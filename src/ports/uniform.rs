//! Uniform source port - IID draws from the open unit interval

use rand::{Rng, distr::Open01};

/// Source of IID uniform variates on the open interval `(0, 1)`.
///
/// Seeding and resetting are the source's business; the engine only draws.
/// Every [`rand::Rng`] is a uniform source, so seeded generators such as
/// `StdRng::seed_from_u64(42)` give reproducible sample sequences.
pub trait UniformSource {
    /// Draw one value in `(0, 1)`, both end points excluded.
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.sample(Open01)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_open_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let u = rng.next_uniform();
            assert!(u > 0.0 && u < 1.0, "uniform out of range: {u}");
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = StdRng::seed_from_u64(12345);
        let mut b = StdRng::seed_from_u64(12345);
        for _ in 0..100 {
            assert_eq!(a.next_uniform().to_bits(), b.next_uniform().to_bits());
        }
    }

    #[test]
    fn test_trait_object_source() {
        let mut rng = StdRng::seed_from_u64(1);
        let source: &mut dyn rand::RngCore = &mut rng;
        let u = source.next_uniform();
        assert!(u > 0.0 && u < 1.0);
    }
}
