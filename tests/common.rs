//! Common test utilities for the tdrgen test suite.
//!
//! This module provides reference densities and seeded generators used
//! across multiple tests.

#![allow(dead_code)]

use rand::{SeedableRng, rngs::StdRng};
use tdrgen::{FnDensity, NullObserver, Tdr, TdrConfig};

/// Boxed closure used for densities in tests.
pub type DynFn = Box<dyn Fn(f64) -> f64 + Send>;

/// Density built from boxed closures.
pub type TestDensity = FnDensity<DynFn, DynFn>;

/// Unnormalized standard normal density `exp(-x^2/2)`.
pub fn normal() -> TestDensity {
    FnDensity::<DynFn, DynFn>::new(
        Box::new(|x: f64| (-0.5 * x * x).exp()),
        Box::new(|x: f64| -x * (-0.5 * x * x).exp()),
    )
}

/// Standard exponential density on `[0, inf)`.
pub fn exponential() -> TestDensity {
    FnDensity::<DynFn, DynFn>::new(
        Box::new(|x: f64| if x < 0.0 { 0.0 } else { (-x).exp() }),
        Box::new(|x: f64| if x < 0.0 { 0.0 } else { -(-x).exp() }),
    )
    .with_support(0.0, f64::INFINITY)
}

/// Unnormalized Cauchy density `1 / (1 + x^2)`; T-concave for `c <= -1/2`
/// but not log-concave.
pub fn cauchy() -> TestDensity {
    FnDensity::<DynFn, DynFn>::new(
        Box::new(|x: f64| 1.0 / (1.0 + x * x)),
        Box::new(|x: f64| -2.0 * x / (1.0 + x * x).powi(2)),
    )
}

/// Bimodal mixture of two normals at -3 and 3.
pub fn bimodal() -> TestDensity {
    FnDensity::<DynFn, DynFn>::new(
        Box::new(|x: f64| (-0.5 * (x - 3.0).powi(2)).exp() + (-0.5 * (x + 3.0).powi(2)).exp()),
        Box::new(|x: f64| {
            -(x - 3.0) * (-0.5 * (x - 3.0).powi(2)).exp()
                - (x + 3.0) * (-0.5 * (x + 3.0).powi(2)).exp()
        }),
    )
}

/// Set up a silent generator, panicking on setup failure.
pub fn generator(density: TestDensity, config: &TdrConfig) -> Tdr<TestDensity, NullObserver> {
    Tdr::with_observer(density, config, NullObserver).expect("setup failed")
}

/// Seeded random number generator.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
