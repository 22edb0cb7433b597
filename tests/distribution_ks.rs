//! Goodness-of-fit of generated variates against reference CDFs

mod common;

use common::{exponential, generator, rng};
use statrs::distribution::{ContinuousCDF, Exp, Normal};
use tdrgen::{
    NullObserver, TdrBuilder, TdrConfig,
    adapters::BuiltinDensity,
    analysis::{check_envelope, ks_test},
};

const LEVEL: f64 = 0.01;

/// Standard exponential, 10^5 draws, log transform
#[test]
fn test_exponential_ks() {
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_domain(0.0, f64::INFINITY)
        .with_mode(0.0);
    let mut tdr = generator(exponential(), &config);
    let samples = tdr.sample_n(&mut rng(12345), 100_000);

    let reference = Exp::new(1.0).unwrap();
    let result = ks_test(&samples, |x| reference.cdf(x)).unwrap();
    assert!(!result.rejects(LEVEL), "{result:?}");
    assert!(samples.iter().all(|&x| x >= 0.0));
}

#[test]
fn test_normal_ks_every_transform() {
    let reference = Normal::new(0.0, 1.0).unwrap();
    for (seed, c) in [(1, 0.0), (2, -0.5), (3, -0.8)] {
        let mut tdr = TdrBuilder::new(BuiltinDensity::normal(0.0, 1.0))
            .c(c)
            .observer(NullObserver)
            .build()
            .unwrap();
        let samples = tdr.sample_n(&mut rng(seed), 50_000);
        let result = ks_test(&samples, |x| reference.cdf(x)).unwrap();
        assert!(!result.rejects(LEVEL), "c = {c}: {result:?}");
    }
}

#[test]
fn test_builtin_densities_match_their_cdfs() {
    for (seed, density) in [
        (10, BuiltinDensity::exponential(2.5)),
        (11, BuiltinDensity::cauchy(1.0, 0.5)),
        (12, BuiltinDensity::gamma(3.0, 2.0)),
        (13, BuiltinDensity::normal(-4.0, 3.0)),
    ] {
        let mut tdr = TdrBuilder::new(density)
            .observer(NullObserver)
            .build()
            .unwrap();
        let samples = tdr.sample_n(&mut rng(seed), 50_000);
        let result = ks_test(&samples, |x| density.cdf(x)).unwrap();
        assert!(!result.rejects(LEVEL), "{density}: {result:?}");
        assert!(check_envelope(&tdr, 500).is_clean(), "{density}");
    }
}

#[test]
fn test_truncated_normal_ks() {
    let (a, b) = (-0.5, 2.0);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mass = normal.cdf(b) - normal.cdf(a);

    let mut tdr = TdrBuilder::new(BuiltinDensity::normal(0.0, 1.0))
        .domain(a, b)
        .observer(NullObserver)
        .build()
        .unwrap();
    let samples = tdr.sample_n(&mut rng(77), 50_000);
    let result = ks_test(&samples, |x| (normal.cdf(x) - normal.cdf(a)) / mass).unwrap();
    assert!(!result.rejects(LEVEL), "{result:?}");
}

#[test]
fn test_dars_generator_ks() {
    let mut tdr = TdrBuilder::new(BuiltinDensity::gamma(2.0, 1.0))
        .c(0.0)
        .starting_points(2)
        .dars(0.99, tdrgen::DarsRule::Mean)
        .observer(NullObserver)
        .build()
        .unwrap();
    let samples = tdr.sample_n(&mut rng(31), 50_000);
    let result = ks_test(&samples, |x| tdr.density().cdf(x)).unwrap();
    assert!(!result.rejects(LEVEL), "{result:?}");
}
