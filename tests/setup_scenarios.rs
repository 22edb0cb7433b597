//! Setup scenarios: construction points, boundary handling and fatal errors

mod common;

use common::{bimodal, cauchy, exponential, generator, normal};
use tdrgen::{
    Error, FnDensity, NullObserver, StartingPoints, Tdr, TdrBuilder, TdrConfig,
    adapters::{BuiltinDensity, MetricsObserver},
};

/// Normal shape, whole real line, mode 0, points {-1, 1}, log transform
#[test]
fn test_boundary_scenario_intervals() {
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_mode(0.0)
        .with_starting_points(StartingPoints::Explicit(vec![-1.0, 1.0]));
    let tdr = generator(normal(), &config);

    let rows = tdr.intervals();
    assert_eq!(rows.len(), 4);
    let xs: Vec<f64> = rows.iter().map(|r| r.x).collect();
    assert_eq!(xs, vec![f64::NEG_INFINITY, -1.0, 0.0, 1.0]);
    assert_eq!(rows[3].x_next, f64::INFINITY);

    // the mode gets a horizontal tangent
    assert_eq!(rows[2].dtfx, Some(0.0));
    // infinite end points carry no density and no tangent
    assert_eq!(rows[0].fx, 0.0);
    assert_eq!(rows[0].dtfx, None);

    // symmetric density, symmetric hat
    assert!((rows[0].hat() - rows[3].hat()).abs() < 1e-12);
    assert!((rows[1].hat() - rows[2].hat()).abs() < 1e-12);

    // tail squeezes vanish
    assert_eq!(rows[0].squeeze, 0.0);
    assert_eq!(rows[3].squeeze, 0.0);

    // true mass of exp(-x^2/2) is sqrt(2 pi)
    let mass = (2.0 * std::f64::consts::PI).sqrt();
    assert!(tdr.hat_area() > mass);
    assert!(tdr.squeeze_area() < mass);
    tdr.check_invariants().unwrap();
}

#[test]
fn test_cumulative_areas_increase() {
    let tdr = generator(normal(), &TdrConfig::new().with_mode(0.0));
    let rows = tdr.intervals();
    for pair in rows.windows(2) {
        assert!(pair[1].cumulative >= pair[0].cumulative);
        assert_eq!(pair[0].x_next, pair[1].x);
    }
    let last = rows.last().unwrap();
    assert!((last.cumulative - tdr.hat_area()).abs() <= 1e-12 * tdr.hat_area());
}

#[test]
fn test_squeeze_below_hat_for_every_interval() {
    for c in [0.0, -0.5, -0.25, -0.9] {
        let tdr = generator(normal(), &TdrConfig::new().with_c(c).with_mode(0.0));
        for row in tdr.intervals() {
            assert!(row.squeeze <= row.hat() * (1.0 + 1e-12), "c = {c}: {row:?}");
        }
        tdr.check_invariants().unwrap();
    }
}

#[test]
fn test_heavy_tail_needs_power_transform() {
    // the Cauchy density is T-concave for c = -1/2
    let tdr = generator(cauchy(), &TdrConfig::new().with_mode(0.0));
    assert!(tdr.hat_area().is_finite());
    tdr.check_invariants().unwrap();
}

#[test]
fn test_log_convex_region_is_rejected() {
    // log(1 / (1 + x^2)) is convex beyond |x| = 1
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_mode(0.0)
        .with_starting_points(StartingPoints::Explicit(vec![-4.0, -2.0, 2.0, 4.0]));
    let err = Tdr::with_observer(cauchy(), &config, NullObserver).unwrap_err();
    assert!(matches!(err, Error::NotTConcave { .. }), "got {err:?}");
}

#[test]
fn test_wrong_mode_is_rejected() {
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_mode(3.0)
        .with_starting_points(StartingPoints::Explicit(vec![-3.0, 0.0]));
    let err = Tdr::with_observer(bimodal(), &config, NullObserver).unwrap_err();
    assert!(matches!(err, Error::NotUnimodal { mode, .. } if mode == 3.0), "got {err:?}");
}

#[test]
fn test_wrong_mode_found_by_tail_points() {
    // no starting points contradict the mode; the points added to bound the
    // left tail do
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_mode(3.0)
        .with_starting_points(StartingPoints::Explicit(vec![]));
    let err = Tdr::with_observer(bimodal(), &config, NullObserver).unwrap_err();
    assert!(matches!(err, Error::NotUnimodal { mode, x, .. } if mode == 3.0 && x < 0.0), "got {err:?}");
}

#[test]
fn test_negative_density_is_fatal() {
    let broken = FnDensity::new(|x: f64| if x > 0.5 { -1.0 } else { 1.0 }, |_| 0.0);
    let config = TdrConfig::new()
        .with_domain(0.0, 1.0)
        .with_starting_points(StartingPoints::Explicit(vec![0.25, 0.75]));
    let err = Tdr::with_observer(broken, &config, NullObserver).unwrap_err();
    assert!(matches!(err, Error::NegativeDensity { x, .. } if x == 0.75), "got {err:?}");
    assert!(err.is_density_error());
}

#[test]
fn test_invalid_configuration() {
    let density = BuiltinDensity::normal(0.0, 1.0);
    for config in [
        TdrConfig::new().with_c(0.5),
        TdrConfig::new().with_c(-1.0),
        TdrConfig::new().with_max_intervals(0),
        TdrConfig::new().with_max_squeeze_ratio(1.5),
        TdrConfig::new().with_guide_factor(-1.0),
        TdrConfig::new().with_domain(2.0, 1.0),
    ] {
        assert!(Tdr::with_observer(density, &config, NullObserver).is_err(), "{config:?}");
    }
}

#[test]
fn test_support_hint_moves_domain() {
    let tdr = generator(exponential(), &TdrConfig::new().with_c(0.0).with_mode(0.0));
    assert_eq!(tdr.domain(), (0.0, f64::INFINITY));
    assert_eq!(tdr.eval_hat(-1.0), 0.0);
    assert!((tdr.eval_hat(0.0) - 1.0).abs() < 1e-12);
}

#[test]
fn test_zero_density_outside_support_is_chopped() {
    // the density vanishes on the left, but the configured domain does not
    // know it; the zero points are collapsed during setup
    let density = FnDensity::new(
        |x: f64| if x < 0.0 { 0.0 } else { (-x).exp() },
        |x: f64| if x < 0.0 { 0.0 } else { -(-x).exp() },
    );
    let config = TdrConfig::new()
        .with_c(0.0)
        .with_domain(-10.0, 10.0)
        .with_starting_points(StartingPoints::Explicit(vec![-5.0, -2.0, 0.0, 1.0, 3.0]));
    let tdr = TdrBuilder::new(density)
        .config(config)
        .observer(MetricsObserver::new())
        .build()
        .unwrap();
    assert!(tdr.observer().summary().skipped_points >= 1);
    assert!(tdr.intervals().iter().filter(|r| r.x < 0.0).count() <= 1);
    tdr.check_invariants().unwrap();
}

#[test]
fn test_builtin_densities_set_up() {
    for density in [
        BuiltinDensity::normal(2.0, 0.5),
        BuiltinDensity::exponential(3.0),
        BuiltinDensity::cauchy(0.0, 2.0),
        BuiltinDensity::gamma(2.5, 1.0),
        BuiltinDensity::gamma(1.0, 1.0),
    ] {
        let tdr = TdrBuilder::new(density)
            .observer(NullObserver)
            .build()
            .unwrap_or_else(|e| panic!("{density}: {e}"));
        assert!(tdr.hat_area() > 0.0, "{density}");
        tdr.check_invariants().unwrap();
    }
}

#[test]
fn test_dars_reaches_ratio_at_setup() {
    let tdr = TdrBuilder::new(BuiltinDensity::normal(0.0, 1.0))
        .starting_points(3)
        .dars(0.99, tdrgen::DarsRule::IntersectionPoint)
        .observer(NullObserver)
        .build()
        .unwrap();
    assert!(tdr.squeeze_hat_ratio() >= 0.95 || tdr.n_intervals() == 50);
}
