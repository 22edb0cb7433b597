//! Choosing and evaluating the starting construction points
//!
//! The result is an ordered list of evaluated points whose first and last
//! entries are the (possibly moved) domain boundaries. Points that cannot be
//! used are dropped and reported to the observer.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use crate::{
    Error, Result,
    config::StartingPoints,
    ports::{Density, Observer, observer::SkipReason},
    tdr::{Transform, interval::Interval, params::evaluate_point},
    utils::fp_approx,
};

/// Where the starting points come from.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRequest<'a> {
    /// Domain boundaries (either may be infinite)
    pub domain: (f64, f64),
    /// Known mode
    pub mode: Option<f64>,
    /// Center of the equiangular rule
    pub center: f64,
    /// Insert the center when no mode is inside the domain
    pub use_center: bool,
    /// Count or explicit list
    pub points: &'a StartingPoints,
}

/// A candidate point before evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    x: f64,
    is_mode: bool,
}

/// `n` interior points spread by equal angles around `center`.
///
/// The boundaries sit at angles `atan(b - center)` (or `+-pi/2` when
/// infinite) and the `n` points split that angular range evenly.
pub fn equiangular_points(domain: (f64, f64), center: f64, n: usize) -> Vec<f64> {
    let (left, right) = domain;
    let left_angle = if left.is_finite() {
        (left - center).atan()
    } else {
        -FRAC_PI_2
    };
    let right_angle = if right.is_finite() {
        (right - center).atan()
    } else {
        FRAC_PI_2
    };
    let step = (right_angle - left_angle) / (n + 1) as f64;

    (1..=n)
        .map(|i| (left_angle + i as f64 * step).tan() + center)
        .collect()
}

fn inside(domain: (f64, f64), x: f64) -> bool {
    domain.0 < x && x < domain.1
}

/// Interior candidates in request order, with the mode (or center) spliced
/// in at its sorted position.
fn candidates(request: &PointRequest<'_>) -> Vec<Candidate> {
    let special = match request.mode {
        Some(mode) if inside(request.domain, mode) => Some(Candidate {
            x: mode,
            is_mode: true,
        }),
        Some(_) => None,
        None if request.use_center && inside(request.domain, request.center) => Some(Candidate {
            x: request.center,
            is_mode: false,
        }),
        None => None,
    };

    let xs = match request.points {
        StartingPoints::Count(n) => {
            let n = if special.is_some() { n.saturating_sub(1) } else { *n };
            equiangular_points(request.domain, request.center, n)
        }
        StartingPoints::Explicit(points) => points.clone(),
    };

    let mut out: Vec<Candidate> = xs
        .into_iter()
        .map(|x| Candidate { x, is_mode: false })
        .collect();

    if let Some(special) = special {
        match out.iter().position(|c| c.x >= special.x) {
            Some(pos) if out[pos].x == special.x => out[pos].is_mode = special.is_mode,
            Some(pos) => out.insert(pos, special),
            None => out.push(special),
        }
    }
    out
}

/// Select, evaluate and clean up the starting construction points.
///
/// # Errors
///
/// Density contract violations, [`Error::NotUnimodal`] when PDF values
/// contradict the mode, [`Error::NotTConcave`] when the density vanishes
/// between points of positive density, and
/// [`Error::TooFewConstructionPoints`] when fewer than two points survive.
pub fn construction_points<D, O>(
    transform: Transform,
    density: &D,
    request: &PointRequest<'_>,
    observer: &mut O,
) -> Result<Vec<Interval>>
where
    D: Density + ?Sized,
    O: Observer + ?Sized,
{
    let (left, right) = request.domain;

    // boundaries, then interior points that lie inside and keep increasing
    let mut accepted = vec![Candidate {
        x: left,
        is_mode: false,
    }];
    for candidate in candidates(request) {
        let x = candidate.x;
        if !inside(request.domain, x) {
            observer.on_point_skipped(x, SkipReason::OutsideDomain);
            continue;
        }
        let last = accepted[accepted.len() - 1].x;
        if x <= last {
            observer.on_point_skipped(x, SkipReason::NotIncreasing);
            continue;
        }
        accepted.push(candidate);
    }
    accepted.push(Candidate {
        x: right,
        is_mode: false,
    });

    let mut points = accepted
        .iter()
        .map(|c| evaluate_point(transform, density, c.x, c.is_mode))
        .collect::<Result<Vec<_>>>()?;

    collapse_zero_runs(&mut points, observer)?;

    if points.len() < 2 {
        return Err(Error::TooFewConstructionPoints {
            usable: points.len(),
        });
    }

    if let Some(mode) = request.mode {
        check_unimodal(&points, mode)?;
    }

    debug!(
        points = points.len(),
        left = points[0].x,
        right = points[points.len() - 1].x,
        "construction points selected"
    );
    Ok(points)
}

/// Drop redundant zero-density points on either side of the support.
///
/// Left of the support only the last zero point is kept (it becomes the new
/// left boundary). Right of the support the first zero point becomes the
/// right boundary.
fn collapse_zero_runs<O: Observer + ?Sized>(
    points: &mut Vec<Interval>,
    observer: &mut O,
) -> Result<()> {
    let leading = points
        .windows(2)
        .take_while(|pair| pair[0].fx == 0.0 && pair[1].fx == 0.0)
        .count();
    for dropped in points.drain(..leading) {
        observer.on_point_skipped(dropped.x, SkipReason::OutsideSupport);
    }

    let Some(first_positive) = points.iter().position(|p| p.fx > 0.0) else {
        // no support at all: a single zero point remains
        return Ok(());
    };
    let Some(offset) = points[first_positive..].iter().position(|p| p.fx == 0.0) else {
        return Ok(());
    };
    let boundary = first_positive + offset;

    if let Some(stray) = points[boundary + 1..].iter().find(|p| p.fx > 0.0) {
        let zero = &points[boundary];
        return Err(Error::NotTConcave {
            x0: zero.x,
            f0: zero.fx,
            x1: stray.x,
            f1: stray.fx,
            reason: "density vanishes inside its support".into(),
        });
    }
    for dropped in points.drain(boundary + 1..) {
        observer.on_point_skipped(dropped.x, SkipReason::OutsideSupport);
    }
    Ok(())
}

/// PDF values must not decrease towards the mode from either side.
pub(crate) fn check_unimodal(points: &[Interval], mode: f64) -> Result<()> {
    for pair in points.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let violated = if cur.x <= mode {
            cur.fx < prev.fx && !fp_approx(cur.fx, prev.fx)
        } else if prev.x >= mode {
            cur.fx > prev.fx && !fp_approx(cur.fx, prev.fx)
        } else {
            false
        };
        if violated {
            return Err(Error::NotUnimodal {
                mode,
                x_prev: prev.x,
                f_prev: prev.fx,
                x: cur.x,
                fx: cur.fx,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FnDensity, NullObserver, observer::SkipReason};

    #[derive(Default)]
    struct Skips(Vec<(f64, SkipReason)>);

    impl Observer for Skips {
        fn on_point_skipped(&mut self, x: f64, reason: SkipReason) {
            self.0.push((x, reason));
        }
    }

    fn normal() -> impl Density {
        FnDensity::new(
            |x: f64| (-0.5 * x * x).exp(),
            |x: f64| -x * (-0.5 * x * x).exp(),
        )
    }

    fn request(
        domain: (f64, f64),
        mode: Option<f64>,
        points: &StartingPoints,
    ) -> PointRequest<'_> {
        PointRequest {
            domain,
            mode,
            center: mode.unwrap_or(0.0),
            use_center: false,
            points,
        }
    }

    #[test]
    fn test_equiangular_points_symmetric() {
        let xs = equiangular_points((f64::NEG_INFINITY, f64::INFINITY), 0.0, 3);
        assert_eq!(xs.len(), 3);
        assert!((xs[0] + 1.0).abs() < 1e-12);
        assert!(xs[1].abs() < 1e-12);
        assert!((xs[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_equiangular_points_bounded() {
        let xs = equiangular_points((0.0, 1.0), 0.0, 4);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(xs.iter().all(|&x| 0.0 < x && x < 1.0));
    }

    #[test]
    fn test_mode_inserted_with_flat_tangent() {
        let points = StartingPoints::Explicit(vec![-1.0, 1.0]);
        let req = request((f64::NEG_INFINITY, f64::INFINITY), Some(0.0), &points);
        let cps = construction_points(Transform::Log, &normal(), &req, &mut NullObserver).unwrap();
        let xs: Vec<f64> = cps.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![f64::NEG_INFINITY, -1.0, 0.0, 1.0, f64::INFINITY]);
        assert_eq!(cps[2].dtfx, 0.0);
        assert!(cps[0].has_vertical_tangent());
        assert!(cps[4].has_vertical_tangent());
    }

    #[test]
    fn test_count_takes_one_point_for_mode() {
        let points = StartingPoints::Count(5);
        let req = request((f64::NEG_INFINITY, f64::INFINITY), Some(0.3), &points);
        let cps = construction_points(Transform::Log, &normal(), &req, &mut NullObserver).unwrap();
        // 4 equiangular points + mode + 2 boundaries
        assert_eq!(cps.len(), 7);
        assert!(cps.iter().any(|p| p.x == 0.3 && p.dtfx == 0.0));
    }

    #[test]
    fn test_bad_points_are_skipped() {
        let points = StartingPoints::Explicit(vec![-3.0, 0.5, 0.5, 0.25, 2.0]);
        let req = request((0.0, 1.0), None, &points);
        let mut skips = Skips::default();
        let cps = construction_points(Transform::Log, &normal(), &req, &mut skips).unwrap();
        let xs: Vec<f64> = cps.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0]);
        assert_eq!(
            skips.0,
            vec![
                (-3.0, SkipReason::OutsideDomain),
                (0.5, SkipReason::NotIncreasing),
                (0.25, SkipReason::NotIncreasing),
                (2.0, SkipReason::OutsideDomain),
            ]
        );
    }

    #[test]
    fn test_zero_runs_collapse() {
        // triangle density on [0, 2], given on a wider domain
        let tri = FnDensity::new(
            |x: f64| if (0.0..=2.0).contains(&x) { 1.0 - (x - 1.0).abs() } else { 0.0 },
            |x: f64| if x < 1.0 { 1.0 } else { -1.0 },
        );
        let points = StartingPoints::Explicit(vec![-3.0, -2.0, -1.0, 0.5, 1.5, 2.5, 3.0]);
        let req = request((-4.0, 4.0), None, &points);
        let mut skips = Skips::default();
        let cps = construction_points(Transform::Log, &tri, &req, &mut skips).unwrap();
        let xs: Vec<f64> = cps.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-1.0, 0.5, 1.5, 2.5]);
        let dropped: Vec<f64> = skips.0.iter().map(|(x, _)| *x).collect();
        assert_eq!(dropped, vec![-4.0, -3.0, -2.0, 3.0, 4.0]);
        assert!(skips.0.iter().all(|(_, r)| *r == SkipReason::OutsideSupport));
    }

    #[test]
    fn test_vanishing_inside_support_is_fatal() {
        let gap = FnDensity::new(
            |x: f64| if x.abs() < 0.1 { 0.0 } else { (-x * x).exp() },
            |x: f64| -2.0 * x * (-x * x).exp(),
        );
        let points = StartingPoints::Explicit(vec![-1.0, 0.0, 1.0]);
        let req = request((-2.0, 2.0), None, &points);
        let err = construction_points(Transform::Log, &gap, &req, &mut NullObserver).unwrap_err();
        assert!(matches!(err, Error::NotTConcave { .. }));
    }

    #[test]
    fn test_not_unimodal() {
        let points = StartingPoints::Explicit(vec![-1.0, 1.0]);
        // the normal density peaks at 0, not at 2
        let req = request((-3.0, 3.0), Some(2.0), &points);
        let err = construction_points(Transform::Log, &normal(), &req, &mut NullObserver).unwrap_err();
        assert!(matches!(err, Error::NotUnimodal { .. }), "got {err:?}");
    }

    #[test]
    fn test_no_support_is_fatal() {
        let zero = FnDensity::new(|_| 0.0, |_| 0.0);
        let points = StartingPoints::Count(3);
        let req = request((0.0, 1.0), None, &points);
        let err = construction_points(Transform::Log, &zero, &req, &mut NullObserver).unwrap_err();
        assert!(matches!(err, Error::TooFewConstructionPoints { usable: 1 }));
    }

    #[test]
    fn test_use_center_inserts_center() {
        let points = StartingPoints::Count(2);
        let req = PointRequest {
            domain: (-5.0, 5.0),
            mode: None,
            center: 0.25,
            use_center: true,
            points: &points,
        };
        let cps = construction_points(Transform::Log, &normal(), &req, &mut NullObserver).unwrap();
        assert_eq!(cps.len(), 4);
        let center = cps.iter().find(|p| p.x == 0.25).unwrap();
        assert_ne!(center.dtfx, 0.0);
    }
}
