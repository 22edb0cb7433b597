//! Interval parameters: tangents, division point, hat and squeeze areas
//!
//! For two neighbouring construction points `(x0, f0, T0, dT0)` and
//! `(x1, f1, T1, dT1)` this module computes the squeeze secant, the point
//! where the hat switches from the left to the right tangent, and the three
//! areas. It is also where T-concavity is enforced: every check that can
//! prove the density is not T-concave lives here.

use crate::{
    Error, Result,
    ports::Density,
    tdr::{
        SLOPE_ROUNDOFF, Transform,
        interval::{Interval, IntervalStore},
    },
    types::IntervalId,
    utils::{FP_TOLERANCE, fp_approx, midpoint},
};

/// Outcome of a parameter computation that did not prove non-concavity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalStatus {
    /// Parameters stored; hat area finite
    Bounded,
    /// Hat area infinite (or division point unusable); nothing stored.
    /// The caller must add a construction point inside the interval.
    Unbounded,
}

/// Evaluate the density at a construction point and build its record.
///
/// Infinite points are never passed to the density; they get `fx = 0`. At a
/// declared mode the tangent is forced to be horizontal.
///
/// # Errors
///
/// [`Error::NegativeDensity`], [`Error::NonFiniteDensity`] or
/// [`Error::NonFiniteDerivative`] when the density breaks its contract.
pub fn evaluate_point<D: Density + ?Sized>(
    transform: Transform,
    density: &D,
    x: f64,
    is_mode: bool,
) -> Result<Interval> {
    let fx = if x.is_finite() { density.pdf(x) } else { 0.0 };
    check_density_value(x, fx)?;

    if fx == 0.0 {
        return Ok(Interval::new(x, 0.0, f64::NEG_INFINITY, f64::INFINITY));
    }

    let tfx = transform.apply(fx);
    let dtfx = if is_mode {
        0.0
    } else {
        let dfx = density.dpdf(x);
        if !dfx.is_finite() {
            return Err(Error::NonFiniteDerivative { x, dfx });
        }
        transform.derivative(fx, dfx)
    };
    Ok(Interval::new(x, fx, tfx, dtfx))
}

/// Validate a single PDF value.
pub(crate) fn check_density_value(x: f64, fx: f64) -> Result<()> {
    if fx.is_nan() || fx.is_infinite() {
        return Err(Error::NonFiniteDensity { x, fx });
    }
    if fx < 0.0 {
        return Err(Error::NegativeDensity { x, fx });
    }
    Ok(())
}

fn not_t_concave(left: &Interval, right: &Interval, reason: impl Into<String>) -> Error {
    Error::NotTConcave {
        x0: left.x,
        f0: left.fx,
        x1: right.x,
        f1: right.fx,
        reason: reason.into(),
    }
}

/// `a` exceeds `b` by more than both the relative tolerance and `abs_tol`.
fn clearly_greater(a: f64, b: f64, abs_tol: f64) -> bool {
    a > b && !fp_approx(a, b) && a - b > abs_tol
}

/// Where the hat switches tangents.
enum Division {
    At(f64),
    OutOfRange,
}

fn division_point(left: &Interval, right: &Interval, slope_tol: f64) -> Result<Division> {
    // a vertical tangent at an end point contributes nothing
    if left.has_vertical_tangent() || left.dtfx == f64::INFINITY {
        return Ok(Division::At(left.x));
    }
    if right.has_vertical_tangent() || right.dtfx.is_infinite() {
        return Ok(Division::At(right.x));
    }

    let (x0, x1) = (left.x, right.x);
    let (d0, d1) = (left.dtfx, right.dtfx);

    if fp_approx(d0, d1) || (d0 - d1).abs() <= slope_tol {
        return Ok(Division::At(midpoint(x0, x1)));
    }
    if d0 < d1 {
        return Err(not_t_concave(
            left,
            right,
            format!("tangent slope increases from {d0} to {d1}"),
        ));
    }

    // Cramer's rule on  d0 t - z = d0 x0 - T0,  d1 t - z = d1 x1 - T1,
    // shifted to x0 for accuracy
    let ip = x0 + (right.tfx - left.tfx - d1 * (x1 - x0)) / (d0 - d1);

    let tol = FP_TOLERANCE * x0.abs().max(x1.abs()).max(x1 - x0);
    if !ip.is_finite() || ip < x0 - tol || ip > x1 + tol {
        return Ok(Division::OutOfRange);
    }
    Ok(Division::At(ip.clamp(x0, x1)))
}

/// Compute and store the parameters of interval `id` from its own
/// construction point and its successor's.
///
/// On [`IntervalStatus::Unbounded`] and on error the store is left
/// untouched. A terminal interval only gets its areas cleared.
///
/// # Errors
///
/// [`Error::NotTConcave`] when the squeeze slope lies outside the tangent
/// slopes, the tangent slopes increase, or the squeeze area exceeds the hat
/// area beyond tolerance.
pub fn compute_interval(
    transform: Transform,
    store: &mut IntervalStore,
    id: IntervalId,
) -> Result<IntervalStatus> {
    let left = store[id];
    let Some(next_id) = left.next else {
        store[id].clear_areas();
        return Ok(IntervalStatus::Bounded);
    };
    let right = store[next_id];

    match interval_parameters(transform, &left, &right)? {
        Some(params) => {
            let iv = &mut store[id];
            iv.sq = params.sq;
            iv.ip = params.ip;
            iv.ahatl = params.ahatl;
            iv.ahatr = params.ahatr;
            iv.asqueeze = params.asqueeze;
            Ok(IntervalStatus::Bounded)
        }
        None => Ok(IntervalStatus::Unbounded),
    }
}

/// Derived quantities of one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalParams {
    /// Squeeze slope
    pub sq: f64,
    /// Division point
    pub ip: f64,
    /// Hat area left of `ip`
    pub ahatl: f64,
    /// Hat area right of `ip`
    pub ahatr: f64,
    /// Squeeze area
    pub asqueeze: f64,
}

/// Pure parameter computation for two neighbouring construction points.
///
/// Returns `Ok(None)` when the hat over the interval is unbounded.
///
/// # Errors
///
/// See [`compute_interval`].
pub fn interval_parameters(
    transform: Transform,
    left: &Interval,
    right: &Interval,
) -> Result<Option<IntervalParams>> {
    let dx = right.x - left.x;
    if !(dx > 0.0) {
        return Err(Error::InvariantViolation {
            message: format!(
                "construction points {} and {} not strictly increasing",
                left.x, right.x
            ),
        });
    }

    // squeeze
    let both_positive = left.fx > 0.0 && right.fx > 0.0;
    let (sq, asqueeze, slope_tol) = if both_positive {
        let sq = (right.tfx - left.tfx) / dx;
        let slope_tol = SLOPE_ROUNDOFF * (left.tfx.abs() + right.tfx.abs()) / dx;

        let slopes_finite = left.dtfx.is_finite() && right.dtfx.is_finite();
        if slopes_finite && clearly_greater(sq, left.dtfx, slope_tol) {
            return Err(not_t_concave(
                left,
                right,
                format!(
                    "squeeze too steep: secant slope {sq} exceeds left tangent slope {}",
                    left.dtfx
                ),
            ));
        }
        if slopes_finite && clearly_greater(right.dtfx, sq, slope_tol) {
            return Err(not_t_concave(
                left,
                right,
                format!(
                    "squeeze too flat: secant slope {sq} below right tangent slope {}",
                    right.dtfx
                ),
            ));
        }

        // integrate from the higher point towards the lower one
        let asqueeze = if left.tfx >= right.tfx {
            transform.area(left.x, left.fx, left.tfx, sq, right.x)
        } else {
            transform.area(right.x, right.fx, right.tfx, sq, left.x)
        };
        (sq, asqueeze, slope_tol)
    } else {
        (0.0, 0.0, 0.0)
    };

    // division point
    let ip = match division_point(left, right, slope_tol)? {
        Division::At(ip) => ip,
        Division::OutOfRange => return Ok(None),
    };

    // hat areas
    let ahatl = transform.area(left.x, left.fx, left.tfx, left.dtfx, ip);
    let ahatr = transform.area(right.x, right.fx, right.tfx, right.dtfx, ip);
    if !ahatl.is_finite() || !ahatr.is_finite() {
        return Ok(None);
    }

    let ahat = ahatl + ahatr;
    if asqueeze > ahat && !fp_approx(asqueeze, ahat) {
        return Err(not_t_concave(
            left,
            right,
            format!("squeeze area {asqueeze} exceeds hat area {ahat}"),
        ));
    }

    Ok(Some(IntervalParams {
        sq,
        ip,
        ahatl,
        ahatr,
        asqueeze,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FnDensity;

    fn gauss() -> impl Density {
        FnDensity::new(
            |x: f64| (-0.5 * x * x).exp(),
            |x: f64| -x * (-0.5 * x * x).exp(),
        )
    }

    fn point(transform: Transform, x: f64) -> Interval {
        evaluate_point(transform, &gauss(), x, x == 0.0).unwrap()
    }

    #[test]
    fn test_evaluate_point() {
        let t = Transform::Log;
        let p = evaluate_point(t, &gauss(), 1.0, false).unwrap();
        assert!((p.tfx + 0.5).abs() < 1e-15);
        assert!((p.dtfx + 1.0).abs() < 1e-15);

        let mode = evaluate_point(t, &gauss(), 0.0, true).unwrap();
        assert_eq!(mode.dtfx, 0.0);

        let far = evaluate_point(t, &gauss(), f64::NEG_INFINITY, false).unwrap();
        assert_eq!(far.fx, 0.0);
        assert!(far.has_vertical_tangent());
        assert_eq!(far.dtfx, f64::INFINITY);
    }

    #[test]
    fn test_evaluate_point_contract_violations() {
        let negative = FnDensity::new(|_| -1.0, |_| 0.0);
        assert!(matches!(
            evaluate_point(Transform::Log, &negative, 0.0, false),
            Err(Error::NegativeDensity { .. })
        ));
        let nan = FnDensity::new(|_| f64::NAN, |_| 0.0);
        assert!(matches!(
            evaluate_point(Transform::Log, &nan, 0.0, false),
            Err(Error::NonFiniteDensity { .. })
        ));
        let bad_derivative = FnDensity::new(|_| 1.0, |_| f64::NAN);
        assert!(matches!(
            evaluate_point(Transform::Log, &bad_derivative, 0.0, false),
            Err(Error::NonFiniteDerivative { .. })
        ));
    }

    #[test]
    fn test_log_normal_interval() {
        let t = Transform::Log;
        let left = point(t, 0.0);
        let right = point(t, 1.0);
        let params = interval_parameters(t, &left, &right).unwrap().unwrap();

        // T(f) = -x^2/2: tangents 0 and -(x - 1) - 1/2 meet at 1/2
        assert!((params.ip - 0.5).abs() < 1e-12);
        assert!((params.sq + 0.5).abs() < 1e-12);
        assert!(params.asqueeze <= params.ahatl + params.ahatr);

        // exact integral of exp(-x^2/2) over [0, 1] lies between the envelopes
        let exact = 0.855_624_391_892_149;
        assert!(params.asqueeze < exact && exact < params.ahatl + params.ahatr);
    }

    #[test]
    fn test_tail_interval_to_infinity() {
        let t = Transform::Log;
        let left = point(t, 1.0);
        let right = point(t, f64::INFINITY);
        let params = interval_parameters(t, &left, &right).unwrap().unwrap();
        assert_eq!(params.ip, f64::INFINITY);
        assert_eq!(params.asqueeze, 0.0);
        assert_eq!(params.ahatr, 0.0);
        // tangent exp(-1/2 - (x - 1)) integrated over [1, inf)
        assert!((params.ahatl - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_unbounded_tail_with_flat_tangent() {
        let t = Transform::Log;
        let left = point(t, 0.0);
        let right = point(t, f64::INFINITY);
        assert_eq!(interval_parameters(t, &left, &right).unwrap(), None);
    }

    #[test]
    fn test_left_boundary_at_minus_infinity() {
        let t = Transform::InvSqrt;
        let left = point(t, f64::NEG_INFINITY);
        let right = point(t, -1.0);
        let params = interval_parameters(t, &left, &right).unwrap().unwrap();
        assert_eq!(params.ip, f64::NEG_INFINITY);
        assert_eq!(params.ahatl, 0.0);
        assert!(params.ahatr.is_finite() && params.ahatr > 0.0);
    }

    #[test]
    fn test_non_concave_density_is_fatal() {
        // log of a two-component mixture is convex between the peaks
        let mixture = FnDensity::new(
            |x: f64| (-0.5 * (x - 3.0).powi(2)).exp() + (-0.5 * (x + 3.0).powi(2)).exp(),
            |x: f64| {
                -(x - 3.0) * (-0.5 * (x - 3.0).powi(2)).exp()
                    - (x + 3.0) * (-0.5 * (x + 3.0).powi(2)).exp()
            },
        );
        let t = Transform::Log;
        let left = evaluate_point(t, &mixture, -1.0, false).unwrap();
        let right = evaluate_point(t, &mixture, 1.0, false).unwrap();
        let err = interval_parameters(t, &left, &right).unwrap_err();
        assert!(matches!(err, Error::NotTConcave { .. }), "got {err:?}");
    }

    #[test]
    fn test_linear_transformed_density_uses_midpoint() {
        // exp(-x): log density is a straight line, tangents coincide
        let expo = FnDensity::new(|x: f64| (-x).exp(), |x: f64| -(-x).exp());
        let t = Transform::Log;
        let left = evaluate_point(t, &expo, 0.0, false).unwrap();
        let right = evaluate_point(t, &expo, 2.0, false).unwrap();
        let params = interval_parameters(t, &left, &right).unwrap().unwrap();
        assert!((params.ip - 1.0).abs() < 1e-12);
        let exact = 1.0 - (-2.0f64).exp();
        assert!((params.ahatl + params.ahatr - exact).abs() < 1e-12);
        assert!((params.asqueeze - exact).abs() < 1e-12);
    }

    #[test]
    fn test_compute_interval_writes_store() {
        let t = Transform::Log;
        let mut store = IntervalStore::new();
        let head = store.alloc(point(t, 0.0));
        let tail = store.insert_after(head, point(t, 1.0));

        let status = compute_interval(t, &mut store, head).unwrap();
        assert_eq!(status, IntervalStatus::Bounded);
        assert!(store[head].ahat() > 0.0);
        assert!((store[head].ip - 0.5).abs() < 1e-12);

        // terminal record only gets cleared
        assert_eq!(
            compute_interval(t, &mut store, tail).unwrap(),
            IntervalStatus::Bounded
        );
        assert_eq!(store[tail].ahat(), 0.0);
    }

    #[test]
    fn test_compute_interval_unbounded_leaves_store() {
        let t = Transform::Log;
        let mut store = IntervalStore::new();
        let head = store.alloc(point(t, 0.0));
        store.insert_after(head, point(t, f64::INFINITY));
        let before = store[head];
        let status = compute_interval(t, &mut store, head).unwrap();
        assert_eq!(status, IntervalStatus::Unbounded);
        assert_eq!(store[head], before);
    }
}
