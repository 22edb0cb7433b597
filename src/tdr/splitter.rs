//! Adaptive interval splitting
//!
//! A rejected candidate `x` (with its already evaluated density) becomes a
//! new construction point, which tightens hat and squeeze where they were
//! loosest. A split either succeeds completely or leaves the envelope
//! exactly as it was.

use tracing::trace;

use crate::{
    ports::{Density, observer::SplitRefusal},
    tdr::{
        hat::Hat,
        interval::Interval,
        params::{IntervalStatus, compute_interval},
    },
    types::IntervalId,
};

/// Result of a split request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// A new construction point was inserted
    Split,
    /// A zero-density end point moved to the requested point
    Chopped,
    /// Nothing changed
    Refused(SplitRefusal),
}

/// Limits applied to a split request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitLimits {
    /// Upper bound on the number of intervals
    pub max_intervals: usize,
    /// Minimum share of the improvable area; `None` disables the check
    pub bound_for_adding: Option<f64>,
}

/// Split interval `id` at `x`, where the density is `fx`.
///
/// On success the totals and the guide table are current again. On refusal
/// the envelope is untouched.
pub fn split<D: Density + ?Sized>(
    hat: &mut Hat,
    density: &D,
    id: IntervalId,
    x: f64,
    fx: f64,
    limits: &SplitLimits,
) -> SplitOutcome {
    if hat.n_intervals >= limits.max_intervals {
        return SplitOutcome::Refused(SplitRefusal::MaxIntervals);
    }

    let old = hat.store[id];
    let Some(next_id) = old.next else {
        return SplitOutcome::Refused(SplitRefusal::DegeneratePoint);
    };
    let old_next = hat.store[next_id];

    if let Some(bound) = limits.bound_for_adding {
        let improvable = hat.hat_area - hat.squeeze_area;
        let share = hat.n_intervals as f64 * (old.ahat() - old.asqueeze) / improvable;
        if !(improvable > 0.0) || share < bound {
            return SplitOutcome::Refused(SplitRefusal::SmallArea);
        }
    }

    if !(old.x < x && x < old_next.x) {
        return SplitOutcome::Refused(SplitRefusal::DegeneratePoint);
    }

    let outcome = if fx <= 0.0 {
        chop(hat, id, next_id, x)
    } else {
        insert(hat, density, id, x, fx)
    };

    match outcome {
        Ok(outcome) => {
            hat.refresh();
            trace!(x, fx, n_intervals = hat.n_intervals, "interval split");
            outcome
        }
        Err(refusal) => {
            // roll back both records touched by the split
            hat.store[id] = old;
            hat.store[next_id] = old_next;
            SplitOutcome::Refused(refusal)
        }
    }
}

/// Recompute one interval, mapping anything but a bounded result to a
/// refusal.
fn recompute(hat: &mut Hat, id: IntervalId) -> Result<(), SplitRefusal> {
    match compute_interval(hat.transform, &mut hat.store, id) {
        Ok(IntervalStatus::Bounded) => Ok(()),
        Ok(IntervalStatus::Unbounded) | Err(_) => Err(SplitRefusal::NotTConcave),
    }
}

/// Move the zero-density end point of the interval to `x`.
fn chop(
    hat: &mut Hat,
    id: IntervalId,
    next_id: IntervalId,
    x: f64,
) -> Result<SplitOutcome, SplitRefusal> {
    let moved = Interval::new(x, 0.0, f64::NEG_INFINITY, f64::INFINITY);

    if hat.store[id].fx == 0.0 && id == hat.head {
        hat.store[id] = Interval {
            next: Some(next_id),
            ..moved
        };
        recompute(hat, id)?;
    } else if hat.store[next_id].fx == 0.0 {
        let after = hat.store[next_id].next;
        hat.store[next_id] = Interval {
            next: after,
            ..moved
        };
        recompute(hat, id)?;
        if after.is_some() {
            recompute(hat, next_id)?;
        }
    } else {
        return Err(SplitRefusal::NotTConcave);
    }
    Ok(SplitOutcome::Chopped)
}

/// Insert a new construction point at `x`.
fn insert<D: Density + ?Sized>(
    hat: &mut Hat,
    density: &D,
    id: IntervalId,
    x: f64,
    fx: f64,
) -> Result<SplitOutcome, SplitRefusal> {
    let dfx = density.dpdf(x);
    if !dfx.is_finite() {
        return Err(SplitRefusal::InvalidDerivative);
    }
    let t = hat.transform;
    let point = Interval::new(x, fx, t.apply(fx), t.derivative(fx, dfx));

    let new_id = hat.store.insert_after(id, point);
    let result = recompute(hat, id).and_then(|()| recompute(hat, new_id));
    if let Err(refusal) = result {
        // unlink before the caller restores the left record
        hat.store.remove_after(id);
        return Err(refusal);
    }
    Ok(SplitOutcome::Split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ports::FnDensity,
        tdr::{Transform, params::evaluate_point},
    };

    fn normal() -> impl Density {
        FnDensity::new(
            |x: f64| (-0.5 * x * x).exp(),
            |x: f64| -x * (-0.5 * x * x).exp(),
        )
    }

    fn hat_for<D: Density>(density: &D, xs: &[f64]) -> Hat {
        let t = Transform::Log;
        let points: Vec<Interval> = xs
            .iter()
            .map(|&x| evaluate_point(t, density, x, false).unwrap())
            .collect();
        let mut hat = Hat::from_points(t, &points, 2.0);
        let ids: Vec<IntervalId> = hat.store.chain(hat.head).map(|(id, _)| id).collect();
        for id in ids {
            assert_eq!(
                compute_interval(t, &mut hat.store, id).unwrap(),
                IntervalStatus::Bounded
            );
        }
        hat.refresh();
        hat
    }

    const OPEN: SplitLimits = SplitLimits {
        max_intervals: 100,
        bound_for_adding: None,
    };

    #[test]
    fn test_split_tightens_envelope() {
        let density = normal();
        let mut hat = hat_for(&density, &[-2.0, 1.0, 3.0]);
        let (before_hat, before_sq) = (hat.hat_area(), hat.squeeze_area());

        let x = 0.0;
        let head = hat.head;
        let outcome = split(&mut hat, &density, head, x, density.pdf(x), &OPEN);
        assert_eq!(outcome, SplitOutcome::Split);
        assert_eq!(hat.n_intervals(), 3);
        assert!(hat.hat_area() <= before_hat);
        assert!(hat.squeeze_area() >= before_sq);
        hat.check_invariants(100).unwrap();
    }

    #[test]
    fn test_refusals_leave_hat_untouched() {
        let density = normal();
        let mut hat = hat_for(&density, &[-2.0, 1.0, 3.0]);
        let before = hat.summaries();

        let limits = SplitLimits {
            max_intervals: 2,
            bound_for_adding: None,
        };
        let head = hat.head;
        assert_eq!(
            split(&mut hat, &density, head, 0.0, 1.0, &limits),
            SplitOutcome::Refused(SplitRefusal::MaxIntervals)
        );
        let head = hat.head;
        assert_eq!(
            split(&mut hat, &density, head, -2.0, density.pdf(-2.0), &OPEN),
            SplitOutcome::Refused(SplitRefusal::DegeneratePoint)
        );
        let head = hat.head;
        assert_eq!(
            split(&mut hat, &density, head, 1.5, density.pdf(1.5), &OPEN),
            SplitOutcome::Refused(SplitRefusal::DegeneratePoint)
        );

        let picky = SplitLimits {
            max_intervals: 100,
            bound_for_adding: Some(10.0),
        };
        let head = hat.head;
        assert_eq!(
            split(&mut hat, &density, head, 0.0, 1.0, &picky),
            SplitOutcome::Refused(SplitRefusal::SmallArea)
        );
        assert_eq!(hat.summaries(), before);
    }

    #[test]
    fn test_non_concave_split_rolls_back() {
        let density = normal();
        let mut hat = hat_for(&density, &[-2.0, 1.0, 3.0]);
        let before = hat.summaries();
        let live = hat.store.live();

        // a density value far above the hat cannot be T-concave
        let head = hat.head;
        let outcome = split(&mut hat, &density, head, 0.0, 50.0, &OPEN);
        assert_eq!(outcome, SplitOutcome::Refused(SplitRefusal::NotTConcave));
        assert_eq!(hat.summaries(), before);
        assert_eq!(hat.store.live(), live, "new record must be released");
        hat.check_invariants(100).unwrap();
    }

    #[test]
    fn test_zero_density_chops_end_point() {
        // half-normal on [0, inf) given on [-1, 3]
        let half = FnDensity::new(
            |x: f64| if x >= 0.0 { (-0.5 * x * x).exp() } else { 0.0 },
            |x: f64| if x >= 0.0 { -x * (-0.5 * x * x).exp() } else { 0.0 },
        );
        let mut hat = hat_for(&half, &[-1.0, 1.0, 3.0]);
        let before = hat.hat_area();

        let head = hat.head;
        let outcome = split(&mut hat, &half, head, -0.5, 0.0, &OPEN);
        assert_eq!(outcome, SplitOutcome::Chopped);
        assert_eq!(hat.n_intervals(), 2);
        assert_eq!(hat.bounds().0, -0.5);
        assert!(hat.hat_area() < before);
        hat.check_invariants(100).unwrap();
    }

    #[test]
    fn test_zero_density_between_positive_points_is_refused() {
        let density = normal();
        let mut hat = hat_for(&density, &[-2.0, 1.0, 3.0]);
        let head = hat.head;
        assert_eq!(
            split(&mut hat, &density, head, 0.0, 0.0, &OPEN),
            SplitOutcome::Refused(SplitRefusal::NotTConcave)
        );
    }
}
