//! Generator setup: from a density and a configuration to a usable hat
//!
//! 1. resolve the configuration against the density's hints;
//! 2. select and evaluate the starting construction points;
//! 3. compute every interval, adding arc-mean points where the hat is
//!    unbounded;
//! 4. optionally refine with derandomized adaptive rejection sampling;
//! 5. build the guide table and report the summary.

use tracing::{debug, warn};

use crate::{
    Error, Result,
    config::{DarsRule, StartingPoints, TdrConfig},
    ports::{
        Density, Observer,
        observer::{SetupSummary, SplitRefusal},
    },
    tdr::{
        Transform,
        construction::{PointRequest, check_unimodal, construction_points},
        hat::Hat,
        interval::Interval,
        params::{IntervalStatus, check_density_value, compute_interval, evaluate_point},
        splitter::{SplitLimits, SplitOutcome, split},
    },
    types::IntervalId,
    utils::{arcmean, midpoint},
};

/// Configuration resolved against a concrete density.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Transform selected by c
    pub transform: Transform,
    /// Domain (intersection of the configured domain and the support)
    pub domain: (f64, f64),
    /// Mode, if known
    pub mode: Option<f64>,
    /// Center of the equiangular rule
    pub center: f64,
    /// Insert the center as a construction point
    pub use_center: bool,
    /// Starting points
    pub starting_points: StartingPoints,
    /// Maximum number of intervals
    pub max_intervals: usize,
    /// Stop splitting at this squeeze/hat ratio
    pub max_squeeze_ratio: f64,
    /// Guide table size per interval
    pub guide_factor: f64,
    /// Minimum relative improvable area for adaptive splits
    pub bound_for_adding: f64,
    /// Verification while sampling
    pub verify: bool,
    /// DARS refinement (factor and rule), if enabled
    pub dars: Option<(f64, DarsRule)>,
}

impl Settings {
    /// Validate `config` and fill in everything it leaves to the density.
    ///
    /// # Errors
    ///
    /// Any validation error of [`TdrConfig::validate`], and
    /// [`Error::InvalidDomain`] when the configured domain misses the
    /// density's support.
    pub fn resolve<D: Density + ?Sized>(config: &TdrConfig, density: &D) -> Result<Self> {
        config.validate()?;
        let transform = config.transform()?;

        let (sl, sr) = density.support();
        let (left, right) = match config.domain {
            Some((l, r)) => (l.max(sl), r.min(sr)),
            None => (sl, sr),
        };
        if left.is_nan() || right.is_nan() || left >= right {
            return Err(Error::InvalidDomain { left, right });
        }

        let in_domain = |m: f64| m >= left && m <= right;
        let mode = match config.mode {
            Some(m) if !in_domain(m) => {
                return Err(Error::config(format!(
                    "mode {m} lies outside the domain [{left}, {right}]"
                )));
            }
            Some(m) => Some(m),
            // a hint from the density is dropped when the domain cuts it off
            None => density.mode().filter(|&m| m.is_finite() && in_domain(m)),
        };

        let center = config.center.or(mode).unwrap_or(0.0).clamp(left, right);

        Ok(Self {
            transform,
            domain: (left, right),
            mode,
            center,
            use_center: config.use_center,
            starting_points: config.starting_points.clone(),
            max_intervals: config.max_intervals,
            max_squeeze_ratio: config.max_squeeze_ratio,
            guide_factor: config.guide_factor,
            bound_for_adding: config.bound_for_adding,
            verify: config.verify,
            dars: config.dars.then_some((config.dars_factor, config.dars_rule)),
        })
    }

    /// Limits for splits requested while sampling.
    pub(crate) fn sampling_limits(&self) -> SplitLimits {
        SplitLimits {
            max_intervals: self.max_intervals,
            bound_for_adding: Some(self.bound_for_adding),
        }
    }
}

/// Run the complete setup.
///
/// # Errors
///
/// Every setup-fatal condition: density contract violations,
/// [`Error::NotUnimodal`], [`Error::NotTConcave`],
/// [`Error::TooFewConstructionPoints`], [`Error::TooManyIntervals`],
/// [`Error::UnboundedHat`] and [`Error::DegenerateHat`].
pub fn build_hat<D, O>(settings: &Settings, density: &D, observer: &mut O) -> Result<Hat>
where
    D: Density + ?Sized,
    O: Observer + ?Sized,
{
    let request = PointRequest {
        domain: settings.domain,
        mode: settings.mode,
        center: settings.center,
        use_center: settings.use_center,
        points: &settings.starting_points,
    };
    let points = construction_points(settings.transform, density, &request, observer)?;

    let count = points.len() - 1;
    if count > settings.max_intervals {
        return Err(Error::TooManyIntervals {
            count,
            max_intervals: settings.max_intervals,
        });
    }

    let mut hat = Hat::from_points(settings.transform, &points, settings.guide_factor);
    let bounded = bound_hat(&mut hat, density, settings.max_intervals, count);
    // points added for a bounded hat can expose a misplaced mode
    if let Some(mode) = settings.mode {
        let points: Vec<Interval> = hat.store.chain(hat.head).map(|(_, iv)| *iv).collect();
        check_unimodal(&points, mode)?;
    }
    let added_for_bounded = bounded?;
    hat.refresh();

    if !(hat.hat_area > 0.0 && hat.hat_area.is_finite()) {
        return Err(Error::DegenerateHat {
            hat_area: hat.hat_area,
        });
    }

    let added_by_dars = match settings.dars {
        Some((factor, rule)) => refine(&mut hat, density, settings, factor, rule)?,
        None => 0,
    };

    let summary = SetupSummary {
        n_intervals: hat.n_intervals,
        hat_area: hat.hat_area,
        squeeze_area: hat.squeeze_area,
        points_added_for_bounded_hat: added_for_bounded,
        points_added_by_dars: added_by_dars,
    };
    debug!(
        n_intervals = summary.n_intervals,
        hat_area = summary.hat_area,
        squeeze_area = summary.squeeze_area,
        "setup complete"
    );
    observer.on_setup_complete(&summary);
    Ok(hat)
}

/// Compute the parameters of every interval, inserting arc-mean points into
/// intervals whose hat is unbounded. Returns the number of points added.
fn bound_hat<D: Density + ?Sized>(
    hat: &mut Hat,
    density: &D,
    max_intervals: usize,
    mut n_intervals: usize,
) -> Result<usize> {
    let transform = hat.transform;
    let mut added = 0;
    let mut cursor = Some(hat.head);

    while let Some(id) = cursor {
        let iv = hat.store[id];
        let Some(next_id) = iv.next else {
            break;
        };

        match compute_interval(transform, &mut hat.store, id)? {
            IntervalStatus::Bounded => {
                cursor = Some(next_id);
                continue;
            }
            IntervalStatus::Unbounded => {}
        }

        if n_intervals >= max_intervals {
            return Err(Error::UnboundedHat { max_intervals });
        }
        let next = hat.store[next_id];
        let x = arcmean(iv.x, next.x);
        if !(iv.x < x && x < next.x) {
            return Err(Error::UnboundedHat { max_intervals });
        }

        let point = evaluate_point(transform, density, x, false)?;
        debug!(x, fx = point.fx, "hat unbounded, adding construction point");

        if point.fx > 0.0 {
            hat.store.insert_after(id, point);
            n_intervals += 1;
            added += 1;
        } else if iv.fx == 0.0 {
            // move the left boundary into the support
            hat.store[id] = Interval {
                next: iv.next,
                ..point
            };
        } else if next.fx == 0.0 {
            hat.store[next_id] = Interval {
                next: next.next,
                ..point
            };
        } else {
            return Err(Error::NotTConcave {
                x0: iv.x,
                f0: iv.fx,
                x1: next.x,
                f1: next.fx,
                reason: format!("density vanishes at {x} inside its support"),
            });
        }
        // recompute the same interval with the new point in place
    }
    Ok(added)
}

/// Split point for derandomized adaptive rejection sampling.
fn dars_point(hat: &Hat, id: IntervalId, rule: DarsRule) -> Option<f64> {
    let iv = &hat.store[id];
    let next = &hat.store[iv.next?];
    let inside = |x: f64| iv.x < x && x < next.x;

    let x = match rule {
        DarsRule::IntersectionPoint if inside(iv.ip) => iv.ip,
        DarsRule::Mean if iv.x.is_finite() && next.x.is_finite() => midpoint(iv.x, next.x),
        _ => arcmean(iv.x, next.x),
    };
    inside(x).then_some(x)
}

/// Split every interval whose improvable area exceeds `factor` times the
/// average, round after round, until the squeeze ratio or the interval limit
/// is reached or a round makes no progress. Returns the number of points
/// added.
fn refine<D: Density + ?Sized>(
    hat: &mut Hat,
    density: &D,
    settings: &Settings,
    factor: f64,
    rule: DarsRule,
) -> Result<usize> {
    let limits = SplitLimits {
        max_intervals: settings.max_intervals,
        bound_for_adding: None,
    };
    let mut added = 0;

    loop {
        if hat.ratio().value() >= settings.max_squeeze_ratio
            || hat.n_intervals >= settings.max_intervals
        {
            break;
        }

        let threshold = factor * (hat.hat_area - hat.squeeze_area) / hat.n_intervals as f64;
        let candidates: Vec<IntervalId> = hat
            .intervals()
            .filter(|(_, iv)| iv.ahat() - iv.asqueeze > threshold)
            .map(|(id, _)| id)
            .collect();
        if candidates.is_empty() {
            break;
        }

        let mut progress = false;
        for id in candidates {
            if hat.n_intervals >= settings.max_intervals {
                break;
            }
            let Some(x) = dars_point(hat, id, rule) else {
                continue;
            };
            let fx = density.pdf(x);
            check_density_value(x, fx)?;

            match split(hat, density, id, x, fx, &limits) {
                SplitOutcome::Split => {
                    added += 1;
                    progress = true;
                }
                SplitOutcome::Chopped => progress = true,
                SplitOutcome::Refused(SplitRefusal::MaxIntervals) => break,
                SplitOutcome::Refused(reason) => {
                    warn!(x, %reason, "refinement split refused");
                }
            }
        }
        if !progress {
            break;
        }
    }

    debug!(
        added,
        n_intervals = hat.n_intervals,
        ratio = %hat.ratio(),
        "refinement finished"
    );
    Ok(added)
}
