//! Observer port - structured events emitted by a generator session
//!
//! This port replaces ad-hoc debug printing. A session owns exactly one
//! observer (see [`FanoutObserver`](crate::adapters::FanoutObserver) to
//! attach several) and reports every noteworthy step of setup and adaptive
//! sampling to it.
//!
//! # Event Sequence
//!
//! 1. `on_point_skipped(...)` - For each rejected construction point (setup)
//! 2. `on_setup_complete(summary)` - Once, after the guide table is built
//! 3. While sampling:
//!    - `on_interval_split(event)` - After every successful split or chop
//!    - `on_split_refused(x, reason)` - When a split request is turned down
//!    - `on_verify_violation(violation)` - Verify mode only
//!    - `on_adaptation_stopped(n, ratio)` - Once, when splitting ends for good
//!
//! # Examples
//!
//! ```
//! use tdrgen::ports::{Observer, observer::SplitEvent};
//!
//! #[derive(Default)]
//! struct SplitCounter {
//!     splits: usize,
//! }
//!
//! impl Observer for SplitCounter {
//!     fn on_interval_split(&mut self, _event: &SplitEvent) {
//!         self.splits += 1;
//!     }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Summary of a finished setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupSummary {
    /// Number of (non-terminal) intervals
    pub n_intervals: usize,
    /// Total hat area
    pub hat_area: f64,
    /// Total squeeze area
    pub squeeze_area: f64,
    /// Intervals added during setup to make the hat bounded
    pub points_added_for_bounded_hat: usize,
    /// Intervals added by derandomized adaptive rejection sampling
    pub points_added_by_dars: usize,
}

/// A successful split (or chop) of one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// Point at which the interval was split
    pub x: f64,
    /// PDF at `x`
    pub fx: f64,
    /// True when no interval was created and an end point moved to `x`
    pub chopped: bool,
    /// Interval count after the split
    pub n_intervals: usize,
    /// Total hat area before the split
    pub hat_area_before: f64,
    /// Total hat area after the split
    pub hat_area: f64,
    /// Total squeeze area after the split
    pub squeeze_area: f64,
}

/// Why a split request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitRefusal {
    /// The interval count reached `max_intervals`
    MaxIntervals,
    /// The interval's share of the improvable area is below `bound_for_adding`
    SmallArea,
    /// The point coincides with (or lies outside) the interval's end points
    DegeneratePoint,
    /// The new intervals would not be T-concave or would have unbounded hats
    NotTConcave,
    /// The derivative of the density at the point is not finite
    InvalidDerivative,
}

impl fmt::Display for SplitRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SplitRefusal::MaxIntervals => "maximum number of intervals reached",
            SplitRefusal::SmallArea => "interval area too small to improve",
            SplitRefusal::DegeneratePoint => "split point on interval boundary",
            SplitRefusal::NotTConcave => "split would violate T-concavity",
            SplitRefusal::InvalidDerivative => "derivative of PDF not finite",
        };
        f.write_str(text)
    }
}

/// Why a construction point was dropped during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Outside the domain
    OutsideDomain,
    /// Not strictly larger than its predecessor
    NotIncreasing,
    /// Redundant zero-density point outside the support
    OutsideSupport,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::OutsideDomain => "point outside domain",
            SkipReason::NotIncreasing => "points not strictly increasing",
            SkipReason::OutsideSupport => "point outside support of PDF",
        };
        f.write_str(text)
    }
}

/// Which envelope bound was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// `pdf(x) > hat(x)`
    AboveHat,
    /// `pdf(x) < squeeze(x)`
    BelowSqueeze,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::AboveHat => "PDF above hat",
            ViolationKind::BelowSqueeze => "PDF below squeeze",
        })
    }
}

/// An observed envelope violation (verify mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyViolation {
    /// Kind of violation
    pub kind: ViolationKind,
    /// Sample location
    pub x: f64,
    /// PDF at `x`
    pub fx: f64,
    /// Hat at `x`
    pub hat: f64,
    /// Squeeze at `x`
    pub squeeze: f64,
}

/// Observer trait for monitoring a generator session.
///
/// All methods default to doing nothing. Observers must be `Send` so that a
/// session can be moved to a worker thread.
pub trait Observer: Send {
    /// Called for each construction point that setup drops.
    fn on_point_skipped(&mut self, _x: f64, _reason: SkipReason) {}

    /// Called once when setup has produced a usable hat.
    fn on_setup_complete(&mut self, _summary: &SetupSummary) {}

    /// Called after every successful split or chop.
    fn on_interval_split(&mut self, _event: &SplitEvent) {}

    /// Called when a split request is refused. Sampling continues with the
    /// unmodified hat.
    fn on_split_refused(&mut self, _x: f64, _reason: SplitRefusal) {}

    /// Called in verify mode when the PDF escapes the envelope at `x`.
    fn on_verify_violation(&mut self, _violation: &VerifyViolation) {}

    /// Called once when adaptive splitting stops (ratio reached or interval
    /// limit hit).
    fn on_adaptation_stopped(&mut self, _n_intervals: usize, _squeeze_hat_ratio: f64) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn on_point_skipped(&mut self, x: f64, reason: SkipReason) {
        (**self).on_point_skipped(x, reason);
    }

    fn on_setup_complete(&mut self, summary: &SetupSummary) {
        (**self).on_setup_complete(summary);
    }

    fn on_interval_split(&mut self, event: &SplitEvent) {
        (**self).on_interval_split(event);
    }

    fn on_split_refused(&mut self, x: f64, reason: SplitRefusal) {
        (**self).on_split_refused(x, reason);
    }

    fn on_verify_violation(&mut self, violation: &VerifyViolation) {
        (**self).on_verify_violation(violation);
    }

    fn on_adaptation_stopped(&mut self, n_intervals: usize, squeeze_hat_ratio: f64) {
        (**self).on_adaptation_stopped(n_intervals, squeeze_hat_ratio);
    }
}
