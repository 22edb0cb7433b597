//! Observer implementations
//!
//! Observers allow composable data collection during setup and sampling
//! without coupling the engine to specific output formats.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::{
    Observer,
    observer::{
        SetupSummary, SkipReason, SplitEvent, SplitRefusal, VerifyViolation, ViolationKind,
    },
};

/// Tracing observer - Forwards every event to `tracing`
///
/// Splits and setup summaries are `debug!` events; skipped points, refused
/// splits and verification violations are `warn!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new() -> Self {
        TracingObserver
    }
}

impl Observer for TracingObserver {
    fn on_point_skipped(&mut self, x: f64, reason: SkipReason) {
        warn!(x, %reason, "construction point skipped");
    }

    fn on_setup_complete(&mut self, summary: &SetupSummary) {
        debug!(
            n_intervals = summary.n_intervals,
            hat_area = summary.hat_area,
            squeeze_area = summary.squeeze_area,
            added_for_bounded_hat = summary.points_added_for_bounded_hat,
            added_by_dars = summary.points_added_by_dars,
            "generator ready"
        );
    }

    fn on_interval_split(&mut self, event: &SplitEvent) {
        debug!(
            x = event.x,
            fx = event.fx,
            chopped = event.chopped,
            n_intervals = event.n_intervals,
            hat_area = event.hat_area,
            squeeze_area = event.squeeze_area,
            "interval split"
        );
    }

    fn on_split_refused(&mut self, x: f64, reason: SplitRefusal) {
        warn!(x, %reason, "split refused");
    }

    fn on_verify_violation(&mut self, violation: &VerifyViolation) {
        let what = match violation.kind {
            ViolationKind::AboveHat => "PDF(x) > hat(x)",
            ViolationKind::BelowSqueeze => "PDF(x) < squeeze(x)",
        };
        warn!(
            x = violation.x,
            fx = violation.fx,
            hat = violation.hat,
            squeeze = violation.squeeze,
            "{what}: PDF not T-concave"
        );
    }

    fn on_adaptation_stopped(&mut self, n_intervals: usize, squeeze_hat_ratio: f64) {
        debug!(n_intervals, squeeze_hat_ratio, "adaptive splitting stopped");
    }
}

/// Metrics observer - Counts events
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    skipped_points: usize,
    setups: usize,
    splits: usize,
    chops: usize,
    refusals: usize,
    refusals_not_t_concave: usize,
    violations_above_hat: usize,
    violations_below_squeeze: usize,
    last_setup: Option<SetupSummary>,
    stopped_at: Option<(usize, f64)>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed setups
    pub fn setups(&self) -> usize {
        self.setups
    }

    /// Number of successful splits (excluding chops)
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Number of chops
    pub fn chops(&self) -> usize {
        self.chops
    }

    /// Number of refused split requests
    pub fn refusals(&self) -> usize {
        self.refusals
    }

    /// Number of verification violations of either kind
    pub fn violations(&self) -> usize {
        self.violations_above_hat + self.violations_below_squeeze
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            skipped_points: self.skipped_points,
            setups: self.setups,
            splits: self.splits,
            chops: self.chops,
            refusals: self.refusals,
            refusals_not_t_concave: self.refusals_not_t_concave,
            violations_above_hat: self.violations_above_hat,
            violations_below_squeeze: self.violations_below_squeeze,
            setup: self.last_setup.clone(),
            adaptation_stopped_at: self.stopped_at.map(|(n, _)| n),
            final_ratio: self.stopped_at.map(|(_, r)| r),
        }
    }
}

/// Summary of collected metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub skipped_points: usize,
    pub setups: usize,
    pub splits: usize,
    pub chops: usize,
    pub refusals: usize,
    pub refusals_not_t_concave: usize,
    pub violations_above_hat: usize,
    pub violations_below_squeeze: usize,
    pub setup: Option<SetupSummary>,
    pub adaptation_stopped_at: Option<usize>,
    pub final_ratio: Option<f64>,
}

impl Observer for MetricsObserver {
    fn on_point_skipped(&mut self, _x: f64, _reason: SkipReason) {
        self.skipped_points += 1;
    }

    fn on_setup_complete(&mut self, summary: &SetupSummary) {
        self.setups += 1;
        self.last_setup = Some(summary.clone());
    }

    fn on_interval_split(&mut self, event: &SplitEvent) {
        if event.chopped {
            self.chops += 1;
        } else {
            self.splits += 1;
        }
    }

    fn on_split_refused(&mut self, _x: f64, reason: SplitRefusal) {
        self.refusals += 1;
        if reason == SplitRefusal::NotTConcave {
            self.refusals_not_t_concave += 1;
        }
    }

    fn on_verify_violation(&mut self, violation: &VerifyViolation) {
        match violation.kind {
            ViolationKind::AboveHat => self.violations_above_hat += 1,
            ViolationKind::BelowSqueeze => self.violations_below_squeeze += 1,
        }
    }

    fn on_adaptation_stopped(&mut self, n_intervals: usize, squeeze_hat_ratio: f64) {
        self.stopped_at = Some((n_intervals, squeeze_hat_ratio));
    }
}

/// Console observer - Prints warnings (and, when verbose, progress) to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    /// Create a new console observer
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Observer for ConsoleObserver {
    fn on_point_skipped(&mut self, x: f64, reason: SkipReason) {
        eprintln!("warning: construction point {x} skipped ({reason})");
    }

    fn on_setup_complete(&mut self, summary: &SetupSummary) {
        if self.verbose {
            eprintln!(
                "setup: {} intervals, hat area {:.6}, squeeze area {:.6}",
                summary.n_intervals, summary.hat_area, summary.squeeze_area
            );
        }
    }

    fn on_interval_split(&mut self, event: &SplitEvent) {
        if self.verbose {
            let action = if event.chopped { "chop" } else { "split" };
            eprintln!(
                "{action} at {:.6}: {} intervals, hat area {:.6}",
                event.x, event.n_intervals, event.hat_area
            );
        }
    }

    fn on_split_refused(&mut self, x: f64, reason: SplitRefusal) {
        if self.verbose || reason == SplitRefusal::NotTConcave {
            eprintln!("warning: split at {x} refused ({reason})");
        }
    }

    fn on_verify_violation(&mut self, violation: &VerifyViolation) {
        eprintln!(
            "warning: {} at x = {}: pdf {} hat {} squeeze {}",
            violation.kind, violation.x, violation.fx, violation.hat, violation.squeeze
        );
    }

    fn on_adaptation_stopped(&mut self, n_intervals: usize, squeeze_hat_ratio: f64) {
        if self.verbose {
            eprintln!(
                "adaptation stopped: {n_intervals} intervals, squeeze/hat {squeeze_hat_ratio:.4}"
            );
        }
    }
}

/// Fan-out observer - Forwards every event to several observers in order
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Box<dyn Observer>>,
}

impl FanoutObserver {
    /// Create an empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer (builder style)
    pub fn with<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.push(observer);
        self
    }

    /// Add an observer
    pub fn push<O: Observer + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Number of attached observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True if no observer is attached
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for FanoutObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Observer for FanoutObserver {
    fn on_point_skipped(&mut self, x: f64, reason: SkipReason) {
        for o in &mut self.observers {
            o.on_point_skipped(x, reason);
        }
    }

    fn on_setup_complete(&mut self, summary: &SetupSummary) {
        for o in &mut self.observers {
            o.on_setup_complete(summary);
        }
    }

    fn on_interval_split(&mut self, event: &SplitEvent) {
        for o in &mut self.observers {
            o.on_interval_split(event);
        }
    }

    fn on_split_refused(&mut self, x: f64, reason: SplitRefusal) {
        for o in &mut self.observers {
            o.on_split_refused(x, reason);
        }
    }

    fn on_verify_violation(&mut self, violation: &VerifyViolation) {
        for o in &mut self.observers {
            o.on_verify_violation(violation);
        }
    }

    fn on_adaptation_stopped(&mut self, n_intervals: usize, squeeze_hat_ratio: f64) {
        for o in &mut self.observers {
            o.on_adaptation_stopped(n_intervals, squeeze_hat_ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn split_event(chopped: bool) -> SplitEvent {
        SplitEvent {
            x: 0.5,
            fx: 0.25,
            chopped,
            n_intervals: 4,
            hat_area_before: 2.0,
            hat_area: 1.5,
            squeeze_area: 1.0,
        }
    }

    #[test]
    fn test_metrics_counts() {
        let mut m = MetricsObserver::new();
        m.on_point_skipped(1.0, SkipReason::OutsideDomain);
        m.on_interval_split(&split_event(false));
        m.on_interval_split(&split_event(true));
        m.on_split_refused(0.1, SplitRefusal::NotTConcave);
        m.on_split_refused(0.2, SplitRefusal::MaxIntervals);
        m.on_verify_violation(&VerifyViolation {
            kind: ViolationKind::BelowSqueeze,
            x: 0.0,
            fx: 0.1,
            hat: 1.0,
            squeeze: 0.5,
        });
        m.on_adaptation_stopped(10, 0.97);

        let s = m.summary();
        assert_eq!(s.skipped_points, 1);
        assert_eq!(s.splits, 1);
        assert_eq!(s.chops, 1);
        assert_eq!(s.refusals, 2);
        assert_eq!(s.refusals_not_t_concave, 1);
        assert_eq!(s.violations_below_squeeze, 1);
        assert_eq!(m.violations(), 1);
        assert_eq!(s.adaptation_stopped_at, Some(10));
        assert_eq!(s.final_ratio, Some(0.97));
    }

    /// Forwards split counts into shared state so the test can inspect them
    /// after the fan-out took ownership.
    struct Shared(Arc<Mutex<usize>>);

    impl Observer for Shared {
        fn on_interval_split(&mut self, _event: &SplitEvent) {
            if let Ok(mut n) = self.0.lock() {
                *n += 1;
            }
        }
    }

    #[test]
    fn test_fanout_forwards_to_all() {
        let a = Arc::new(Mutex::new(0));
        let b = Arc::new(Mutex::new(0));
        let mut fanout = FanoutObserver::new()
            .with(Shared(Arc::clone(&a)))
            .with(Shared(Arc::clone(&b)))
            .with(TracingObserver::new());
        assert_eq!(fanout.len(), 3);

        fanout.on_interval_split(&split_event(false));
        fanout.on_interval_split(&split_event(true));
        assert_eq!(*a.lock().unwrap(), 2);
        assert_eq!(*b.lock().unwrap(), 2);
    }

    #[test]
    fn test_violation_kind_display() {
        assert_eq!(ViolationKind::AboveHat.to_string(), "PDF above hat");
    }
}
