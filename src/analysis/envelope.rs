//! Numerical checks of the envelope `squeeze <= pdf <= hat`

use serde::{Deserialize, Serialize};

use crate::{
    ports::{Density, Observer},
    tdr::Tdr,
    utils::{fp_greater, fp_less},
};

/// Outcome of probing the envelope at a set of points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeReport {
    pub points_checked: usize,
    pub above_hat: usize,
    pub below_squeeze: usize,
    /// Largest `pdf(x) - hat(x)` seen (0 when the hat always dominates)
    pub max_excess: f64,
    /// Location of `max_excess`
    pub worst_x: Option<f64>,
}

impl EnvelopeReport {
    /// True if no checked point violated either bound.
    pub fn is_clean(&self) -> bool {
        self.above_hat == 0 && self.below_squeeze == 0
    }

    fn record(&mut self, x: f64, fx: f64, hat: f64, squeeze: f64) {
        self.points_checked += 1;
        if fp_greater(fx, hat) {
            self.above_hat += 1;
            if fx - hat > self.max_excess {
                self.max_excess = fx - hat;
                self.worst_x = Some(x);
            }
        } else if fp_less(fx, squeeze) {
            self.below_squeeze += 1;
        }
    }
}

/// Check the envelope of `tdr` at `n` hat quantiles plus every construction
/// point.
///
/// Quantiles of the hat concentrate the checks where candidates are
/// actually drawn, which also covers unbounded domains.
pub fn check_envelope<D: Density, O: Observer>(tdr: &Tdr<D, O>, n: usize) -> EnvelopeReport {
    let mut report = EnvelopeReport::default();
    let density = tdr.density();

    let mut check = |x: f64| {
        let fx = density.pdf(x);
        if fx.is_finite() {
            report.record(x, fx, tdr.eval_hat(x), tdr.eval_squeeze(x));
        }
    };

    for i in 0..n {
        let u = (i as f64 + 0.5) / n as f64;
        check(tdr.hat_quantile(u));
    }
    for iv in tdr.intervals() {
        if iv.x.is_finite() {
            check(iv.x);
        }
    }
    report
}
