//! The rejection sampling loop
//!
//! Each candidate is drawn from the normalized hat by inversion. It is
//! accepted without evaluating the density when it falls below
//! `min(f(x_i), f(x_{i+1}))` or below the squeeze; otherwise the density
//! is evaluated, the rejected point may split its interval, and the
//! candidate is accepted iff it lies below the density.

use tracing::warn;

use crate::{
    ports::{
        Density, Observer, UniformSource,
        observer::{SplitEvent, SplitRefusal, VerifyViolation, ViolationKind},
    },
    tdr::{
        Tdr,
        splitter::{SplitOutcome, split},
    },
    types::IntervalId,
    utils::{fp_greater, fp_less},
};

impl<D: Density, O: Observer> Tdr<D, O> {
    /// Draw one variate.
    ///
    /// Never fails: refused splits and envelope violations are reported to
    /// the observer and sampling carries on.
    pub fn sample<U: UniformSource + ?Sized>(&mut self, urng: &mut U) -> f64 {
        loop {
            self.stats.candidates += 1;

            let (id, r) = self.hat.select(urng.next_uniform());
            let Some((x, hx)) = self.hat.invert_in(id, r) else {
                self.stats.rejections += 1;
                continue;
            };
            let v = urng.next_uniform() * hx;

            let iv = &self.hat.store[id];
            let lower = match iv.next {
                Some(next) => iv.fx.min(self.hat.store[next].fx),
                None => 0.0,
            };
            let squeeze = self.hat.squeeze_in(id, x);

            let checked = if self.settings.verify {
                let fx = self.evaluate(x);
                self.check_envelope(x, fx, hx, squeeze);
                Some(fx)
            } else {
                None
            };

            if v <= lower {
                self.stats.fast_accepts += 1;
                self.stats.samples += 1;
                return x;
            }
            if v <= squeeze {
                self.stats.squeeze_accepts += 1;
                self.stats.samples += 1;
                return x;
            }

            let fx = match checked {
                Some(fx) => fx,
                None => self.evaluate(x),
            };
            self.adapt(id, x, fx);

            if v <= fx {
                self.stats.density_accepts += 1;
                self.stats.samples += 1;
                return x;
            }
            self.stats.rejections += 1;
        }
    }

    /// Draw `n` variates.
    pub fn sample_n<U: UniformSource + ?Sized>(&mut self, urng: &mut U, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample(urng)).collect()
    }

    /// Evaluate the density at a candidate; broken values count as zero.
    fn evaluate(&mut self, x: f64) -> f64 {
        self.stats.pdf_evaluations += 1;
        let fx = self.density.pdf(x);
        if fx.is_finite() && fx >= 0.0 {
            fx
        } else {
            warn!(x, fx, "PDF returned an invalid value while sampling");
            0.0
        }
    }

    fn check_envelope(&mut self, x: f64, fx: f64, hat: f64, squeeze: f64) {
        let kind = if fp_greater(fx, hat) {
            ViolationKind::AboveHat
        } else if fp_less(fx, squeeze) {
            ViolationKind::BelowSqueeze
        } else {
            return;
        };
        self.stats.violations += 1;
        self.observer.on_verify_violation(&VerifyViolation {
            kind,
            x,
            fx,
            hat,
            squeeze,
        });
    }

    /// Try to improve the hat with the rejected point `x`.
    fn adapt(&mut self, id: IntervalId, x: f64, fx: f64) {
        if !self.adapting {
            return;
        }
        if self.hat.ratio().value() >= self.settings.max_squeeze_ratio {
            self.stop_adapting();
            return;
        }

        let before = self.hat.hat_area;
        let limits = self.settings.sampling_limits();
        match split(&mut self.hat, &self.density, id, x, fx, &limits) {
            outcome @ (SplitOutcome::Split | SplitOutcome::Chopped) => {
                self.stats.splits += 1;
                self.observer.on_interval_split(&SplitEvent {
                    x,
                    fx,
                    chopped: outcome == SplitOutcome::Chopped,
                    n_intervals: self.hat.n_intervals,
                    hat_area_before: before,
                    hat_area: self.hat.hat_area,
                    squeeze_area: self.hat.squeeze_area,
                });
                if self.hat.ratio().value() >= self.settings.max_squeeze_ratio {
                    self.stop_adapting();
                }
            }
            SplitOutcome::Refused(SplitRefusal::MaxIntervals) => {
                self.stats.refused_splits += 1;
                self.observer.on_split_refused(x, SplitRefusal::MaxIntervals);
                self.stop_adapting();
            }
            SplitOutcome::Refused(SplitRefusal::SmallArea) => {}
            SplitOutcome::Refused(reason) => {
                self.stats.refused_splits += 1;
                self.observer.on_split_refused(x, reason);
            }
        }
    }

    fn stop_adapting(&mut self) {
        self.adapting = false;
        self.observer
            .on_adaptation_stopped(self.hat.n_intervals, self.hat.ratio().value());
    }
}
