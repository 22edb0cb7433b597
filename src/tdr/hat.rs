//! The hat/squeeze envelope over the whole domain
//!
//! [`Hat`] owns the interval arena, the chain head, the area totals and the
//! guide table. Setup builds it; the splitter is the only code that mutates
//! it afterwards.

use crate::{
    Error, Result,
    tdr::{
        Transform,
        guide::{GuideTable, accumulate},
        interval::{Interval, IntervalStore},
    },
    types::{IntervalId, IntervalSummary, SqueezeRatio},
    utils::fp_approx,
};

/// Piecewise envelope of a T-concave density.
#[derive(Debug, Clone)]
pub struct Hat {
    pub(crate) transform: Transform,
    pub(crate) store: IntervalStore,
    pub(crate) head: IntervalId,
    pub(crate) n_intervals: usize,
    pub(crate) hat_area: f64,
    pub(crate) squeeze_area: f64,
    pub(crate) guide: GuideTable,
    guide_factor: f64,
}

impl Hat {
    /// Link evaluated construction points into a chain. Areas stay zero until
    /// the interval parameters are computed and [`refresh`](Self::refresh) runs.
    ///
    /// `points` must hold at least two entries.
    pub(crate) fn from_points(transform: Transform, points: &[Interval], guide_factor: f64) -> Self {
        let mut store = IntervalStore::new();
        let head = store.alloc(points[0]);
        let mut last = head;
        for point in &points[1..] {
            last = store.insert_after(last, *point);
        }

        let totals = accumulate(&mut store, head);
        let guide = GuideTable::build(&store, head, &totals, guide_factor);
        Self {
            transform,
            store,
            head,
            n_intervals: totals.n_intervals,
            hat_area: totals.hat_area,
            squeeze_area: totals.squeeze_area,
            guide,
            guide_factor,
        }
    }

    /// Recompute cumulative areas, totals and the guide table.
    pub(crate) fn refresh(&mut self) {
        let totals = accumulate(&mut self.store, self.head);
        self.n_intervals = totals.n_intervals;
        self.hat_area = totals.hat_area;
        self.squeeze_area = totals.squeeze_area;
        self.guide = GuideTable::build(&self.store, self.head, &totals, self.guide_factor);
    }

    /// The transform in use.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Number of non-terminal intervals.
    pub fn n_intervals(&self) -> usize {
        self.n_intervals
    }

    /// Total area below the hat.
    pub fn hat_area(&self) -> f64 {
        self.hat_area
    }

    /// Total area below the squeeze.
    pub fn squeeze_area(&self) -> f64 {
        self.squeeze_area
    }

    /// Squeeze area over hat area.
    pub fn ratio(&self) -> SqueezeRatio {
        SqueezeRatio::from_areas(self.squeeze_area, self.hat_area)
    }

    /// Left and right end of the envelope.
    pub fn bounds(&self) -> (f64, f64) {
        let left = self.store[self.head].x;
        let right = self
            .store
            .chain(self.head)
            .last()
            .map_or(left, |(_, iv)| iv.x);
        (left, right)
    }

    /// The guide table.
    pub fn guide(&self) -> &GuideTable {
        &self.guide
    }

    /// Non-terminal intervals in order.
    pub(crate) fn intervals(&self) -> impl Iterator<Item = (IntervalId, &Interval)> {
        self.store
            .chain(self.head)
            .filter(|(_, iv)| !iv.is_terminal())
    }

    /// The non-terminal interval containing `x`, if `x` lies inside the
    /// envelope's range.
    pub(crate) fn find(&self, x: f64) -> Option<IntervalId> {
        if x.is_nan() {
            return None;
        }
        self.intervals()
            .find(|(_, iv)| {
                iv.next
                    .is_some_and(|next| iv.x <= x && x <= self.store[next].x)
            })
            .map(|(id, _)| id)
    }

    /// Hat value of interval `id` at `x` (which must lie in the interval).
    pub(crate) fn hat_in(&self, id: IntervalId, x: f64) -> f64 {
        let iv = &self.store[id];
        let Some(next) = iv.next else { return 0.0 };
        let nx = &self.store[next];

        if x <= iv.ip && !iv.has_vertical_tangent() {
            self.transform.line_value(iv.x, iv.tfx, iv.dtfx, x)
        } else if !nx.has_vertical_tangent() {
            self.transform.line_value(nx.x, nx.tfx, nx.dtfx, x)
        } else {
            0.0
        }
    }

    /// Squeeze value of interval `id` at `x` (which must lie in the interval).
    pub(crate) fn squeeze_in(&self, id: IntervalId, x: f64) -> f64 {
        let iv = &self.store[id];
        let Some(next) = iv.next else { return 0.0 };
        if iv.fx > 0.0 && self.store[next].fx > 0.0 {
            self.transform.line_value(iv.x, iv.tfx, iv.sq, x)
        } else {
            0.0
        }
    }

    /// Hat value at `x`; zero outside the envelope.
    pub fn eval_hat(&self, x: f64) -> f64 {
        self.find(x).map_or(0.0, |id| self.hat_in(id, x))
    }

    /// Squeeze value at `x`; zero outside the envelope.
    pub fn eval_squeeze(&self, x: f64) -> f64 {
        self.find(x).map_or(0.0, |id| self.squeeze_in(id, x))
    }

    /// Invert the hat inside interval `id` at residual area `r`.
    ///
    /// Left of the division point the left tangent is integrated rightwards
    /// from `x_i`; otherwise the right tangent is integrated leftwards from
    /// `x_{i+1}`. Returns the point and the hat value there, or `None` when
    /// round-off pushed the point out of the interval.
    pub(crate) fn invert_in(&self, id: IntervalId, r: f64) -> Option<(f64, f64)> {
        let iv = &self.store[id];
        let nx = &self.store[iv.next?];
        let t = self.transform;

        let (x, hx) = if r < iv.ahatl {
            let x = t.invert_area(iv.x, iv.fx, iv.tfx, iv.dtfx, r);
            (x, t.line_value(iv.x, iv.tfx, iv.dtfx, x))
        } else {
            let x = t.invert_area(nx.x, nx.fx, nx.tfx, nx.dtfx, -(iv.ahat() - r));
            (x, t.line_value(nx.x, nx.tfx, nx.dtfx, x))
        };

        if !x.is_finite() || x < iv.x || x > nx.x || !hx.is_finite() {
            return None;
        }
        Some((x, hx))
    }

    /// Locate the interval for uniform `u` and return it together with the
    /// residual area inside it.
    pub(crate) fn select(&self, u: f64) -> (IntervalId, f64) {
        let id = self.guide.locate(&self.store, u);
        let iv = &self.store[id];
        let ahat = iv.ahat();
        let r = (u * self.hat_area - (iv.acum - ahat)).clamp(0.0, ahat);
        (id, r)
    }

    /// Inverse CDF of the normalized hat.
    ///
    /// `u` is clamped to `[0, 1]`; `u = 1` maps to the right end of the last
    /// interval with positive hat area.
    pub fn quantile(&self, u: f64) -> f64 {
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let (id, r) = self.select(u);
        match self.invert_in(id, r) {
            Some((x, _)) => x,
            None => {
                // round-off at the very end of the range
                let iv = &self.store[id];
                let end = iv.next.map_or(iv.x, |next| self.store[next].x);
                if r >= iv.ahat() { end } else { iv.x }
            }
        }
    }

    /// Serializable view of every non-terminal interval.
    pub fn summaries(&self) -> Vec<IntervalSummary> {
        self.intervals()
            .map(|(_, iv)| {
                let x_next = iv.next.map_or(iv.x, |next| self.store[next].x);
                IntervalSummary {
                    x: iv.x,
                    x_next,
                    fx: iv.fx,
                    dtfx: iv.dtfx.is_finite().then_some(iv.dtfx),
                    division_point: iv.ip,
                    hat_left: iv.ahatl,
                    hat_right: iv.ahatr,
                    squeeze: iv.asqueeze,
                    cumulative: iv.acum,
                }
            })
            .collect()
    }

    /// Verify every structural invariant of the envelope.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] naming the first broken invariant.
    pub fn check_invariants(&self, max_intervals: usize) -> Result<()> {
        let violation = |message: String| Err(Error::InvariantViolation { message });

        let mut count = 0usize;
        let mut running = 0.0f64;
        let mut squeeze = 0.0f64;
        let mut prev: Option<&Interval> = None;

        for (id, iv) in self.store.chain(self.head) {
            if !self.store.is_live(id) {
                return violation(format!("interval {id} linked but released"));
            }
            if let Some(p) = prev {
                if !(iv.x > p.x) {
                    return violation(format!(
                        "construction points not increasing: {} then {}",
                        p.x, iv.x
                    ));
                }
            }
            if iv.is_terminal() {
                if iv.acum != f64::INFINITY || iv.ahat() != 0.0 || iv.asqueeze != 0.0 {
                    return violation(format!("terminal interval at {} carries area", iv.x));
                }
            } else {
                count += 1;
                let ahat = iv.ahat();
                if !(ahat >= 0.0 && ahat.is_finite()) {
                    return violation(format!("hat area {ahat} at {} not finite", iv.x));
                }
                if iv.asqueeze > ahat && !fp_approx(iv.asqueeze, ahat) {
                    return violation(format!(
                        "squeeze area {} exceeds hat area {ahat} at {}",
                        iv.asqueeze, iv.x
                    ));
                }
                if let Some(p) = prev {
                    if iv.acum < p.acum {
                        return violation(format!("cumulative area decreases at {}", iv.x));
                    }
                }
                running += ahat;
                squeeze += iv.asqueeze;
                if !fp_approx(iv.acum, running) {
                    return violation(format!(
                        "cumulative area {} at {} differs from running sum {running}",
                        iv.acum, iv.x
                    ));
                }
            }
            prev = Some(iv);
        }

        if count != self.n_intervals {
            return violation(format!(
                "interval count {} differs from chain length {count}",
                self.n_intervals
            ));
        }
        if count > max_intervals {
            return violation(format!("{count} intervals exceed maximum {max_intervals}"));
        }
        if !fp_approx(running, self.hat_area) || !fp_approx(squeeze, self.squeeze_area) {
            return violation(format!(
                "stored totals ({}, {}) differ from sums ({running}, {squeeze})",
                self.hat_area, self.squeeze_area
            ));
        }

        self.check_guide()
    }

    fn check_guide(&self) -> Result<()> {
        let size = self.guide.len();
        if size == 0 {
            return Err(Error::InvariantViolation {
                message: "guide table is empty".into(),
            });
        }
        for (j, &slot) in self.guide.slots().iter().enumerate() {
            let target = j as f64 * self.hat_area / size as f64;
            let iv = &self.store[slot];
            if iv.is_terminal() {
                return Err(Error::InvariantViolation {
                    message: format!("guide slot {j} points at the terminal interval"),
                });
            }
            let is_last = iv
                .next
                .is_some_and(|next| self.store[next].is_terminal());
            if iv.acum < target && !is_last {
                return Err(Error::InvariantViolation {
                    message: format!("guide slot {j} stops short of area {target}"),
                });
            }
            let predecessor = self.intervals().find(|(_, p)| p.next == Some(slot));
            if let Some((_, p)) = predecessor {
                if p.acum >= target {
                    return Err(Error::InvariantViolation {
                        message: format!("guide slot {j} skips past area {target}"),
                    });
                }
            }
        }
        Ok(())
    }
}
