//! Newtype wrappers and plain data records shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::extended_float;

/// Stable index of an interval record inside an
/// [`IntervalStore`](crate::tdr::interval::IntervalStore).
///
/// Indices stay valid while the record is alive; a released index may be
/// handed out again by a later allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalId(usize);

impl IntervalId {
    /// Create an id from a raw slot index.
    pub(crate) const fn new(index: usize) -> Self {
        IntervalId(index)
    }

    /// Get the raw slot index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<IntervalId> for usize {
    fn from(id: IntervalId) -> Self {
        id.0
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A ratio between squeeze area and hat area, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SqueezeRatio(f64);

impl SqueezeRatio {
    /// Build the ratio from the two areas. A non-positive or non-finite hat
    /// area yields zero.
    pub fn from_areas(squeeze_area: f64, hat_area: f64) -> Self {
        if hat_area > 0.0 && hat_area.is_finite() {
            SqueezeRatio((squeeze_area / hat_area).clamp(0.0, 1.0))
        } else {
            SqueezeRatio(0.0)
        }
    }

    /// Get the inner value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Upper bound `1 / ratio - 1` on the expected number of PDF
    /// evaluations (and of rejected candidates) per returned sample.
    ///
    /// Not the rate itself: the exact values divide by the area below the
    /// density, which is unknown but never smaller than the squeeze area.
    pub fn rejection_bound(&self) -> f64 {
        if self.0 > 0.0 {
            1.0 / self.0 - 1.0
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Display for SqueezeRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Read-only view of one interval, as exposed by
/// [`Tdr::intervals`](crate::tdr::Tdr::intervals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    /// Left construction point
    #[serde(with = "extended_float")]
    pub x: f64,
    /// Right construction point (left point of the successor)
    #[serde(with = "extended_float")]
    pub x_next: f64,
    /// PDF at the left construction point
    pub fx: f64,
    /// Slope of the transformed density at `x` (`None` for a vertical tangent)
    pub dtfx: Option<f64>,
    /// Division point between the left and right tangent
    #[serde(with = "extended_float")]
    pub division_point: f64,
    /// Hat area left of the division point
    pub hat_left: f64,
    /// Hat area right of the division point
    pub hat_right: f64,
    /// Squeeze area
    pub squeeze: f64,
    /// Cumulative hat area up to and including this interval
    pub cumulative: f64,
}

impl IntervalSummary {
    /// Total hat area over the interval.
    pub fn hat(&self) -> f64 {
        self.hat_left + self.hat_right
    }

    /// Area between hat and squeeze.
    pub fn improvable(&self) -> f64 {
        self.hat() - self.squeeze
    }
}

/// Counters collected by the rejection loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerStats {
    /// Variates returned
    pub samples: u64,
    /// Candidates generated from the hat
    pub candidates: u64,
    /// Candidates accepted below the smaller end point density
    pub fast_accepts: u64,
    /// Candidates accepted below the squeeze
    pub squeeze_accepts: u64,
    /// Candidates accepted after evaluating the PDF
    pub density_accepts: u64,
    /// Candidates rejected
    pub rejections: u64,
    /// Calls to the PDF made by the sampling loop
    pub pdf_evaluations: u64,
    /// Successful interval splits (including chops)
    pub splits: u64,
    /// Split requests that were refused
    pub refused_splits: u64,
    /// Verification violations observed (verify mode only)
    pub violations: u64,
}

impl SamplerStats {
    /// Observed acceptance rate (samples per candidate).
    pub fn acceptance_rate(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.samples as f64 / self.candidates as f64
        }
    }

    /// Average number of PDF evaluations per returned sample.
    pub fn pdf_evaluations_per_sample(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.pdf_evaluations as f64 / self.samples as f64
        }
    }
}
