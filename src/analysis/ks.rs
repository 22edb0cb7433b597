//! Kolmogorov-Smirnov goodness-of-fit test

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Result of a one-sample KS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsTest {
    /// Number of samples
    pub n: usize,
    /// Supremum distance between empirical and reference CDF
    pub statistic: f64,
    /// Asymptotic p-value
    pub p_value: f64,
}

impl KsTest {
    /// True if the null hypothesis is rejected at `level`.
    pub fn rejects(&self, level: f64) -> bool {
        self.p_value < level
    }
}

/// One-sample KS test of `samples` against the continuous CDF `cdf`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] for an empty sample or a sample
/// containing NaN.
pub fn ks_test<F: Fn(f64) -> f64>(samples: &[f64], cdf: F) -> Result<KsTest> {
    if samples.is_empty() {
        return Err(Error::config("KS test needs at least one sample"));
    }
    if samples.iter().any(|x| x.is_nan()) {
        return Err(Error::config("KS test sample contains NaN"));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mut d: f64 = 0.0;
    for (i, &x) in sorted.iter().enumerate() {
        let f = cdf(x).clamp(0.0, 1.0);
        let above = (i + 1) as f64 / n - f;
        let below = f - i as f64 / n;
        d = d.max(above).max(below);
    }

    let sqrt_n = n.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    Ok(KsTest {
        n: sorted.len(),
        statistic: d,
        p_value: kolmogorov_survival(lambda),
    })
}

/// Survival function of the Kolmogorov distribution,
/// `Q(λ) = 2 Σ (-1)^(j-1) exp(-2 j² λ²)`.
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    // the alternating series converges too slowly to matter below this
    if lambda < 0.2 {
        return 1.0;
    }
    let a = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    for j in 1..=100 {
        let j = j as f64;
        let term = sign * (a * j * j).exp();
        sum += term;
        if term.abs() < 1e-12 * sum.abs() {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
