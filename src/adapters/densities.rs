//! Built-in densities
//!
//! A small catalog of T-concave densities with their derivatives and
//! reference CDFs. The CLI parses them from strings such as `normal:0,1`;
//! the test suite uses them as known targets.

use std::{f64::consts::PI, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use statrs::{
    distribution::{Cauchy, ContinuousCDF, Exp, Gamma, Normal},
    function::gamma::ln_gamma,
};

use crate::{Error, Result, ports::Density};

/// A density from the built-in catalog.
///
/// # Examples
///
/// ```
/// use tdrgen::{adapters::BuiltinDensity, ports::Density};
///
/// let gamma: BuiltinDensity = "gamma:3,2".parse()?;
/// assert_eq!(gamma.mode(), Some(4.0));
/// assert_eq!(gamma.support(), (0.0, f64::INFINITY));
/// assert!((gamma.cdf(4.0) - 0.323_323_583_816_936_5).abs() < 1e-9);
/// # Ok::<(), tdrgen::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BuiltinDensity {
    /// Normal with mean and standard deviation
    Normal { mean: f64, sd: f64 },
    /// Exponential with rate
    Exponential { rate: f64 },
    /// Cauchy with location and scale (T-concave for c = -1/2 only)
    Cauchy { location: f64, scale: f64 },
    /// Gamma with shape >= 1 and scale
    Gamma { shape: f64, scale: f64 },
}

impl BuiltinDensity {
    /// Normal density.
    pub fn normal(mean: f64, sd: f64) -> Self {
        BuiltinDensity::Normal { mean, sd }
    }

    /// Exponential density on `[0, inf)`.
    pub fn exponential(rate: f64) -> Self {
        BuiltinDensity::Exponential { rate }
    }

    /// Cauchy density.
    pub fn cauchy(location: f64, scale: f64) -> Self {
        BuiltinDensity::Cauchy { location, scale }
    }

    /// Gamma density on `[0, inf)`.
    pub fn gamma(shape: f64, scale: f64) -> Self {
        BuiltinDensity::Gamma { shape, scale }
    }

    /// Family name as used in density strings.
    pub fn family(&self) -> &'static str {
        match self {
            BuiltinDensity::Normal { .. } => "normal",
            BuiltinDensity::Exponential { .. } => "exponential",
            BuiltinDensity::Cauchy { .. } => "cauchy",
            BuiltinDensity::Gamma { .. } => "gamma",
        }
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// [`Error::ParseDensity`] describing the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::ParseDensity {
                    input: self.to_string(),
                    reason: format!("{name} must be positive and finite, got {v}"),
                })
            }
        };
        let finite = |name: &str, v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(Error::ParseDensity {
                    input: self.to_string(),
                    reason: format!("{name} must be finite, got {v}"),
                })
            }
        };

        match *self {
            BuiltinDensity::Normal { mean, sd } => {
                finite("mean", mean)?;
                positive("sd", sd)
            }
            BuiltinDensity::Exponential { rate } => positive("rate", rate),
            BuiltinDensity::Cauchy { location, scale } => {
                finite("location", location)?;
                positive("scale", scale)
            }
            BuiltinDensity::Gamma { shape, scale } => {
                positive("scale", scale)?;
                if shape >= 1.0 && shape.is_finite() {
                    Ok(())
                } else {
                    Err(Error::ParseDensity {
                        input: self.to_string(),
                        reason: format!("shape must be >= 1 for a T-concave density, got {shape}"),
                    })
                }
            }
        }
    }

    /// Reference CDF. Returns NaN for invalid parameters.
    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            BuiltinDensity::Normal { mean, sd } => {
                Normal::new(mean, sd).map_or(f64::NAN, |d| d.cdf(x))
            }
            BuiltinDensity::Exponential { rate } => Exp::new(rate).map_or(f64::NAN, |d| d.cdf(x)),
            BuiltinDensity::Cauchy { location, scale } => {
                Cauchy::new(location, scale).map_or(f64::NAN, |d| d.cdf(x))
            }
            BuiltinDensity::Gamma { shape, scale } => {
                Gamma::new(shape, 1.0 / scale).map_or(f64::NAN, |d| d.cdf(x))
            }
        }
    }
}

impl Density for BuiltinDensity {
    fn pdf(&self, x: f64) -> f64 {
        match *self {
            BuiltinDensity::Normal { mean, sd } => {
                let z = (x - mean) / sd;
                (-0.5 * z * z).exp() / (sd * (2.0 * PI).sqrt())
            }
            BuiltinDensity::Exponential { rate } => {
                if x < 0.0 {
                    0.0
                } else {
                    rate * (-rate * x).exp()
                }
            }
            BuiltinDensity::Cauchy { location, scale } => {
                let z = (x - location) / scale;
                1.0 / (PI * scale * (1.0 + z * z))
            }
            BuiltinDensity::Gamma { shape, scale } => {
                if x < 0.0 {
                    0.0
                } else if x == 0.0 {
                    if shape == 1.0 { 1.0 / scale } else { 0.0 }
                } else {
                    ((shape - 1.0) * x.ln() - x / scale - ln_gamma(shape) - shape * scale.ln())
                        .exp()
                }
            }
        }
    }

    fn dpdf(&self, x: f64) -> f64 {
        match *self {
            BuiltinDensity::Normal { mean, sd } => -(x - mean) / (sd * sd) * self.pdf(x),
            BuiltinDensity::Exponential { rate } => -rate * self.pdf(x),
            BuiltinDensity::Cauchy { location, scale } => {
                let z = (x - location) / scale;
                -2.0 * z / (scale * (1.0 + z * z)) * self.pdf(x)
            }
            BuiltinDensity::Gamma { shape, scale } => {
                if x < 0.0 {
                    0.0
                } else if x == 0.0 {
                    if shape == 1.0 { -1.0 / (scale * scale) } else { 0.0 }
                } else {
                    ((shape - 1.0) / x - 1.0 / scale) * self.pdf(x)
                }
            }
        }
    }

    fn support(&self) -> (f64, f64) {
        match self {
            BuiltinDensity::Normal { .. } | BuiltinDensity::Cauchy { .. } => {
                (f64::NEG_INFINITY, f64::INFINITY)
            }
            BuiltinDensity::Exponential { .. } | BuiltinDensity::Gamma { .. } => {
                (0.0, f64::INFINITY)
            }
        }
    }

    fn mode(&self) -> Option<f64> {
        Some(match *self {
            BuiltinDensity::Normal { mean, .. } => mean,
            BuiltinDensity::Exponential { .. } => 0.0,
            BuiltinDensity::Cauchy { location, .. } => location,
            BuiltinDensity::Gamma { shape, scale } => (shape - 1.0) * scale,
        })
    }
}

impl fmt::Display for BuiltinDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinDensity::Normal { mean, sd } => write!(f, "normal:{mean},{sd}"),
            BuiltinDensity::Exponential { rate } => write!(f, "exponential:{rate}"),
            BuiltinDensity::Cauchy { location, scale } => write!(f, "cauchy:{location},{scale}"),
            BuiltinDensity::Gamma { shape, scale } => write!(f, "gamma:{shape},{scale}"),
        }
    }
}

impl FromStr for BuiltinDensity {
    type Err = Error;

    /// Parse `family[:p1[,p2]]`. Missing parameters take the standard values.
    fn from_str(s: &str) -> Result<Self> {
        let fail = |reason: String| Error::ParseDensity {
            input: s.to_string(),
            reason,
        };

        let (family, params) = match s.split_once(':') {
            Some((family, params)) => (family.trim(), params.trim()),
            None => (s.trim(), ""),
        };
        let values = if params.is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(|p| {
                    p.trim()
                        .parse::<f64>()
                        .map_err(|e| fail(format!("bad parameter '{}': {e}", p.trim())))
                })
                .collect::<Result<Vec<f64>>>()?
        };

        let arity = |max: usize| {
            if values.len() > max {
                Err(fail(format!(
                    "{family} takes at most {max} parameter(s), got {}",
                    values.len()
                )))
            } else {
                Ok(())
            }
        };
        let get = |i: usize, default: f64| values.get(i).copied().unwrap_or(default);

        let density = match family.to_ascii_lowercase().as_str() {
            "normal" | "gauss" | "gaussian" => {
                arity(2)?;
                BuiltinDensity::normal(get(0, 0.0), get(1, 1.0))
            }
            "exponential" | "exp" => {
                arity(1)?;
                BuiltinDensity::exponential(get(0, 1.0))
            }
            "cauchy" => {
                arity(2)?;
                BuiltinDensity::cauchy(get(0, 0.0), get(1, 1.0))
            }
            "gamma" => {
                arity(2)?;
                BuiltinDensity::gamma(get(0, 1.0), get(1, 1.0))
            }
            other => return Err(fail(format!("unknown family '{other}'"))),
        };
        density.validate().map_err(|e| match e {
            Error::ParseDensity { reason, .. } => fail(reason),
            other => other,
        })?;
        Ok(density)
    }
}
