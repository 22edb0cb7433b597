//! Setup configuration for generator sessions.
//!
//! Every session owns its own copy of a [`TdrConfig`]; there is no process
//! wide state.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, tdr::Transform, utils::extended_float};

/// Default number of equiangular starting points.
pub const DEFAULT_STARTING_POINTS: usize = 10;
/// Default upper bound on the number of intervals.
pub const DEFAULT_MAX_INTERVALS: usize = 50;
/// Default squeeze/hat ratio at which adaptive splitting stops.
pub const DEFAULT_MAX_SQUEEZE_RATIO: f64 = 0.95;
/// Default guide table size per interval.
pub const DEFAULT_GUIDE_FACTOR: f64 = 3.0;
/// Default minimum relative improvable area for a split.
pub const DEFAULT_BOUND_FOR_ADDING: f64 = 0.5;
/// Default DARS threshold relative to the average improvable area.
pub const DEFAULT_DARS_FACTOR: f64 = 0.99;

/// How the first construction points are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingPoints {
    /// `n` points by the equiangular rule around the mode or center
    Count(usize),
    /// Explicit, strictly increasing points
    Explicit(Vec<f64>),
}

impl Default for StartingPoints {
    fn default() -> Self {
        StartingPoints::Count(DEFAULT_STARTING_POINTS)
    }
}

/// Where derandomized adaptive rejection sampling splits an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DarsRule {
    /// At the tangent intersection (arc-mean if that is not finite)
    #[default]
    IntersectionPoint,
    /// At the arc-mean of the end points
    ArcMean,
    /// At the arithmetic mean (arc-mean for unbounded intervals)
    Mean,
}

/// Configuration of a TDR generator session.
///
/// # Examples
///
/// ```
/// use tdrgen::config::{StartingPoints, TdrConfig};
///
/// let config = TdrConfig::new()
///     .with_domain(0.0, f64::INFINITY)
///     .with_mode(0.0)
///     .with_c(0.0)
///     .with_starting_points(StartingPoints::Explicit(vec![0.5, 2.0]))
///     .with_max_intervals(40);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdrConfig {
    /// Domain `(left, right)`; `None` uses the density's support
    #[serde(with = "extended_float::pair")]
    pub domain: Option<(f64, f64)>,
    /// Mode; `None` uses the density's hint (if any)
    pub mode: Option<f64>,
    /// Center for the equiangular rule; defaults to the mode, else 0
    pub center: Option<f64>,
    /// Insert the center as a construction point when no mode is known
    pub use_center: bool,
    /// Transform parameter c
    pub c: f64,
    /// Starting construction points
    pub starting_points: StartingPoints,
    /// Maximum number of intervals
    pub max_intervals: usize,
    /// Stop splitting once squeeze area / hat area reaches this
    pub max_squeeze_ratio: f64,
    /// Guide table size relative to the interval count
    pub guide_factor: f64,
    /// Minimum relative improvable area for an adaptive split
    pub bound_for_adding: f64,
    /// Check squeeze <= pdf <= hat for every evaluated candidate
    pub verify: bool,
    /// Refine the hat at setup time (derandomized adaptive rejection sampling)
    pub dars: bool,
    /// DARS splits intervals above this multiple of the mean improvable area
    pub dars_factor: f64,
    /// DARS split point rule
    pub dars_rule: DarsRule,
}

impl Default for TdrConfig {
    fn default() -> Self {
        Self {
            domain: None,
            mode: None,
            center: None,
            use_center: false,
            c: -0.5,
            starting_points: StartingPoints::default(),
            max_intervals: DEFAULT_MAX_INTERVALS,
            max_squeeze_ratio: DEFAULT_MAX_SQUEEZE_RATIO,
            guide_factor: DEFAULT_GUIDE_FACTOR,
            bound_for_adding: DEFAULT_BOUND_FOR_ADDING,
            verify: false,
            dars: false,
            dars_factor: DEFAULT_DARS_FACTOR,
            dars_rule: DarsRule::default(),
        }
    }
}

impl TdrConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the domain.
    pub fn with_domain(mut self, left: f64, right: f64) -> Self {
        self.domain = Some((left, right));
        self
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: f64) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the center used by the equiangular rule.
    pub fn with_center(mut self, center: f64) -> Self {
        self.center = Some(center);
        self
    }

    /// Insert the center as a construction point.
    pub fn with_use_center(mut self, use_center: bool) -> Self {
        self.use_center = use_center;
        self
    }

    /// Set the transform parameter c.
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set the starting construction points.
    pub fn with_starting_points(mut self, points: StartingPoints) -> Self {
        self.starting_points = points;
        self
    }

    /// Set the maximum number of intervals.
    pub fn with_max_intervals(mut self, max_intervals: usize) -> Self {
        self.max_intervals = max_intervals;
        self
    }

    /// Set the squeeze/hat ratio at which splitting stops.
    pub fn with_max_squeeze_ratio(mut self, ratio: f64) -> Self {
        self.max_squeeze_ratio = ratio;
        self
    }

    /// Set the guide table factor.
    pub fn with_guide_factor(mut self, factor: f64) -> Self {
        self.guide_factor = factor;
        self
    }

    /// Set the minimum relative improvable area for a split.
    pub fn with_bound_for_adding(mut self, bound: f64) -> Self {
        self.bound_for_adding = bound;
        self
    }

    /// Enable or disable verification while sampling.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Enable setup-time refinement with the given factor and rule.
    pub fn with_dars(mut self, factor: f64, rule: DarsRule) -> Self {
        self.dars = true;
        self.dars_factor = factor;
        self.dars_rule = rule;
        self
    }

    /// The transform selected by `c`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransform`] for unsupported values of c.
    pub fn transform(&self) -> Result<Transform> {
        Transform::from_c(self.c)
    }

    /// Check every parameter for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`], [`Error::InvalidDomain`] or
    /// [`Error::InvalidTransform`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.transform()?;

        if let Some((left, right)) = self.domain {
            if left.is_nan() || right.is_nan() || left >= right {
                return Err(Error::InvalidDomain { left, right });
            }
        }
        if let Some(mode) = self.mode {
            if !mode.is_finite() {
                return Err(Error::config(format!("mode {mode} is not finite")));
            }
        }
        if let Some(center) = self.center {
            if !center.is_finite() {
                return Err(Error::config(format!("center {center} is not finite")));
            }
        }
        if self.max_intervals == 0 {
            return Err(Error::config("max_intervals must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.max_squeeze_ratio) {
            return Err(Error::config(format!(
                "max_squeeze_ratio {} must lie in [0, 1]",
                self.max_squeeze_ratio
            )));
        }
        if !(self.guide_factor >= 0.0 && self.guide_factor.is_finite()) {
            return Err(Error::config(format!(
                "guide_factor {} must be finite and >= 0",
                self.guide_factor
            )));
        }
        if !(self.bound_for_adding >= 0.0 && self.bound_for_adding.is_finite()) {
            return Err(Error::config(format!(
                "bound_for_adding {} must be finite and >= 0",
                self.bound_for_adding
            )));
        }
        if !(self.dars_factor >= 0.0 && self.dars_factor.is_finite()) {
            return Err(Error::config(format!(
                "dars_factor {} must be finite and >= 0",
                self.dars_factor
            )));
        }
        if let StartingPoints::Explicit(points) = &self.starting_points {
            if let Some(bad) = points.iter().find(|x| !x.is_finite()) {
                return Err(Error::config(format!("starting point {bad} is not finite")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TdrConfig::default();
        assert_eq!(config.max_intervals, 50);
        assert_eq!(config.max_squeeze_ratio, 0.95);
        assert_eq!(config.guide_factor, 3.0);
        assert_eq!(config.bound_for_adding, 0.5);
        assert!(!config.verify);
        assert_eq!(config.transform().unwrap(), Transform::InvSqrt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_domain_may_be_infinite() {
        let config: TdrConfig =
            serde_json::from_str(r#"{"domain": [0.0, "inf"], "c": 0.0}"#).unwrap();
        assert_eq!(config.domain, Some((0.0, f64::INFINITY)));
        assert_eq!(config.max_intervals, DEFAULT_MAX_INTERVALS);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""domain":[0.0,"inf"]"#), "{json}");
        assert_eq!(serde_json::from_str::<TdrConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_domain() {
        let err = TdrConfig::new().with_domain(1.0, 1.0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidDomain { .. }));
        let err = TdrConfig::new()
            .with_domain(f64::NAN, 1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDomain { .. }));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(TdrConfig::new().with_c(1.0).validate().is_err());
        assert!(TdrConfig::new().with_max_intervals(0).validate().is_err());
        assert!(TdrConfig::new().with_max_squeeze_ratio(1.5).validate().is_err());
        assert!(TdrConfig::new().with_guide_factor(-1.0).validate().is_err());
        assert!(
            TdrConfig::new()
                .with_bound_for_adding(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(TdrConfig::new().with_mode(f64::INFINITY).validate().is_err());
        assert!(
            TdrConfig::new()
                .with_starting_points(StartingPoints::Explicit(vec![0.0, f64::NAN]))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_json_roundtrip_with_partial_input() {
        let config: TdrConfig =
            serde_json::from_str(r#"{"c": 0.0, "max_intervals": 80, "verify": true}"#).unwrap();
        assert_eq!(config.c, 0.0);
        assert_eq!(config.max_intervals, 80);
        assert!(config.verify);
        assert_eq!(config.guide_factor, DEFAULT_GUIDE_FACTOR);

        let config: TdrConfig =
            serde_json::from_str(r#"{"starting_points": {"explicit": [-1.0, 1.0]}}"#).unwrap();
        assert_eq!(
            config.starting_points,
            StartingPoints::Explicit(vec![-1.0, 1.0])
        );
    }
}
