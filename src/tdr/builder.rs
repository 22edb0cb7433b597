//! Builder pattern for generator construction
//!
//! Provides a fluent API for configuring and setting up [`Tdr`] sessions.

use crate::{
    Result,
    adapters::TracingObserver,
    config::{DarsRule, StartingPoints, TdrConfig},
    ports::{Density, Observer},
    tdr::Tdr,
};

/// Builder for [`Tdr`] sessions.
///
/// # Examples
///
/// ```
/// use tdrgen::{TdrBuilder, adapters::BuiltinDensity};
///
/// // Defaults: c = -1/2, ten equiangular starting points
/// let tdr = TdrBuilder::new(BuiltinDensity::normal(0.0, 1.0)).build()?;
///
/// // Log transform on the positive half line with explicit points
/// let tdr = TdrBuilder::new(BuiltinDensity::exponential(1.0))
///     .c(0.0)
///     .domain(0.0, f64::INFINITY)
///     .mode(0.0)
///     .construction_points(vec![0.5, 2.0])
///     .max_intervals(30)
///     .build()?;
/// assert!(tdr.n_intervals() <= 30);
/// # Ok::<(), tdrgen::Error>(())
/// ```
#[derive(Debug)]
pub struct TdrBuilder<D, O = TracingObserver> {
    density: D,
    config: TdrConfig,
    observer: O,
}

impl<D: Density> TdrBuilder<D> {
    /// Start a builder for `density` with the default configuration.
    pub fn new(density: D) -> Self {
        Self {
            density,
            config: TdrConfig::default(),
            observer: TracingObserver::new(),
        }
    }
}

impl<D: Density, O: Observer> TdrBuilder<D, O> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: TdrConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the domain.
    pub fn domain(mut self, left: f64, right: f64) -> Self {
        self.config.domain = Some((left, right));
        self
    }

    /// Set the mode.
    pub fn mode(mut self, mode: f64) -> Self {
        self.config.mode = Some(mode);
        self
    }

    /// Set the center of the equiangular rule.
    pub fn center(mut self, center: f64) -> Self {
        self.config.center = Some(center);
        self
    }

    /// Insert the center as a construction point.
    pub fn use_center(mut self, use_center: bool) -> Self {
        self.config.use_center = use_center;
        self
    }

    /// Set the transform parameter c.
    pub fn c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Use `n` equiangular starting points.
    pub fn starting_points(mut self, n: usize) -> Self {
        self.config.starting_points = StartingPoints::Count(n);
        self
    }

    /// Use explicit starting points.
    pub fn construction_points(mut self, points: Vec<f64>) -> Self {
        self.config.starting_points = StartingPoints::Explicit(points);
        self
    }

    /// Set the maximum number of intervals.
    pub fn max_intervals(mut self, max_intervals: usize) -> Self {
        self.config.max_intervals = max_intervals;
        self
    }

    /// Set the squeeze/hat ratio at which splitting stops.
    pub fn max_squeeze_ratio(mut self, ratio: f64) -> Self {
        self.config.max_squeeze_ratio = ratio;
        self
    }

    /// Set the guide table factor.
    pub fn guide_factor(mut self, factor: f64) -> Self {
        self.config.guide_factor = factor;
        self
    }

    /// Set the minimum relative improvable area for a split.
    pub fn bound_for_adding(mut self, bound: f64) -> Self {
        self.config.bound_for_adding = bound;
        self
    }

    /// Enable or disable verification.
    pub fn verify(mut self, verify: bool) -> Self {
        self.config.verify = verify;
        self
    }

    /// Refine the hat at setup time.
    pub fn dars(mut self, factor: f64, rule: DarsRule) -> Self {
        self.config = self.config.with_dars(factor, rule);
        self
    }

    /// Report to `observer` instead.
    pub fn observer<P: Observer>(self, observer: P) -> TdrBuilder<D, P> {
        TdrBuilder {
            density: self.density,
            config: self.config,
            observer,
        }
    }

    /// The configuration assembled so far.
    pub fn current_config(&self) -> &TdrConfig {
        &self.config
    }

    /// Run the setup.
    ///
    /// # Errors
    ///
    /// Any setup-fatal [`Error`](crate::Error).
    pub fn build(self) -> Result<Tdr<D, O>> {
        Tdr::with_observer(self.density, &self.config, self.observer)
    }
}
