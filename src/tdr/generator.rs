//! Generator session
//!
//! A [`Tdr`] owns everything one sampler needs: the density, the resolved
//! configuration, the envelope, the observer and the running statistics.
//! Sessions share nothing, so independent sessions can live on different
//! threads.

use crate::{
    Result,
    adapters::TracingObserver,
    config::TdrConfig,
    ports::{Density, Observer},
    tdr::{
        hat::Hat,
        setup::{Settings, build_hat},
    },
    types::{IntervalSummary, SamplerStats, SqueezeRatio},
};

/// Transformed density rejection generator.
///
/// # Examples
///
/// ```
/// use rand::{SeedableRng, rngs::StdRng};
/// use tdrgen::{FnDensity, Tdr, TdrConfig};
///
/// let density = FnDensity::new(|x: f64| (-0.5 * x * x).exp(), |x: f64| -x * (-0.5 * x * x).exp())
///     .with_mode(0.0);
/// let mut tdr = Tdr::new(density, &TdrConfig::new())?;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let x = tdr.sample(&mut rng);
/// assert!(x.is_finite());
/// assert!(tdr.squeeze_hat_ratio() <= 1.0);
/// # Ok::<(), tdrgen::Error>(())
/// ```
#[derive(Debug)]
pub struct Tdr<D, O = TracingObserver> {
    pub(crate) density: D,
    pub(crate) settings: Settings,
    pub(crate) hat: Hat,
    pub(crate) observer: O,
    pub(crate) stats: SamplerStats,
    pub(crate) adapting: bool,
}

impl<D: Density> Tdr<D, TracingObserver> {
    /// Set up a generator that reports through `tracing`.
    ///
    /// # Errors
    ///
    /// Any setup-fatal [`Error`](crate::Error).
    pub fn new(density: D, config: &TdrConfig) -> Result<Self> {
        Self::with_observer(density, config, TracingObserver::new())
    }
}

impl<D: Density, O: Observer> Tdr<D, O> {
    /// Set up a generator reporting to `observer`.
    ///
    /// # Errors
    ///
    /// Any setup-fatal [`Error`](crate::Error).
    pub fn with_observer(density: D, config: &TdrConfig, mut observer: O) -> Result<Self> {
        let settings = Settings::resolve(config, &density)?;
        let hat = build_hat(&settings, &density, &mut observer)?;
        Ok(Self {
            density,
            settings,
            hat,
            observer,
            stats: SamplerStats::default(),
            adapting: true,
        })
    }

    /// Total area below the hat.
    pub fn hat_area(&self) -> f64 {
        self.hat.hat_area()
    }

    /// Total area below the squeeze.
    pub fn squeeze_area(&self) -> f64 {
        self.hat.squeeze_area()
    }

    /// Squeeze area over hat area, in `[0, 1]`.
    pub fn squeeze_hat_ratio(&self) -> f64 {
        self.hat.ratio().value()
    }

    /// Squeeze ratio as a typed value.
    pub fn ratio(&self) -> SqueezeRatio {
        self.hat.ratio()
    }

    /// Number of intervals.
    pub fn n_intervals(&self) -> usize {
        self.hat.n_intervals()
    }

    /// Domain actually covered by the hat (boundaries may have moved inward
    /// to the support).
    pub fn domain(&self) -> (f64, f64) {
        self.hat.bounds()
    }

    /// Snapshot of every interval.
    pub fn intervals(&self) -> Vec<IntervalSummary> {
        self.hat.summaries()
    }

    /// Hat value at `x`.
    pub fn eval_hat(&self, x: f64) -> f64 {
        self.hat.eval_hat(x)
    }

    /// Squeeze value at `x`.
    pub fn eval_squeeze(&self, x: f64) -> f64 {
        self.hat.eval_squeeze(x)
    }

    /// Inverse CDF of the normalized hat at `u`.
    pub fn hat_quantile(&self, u: f64) -> f64 {
        self.hat.quantile(u)
    }

    /// Sampling statistics so far.
    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    /// Reset the sampling statistics.
    pub fn reset_stats(&mut self) {
        self.stats = SamplerStats::default();
    }

    /// True while rejected candidates may still split intervals.
    pub fn is_adapting(&self) -> bool {
        self.adapting
    }

    /// Turn verification of `squeeze <= pdf <= hat` on or off.
    pub fn set_verify(&mut self, verify: bool) {
        self.settings.verify = verify;
    }

    /// Whether verification is on.
    pub fn verify(&self) -> bool {
        self.settings.verify
    }

    /// The resolved configuration.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The envelope.
    pub fn hat(&self) -> &Hat {
        &self.hat
    }

    /// The density.
    pub fn density(&self) -> &D {
        &self.density
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Give up the session, returning density and observer.
    pub fn into_parts(self) -> (D, O) {
        (self.density, self.observer)
    }

    /// Check every structural invariant of the envelope.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`](crate::Error::InvariantViolation).
    pub fn check_invariants(&self) -> Result<()> {
        self.hat.check_invariants(self.settings.max_intervals)
    }
}
