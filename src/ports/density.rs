//! Density port - the PDF and its derivative, as consumed by the engine
//!
//! The engine never looks inside a density: it only evaluates `pdf` and
//! `dpdf` at real arguments. Implementations must be pure; they may be
//! unnormalized.

/// A (possibly unnormalized) univariate density with a derivative.
///
/// # Contract
///
/// * `pdf(x) >= 0` for every `x` in the domain.
/// * `dpdf(x)` is the derivative of `pdf` at `x`. At a declared mode the
///   engine ignores `dpdf` and uses an exact horizontal tangent.
/// * Both functions are pure and cheap; they are called from the hot path.
///
/// # Examples
///
/// ```
/// use tdrgen::ports::Density;
///
/// struct HalfNormal;
///
/// impl Density for HalfNormal {
///     fn pdf(&self, x: f64) -> f64 {
///         (-0.5 * x * x).exp()
///     }
///
///     fn dpdf(&self, x: f64) -> f64 {
///         -x * (-0.5 * x * x).exp()
///     }
///
///     fn support(&self) -> (f64, f64) {
///         (0.0, f64::INFINITY)
///     }
///
///     fn mode(&self) -> Option<f64> {
///         Some(0.0)
///     }
/// }
/// ```
pub trait Density {
    /// Evaluate the density at `x`.
    fn pdf(&self, x: f64) -> f64;

    /// Evaluate the derivative of the density at `x`.
    fn dpdf(&self, x: f64) -> f64;

    /// Natural support of the density. Used when the configuration does not
    /// set a domain.
    ///
    /// # Default Implementation
    ///
    /// The whole real line.
    fn support(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Location of the mode, if known. Used when the configuration does not
    /// set a mode.
    ///
    /// # Default Implementation
    ///
    /// Unknown.
    fn mode(&self) -> Option<f64> {
        None
    }
}

impl<D: Density + ?Sized> Density for &D {
    fn pdf(&self, x: f64) -> f64 {
        (**self).pdf(x)
    }

    fn dpdf(&self, x: f64) -> f64 {
        (**self).dpdf(x)
    }

    fn support(&self) -> (f64, f64) {
        (**self).support()
    }

    fn mode(&self) -> Option<f64> {
        (**self).mode()
    }
}

impl<D: Density + ?Sized> Density for Box<D> {
    fn pdf(&self, x: f64) -> f64 {
        (**self).pdf(x)
    }

    fn dpdf(&self, x: f64) -> f64 {
        (**self).dpdf(x)
    }

    fn support(&self) -> (f64, f64) {
        (**self).support()
    }

    fn mode(&self) -> Option<f64> {
        (**self).mode()
    }
}

/// Density built from a pair of closures.
///
/// # Examples
///
/// ```
/// use tdrgen::ports::{Density, FnDensity};
///
/// let gauss = FnDensity::new(|x: f64| (-x * x).exp(), |x: f64| -2.0 * x * (-x * x).exp())
///     .with_mode(0.0);
/// assert_eq!(gauss.pdf(0.0), 1.0);
/// assert_eq!(gauss.mode(), Some(0.0));
/// ```
#[derive(Clone)]
pub struct FnDensity<F, G> {
    pdf: F,
    dpdf: G,
    support: (f64, f64),
    mode: Option<f64>,
}

impl<F, G> FnDensity<F, G>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    /// Wrap a PDF and its derivative. Support defaults to the real line.
    pub fn new(pdf: F, dpdf: G) -> Self {
        Self {
            pdf,
            dpdf,
            support: (f64::NEG_INFINITY, f64::INFINITY),
            mode: None,
        }
    }

    /// Set the support hint.
    pub fn with_support(mut self, left: f64, right: f64) -> Self {
        self.support = (left, right);
        self
    }

    /// Set the mode hint.
    pub fn with_mode(mut self, mode: f64) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl<F, G> Density for FnDensity<F, G>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    fn pdf(&self, x: f64) -> f64 {
        (self.pdf)(x)
    }

    fn dpdf(&self, x: f64) -> f64 {
        (self.dpdf)(x)
    }

    fn support(&self) -> (f64, f64) {
        self.support
    }

    fn mode(&self) -> Option<f64> {
        self.mode
    }
}

impl<F, G> std::fmt::Debug for FnDensity<F, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDensity")
            .field("support", &self.support)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
