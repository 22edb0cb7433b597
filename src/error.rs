//! Error types for the tdrgen crate
//!
//! Every variant here is a setup-time (or export-time) failure. The sampling
//! loop never returns an error: refused splits and verification failures are
//! reported through the [`Observer`](crate::ports::Observer) port instead.

use thiserror::Error;

/// Main error type for the tdrgen crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid domain [{left}, {right}]: left bound must be smaller than right bound")]
    InvalidDomain { left: f64, right: f64 },

    #[error("unsupported transform parameter c = {c} (expected 0, -0.5 or -1 < c < 0)")]
    InvalidTransform { c: f64 },

    #[error("PDF({x}) = {fx} is negative")]
    NegativeDensity { x: f64, fx: f64 },

    #[error("PDF({x}) = {fx} is not finite")]
    NonFiniteDensity { x: f64, fx: f64 },

    #[error("derivative of PDF at x = {x} is not finite (dPDF = {dfx})")]
    NonFiniteDerivative { x: f64, dfx: f64 },

    #[error(
        "PDF not unimodal around mode {mode}: PDF({x_prev}) = {f_prev} and PDF({x}) = {fx} \
         violate monotonicity"
    )]
    NotUnimodal {
        mode: f64,
        x_prev: f64,
        f_prev: f64,
        x: f64,
        fx: f64,
    },

    #[error("PDF not T-concave on [{x0}, {x1}] (PDF values {f0}, {f1}): {reason}")]
    NotTConcave {
        x0: f64,
        f0: f64,
        x1: f64,
        f1: f64,
        reason: String,
    },

    #[error("hat area still unbounded after reaching {max_intervals} intervals")]
    UnboundedHat { max_intervals: usize },

    #[error("{count} starting intervals exceed max_intervals = {max_intervals}")]
    TooManyIntervals { count: usize, max_intervals: usize },

    #[error("only {usable} usable construction point(s) left, at least 2 are required")]
    TooFewConstructionPoints { usable: usize },

    #[error("hat area {hat_area} is not a positive finite number")]
    DegenerateHat { hat_area: f64 },

    #[error("invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("invalid density string '{input}': {reason}")]
    ParseDensity { input: String, reason: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "write output".to_string(),
            source,
        }
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidConfiguration`].
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// True for errors caused by the density itself rather than by the caller's
    /// configuration.
    pub fn is_density_error(&self) -> bool {
        matches!(
            self,
            Error::NegativeDensity { .. }
                | Error::NonFiniteDensity { .. }
                | Error::NonFiniteDerivative { .. }
                | Error::NotUnimodal { .. }
                | Error::NotTConcave { .. }
                | Error::UnboundedHat { .. }
        )
    }
}
