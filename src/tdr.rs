//! Transformed density rejection
//!
//! The engine builds a piecewise hat and squeeze of a T-concave density in
//! the transformed scale `T_c(f)`, samples from the hat by inversion and
//! refines the envelope with every rejected candidate.

pub mod builder;
pub mod construction;
pub mod generator;
pub mod guide;
pub mod hat;
pub mod interval;
pub mod params;
pub mod sampler;
pub mod setup;
pub mod splitter;
pub mod transform;

// Re-export main types
pub use builder::TdrBuilder;
pub use generator::Tdr;
pub use hat::Hat;
pub use params::IntervalStatus;
pub use setup::Settings;
pub use transform::Transform;

/// Relative size below which power-transform areas use the linear formula.
pub const POWER_LINEAR_CUTOFF: f64 = 1.0e-8;

/// `|slope * dx|` below which log-transform areas use the linear formula.
pub const LOG_LINEAR_CUTOFF: f64 = 1.0e-12;

/// `|t|` below which `ln(1 + t) / t` is replaced by its Taylor expansion.
pub const LOG_INVERSION_CUTOFF: f64 = 1.0e-8;

/// Round-off allowance for slope comparisons, in units of `|T|/dx`.
pub const SLOPE_ROUNDOFF: f64 = 100.0 * f64::EPSILON;
