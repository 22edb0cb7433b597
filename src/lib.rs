//! Transformed density rejection (TDR)
//!
//! This crate provides:
//! - Automatic hat and squeeze construction for T-concave densities
//!   (`T = log` and `T(x) = -x^c` for `-1 < c < 0`)
//! - A rejection sampler that refines its hat adaptively from rejected
//!   candidates
//! - Optional derandomized refinement at setup time
//! - Structured observation of setup and sampling through the
//!   [`Observer`](ports::Observer) port
//! - Built-in reference densities, goodness-of-fit tests and a CLI
//!
//! # Examples
//!
//! ```
//! use rand::{SeedableRng, rngs::StdRng};
//! use tdrgen::{FnDensity, Tdr, TdrConfig};
//!
//! // standard exponential on [0, inf)
//! let density = FnDensity::new(|x: f64| (-x).exp(), |x: f64| -(-x).exp());
//! let config = TdrConfig::new()
//!     .with_c(0.0)
//!     .with_domain(0.0, f64::INFINITY)
//!     .with_mode(0.0);
//! let mut tdr = Tdr::new(density, &config)?;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let xs = tdr.sample_n(&mut rng, 1_000);
//! assert!(xs.iter().all(|&x| x >= 0.0));
//! # Ok::<(), tdrgen::Error>(())
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod ports;
pub mod tdr;
pub mod types;
pub mod utils;

pub use config::{DarsRule, StartingPoints, TdrConfig};
pub use error::{Error, Result};
pub use ports::{Density, FnDensity, NullObserver, Observer, UniformSource};
pub use tdr::{Tdr, TdrBuilder, Transform};
pub use types::{IntervalId, IntervalSummary, SamplerStats, SqueezeRatio};
