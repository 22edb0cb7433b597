//! Ports (trait boundaries) between the TDR engine and its collaborators.
//!
//! The engine owns these traits; densities, random number generators and
//! event sinks are plugged in from outside.

pub mod density;
pub mod observer;
pub mod uniform;

pub use density::{Density, FnDensity};
pub use observer::{NullObserver, Observer};
pub use uniform::UniformSource;
