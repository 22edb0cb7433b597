//! Adapters implementing domain ports.
//!
//! This module contains concrete implementations of the traits defined in
//! the ports module: ready-made densities and observers. Following hexagonal
//! architecture, adapters depend on domain ports, not the other way around.

pub mod densities;
pub mod observers;

pub use densities::BuiltinDensity;
pub use observers::{
    ConsoleObserver, FanoutObserver, MetricsObserver, MetricsSummary, TracingObserver,
};
