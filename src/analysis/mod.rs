//! Analysis tools for generated samples and envelopes
//!
//! This module provides goodness-of-fit testing against reference CDFs and
//! numerical checks of the hat/squeeze envelope.

pub mod envelope;
pub mod ks;

pub use envelope::{EnvelopeReport, check_envelope};
pub use ks::{KsTest, kolmogorov_survival, ks_test};
