//! CLI infrastructure for the `tdr` tool
//!
//! This module provides the command-line interface for drawing variates,
//! inspecting generated hats and validating samples against reference
//! distributions.

pub mod commands;
pub mod config;
pub mod output;
