//! Subcommands of the `tdr` binary

pub mod inspect;
pub mod sample;
pub mod validate;
