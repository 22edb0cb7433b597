//! tdr CLI - Sampling from T-concave densities by transformed density rejection
//!
//! This CLI provides a unified interface for:
//! - Drawing variates from built-in densities
//! - Inspecting the hat and squeeze of a generator
//! - Validating samples against reference distributions

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tdr")]
#[command(version, about = "Transformed density rejection sampler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw variates from a density
    Sample(tdrgen::cli::commands::sample::SampleArgs),

    /// Show the intervals, hat and squeeze of a generator
    Inspect(tdrgen::cli::commands::inspect::InspectArgs),

    /// Run a KS test and envelope checks against the reference distribution
    Validate(tdrgen::cli::commands::validate::ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => tdrgen::cli::commands::sample::execute(args),
        Commands::Inspect(args) => tdrgen::cli::commands::inspect::execute(args),
        Commands::Validate(args) => tdrgen::cli::commands::validate::execute(args),
    }
}
