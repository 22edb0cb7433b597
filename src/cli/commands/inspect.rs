//! Inspect command - Show the hat and squeeze of a generator

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        config::GeneratorArgs,
        output::{print_interval_table, print_section, print_stats_table, print_subsection},
    },
    export,
    types::IntervalSummary,
};

#[derive(Parser, Debug)]
#[command(about = "Show the intervals of a generator")]
pub struct InspectArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Draw this many variates first so adaptive splitting can refine the hat
    #[arg(long, default_value_t = 0)]
    pub warmup: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the interval table to a file (CSV, or JSON for `.json`)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    density: String,
    c: f64,
    domain: (f64, f64),
    n_intervals: usize,
    hat_area: f64,
    squeeze_area: f64,
    squeeze_hat_ratio: f64,
    intervals: Vec<IntervalSummary>,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let mut tdr = args.generator.build()?;
    if args.warmup > 0 {
        let mut rng = args.generator.rng();
        tdr.sample_n(&mut rng, args.warmup);
    }

    let report = InspectReport {
        density: tdr.density().to_string(),
        c: tdr.settings().transform.c(),
        domain: tdr.domain(),
        n_intervals: tdr.n_intervals(),
        hat_area: tdr.hat_area(),
        squeeze_area: tdr.squeeze_area(),
        squeeze_hat_ratio: tdr.squeeze_hat_ratio(),
        intervals: tdr.intervals(),
    };

    if let Some(path) = &args.export {
        export::export_intervals(path, &report.intervals)?;
    }

    if args.json {
        export::write_json(std::io::stdout().lock(), &report)?;
        return Ok(());
    }

    print_section(&format!("Hat for {}", report.density));
    print_stats_table(&[
        ("Transform c", report.c.to_string()),
        (
            "Domain",
            format!("[{}, {}]", report.domain.0, report.domain.1),
        ),
        ("Intervals", report.n_intervals.to_string()),
        ("Hat area", format!("{:.6}", report.hat_area)),
        ("Squeeze area", format!("{:.6}", report.squeeze_area)),
        ("Squeeze/hat", format!("{:.4}", report.squeeze_hat_ratio)),
        (
            "PDF calls bound",
            format!("{:.4}", tdr.ratio().rejection_bound()),
        ),
    ]);
    print_subsection("Intervals");
    print_interval_table(&report.intervals);
    if let Some(path) = &args.export {
        println!("\nInterval table written to {}", path.display());
    }

    Ok(())
}
