//! Sample command - Draw variates from a built-in density

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;

use crate::{
    cli::{
        config::GeneratorArgs,
        output::{create_sampling_progress, format_number, print_section, print_stats_table},
    },
    export,
};

const CHUNK: usize = 10_000;

#[derive(Parser, Debug)]
#[command(about = "Draw variates from a density")]
pub struct SampleArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Number of variates
    #[arg(long, short = 'n', default_value_t = 10)]
    pub count: usize,

    /// Write variates to a file (CSV, or JSON for `.json`) instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print generator statistics afterwards
    #[arg(long)]
    pub stats: bool,
}

pub fn execute(args: SampleArgs) -> Result<()> {
    let mut tdr = args.generator.build()?;
    let mut rng = args.generator.rng();

    match &args.output {
        Some(path) => {
            let pb = (!args.no_progress).then(|| create_sampling_progress(args.count as u64));
            let mut samples = Vec::with_capacity(args.count);
            while samples.len() < args.count {
                let n = CHUNK.min(args.count - samples.len());
                samples.extend(tdr.sample_n(&mut rng, n));
                if let Some(pb) = &pb {
                    pb.set_position(samples.len() as u64);
                    pb.set_message(format!("{} intervals", tdr.n_intervals()));
                }
            }
            if let Some(pb) = pb {
                pb.finish_with_message("done");
            }
            export::export_samples(path, &samples)?;
            println!(
                "Wrote {} samples to {}",
                format_number(args.count as u64),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for _ in 0..args.count {
                writeln!(out, "{}", tdr.sample(&mut rng))?;
            }
            out.flush()?;
        }
    }

    if args.stats {
        let stats = tdr.stats();
        print_section(&format!("Generator statistics ({})", tdr.density()));
        print_stats_table(&[
            ("Intervals", tdr.n_intervals().to_string()),
            ("Hat area", format!("{:.6}", tdr.hat_area())),
            ("Squeeze area", format!("{:.6}", tdr.squeeze_area())),
            ("Squeeze/hat", format!("{:.4}", tdr.squeeze_hat_ratio())),
            ("Samples", format_number(stats.samples)),
            ("Acceptance rate", format!("{:.4}", stats.acceptance_rate())),
            (
                "PDF calls/sample",
                format!("{:.4}", stats.pdf_evaluations_per_sample()),
            ),
            ("Splits", stats.splits.to_string()),
            ("Violations", stats.violations.to_string()),
        ]);
    }

    Ok(())
}
