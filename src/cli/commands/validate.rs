//! Validate command - Goodness-of-fit and envelope checks

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;

use crate::{
    analysis::{EnvelopeReport, KsTest, check_envelope, ks_test},
    cli::{
        config::GeneratorArgs,
        output::{
            create_sampling_progress, format_number, print_section, print_stats_table,
            print_subsection,
        },
    },
    export,
    types::SamplerStats,
};

const CHUNK: usize = 10_000;

#[derive(Parser, Debug)]
#[command(about = "Check samples against the reference distribution")]
pub struct ValidateArgs {
    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Number of variates for the KS test
    #[arg(long, short = 'n', default_value_t = 100_000)]
    pub count: usize,

    /// Significance level
    #[arg(long, default_value_t = 0.01)]
    pub level: f64,

    /// Number of hat quantiles at which the envelope is checked
    #[arg(long, default_value_t = 1_000)]
    pub check_points: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    density: String,
    level: f64,
    ks: KsTest,
    envelope: EnvelopeReport,
    stats: SamplerStats,
    n_intervals: usize,
    squeeze_hat_ratio: f64,
    passed: bool,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    if !(args.level > 0.0 && args.level < 1.0) {
        bail!("--level must lie in (0, 1), got {}", args.level);
    }

    let mut tdr = args.generator.build()?;
    let mut rng = args.generator.rng();

    let pb = (!args.no_progress && !args.json)
        .then(|| create_sampling_progress(args.count as u64));
    let mut samples = Vec::with_capacity(args.count);
    while samples.len() < args.count {
        let n = CHUNK.min(args.count - samples.len());
        samples.extend(tdr.sample_n(&mut rng, n));
        if let Some(pb) = &pb {
            pb.set_position(samples.len() as u64);
            pb.set_message(format!("ratio {:.4}", tdr.squeeze_hat_ratio()));
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let density = *tdr.density();
    let ks = ks_test(&samples, |x| density.cdf(x))?;
    let envelope = check_envelope(&tdr, args.check_points);
    let passed = !ks.rejects(args.level) && envelope.is_clean();

    let report = ValidationReport {
        density: density.to_string(),
        level: args.level,
        ks,
        envelope,
        stats: tdr.stats().clone(),
        n_intervals: tdr.n_intervals(),
        squeeze_hat_ratio: tdr.squeeze_hat_ratio(),
        passed,
    };

    if args.json {
        export::write_json(std::io::stdout().lock(), &report)?;
    } else {
        print_report(&report);
    }

    if !passed {
        bail!("validation failed for {}", report.density);
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    print_section(&format!("Validation of {}", report.density));

    print_subsection("Kolmogorov-Smirnov");
    print_stats_table(&[
        ("Samples", format_number(report.ks.n as u64)),
        ("Statistic D", format!("{:.6}", report.ks.statistic)),
        ("p-value", format!("{:.4}", report.ks.p_value)),
        (
            "Verdict",
            if report.ks.rejects(report.level) {
                format!("REJECTED at {}", report.level)
            } else {
                format!("not rejected at {}", report.level)
            },
        ),
    ]);

    print_subsection("Envelope");
    print_stats_table(&[
        ("Points checked", report.envelope.points_checked.to_string()),
        ("Above hat", report.envelope.above_hat.to_string()),
        ("Below squeeze", report.envelope.below_squeeze.to_string()),
        ("Max excess", format!("{:.3e}", report.envelope.max_excess)),
    ]);

    print_subsection("Generator");
    print_stats_table(&[
        ("Intervals", report.n_intervals.to_string()),
        ("Squeeze/hat", format!("{:.4}", report.squeeze_hat_ratio)),
        (
            "Acceptance rate",
            format!("{:.4}", report.stats.acceptance_rate()),
        ),
        (
            "PDF calls/sample",
            format!("{:.4}", report.stats.pdf_evaluations_per_sample()),
        ),
        ("Violations", report.stats.violations.to_string()),
    ]);

    println!(
        "\n{}",
        if report.passed { "PASSED" } else { "FAILED" }
    );
}
