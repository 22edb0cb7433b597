//! Shared configuration for CLI commands

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    adapters::{BuiltinDensity, ConsoleObserver},
    config::{StartingPoints, TdrConfig},
    tdr::Tdr,
};

/// Generator options common to every subcommand
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Density, e.g. `normal:0,1`, `exponential:2`, `cauchy`, `gamma:3,1`
    #[arg(long, short = 'd', default_value = "normal")]
    pub density: String,

    /// JSON file with a generator configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Transform parameter c (0 = log, -0.5 = inverse square root)
    #[arg(long, short = 'c', allow_hyphen_values = true)]
    pub c: Option<f64>,

    /// Number of equiangular starting points
    #[arg(long)]
    pub points: Option<usize>,

    /// Explicit starting points, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub at: Option<Vec<f64>>,

    /// Left domain bound
    #[arg(long, allow_hyphen_values = true)]
    pub left: Option<f64>,

    /// Right domain bound
    #[arg(long, allow_hyphen_values = true)]
    pub right: Option<f64>,

    /// Maximum number of intervals
    #[arg(long)]
    pub max_intervals: Option<usize>,

    /// Squeeze/hat ratio at which adaptive splitting stops
    #[arg(long)]
    pub max_ratio: Option<f64>,

    /// Refine the hat at setup (derandomized adaptive rejection sampling)
    #[arg(long)]
    pub dars: bool,

    /// Check squeeze <= pdf <= hat while sampling
    #[arg(long)]
    pub verify: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl GeneratorArgs {
    /// Parse the `--density` argument
    pub fn density(&self) -> Result<BuiltinDensity> {
        self.density
            .parse()
            .with_context(|| format!("invalid --density '{}'", self.density))
    }

    /// Configuration file (if any) with command line overrides applied
    pub fn tdr_config(&self) -> Result<TdrConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => TdrConfig::default(),
        };

        if let Some(c) = self.c {
            config.c = c;
        }
        if let Some(n) = self.points {
            config.starting_points = StartingPoints::Count(n);
        }
        if let Some(points) = &self.at {
            config.starting_points = StartingPoints::Explicit(points.clone());
        }
        if self.left.is_some() || self.right.is_some() {
            let (l, r) = config
                .domain
                .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
            config.domain = Some((self.left.unwrap_or(l), self.right.unwrap_or(r)));
        }
        if let Some(n) = self.max_intervals {
            config.max_intervals = n;
        }
        if let Some(ratio) = self.max_ratio {
            config.max_squeeze_ratio = ratio;
        }
        if self.dars {
            config.dars = true;
        }
        if self.verify {
            config.verify = true;
        }
        config.validate()?;
        Ok(config)
    }

    /// Set up a generator for the requested density
    pub fn build(&self) -> Result<Tdr<BuiltinDensity, ConsoleObserver>> {
        let density = self.density()?;
        let config = self.tdr_config()?;
        let tdr = Tdr::with_observer(density, &config, ConsoleObserver::new(self.verbose))
            .with_context(|| format!("setting up generator for {density}"))?;
        Ok(tdr)
    }

    /// Seeded (or entropy-seeded) random number generator
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: GeneratorArgs,
    }

    fn parse(argv: &[&str]) -> GeneratorArgs {
        Harness::parse_from(std::iter::once("tdr").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_overrides_apply() {
        let args = parse(&["-d", "exponential:2", "-c", "0", "--at", "0.5,2", "--left", "0"]);
        let config = args.tdr_config().unwrap();
        assert_eq!(config.c, 0.0);
        assert_eq!(
            config.starting_points,
            StartingPoints::Explicit(vec![0.5, 2.0])
        );
        assert_eq!(config.domain, Some((0.0, f64::INFINITY)));
        assert_eq!(args.density().unwrap(), BuiltinDensity::exponential(2.0));
    }

    #[test]
    fn test_negative_c_parses() {
        let args = parse(&["-c", "-0.25"]);
        assert_eq!(args.tdr_config().unwrap().c, -0.25);
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tdr.json");
        fs::write(&path, r#"{ "c": 0.0, "max_intervals": 12 }"#).unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--max-intervals", "20"]);
        let config = args.tdr_config().unwrap();
        assert_eq!(config.c, 0.0);
        assert_eq!(config.max_intervals, 20);
    }

    #[test]
    fn test_build_and_seeded_rng() {
        let args = parse(&["-d", "normal:1,2", "--seed", "7"]);
        let mut tdr = args.build().unwrap();
        let a = tdr.sample(&mut args.rng());
        let mut tdr = args.build().unwrap();
        let b = tdr.sample(&mut args.rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_density_is_reported() {
        let args = parse(&["-d", "weibull"]);
        assert!(args.density().is_err());
    }
}
