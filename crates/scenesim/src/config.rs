//! Sweep configuration: command-line flags layered over an optional TOML file

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use scenecache::{SelfMatch, DEFAULT_EVICTION_FRACTION, DEFAULT_SUPPRESSION_PROBABILITY};
use serde::Deserialize;

const DEFAULT_INPUT: &str = "landsat_scenes_clipped.csv";
const DEFAULT_OUTPUT: &str = "results.csv";
const DEFAULT_REQUESTS: u64 = 500;
const DEFAULT_TTL_WINDOWS: RangeInclusive<u32> = 1..=5;
const DEFAULT_BATCH_SIZES: RangeInclusive<usize> = 2..=10;

/// Results file layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma separated table with a header row
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file with sweep settings (flags take precedence)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scene coordinate file (CSV with a header row)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Results file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Requests issued per configuration
    #[arg(short = 'n', long)]
    pub requests: Option<u64>,

    /// Smallest TTL window (batch lookups between evictions)
    #[arg(long)]
    pub ttl_min: Option<u32>,

    /// Largest TTL window
    #[arg(long)]
    pub ttl_max: Option<u32>,

    /// Smallest number of scenes per request
    #[arg(long)]
    pub batch_min: Option<usize>,

    /// Largest number of scenes per request
    #[arg(long)]
    pub batch_max: Option<usize>,

    /// Seed for the random source (random if omitted)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// How anchors are removed from their batch: coordinates or index
    #[arg(long)]
    pub self_match: Option<SelfMatch>,

    /// Share of cached scenes dropped per eviction cycle
    #[arg(long)]
    pub eviction_fraction: Option<f64>,

    /// Chance a cached scene is not served
    #[arg(long)]
    pub suppression_probability: Option<f64>,

    /// Results file format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Sweep settings as read from a TOML file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub requests: Option<u64>,
    pub ttl_min: Option<u32>,
    pub ttl_max: Option<u32>,
    pub batch_min: Option<usize>,
    pub batch_max: Option<usize>,
    pub seed: Option<u64>,
    pub self_match: Option<String>,
    pub eviction_fraction: Option<f64>,
    pub suppression_probability: Option<f64>,
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Fully resolved settings for one sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub requests: u64,
    pub ttl_windows: RangeInclusive<u32>,
    pub batch_sizes: RangeInclusive<usize>,
    pub seed: Option<u64>,
    pub self_match: SelfMatch,
    pub eviction_fraction: f64,
    pub suppression_probability: f64,
    pub format: OutputFormat,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            requests: DEFAULT_REQUESTS,
            ttl_windows: DEFAULT_TTL_WINDOWS,
            batch_sizes: DEFAULT_BATCH_SIZES,
            seed: None,
            self_match: SelfMatch::default(),
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
            suppression_probability: DEFAULT_SUPPRESSION_PROBABILITY,
            format: OutputFormat::default(),
        }
    }
}

impl SweepConfig {
    /// Resolve defaults, then the config file named in `args`, then the flags
    pub fn from_args(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, args)
    }

    fn resolve(file: FileConfig, args: Args) -> Result<Self> {
        let defaults = Self::default();

        let file_self_match = file
            .self_match
            .as_deref()
            .map(str::parse::<SelfMatch>)
            .transpose()
            .context("invalid self_match in config file")?;

        let ttl_min = args.ttl_min.or(file.ttl_min).unwrap_or(*defaults.ttl_windows.start());
        let ttl_max = args.ttl_max.or(file.ttl_max).unwrap_or(*defaults.ttl_windows.end());
        let batch_min = args
            .batch_min
            .or(file.batch_min)
            .unwrap_or(*defaults.batch_sizes.start());
        let batch_max = args
            .batch_max
            .or(file.batch_max)
            .unwrap_or(*defaults.batch_sizes.end());

        let config = Self {
            input: args.input.or(file.input).unwrap_or(defaults.input),
            output: args.output.or(file.output).unwrap_or(defaults.output),
            requests: args.requests.or(file.requests).unwrap_or(defaults.requests),
            ttl_windows: ttl_min..=ttl_max,
            batch_sizes: batch_min..=batch_max,
            seed: args.seed.or(file.seed),
            self_match: args
                .self_match
                .or(file_self_match)
                .unwrap_or(defaults.self_match),
            eviction_fraction: args
                .eviction_fraction
                .or(file.eviction_fraction)
                .unwrap_or(defaults.eviction_fraction),
            suppression_probability: args
                .suppression_probability
                .or(file.suppression_probability)
                .unwrap_or(defaults.suppression_probability),
            format: args.format.or(file.format).unwrap_or(defaults.format),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.requests == 0 {
            bail!("requests must be at least 1");
        }
        if *self.ttl_windows.start() == 0 || self.ttl_windows.is_empty() {
            bail!(
                "TTL window range {}..={} must be non-empty and start at 1 or more",
                self.ttl_windows.start(),
                self.ttl_windows.end()
            );
        }
        if *self.batch_sizes.start() == 0 || self.batch_sizes.is_empty() {
            bail!(
                "batch size range {}..={} must be non-empty and start at 1 or more",
                self.batch_sizes.start(),
                self.batch_sizes.end()
            );
        }
        Ok(())
    }

    /// Number of (batch size, TTL window) pairs in the sweep
    pub fn configurations(&self) -> usize {
        self.ttl_windows.clone().count() * self.batch_sizes.clone().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SweepConfig::resolve(FileConfig::default(), Args::default()).unwrap();

        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.requests, 500);
        assert_eq!(config.configurations(), 45);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "requests = 100").unwrap();
        writeln!(file, "ttl_max = 8").unwrap();
        writeln!(file, "self_match = \"index\"").unwrap();
        writeln!(file, "format = \"json\"").unwrap();
        file.flush().unwrap();

        let args = Args::parse_from([
            "scenesim",
            "--config",
            file.path().to_str().unwrap(),
            "--requests",
            "250",
            "--seed",
            "11",
        ]);
        let config = SweepConfig::from_args(args).unwrap();

        assert_eq!(config.requests, 250);
        assert_eq!(config.ttl_windows, 1..=8);
        assert_eq!(config.self_match, SelfMatch::Index);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn test_self_match_flag() {
        let args = Args::parse_from(["scenesim", "--self-match", "index", "-f", "json"]);

        assert_eq!(args.self_match, Some(SelfMatch::Index));
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_rejects_unknown_file_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache_size = 10").unwrap();
        file.flush().unwrap();

        assert!(FileConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let zero_ttl = Args {
            ttl_min: Some(0),
            ..Args::default()
        };
        assert!(SweepConfig::resolve(FileConfig::default(), zero_ttl).is_err());

        let inverted = Args {
            batch_min: Some(6),
            batch_max: Some(3),
            ..Args::default()
        };
        assert!(SweepConfig::resolve(FileConfig::default(), inverted).is_err());

        let no_requests = Args {
            requests: Some(0),
            ..Args::default()
        };
        assert!(SweepConfig::resolve(FileConfig::default(), no_requests).is_err());
    }
}
