//! Results table: one record per sweep configuration

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use scenecache::{CacheStats, RunOutcome};
use serde::Serialize;

use crate::config::OutputFormat;

/// Outcome of one (TTL window, batch size) configuration
///
/// The first five column names are kept from the historical results files
/// so existing notebooks keep reading them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    #[serde(rename = "Number of Requests")]
    pub requests: u64,

    #[serde(rename = "Cache Expiration")]
    pub ttl_window: u32,

    #[serde(rename = "number of scenes per request")]
    pub batch_size: usize,

    #[serde(rename = "Cold Storage Hits")]
    pub misses: u64,

    #[serde(rename = "Cold Storage Hit Rate")]
    pub miss_rate: f64,

    #[serde(rename = "Served Hits")]
    pub hits: u64,

    #[serde(rename = "Suppressed Hits")]
    pub suppressed: u64,

    #[serde(rename = "Admissions")]
    pub admissions: u64,

    #[serde(rename = "Refused Admissions")]
    pub refused: u64,

    #[serde(rename = "Eviction Cycles")]
    pub eviction_cycles: u64,

    #[serde(rename = "Evicted Scenes")]
    pub evicted: u64,

    #[serde(rename = "Hit Ratio")]
    pub hit_ratio: f64,
}

impl RunRecord {
    pub fn new(ttl_window: u32, batch_size: usize, outcome: RunOutcome, stats: &CacheStats) -> Self {
        Self {
            requests: outcome.requests,
            ttl_window,
            batch_size,
            misses: outcome.misses,
            miss_rate: outcome.miss_rate(),
            hits: stats.hits(),
            suppressed: stats.suppressed(),
            admissions: stats.admissions(),
            refused: stats.refused(),
            eviction_cycles: stats.eviction_cycles(),
            evicted: stats.evicted(),
            hit_ratio: stats.hit_ratio(),
        }
    }
}

/// Order records by ascending miss rate, keeping sweep order among ties
pub fn sort_by_miss_rate(records: &mut [RunRecord]) {
    records.sort_by(|a, b| a.miss_rate.total_cmp(&b.miss_rate));
}

pub fn write_csv<W: Write>(records: &[RunRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_json_lines<W: Write>(records: &[RunRecord], mut writer: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `records` to `path` in the requested format
pub fn write_report(path: &Path, format: OutputFormat, records: &[RunRecord]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating results file {}", path.display()))?;
    let writer = BufWriter::new(file);

    let written = match format {
        OutputFormat::Csv => write_csv(records, writer),
        OutputFormat::Json => write_json_lines(records, writer),
    };
    written.with_context(|| format!("writing results to {}", path.display()))
}
