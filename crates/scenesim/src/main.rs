//! SceneSim - cache hit-rate sweep over spatially clustered scene requests

mod config;
mod report;
mod sweep;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scenestore::PointSet;
use tracing::info;

use crate::config::{Args, SweepConfig};
use crate::report::{sort_by_miss_rate, write_report};
use crate::sweep::run_sweep;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = SweepConfig::from_args(Args::parse())?;

    info!("Starting SceneSim v{}", env!("CARGO_PKG_VERSION"));
    info!("Scene file: {}", config.input.display());
    info!("Requests per configuration: {}", config.requests);
    info!(
        "TTL windows {}..={}, batch sizes {}..={} ({} configurations)",
        config.ttl_windows.start(),
        config.ttl_windows.end(),
        config.batch_sizes.start(),
        config.batch_sizes.end(),
        config.configurations()
    );
    info!("Self-match policy: {}", config.self_match);

    let points = PointSet::open(&config.input)
        .with_context(|| format!("loading scenes from {}", config.input.display()))?;
    info!("Scene columns: {}", points.columns().join(", "));

    // Log the seed so any sweep can be replayed with --seed
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Random seed: {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut records = run_sweep(&config, &points, &mut rng)?;
    sort_by_miss_rate(&mut records);
    write_report(&config.output, config.format, &records)?;
    info!("Wrote {} results to {}", records.len(), config.output.display());

    println!("\n{:>6} {:>6} {:>10} {:>10}", "ttl", "batch", "cold hits", "rate");
    for record in &records {
        println!(
            "{:>6} {:>6} {:>10} {:>10.3}",
            record.ttl_window, record.batch_size, record.misses, record.miss_rate
        );
    }

    Ok(())
}
