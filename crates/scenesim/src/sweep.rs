//! Nested sweep over batch sizes and TTL windows

use anyhow::Result;
use rand::Rng;
use scenecache::{CacheConfig, Simulator, TtlCache};
use scenestore::PointSet;
use tracing::info;

use crate::config::SweepConfig;
use crate::report::RunRecord;

/// Run every configuration of the sweep against one point set
///
/// Batch size is the outer loop and TTL window the inner one. Each
/// configuration gets a fresh cache; the spatial index and the random source
/// are shared by all of them, so a seeded sweep replays exactly.
pub fn run_sweep<R: Rng + ?Sized>(
    config: &SweepConfig,
    points: &PointSet,
    rng: &mut R,
) -> Result<Vec<RunRecord>> {
    let simulator = Simulator::new(points)?.with_self_match(config.self_match);
    let mut records = Vec::with_capacity(config.configurations());

    for batch_size in config.batch_sizes.clone() {
        for ttl_window in config.ttl_windows.clone() {
            let cache_config = CacheConfig::new(ttl_window)
                .with_eviction_fraction(config.eviction_fraction)
                .with_suppression_probability(config.suppression_probability);
            let mut cache = TtlCache::with_config(cache_config)?;

            let outcome = simulator.run(config.requests, batch_size, &mut cache, rng)?;
            info!(
                "ttl={} batch={} cold storage hits {}/{} ({:.3})",
                ttl_window,
                batch_size,
                outcome.misses,
                outcome.requests,
                outcome.miss_rate()
            );

            records.push(RunRecord::new(ttl_window, batch_size, outcome, cache.stats()));
        }
    }

    Ok(records)
}
