//! TtlCache: request-counted cache with random bulk eviction

use rand::seq::index;
use rand::Rng;
use scenestore::{Error, Result};
use tracing::{debug, trace};

use crate::lru::LruSet;
use crate::stats::CacheStats;

/// Share of resident keys removed by one eviction cycle
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.1;

/// Probability that a resident key is not served on lookup
pub const DEFAULT_SUPPRESSION_PROBABILITY: f64 = 0.1;

/// Construction parameters for [`TtlCache`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Batch lookups between eviction cycles (at least 1)
    pub ttl_window: u32,

    /// Share of residents removed per eviction cycle, in `[0, 1]`
    pub eviction_fraction: f64,

    /// Chance a resident key is withheld from the result, in `[0, 1]`
    pub suppression_probability: f64,
}

impl CacheConfig {
    /// Default configuration for the given TTL window
    pub fn new(ttl_window: u32) -> Self {
        Self {
            ttl_window,
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
            suppression_probability: DEFAULT_SUPPRESSION_PROBABILITY,
        }
    }

    /// Set the eviction fraction
    pub fn with_eviction_fraction(mut self, fraction: f64) -> Self {
        self.eviction_fraction = fraction;
        self
    }

    /// Set the suppression probability
    pub fn with_suppression_probability(mut self, probability: f64) -> Self {
        self.suppression_probability = probability;
        self
    }

    /// Check that every field is in range
    pub fn validate(&self) -> Result<()> {
        if self.ttl_window == 0 {
            return Err(Error::InvalidConfig(
                "ttl_window must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.eviction_fraction) {
            return Err(Error::InvalidConfig(format!(
                "eviction_fraction must be within [0, 1], got {}",
                self.eviction_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.suppression_probability) {
            return Err(Error::InvalidConfig(format!(
                "suppression_probability must be within [0, 1], got {}",
                self.suppression_probability
            )));
        }
        Ok(())
    }
}

/// Scene cache whose lifetime is counted in batch lookups
///
/// Every `ttl_window` lookups a random share of the resident keys is dropped.
/// Resident keys are occasionally withheld from a result to model replicas
/// that have not caught up, without actually being evicted.
pub struct TtlCache {
    /// Resident scene indices in access order
    entries: LruSet<usize>,

    /// Lookups left before the next eviction cycle
    countdown: u32,

    config: CacheConfig,

    stats: CacheStats,
}

impl TtlCache {
    /// Create a cache with default eviction and suppression rates
    ///
    /// # Arguments
    /// * `ttl_window` - Batch lookups between eviction cycles, at least 1
    ///
    /// # Returns
    /// * `Result<TtlCache>` - Empty cache with a full countdown
    pub fn new(ttl_window: u32) -> Result<Self> {
        Self::with_config(CacheConfig::new(ttl_window))
    }

    /// Create a cache from an explicit configuration
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            entries: LruSet::new(),
            countdown: config.ttl_window,
            config,
            stats: CacheStats::new(),
        })
    }

    /// Resolve one batch of requested keys
    ///
    /// Runs the eviction cycle first if the countdown is exhausted, then
    /// resolves keys in order and finally decrements the countdown once.
    /// Random draws happen in exactly that order: eviction sampling, then one
    /// draw per resident key.
    ///
    /// # Arguments
    /// * `keys` - Scene indices requested together (may be empty)
    /// * `rng` - Random source shared with the caller
    ///
    /// # Returns
    /// * `Vec<usize>` - Served keys, an order-preserving subsequence of `keys`
    pub fn lookup_batch<R: Rng + ?Sized>(&mut self, keys: &[usize], rng: &mut R) -> Vec<usize> {
        if self.countdown == 0 {
            self.evict_cycle(rng);
        }

        let mut served = Vec::with_capacity(keys.len());
        for &key in keys {
            if self.entries.contains(&key) {
                if rng.random::<f64>() >= self.config.suppression_probability {
                    served.push(key);
                    self.stats.record_hit();
                } else {
                    trace!(key, "suppressed resident key");
                    self.stats.record_suppressed();
                }
                self.entries.touch(&key);
            } else if self.countdown > 0 {
                served.push(key);
                self.entries.insert(key);
                self.stats.record_admission();
            } else {
                self.stats.record_refused();
            }
        }

        self.countdown = self.countdown.saturating_sub(1);
        self.stats.record_lookup();
        served
    }

    /// Remove a random share of residents and restart the countdown
    ///
    /// Victims are sampled by dense slot position, so one cycle costs
    /// O(count) rather than O(len).
    fn evict_cycle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let len = self.entries.len();
        let count = evict_count(len, self.config.eviction_fraction);

        if count > 0 {
            // Resolve every position before removing: removal moves keys
            let victims: Vec<usize> = index::sample(rng, len, count)
                .into_iter()
                .filter_map(|pos| self.entries.key_at(pos).copied())
                .collect();
            for key in &victims {
                self.entries.remove(key);
            }
        }

        self.countdown = self.config.ttl_window;
        self.stats.record_eviction_cycle(count);
        debug!(evicted = count, remaining = self.entries.len(), "eviction cycle");
    }

    /// Check whether `key` is resident
    pub fn contains(&self, key: usize) -> bool {
        self.entries.contains(&key)
    }

    /// Resident keys from least to most recently used
    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().copied()
    }

    /// Lookups left before the next eviction cycle
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Configured TTL window
    pub fn ttl_window(&self) -> u32 {
        self.config.ttl_window
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of resident keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no keys are resident
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keys removed by one eviction cycle over `len` residents
///
/// At least one key goes whenever the cache is non-empty.
pub fn evict_count(len: usize, fraction: f64) -> usize {
    if len == 0 {
        return 0;
    }
    ((len as f64 * fraction).floor() as usize).clamp(1, len)
}
