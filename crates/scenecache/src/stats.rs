//! Cache statistics tracking

/// Counters for one cache over its lifetime
///
/// The cache is owned by a single simulation run, so plain counters are
/// enough; [`TtlCache`](crate::TtlCache) updates them through `&mut self`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    lookups: u64,
    hits: u64,
    suppressed: u64,
    admissions: u64,
    refused: u64,
    eviction_cycles: u64,
    evicted: u64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch lookup
    pub fn record_lookup(&mut self) {
        self.lookups += 1;
    }

    /// Record a resident key that was served
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a resident key that was not served
    pub fn record_suppressed(&mut self) {
        self.suppressed += 1;
    }

    /// Record a missing key admitted and served
    pub fn record_admission(&mut self) {
        self.admissions += 1;
    }

    /// Record a missing key that was neither admitted nor served
    pub fn record_refused(&mut self) {
        self.refused += 1;
    }

    /// Record an eviction cycle that removed `count` keys
    pub fn record_eviction_cycle(&mut self, count: usize) {
        self.eviction_cycles += 1;
        self.evicted += count as u64;
    }

    /// Get total batch lookups
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Get resident keys served
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get resident keys suppressed
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Get missing keys admitted
    pub fn admissions(&self) -> u64 {
        self.admissions
    }

    /// Get missing keys refused
    pub fn refused(&self) -> u64 {
        self.refused
    }

    /// Get eviction cycles fired
    pub fn eviction_cycles(&self) -> u64 {
        self.eviction_cycles
    }

    /// Get keys removed by eviction cycles
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Share of requested keys served from residents (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let requested = self.hits + self.suppressed + self.admissions + self.refused;
        if requested == 0 {
            0.0
        } else {
            self.hits as f64 / requested as f64
        }
    }
}
