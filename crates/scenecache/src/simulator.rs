//! Request simulator: spatially clustered batches against a [`TtlCache`]

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use scenestore::{Error, KdTree, PointSet, Result};
use tracing::debug;

use crate::cache::TtlCache;

/// How the anchor itself is removed from its neighbour list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelfMatch {
    /// Drop every neighbour whose coordinates equal the anchor's.
    /// Distinct scenes sharing the anchor's coordinates are dropped too.
    #[default]
    Coordinates,
    /// Drop only the anchor's own index
    Index,
}

impl fmt::Display for SelfMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfMatch::Coordinates => write!(f, "coordinates"),
            SelfMatch::Index => write!(f, "index"),
        }
    }
}

impl FromStr for SelfMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "coordinates" | "coords" => Ok(SelfMatch::Coordinates),
            "index" => Ok(SelfMatch::Index),
            other => Err(Error::InvalidConfig(format!(
                "unknown self-match policy '{}'",
                other
            ))),
        }
    }
}

/// Tally of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Batches issued
    pub requests: u64,
    /// Batches not fully served ("cold storage hits")
    pub misses: u64,
}

impl RunOutcome {
    /// Share of batches that missed (0.0 to 1.0)
    pub fn miss_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.misses as f64 / self.requests as f64
        }
    }
}

/// Drives batch lookups built from nearest neighbours of random anchors
///
/// The k-d tree is built once in [`Simulator::new`] and reused for every
/// request of every run.
pub struct Simulator<'a> {
    points: &'a PointSet,
    tree: KdTree<'a>,
    self_match: SelfMatch,
}

impl<'a> Simulator<'a> {
    /// Index `points` for neighbour queries
    pub fn new(points: &'a PointSet) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyPointSet);
        }

        let tree = KdTree::build(points);
        debug!(points = points.len(), dims = points.dims(), "built spatial index");

        Ok(Self {
            points,
            tree,
            self_match: SelfMatch::default(),
        })
    }

    /// Choose how anchors are removed from their own batch
    pub fn with_self_match(mut self, self_match: SelfMatch) -> Self {
        self.self_match = self_match;
        self
    }

    /// Scene indices requested together for `anchor`
    ///
    /// Looks up `batch_size + 1` neighbours, removes the anchor and truncates
    /// to `batch_size`. Fewer keys come back when the point set is small or
    /// duplicates of the anchor were removed.
    pub fn request_batch(&self, anchor: usize, batch_size: usize) -> Result<Vec<usize>> {
        let origin = self.points.point(anchor);
        let mut batch = self.tree.nearest(origin, batch_size + 1)?;

        match self.self_match {
            SelfMatch::Coordinates => batch.retain(|&idx| self.points.point(idx) != origin),
            SelfMatch::Index => batch.retain(|&idx| idx != anchor),
        }
        batch.truncate(batch_size);

        Ok(batch)
    }

    /// Issue `total_requests` batches against `cache`
    ///
    /// # Arguments
    /// * `total_requests` - Batches to issue, at least 1
    /// * `batch_size` - Keys per batch, at least 1; also the bar a batch must
    ///   reach to count as served
    /// * `cache` - Cache under test, carried across all requests
    /// * `rng` - Random source; the anchor is drawn before each lookup
    ///
    /// # Returns
    /// * `Result<RunOutcome>` - Requests issued and batches that missed
    pub fn run<R: Rng + ?Sized>(
        &self,
        total_requests: u64,
        batch_size: usize,
        cache: &mut TtlCache,
        rng: &mut R,
    ) -> Result<RunOutcome> {
        if total_requests == 0 {
            return Err(Error::InvalidConfig(
                "total_requests must be at least 1".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let mut misses = 0;
        for _ in 0..total_requests {
            let anchor = rng.random_range(0..self.points.len());
            let batch = self.request_batch(anchor, batch_size)?;
            let served = cache.lookup_batch(&batch, rng);
            if served.len() < batch_size {
                misses += 1;
            }
        }

        debug!(
            ttl_window = cache.ttl_window(),
            batch_size,
            total_requests,
            misses,
            "simulation run finished"
        );

        Ok(RunOutcome {
            requests: total_requests,
            misses,
        })
    }
}

/// Build an index over `points` and run one simulation
///
/// # Returns
/// * `Result<u64>` - Number of batches not fully served
pub fn run_simulation<R: Rng + ?Sized>(
    points: &PointSet,
    total_requests: u64,
    batch_size: usize,
    cache: &mut TtlCache,
    rng: &mut R,
) -> Result<u64> {
    let simulator = Simulator::new(points)?;
    let outcome = simulator.run(total_requests, batch_size, cache, rng)?;
    Ok(outcome.misses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{
        evict_count, CacheConfig, DEFAULT_EVICTION_FRACTION, DEFAULT_SUPPRESSION_PROBABILITY,
    };
    use rand::seq::index;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grid(n: usize) -> PointSet {
        let rows: Vec<[f64; 2]> = (0..n * n)
            .map(|i| [(i % n) as f64, (i / n) as f64])
            .collect();
        PointSet::from_rows(rows).unwrap()
    }

    #[test]
    fn test_request_batch_excludes_anchor() {
        let points = grid(5);
        let sim = Simulator::new(&points).unwrap();

        let batch = sim.request_batch(12, 4).unwrap();

        assert_eq!(batch, vec![7, 11, 13, 17]);
    }

    #[test]
    fn test_request_batch_duplicate_coordinates() {
        let points = PointSet::from_rows([[0.0], [0.0], [1.0], [2.0], [3.0]]).unwrap();

        let by_coords = Simulator::new(&points).unwrap();
        assert_eq!(by_coords.request_batch(0, 2).unwrap(), vec![2]);

        let by_index = Simulator::new(&points)
            .unwrap()
            .with_self_match(SelfMatch::Index);
        assert_eq!(by_index.request_batch(0, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_small_point_set_counts_short_batches() {
        let points = PointSet::from_rows([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        let sim = Simulator::new(&points).unwrap();
        let mut cache = TtlCache::new(3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = sim.run(50, 5, &mut cache, &mut rng).unwrap();

        assert_eq!(outcome.requests, 50);
        assert_eq!(outcome.misses, 50);
        assert_eq!(outcome.miss_rate(), 1.0);
    }

    #[test]
    fn test_no_suppression_never_misses() {
        let points = grid(8);
        let sim = Simulator::new(&points).unwrap();
        let config = CacheConfig::new(2).with_suppression_probability(0.0);
        let mut cache = TtlCache::with_config(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = sim.run(300, 4, &mut cache, &mut rng).unwrap();

        assert_eq!(outcome.misses, 0);
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let points = grid(12);
        let run = || {
            let mut cache = TtlCache::new(3).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(2024);
            run_simulation(&points, 500, 5, &mut cache, &mut rng).unwrap()
        };

        let first = run();
        assert_eq!(first, run());
        assert!(first > 0 && first < 500, "misses {}", first);
    }

    /// Plain-vector model of the run loop: residents kept in insertion
    /// order with swap-remove on eviction, draws taken in the same order
    fn reference_misses<R: Rng>(
        sim: &Simulator,
        len: usize,
        total_requests: u64,
        batch_size: usize,
        ttl_window: u32,
        rng: &mut R,
    ) -> u64 {
        let mut resident: Vec<usize> = Vec::new();
        let mut countdown = ttl_window;
        let mut misses = 0;

        for _ in 0..total_requests {
            let anchor = rng.random_range(0..len);
            let batch = sim.request_batch(anchor, batch_size).unwrap();

            if countdown == 0 {
                let count = evict_count(resident.len(), DEFAULT_EVICTION_FRACTION);
                if count > 0 {
                    let victims: Vec<usize> = index::sample(rng, resident.len(), count)
                        .into_iter()
                        .map(|pos| resident[pos])
                        .collect();
                    for victim in victims {
                        let pos = resident.iter().position(|&k| k == victim).unwrap();
                        resident.swap_remove(pos);
                    }
                }
                countdown = ttl_window;
            }

            let mut served = 0;
            for key in batch {
                if resident.contains(&key) {
                    if rng.random::<f64>() >= DEFAULT_SUPPRESSION_PROBABILITY {
                        served += 1;
                    }
                } else if countdown > 0 {
                    resident.push(key);
                    served += 1;
                }
            }
            countdown = countdown.saturating_sub(1);

            if served < batch_size {
                misses += 1;
            }
        }
        misses
    }

    #[test]
    fn test_run_matches_reference_model() {
        let points = grid(12);
        let sim = Simulator::new(&points).unwrap();
        let mut cache = TtlCache::new(3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut twin = rng.clone();

        let outcome = sim.run(500, 5, &mut cache, &mut rng).unwrap();
        let expected = reference_misses(&sim, points.len(), 500, 5, 3, &mut twin);

        assert_eq!(outcome.misses, expected);
        assert!(expected > 0 && expected < 500, "misses {}", expected);
        // Same number of draws consumed by both
        assert_eq!(rng.random::<u64>(), twin.random::<u64>());
    }

    #[test]
    fn test_simulator_reused_across_runs() {
        let points = grid(6);
        let sim = Simulator::new(&points).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for ttl in 1..=3 {
            let mut cache = TtlCache::new(ttl).unwrap();
            let outcome = sim.run(100, 3, &mut cache, &mut rng).unwrap();
            assert!(outcome.misses <= 100);
            assert_eq!(cache.stats().lookups(), 100);
        }
    }

    #[test]
    fn test_rejects_zero_parameters() {
        let points = grid(2);
        let sim = Simulator::new(&points).unwrap();
        let mut cache = TtlCache::new(1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(sim.run(0, 3, &mut cache, &mut rng).is_err());
        assert!(sim.run(10, 0, &mut cache, &mut rng).is_err());
    }

    #[test]
    fn test_self_match_parse() {
        assert_eq!("index".parse::<SelfMatch>().unwrap(), SelfMatch::Index);
        assert_eq!(
            "Coordinates".parse::<SelfMatch>().unwrap(),
            SelfMatch::Coordinates
        );
        assert!("nearest".parse::<SelfMatch>().is_err());
        assert_eq!(SelfMatch::Index.to_string(), "index");
    }
}
