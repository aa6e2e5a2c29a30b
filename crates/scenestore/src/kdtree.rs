//! Static k-d tree for nearest-neighbour queries
//!
//! The tree is implicit: `order` holds point indices arranged so that the
//! median of every subrange is its splitting node. No per-node allocation.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::points::PointSet;

/// Candidate kept during a query, ordered by (distance, index)
type Candidate = (OrderedFloat<f64>, usize);

/// Nearest-neighbour index over a borrowed point set
pub struct KdTree<'a> {
    points: &'a PointSet,
    order: Vec<usize>,
}

impl<'a> KdTree<'a> {
    /// Build the index once; queries never modify it
    pub fn build(points: &'a PointSet) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        Self::split(points, &mut order, 0);
        Self { points, order }
    }

    fn split(points: &PointSet, order: &mut [usize], depth: usize) {
        if order.len() <= 1 {
            return;
        }
        let axis = depth % points.dims();
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            points.point(a)[axis]
                .total_cmp(&points.point(b)[axis])
                .then(a.cmp(&b))
        });
        let (left, right) = order.split_at_mut(mid);
        Self::split(points, left, depth + 1);
        Self::split(points, &mut right[1..], depth + 1);
    }

    /// Find the `k` points nearest to `query`
    ///
    /// # Arguments
    /// * `query` - Coordinates to search around
    /// * `k` - Number of neighbours wanted
    ///
    /// # Returns
    /// * `Result<Vec<usize>>` - Up to `min(k, len)` point indices, nearest
    ///   first; equal distances are ordered by ascending index
    pub fn nearest(&self, query: &[f64], k: usize) -> Result<Vec<usize>> {
        if query.len() != self.points.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.points.dims(),
                found: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(&self.order, 0, query, k, &mut heap);

        Ok(heap.into_sorted_vec().into_iter().map(|(_, idx)| idx).collect())
    }

    /// Nearest neighbours of an indexed point (the point itself included)
    pub fn nearest_to(&self, idx: usize, k: usize) -> Result<Vec<usize>> {
        self.nearest(self.points.point(idx), k)
    }

    fn search(
        &self,
        order: &[usize],
        depth: usize,
        query: &[f64],
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        if order.is_empty() {
            return;
        }

        let mid = order.len() / 2;
        let idx = order[mid];
        let point = self.points.point(idx);

        let candidate = (OrderedFloat(squared_distance(point, query)), idx);
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let axis = depth % self.points.dims();
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            (&order[..mid], &order[mid + 1..])
        } else {
            (&order[mid + 1..], &order[..mid])
        };

        self.search(near, depth + 1, query, k, heap);

        // Ties across the plane can still win on index order, so compare inclusively.
        let plane = OrderedFloat(diff * diff);
        if heap.len() < k || heap.peek().is_some_and(|worst| plane <= worst.0) {
            self.search(far, depth + 1, query, k, heap);
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
