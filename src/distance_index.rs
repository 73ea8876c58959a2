//! Distance lookup tables with point occupancy.
//!
//! For every point the reachable targets are grouped by distance once, in
//! ascending order, so the repeated "nearest free point" queries of the search
//! only walk buckets instead of re-sorting the point set. The depot is never a
//! target.

use crate::error::SearchError;
use crate::problem::{PointKind, Problem};
use std::sync::Arc;

/// Targets at one distance from a point, ascending by id.
#[derive(Debug, Clone)]
struct Bucket {
    distance: u64,
    targets: Vec<usize>,
}

/// Read-only part of the index, shared between attempts.
#[derive(Debug)]
struct DistanceTable {
    n: usize,
    m: usize,
    size: usize,
    matrix: Vec<u64>,
    buckets: Vec<Vec<Bucket>>,
    closest: Vec<Vec<u64>>,
    closest_range: u64,
}

impl DistanceTable {
    fn new(problem: &Problem, closest_range: u64) -> Self {
        let size = problem.point_count();
        let mut matrix = Vec::with_capacity(size * size);
        for row in &problem.distance_matrix {
            matrix.extend_from_slice(row);
        }

        let mut buckets = Vec::with_capacity(size);
        let mut closest = Vec::with_capacity(size);

        for from in 0..size {
            let mut targets: Vec<(u64, usize)> = (1..size)
                .filter(|&to| to != from)
                .map(|to| (matrix[from * size + to], to))
                .collect();
            targets.sort_unstable();

            let mut point_buckets: Vec<Bucket> = Vec::new();
            for (distance, to) in targets {
                match point_buckets.last_mut() {
                    Some(bucket) if bucket.distance == distance => bucket.targets.push(to),
                    _ => point_buckets.push(Bucket {
                        distance,
                        targets: vec![to],
                    }),
                }
            }

            let point_closest = match point_buckets.first() {
                Some(first) => {
                    let limit = first.distance.saturating_mul(closest_range);
                    point_buckets
                        .iter()
                        .map(|bucket| bucket.distance)
                        .take_while(|&distance| distance <= limit)
                        .collect()
                }
                None => Vec::new(),
            };

            buckets.push(point_buckets);
            closest.push(point_closest);
        }

        DistanceTable {
            n: problem.n,
            m: problem.m,
            size,
            matrix,
            buckets,
            closest,
            closest_range,
        }
    }
}

/// Which kinds of points a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowed {
    Supply,
    Demand,
    Any,
}

/// Outcome of a nearest-point query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nearest {
    /// Every free allowed target at the smallest feasible distance.
    Found {
        targets: Vec<usize>,
        distance: u64,
        /// The distance lies in the closest-range set of the origin
        closest: bool,
    },
    /// No free allowed target within reach.
    Exhausted,
}

/// Distance index plus the live occupancy of one search attempt.
///
/// Cloning shares the lookup tables and copies the occupancy.
#[derive(Debug, Clone)]
pub struct DistanceIndex {
    table: Arc<DistanceTable>,
    used: Vec<bool>,
    used_n: usize,
}

impl DistanceIndex {
    /// Build the index for a problem. `closest_range` is the multiple of the
    /// shortest distance from a point up to which distances count as closest.
    pub fn new(problem: &Problem, closest_range: u64) -> Self {
        let table = DistanceTable::new(problem, closest_range);
        let used = vec![false; table.size];

        DistanceIndex {
            table: Arc::new(table),
            used,
            used_n: 0,
        }
    }

    /// An index over the same tables with every point free.
    pub fn fresh(&self) -> Self {
        DistanceIndex {
            table: Arc::clone(&self.table),
            used: vec![false; self.table.size],
            used_n: 0,
        }
    }

    pub fn n(&self) -> usize {
        self.table.n
    }

    pub fn m(&self) -> usize {
        self.table.m
    }

    pub fn point_count(&self) -> usize {
        self.table.size
    }

    pub fn closest_range(&self) -> u64 {
        self.table.closest_range
    }

    pub fn is_supply(&self, point: usize) -> bool {
        point > 0 && point <= self.table.n
    }

    pub fn is_demand(&self, point: usize) -> bool {
        point > self.table.n && point < self.table.size
    }

    pub fn kind(&self, point: usize) -> PointKind {
        if point == 0 {
            PointKind::Depot
        } else if self.is_supply(point) {
            PointKind::Supply
        } else {
            PointKind::Demand
        }
    }

    /// Matrix distance between two points.
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.table.matrix[from * self.table.size + to]
    }

    pub fn is_used(&self, point: usize) -> bool {
        self.used.get(point).copied().unwrap_or(false)
    }

    /// Reserve a point.
    pub fn use_point(&mut self, point: usize) -> Result<(), SearchError> {
        self.check_point(point)?;
        if self.used[point] {
            return Err(SearchError::PointAlreadyUsed(point));
        }

        self.used[point] = true;
        if self.is_supply(point) {
            self.used_n += 1;
        }
        Ok(())
    }

    /// Release a point reserved with [`DistanceIndex::use_point`].
    pub fn free_point(&mut self, point: usize) -> Result<(), SearchError> {
        self.check_point(point)?;
        if !self.used[point] {
            return Err(SearchError::PointNotUsed(point));
        }

        self.used[point] = false;
        if self.is_supply(point) {
            self.used_n -= 1;
        }
        Ok(())
    }

    /// Number of occupied supply points.
    pub fn used_n_points(&self) -> usize {
        self.used_n
    }

    pub fn has_free_n_points(&self) -> bool {
        self.used_n < self.table.n
    }

    /// Occupied points, ascending.
    pub fn used_points(&self) -> Vec<usize> {
        (0..self.table.size).filter(|&p| self.used[p]).collect()
    }

    /// Closest-range distances of a point, ascending.
    pub fn closest_distances(&self, point: usize) -> &[u64] {
        &self.table.closest[point]
    }

    /// Smallest distance from `from`, not above `max_distance`, with at least
    /// one free allowed target. With `forced` only that exact distance is
    /// considered.
    pub fn nearest(
        &self,
        from: usize,
        max_distance: u64,
        allowed: Allowed,
        forced: Option<u64>,
    ) -> Nearest {
        let buckets = &self.table.buckets[from];
        let candidates = match forced {
            Some(distance) => match buckets.binary_search_by_key(&distance, |b| b.distance) {
                Ok(i) => &buckets[i..=i],
                Err(_) => &buckets[..0],
            },
            None => &buckets[..],
        };

        for bucket in candidates {
            if bucket.distance > max_distance {
                break;
            }

            let targets: Vec<usize> = bucket
                .targets
                .iter()
                .copied()
                .filter(|&target| !self.used[target] && self.allows(allowed, target))
                .collect();

            if !targets.is_empty() {
                return Nearest::Found {
                    targets,
                    distance: bucket.distance,
                    closest: self.table.closest[from]
                        .binary_search(&bucket.distance)
                        .is_ok(),
                };
            }
        }

        Nearest::Exhausted
    }

    /// Depot distances worth trying as a forced first hop: from the smallest
    /// distance that still has a free target up to `closest_range` times it.
    pub fn initial_closest_distances(&self) -> Vec<u64> {
        let buckets = &self.table.buckets[0];
        let first = buckets
            .iter()
            .find(|bucket| bucket.targets.iter().any(|&t| !self.used[t]));

        match first {
            Some(first) => {
                let limit = first.distance.saturating_mul(self.table.closest_range);
                buckets
                    .iter()
                    .map(|bucket| bucket.distance)
                    .skip_while(|&distance| distance < first.distance)
                    .take_while(|&distance| distance <= limit)
                    .collect()
            }
            None => Vec::new(),
        }
    }

    fn allows(&self, allowed: Allowed, target: usize) -> bool {
        match allowed {
            Allowed::Any => true,
            Allowed::Supply => self.is_supply(target),
            Allowed::Demand => self.is_demand(target),
        }
    }

    fn check_point(&self, point: usize) -> Result<(), SearchError> {
        if point == 0 || point >= self.table.size {
            return Err(SearchError::UnknownPoint(point));
        }
        Ok(())
    }
}
