//! Neighbor discovery on the unit torus.
//!
//! Every index produces the same adjacency: `j` is listed for `i` iff the squared
//! toroidal distance between them is strictly below `r^2`, and each list is in
//! ascending index order. The order matters because the imitation walk visits
//! neighbors in stored order.

use cooperation_common::{NeighborIndexKind, Vec2, WrapMode};
use rayon::prelude::*;

use crate::grid::CellGridIndex;

/// Builds symmetric neighbor lists for a set of positions.
pub trait NeighborIndex: Send + Sync {
    /// Returns one neighbor list per position.
    fn build(&self, positions: &[Vec2], radius: f64, wrap: WrapMode) -> Vec<Vec<usize>>;
}

/// The pair test shared by all indices. Ties at exactly `r` are excluded.
#[inline(always)]
pub fn is_neighbor(a: Vec2, b: Vec2, radius_sq: f64, wrap: WrapMode) -> bool {
    a.toroidal_distance_squared(b, wrap) < radius_sq
}

/// Tests every unordered pair exactly once: O(N^2).
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceIndex;

impl NeighborIndex for BruteForceIndex {
    fn build(&self, positions: &[Vec2], radius: f64, wrap: WrapMode) -> Vec<Vec<usize>> {
        let radius_sq = radius * radius;

        // Row i only looks at j < i, so each pair is tested once. Rows are independent.
        let lower: Vec<Vec<usize>> = (0..positions.len())
            .into_par_iter()
            .map(|i| {
                let pos = positions[i];
                (0..i)
                    .filter(|&j| is_neighbor(pos, positions[j], radius_sq, wrap))
                    .collect()
            })
            .collect();

        // Mirror serially; walking rows in order keeps the upper halves ascending.
        let mut upper: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
        for (k, row) in lower.iter().enumerate() {
            for &j in row {
                upper[j].push(k);
            }
        }

        lower
            .into_iter()
            .zip(upper)
            .map(|(mut row, above)| {
                row.extend(above);
                row
            })
            .collect()
    }
}

/// Returns the index implementation selected in the configuration.
pub fn index_for(kind: NeighborIndexKind) -> Box<dyn NeighborIndex> {
    match kind {
        NeighborIndexKind::BruteForce => Box::new(BruteForceIndex),
        NeighborIndexKind::Grid => Box::new(CellGridIndex::default()),
    }
}

/// `histogram[k]` is the number of agents with exactly `k` neighbors.
/// Empty for an empty population.
pub fn neighbor_histogram<L: AsRef<[usize]>>(lists: &[L]) -> Vec<usize> {
    let sizes: Vec<usize> = lists.iter().map(|l| l.as_ref().len()).collect();
    let Some(&max_size) = sizes.iter().max() else {
        return Vec::new();
    };
    let mut histogram = vec![0usize; max_size + 1];
    for size in sizes {
        histogram[size] += 1;
    }
    histogram
}

/// Summary of neighborhood sizes, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub isolated: usize,
}

pub fn neighbor_stats<L: AsRef<[usize]>>(lists: &[L]) -> Option<NeighborStats> {
    if lists.is_empty() {
        return None;
    }
    let mut min = usize::MAX;
    let mut max = 0;
    let mut total = 0;
    let mut isolated = 0;
    for list in lists {
        let size = list.as_ref().len();
        min = min.min(size);
        max = max.max(size);
        total += size;
        if size == 0 {
            isolated += 1;
        }
    }
    Some(NeighborStats {
        min,
        max,
        mean: total as f64 / lists.len() as f64,
        isolated,
    })
}
