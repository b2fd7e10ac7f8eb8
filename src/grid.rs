use cooperation_common::{Vec2, WrapMode};
use rayon::prelude::*;

use crate::neighbors::{is_neighbor, BruteForceIndex, NeighborIndex};

const DEFAULT_MAX_CELLS_PER_AXIS: usize = 512;

/// Uniform bucket grid over the unit torus.
///
/// Cells are strictly wider than the radius, so every neighbor of an agent lies in
/// the 3x3 block of cells around it (wrapping at the edges). Produces exactly the
/// lists `BruteForceIndex` does, in roughly O(N * density) instead of O(N^2).
#[derive(Debug, Clone, Copy)]
pub struct CellGridIndex {
    pub max_cells_per_axis: usize,
}

impl Default for CellGridIndex {
    fn default() -> Self {
        CellGridIndex { max_cells_per_axis: DEFAULT_MAX_CELLS_PER_AXIS }
    }
}

impl CellGridIndex {
    /// Number of cells along each axis for a radius. One less than `floor(1 / r)`
    /// so rounding in the cell lookup can never split a neighbor pair by two cells.
    pub fn cells_per_axis(&self, radius: f64) -> usize {
        if radius.is_nan() || radius <= 0.0 {
            return 0;
        }
        let fit = (1.0 / radius).floor();
        if fit >= self.max_cells_per_axis as f64 + 1.0 {
            self.max_cells_per_axis
        } else {
            (fit as usize).saturating_sub(1)
        }
    }
}

// Calculates the 1D grid cell index for a given position
#[inline(always)]
fn get_grid_cell_idx(pos: Vec2, dim: usize) -> usize {
    let grid_x = ((pos.x * dim as f64).floor().max(0.0) as usize).min(dim - 1);
    let grid_y = ((pos.y * dim as f64).floor().max(0.0) as usize).min(dim - 1);
    grid_y * dim + grid_x
}

impl NeighborIndex for CellGridIndex {
    fn build(&self, positions: &[Vec2], radius: f64, wrap: WrapMode) -> Vec<Vec<usize>> {
        let num_agents = positions.len();
        let radius_sq = radius * radius;
        if num_agents == 0 || radius_sq.is_nan() || radius_sq <= 0.0 {
            return vec![Vec::new(); num_agents];
        }

        let dim = self.cells_per_axis(radius);
        if dim < 3 {
            // The 3x3 block would visit some cells twice; nothing to gain over pairs anyway.
            log::debug!("Radius {} too large for a bucket grid; using brute force.", radius);
            return BruteForceIndex.build(positions, radius, wrap);
        }
        let num_cells = dim * dim;

        // Counting sort of agents by cell.
        let agent_cells: Vec<usize> = positions.iter().map(|&p| get_grid_cell_idx(p, dim)).collect();
        let mut cell_counts = vec![0usize; num_cells];
        for &cell in &agent_cells {
            cell_counts[cell] += 1;
        }
        let mut cell_starts = vec![0usize; num_cells];
        let mut total = 0;
        for (start, &count) in cell_starts.iter_mut().zip(&cell_counts) {
            *start = total;
            total += count;
        }
        let mut write_offsets = cell_starts.clone();
        let mut cell_agent_indices = vec![0usize; num_agents];
        for (agent, &cell) in agent_cells.iter().enumerate() {
            cell_agent_indices[write_offsets[cell]] = agent;
            write_offsets[cell] += 1;
        }

        (0..num_agents)
            .into_par_iter()
            .map(|agent| {
                let pos = positions[agent];
                let cell = agent_cells[agent];
                let center_x = (cell % dim) as isize;
                let center_y = (cell / dim) as isize;
                let mut found = Vec::new();

                for dy in -1..=1isize {
                    for dx in -1..=1isize {
                        let check_x = (center_x + dx).rem_euclid(dim as isize) as usize;
                        let check_y = (center_y + dy).rem_euclid(dim as isize) as usize;
                        let grid_idx = check_y * dim + check_x;
                        let start = cell_starts[grid_idx];
                        let end = start + cell_counts[grid_idx];

                        for &other in &cell_agent_indices[start..end] {
                            if other != agent && is_neighbor(pos, positions[other], radius_sq, wrap) {
                                found.push(other);
                            }
                        }
                    }
                }
                found.sort_unstable();
                found
            })
            .collect()
    }
}
