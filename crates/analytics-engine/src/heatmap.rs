//! Per-tick spatial density grid over the floor plan.

use common::detection::NormPoint;

/// Fixed-resolution grid of per-cell person counts. Rebuilt from scratch
/// every tick; counts never accumulate across ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapGrid {
    resolution: usize,
    cells: Vec<Vec<u32>>,
}

impl HeatmapGrid {
    pub fn empty(resolution: usize) -> Self {
        let resolution = resolution.max(1);
        Self {
            resolution,
            cells: vec![vec![0; resolution]; resolution],
        }
    }

    /// Bin projected points into cells. Indices are `floor(coord * res)`
    /// clamped into the grid, so a point exactly on the upper boundary
    /// (x = 1.0) lands in the last cell instead of falling off.
    pub fn from_points(points: &[NormPoint], resolution: usize) -> Self {
        let mut grid = Self::empty(resolution);
        let res = grid.resolution;
        for point in points {
            let col = ((point.x * res as f64).floor() as isize).clamp(0, res as isize - 1);
            let row = ((point.y * res as f64).floor() as isize).clamp(0, res as isize - 1);
            grid.cells[row as usize][col as usize] += 1;
        }
        grid
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cells(&self) -> &[Vec<u32>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Vec<u32>> {
        self.cells
    }

    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .map(|row| row.iter().map(|&c| u64::from(c)).sum::<u64>())
            .sum()
    }
}
