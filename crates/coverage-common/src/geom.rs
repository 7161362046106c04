//! Grid extents and grid geometry.

use serde::{Deserialize, Serialize};
use transform::AffineTransform;

use crate::error::{CoverageError, CoverageResult};

/// Per-dimension index bounds of a grid: `low` inclusive, `high`
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridExtent {
    low: Vec<i64>,
    high: Vec<i64>,
}

impl GridExtent {
    pub fn new(low: Vec<i64>, high: Vec<i64>) -> CoverageResult<Self> {
        if low.len() != high.len() {
            return Err(CoverageError::dimension_mismatch(format!(
                "extent has {} low bounds but {} high bounds",
                low.len(),
                high.len()
            )));
        }
        for (d, (&l, &h)) in low.iter().zip(&high).enumerate() {
            if h <= l {
                return Err(CoverageError::invalid_extent(format!(
                    "dimension {}: {}..{} is empty",
                    d, l, h
                )));
            }
        }
        Ok(Self { low, high })
    }

    /// Extent starting at zero with the given sizes.
    pub fn with_sizes(sizes: &[usize]) -> CoverageResult<Self> {
        Self::new(
            vec![0; sizes.len()],
            sizes.iter().map(|&s| s as i64).collect(),
        )
    }

    pub fn dimension(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self, dim: usize) -> i64 {
        self.low[dim]
    }

    pub fn high(&self, dim: usize) -> i64 {
        self.high[dim]
    }

    pub fn size(&self, dim: usize) -> usize {
        (self.high[dim] - self.low[dim]) as usize
    }

    pub fn sizes(&self) -> Vec<usize> {
        (0..self.dimension()).map(|d| self.size(d)).collect()
    }

    pub fn num_cells(&self) -> usize {
        (0..self.dimension()).map(|d| self.size(d)).product()
    }

    pub fn contains(&self, index: &[i64]) -> bool {
        index.len() == self.dimension()
            && index
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(&i, (&l, &h))| i >= l && i < h)
    }

    /// All index tuples over the dimensions not listed in `skip_dims`,
    /// each tuple holding one entry per kept dimension in dimension
    /// order. With no kept dimensions this yields a single empty tuple.
    pub fn index_tuples_excluding(&self, skip_dims: &[usize]) -> Vec<Vec<i64>> {
        let kept: Vec<usize> = (0..self.dimension())
            .filter(|d| !skip_dims.contains(d))
            .collect();
        let mut tuples = vec![Vec::new()];
        for &d in &kept {
            let mut next = Vec::with_capacity(tuples.len() * self.size(d));
            for tuple in &tuples {
                for v in self.low[d]..self.high[d] {
                    let mut extended = tuple.clone();
                    extended.push(v);
                    next.push(extended);
                }
            }
            tuples = next;
        }
        tuples
    }
}

/// The discrete grid of a coverage and its mapping to world coordinates.
///
/// Grid dimension `i` maps to world dimension `i`: grid-to-world
/// transforms never permute axes, which is what lets the pipeline carve
/// them into independent leading/spatial/trailing runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    extent: GridExtent,
    grid_to_world: AffineTransform,
    /// Grid dimension indices of the two spatial (horizontal) axes.
    spatial_axes: (usize, usize),
}

impl GridGeometry {
    pub fn new(
        extent: GridExtent,
        grid_to_world: AffineTransform,
        spatial_axes: (usize, usize),
    ) -> CoverageResult<Self> {
        let dim = extent.dimension();
        if grid_to_world.source_dim() != dim || grid_to_world.target_dim() != dim {
            return Err(CoverageError::dimension_mismatch(format!(
                "grid-to-world transform is {}D -> {}D for a {}D extent",
                grid_to_world.source_dim(),
                grid_to_world.target_dim(),
                dim
            )));
        }
        let (a0, a1) = spatial_axes;
        if a0 == a1 || a0 >= dim || a1 >= dim {
            return Err(CoverageError::dimension_mismatch(format!(
                "spatial axes ({}, {}) invalid for a {}D grid",
                a0, a1, dim
            )));
        }
        Ok(Self {
            extent,
            grid_to_world,
            spatial_axes,
        })
    }

    /// Convenience for plain 2D rasters: spatial axes (0, 1).
    pub fn d2(width: usize, height: usize, grid_to_world: AffineTransform) -> CoverageResult<Self> {
        Self::new(
            GridExtent::with_sizes(&[width, height])?,
            grid_to_world,
            (0, 1),
        )
    }

    pub fn extent(&self) -> &GridExtent {
        &self.extent
    }

    pub fn grid_to_world(&self) -> &AffineTransform {
        &self.grid_to_world
    }

    pub fn spatial_axes(&self) -> (usize, usize) {
        self.spatial_axes
    }

    pub fn dimension(&self) -> usize {
        self.extent.dimension()
    }

    /// Equality within a transform tolerance; extents and spatial axes
    /// compare exactly.
    pub fn equivalent_to(&self, other: &GridGeometry, tolerance: f64) -> bool {
        self.extent == other.extent
            && self.spatial_axes == other.spatial_axes
            && self.grid_to_world.equivalent_to(&other.grid_to_world, tolerance)
    }
}
