//! The coverage type tying CRS, grid, bands, and samples together.

use std::sync::Arc;

use uuid::Uuid;

use crate::buffer::PixelBuffer;
use crate::crs::Crs;
use crate::error::{CoverageError, CoverageResult};
use crate::geom::GridGeometry;
use crate::sample::SampleDimension;

/// An N-dimensional gridded coverage.
///
/// Every coverage carries a unique id assigned at construction; derived
/// coverages get fresh ids even when they share the sample buffer. The
/// buffer itself is shared by `Arc`, so resampling a coverage that is
/// already aligned, or caching a result, never copies samples.
#[derive(Debug, Clone)]
pub struct Coverage {
    id: Uuid,
    name: String,
    crs: Crs,
    geometry: GridGeometry,
    bands: Vec<SampleDimension>,
    buffer: Arc<PixelBuffer>,
}

impl Coverage {
    pub fn new(
        name: impl Into<String>,
        crs: Crs,
        geometry: GridGeometry,
        bands: Vec<SampleDimension>,
        buffer: Arc<PixelBuffer>,
    ) -> CoverageResult<Self> {
        let name = name.into();
        if crs.dimension() != geometry.dimension() {
            return Err(CoverageError::dimension_mismatch(format!(
                "CRS '{}' is {}D but the grid geometry is {}D",
                crs.name(),
                crs.dimension(),
                geometry.dimension()
            )));
        }
        if buffer.shape() != geometry.extent().sizes().as_slice() {
            return Err(CoverageError::dimension_mismatch(format!(
                "buffer shape {:?} does not match extent sizes {:?}",
                buffer.shape(),
                geometry.extent().sizes()
            )));
        }
        if bands.is_empty() || bands.len() != buffer.num_bands() {
            return Err(CoverageError::band_mismatch(format!(
                "{} sample dimensions for a buffer with {} bands",
                bands.len(),
                buffer.num_bands()
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            crs,
            geometry,
            bands,
            buffer,
        })
    }

    /// Stable identity for caching. Two coverages are the same result
    /// only when their ids match.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn bands(&self) -> &[SampleDimension] {
        &self.bands
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    /// Sample at a zero-based grid index.
    pub fn sample(&self, index: &[usize], band: usize) -> CoverageResult<f32> {
        self.buffer.sample(index, band)
    }
}
