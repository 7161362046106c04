//! N-dimensional sample storage.

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, CoverageResult};

/// Raw sample storage for a coverage: an N-dimensional block of f32
/// cells with interleaved bands.
///
/// Dimension 0 varies fastest within `samples`, and the bands of one
/// cell are adjacent. For a 2D grid shaped `[width, height]` this is the
/// usual row-major raster layout with an extra band stride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelBuffer {
    shape: Vec<usize>,
    num_bands: usize,
    samples: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(shape: Vec<usize>, num_bands: usize, samples: Vec<f32>) -> CoverageResult<Self> {
        if num_bands == 0 {
            return Err(CoverageError::band_mismatch("buffer needs at least one band"));
        }
        let cells: usize = shape.iter().product();
        if samples.len() != cells * num_bands {
            return Err(CoverageError::band_mismatch(format!(
                "{} samples for {} cells x {} bands",
                samples.len(),
                cells,
                num_bands
            )));
        }
        Ok(Self {
            shape,
            num_bands,
            samples,
        })
    }

    /// Allocate a buffer filled with a constant value. `num_bands` must
    /// be at least 1.
    pub fn filled(shape: Vec<usize>, num_bands: usize, value: f32) -> Self {
        let cells: usize = shape.iter().product();
        Self {
            samples: vec![value; cells * num_bands],
            shape,
            num_bands,
        }
    }

    /// Allocate a buffer filled with NaN, the no-data value of resampled
    /// cells that fall outside their source.
    pub fn filled_nan(shape: Vec<usize>, num_bands: usize) -> Self {
        Self::filled(shape, num_bands, f32::NAN)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn num_cells(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Flat cell offset for an index tuple (dimension 0 fastest).
    pub fn cell_offset(&self, index: &[usize]) -> CoverageResult<usize> {
        if index.len() != self.shape.len() {
            return Err(CoverageError::dimension_mismatch(format!(
                "index has {} entries for a {}D buffer",
                index.len(),
                self.shape.len()
            )));
        }
        let mut offset = 0;
        let mut stride = 1;
        for (d, (&i, &size)) in index.iter().zip(&self.shape).enumerate() {
            if i >= size {
                return Err(CoverageError::out_of_bounds(format!(
                    "index {} >= size {} in dimension {}",
                    i, size, d
                )));
            }
            offset += i * stride;
            stride *= size;
        }
        Ok(offset)
    }

    pub fn sample(&self, index: &[usize], band: usize) -> CoverageResult<f32> {
        if band >= self.num_bands {
            return Err(CoverageError::out_of_bounds(format!(
                "band {} >= band count {}",
                band, self.num_bands
            )));
        }
        let offset = self.cell_offset(index)?;
        Ok(self.samples[offset * self.num_bands + band])
    }

    pub fn set_sample(&mut self, index: &[usize], band: usize, value: f32) -> CoverageResult<()> {
        if band >= self.num_bands {
            return Err(CoverageError::out_of_bounds(format!(
                "band {} >= band count {}",
                band, self.num_bands
            )));
        }
        let offset = self.cell_offset(index)?;
        self.samples[offset * self.num_bands + band] = value;
        Ok(())
    }

    /// Apply `f(band, sample)` to every sample, producing a new buffer of
    /// the same shape.
    pub fn map(&self, mut f: impl FnMut(usize, f32) -> f32) -> PixelBuffer {
        let num_bands = self.num_bands;
        let samples = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, &v)| f(i % num_bands, v))
            .collect();
        PixelBuffer {
            shape: self.shape.clone(),
            num_bands,
            samples,
        }
    }

    /// Combine two buffers cell-wise with `f(band, a, b)`.
    ///
    /// Shapes must match exactly. Band counts must match, except that a
    /// single-band buffer broadcasts against a multi-band one.
    pub fn zip_map(
        &self,
        other: &PixelBuffer,
        mut f: impl FnMut(usize, f32, f32) -> f32,
    ) -> CoverageResult<PixelBuffer> {
        if self.shape != other.shape {
            return Err(CoverageError::dimension_mismatch(format!(
                "buffer shapes {:?} and {:?} differ",
                self.shape, other.shape
            )));
        }
        let bands = self.num_bands.max(other.num_bands);
        if self.num_bands != other.num_bands && self.num_bands != 1 && other.num_bands != 1 {
            return Err(CoverageError::band_mismatch(format!(
                "cannot combine {} bands with {} bands",
                self.num_bands, other.num_bands
            )));
        }

        let cells = self.num_cells();
        let mut samples = Vec::with_capacity(cells * bands);
        for cell in 0..cells {
            for band in 0..bands {
                let a = self.samples[cell * self.num_bands + band.min(self.num_bands - 1)];
                let b = other.samples[cell * other.num_bands + band.min(other.num_bands - 1)];
                samples.push(f(band, a, b));
            }
        }
        Ok(PixelBuffer {
            shape: self.shape.clone(),
            num_bands: bands,
            samples,
        })
    }

    /// Copy one band's 2D plane at fixed non-spatial indices into a flat
    /// `Vec<f32>` with x varying fastest. Dimensions not listed in
    /// `fixed` and not one of the spatial dimensions default to index 0.
    pub fn extract_plane(
        &self,
        x_dim: usize,
        y_dim: usize,
        fixed: &[(usize, usize)],
        band: usize,
    ) -> CoverageResult<Vec<f32>> {
        let rank = self.shape.len();
        if x_dim >= rank || y_dim >= rank || x_dim == y_dim {
            return Err(CoverageError::dimension_mismatch(format!(
                "spatial dimensions ({}, {}) invalid for a {}D buffer",
                x_dim, y_dim, rank
            )));
        }
        let width = self.shape[x_dim];
        let height = self.shape[y_dim];

        let mut index = vec![0usize; rank];
        for &(d, i) in fixed {
            index[d] = i;
        }

        let mut plane = Vec::with_capacity(width * height);
        for y in 0..height {
            index[y_dim] = y;
            for x in 0..width {
                index[x_dim] = x;
                plane.push(self.sample(&index, band)?);
            }
        }
        Ok(plane)
    }
}
