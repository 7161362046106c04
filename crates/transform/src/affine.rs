//! Affine transforms over arbitrary dimension counts.
//!
//! A transform is stored as a homogeneous matrix of shape
//! `(target_dim + 1) x (source_dim + 1)` whose bottom row is
//! `[0, …, 0, 1]`. The rightmost column holds the translation terms.
//! This representation makes composition a matrix product and makes the
//! dimension-independence checks in [`crate::separate`] purely structural.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Default absolute tolerance for coefficient comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// An affine map from `source_dim()`-dimensional to
/// `target_dim()`-dimensional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    matrix: DMatrix<f64>,
}

impl AffineTransform {
    /// Identity transform in `dim` dimensions.
    pub fn identity(dim: usize) -> Self {
        Self {
            matrix: DMatrix::identity(dim + 1, dim + 1),
        }
    }

    /// Build from an explicit homogeneous matrix.
    ///
    /// The bottom row must be `[0, …, 0, 1]`; anything else is rejected as
    /// [`TransformError::InvalidMatrix`].
    pub fn from_matrix(matrix: DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() < 2 || matrix.ncols() < 2 {
            return Err(TransformError::invalid_matrix(
                "homogeneous matrix must be at least 2x2",
            ));
        }
        let last = matrix.nrows() - 1;
        for c in 0..matrix.ncols() {
            let expected = if c == matrix.ncols() - 1 { 1.0 } else { 0.0 };
            if matrix[(last, c)] != expected {
                return Err(TransformError::invalid_matrix(format!(
                    "bottom row must be [0, …, 0, 1], found {} in column {}",
                    matrix[(last, c)],
                    c
                )));
            }
        }
        Ok(Self { matrix })
    }

    /// Construct without validating the bottom row. Callers must only pass
    /// matrices built with a correct homogeneous bottom row.
    pub(crate) fn from_matrix_unchecked(matrix: DMatrix<f64>) -> Self {
        Self { matrix }
    }

    /// Pure translation in `offsets.len()` dimensions.
    pub fn translation(offsets: &[f64]) -> Self {
        let dim = offsets.len();
        let mut matrix = DMatrix::identity(dim + 1, dim + 1);
        for (i, &off) in offsets.iter().enumerate() {
            matrix[(i, dim)] = off;
        }
        Self { matrix }
    }

    /// Axis-aligned scaling in `scales.len()` dimensions.
    pub fn scaling(scales: &[f64]) -> Self {
        let dim = scales.len();
        let mut matrix = DMatrix::identity(dim + 1, dim + 1);
        for (i, &s) in scales.iter().enumerate() {
            matrix[(i, i)] = s;
        }
        Self { matrix }
    }

    /// Per-axis scale plus offset: `out[i] = in[i] * scales[i] + offsets[i]`.
    pub fn scale_offset(scales: &[f64], offsets: &[f64]) -> Result<Self> {
        if scales.len() != offsets.len() {
            return Err(TransformError::dimension_mismatch(
                scales.len(),
                offsets.len(),
            ));
        }
        let dim = scales.len();
        let mut matrix = DMatrix::identity(dim + 1, dim + 1);
        for i in 0..dim {
            matrix[(i, i)] = scales[i];
            matrix[(i, dim)] = offsets[i];
        }
        Ok(Self { matrix })
    }

    /// General 2D affine map:
    /// `x' = m00*x + m01*y + t0`, `y' = m10*x + m11*y + t1`.
    pub fn affine_2d(m00: f64, m01: f64, m10: f64, m11: f64, t0: f64, t1: f64) -> Self {
        let mut matrix = DMatrix::identity(3, 3);
        matrix[(0, 0)] = m00;
        matrix[(0, 1)] = m01;
        matrix[(0, 2)] = t0;
        matrix[(1, 0)] = m10;
        matrix[(1, 1)] = m11;
        matrix[(1, 2)] = t1;
        Self { matrix }
    }

    /// The usual axis-aligned grid-to-world map for a 2D raster: cell
    /// `(col, row)` maps to `(origin_x + col * dx, origin_y + row * dy)`.
    ///
    /// `dy` is typically negative for north-up rasters whose row index
    /// grows southward.
    pub fn grid_to_world_2d(origin_x: f64, origin_y: f64, dx: f64, dy: f64) -> Self {
        Self::affine_2d(dx, 0.0, 0.0, dy, origin_x, origin_y)
    }

    /// Number of source dimensions this transform consumes.
    pub fn source_dim(&self) -> usize {
        self.matrix.ncols() - 1
    }

    /// Number of target dimensions this transform produces.
    pub fn target_dim(&self) -> usize {
        self.matrix.nrows() - 1
    }

    /// The underlying homogeneous matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Linear coefficient for target dimension `row`, source dimension `col`.
    pub fn coefficient(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// Translation term for target dimension `row`.
    pub fn offset(&self, row: usize) -> f64 {
        self.matrix[(row, self.source_dim())]
    }

    /// Apply the transform to a point.
    pub fn apply(&self, point: &[f64]) -> Result<Vec<f64>> {
        if point.len() != self.source_dim() {
            return Err(TransformError::dimension_mismatch(
                self.source_dim(),
                point.len(),
            ));
        }
        let mut out = vec![0.0; self.target_dim()];
        for (r, slot) in out.iter_mut().enumerate() {
            let mut acc = self.offset(r);
            for (c, &v) in point.iter().enumerate() {
                acc += self.matrix[(r, c)] * v;
            }
            *slot = acc;
        }
        Ok(out)
    }

    /// Apply a 2-in/2-out transform without allocating.
    pub fn apply_2d(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.source_dim() != 2 || self.target_dim() != 2 {
            return Err(TransformError::dimension_mismatch(2, self.source_dim()));
        }
        let m = &self.matrix;
        Ok((
            m[(0, 0)] * x + m[(0, 1)] * y + m[(0, 2)],
            m[(1, 0)] * x + m[(1, 1)] * y + m[(1, 2)],
        ))
    }

    /// Compose `self` followed by `next`.
    pub fn then(&self, next: &AffineTransform) -> Result<AffineTransform> {
        if next.source_dim() != self.target_dim() {
            return Err(TransformError::dimension_mismatch(
                self.target_dim(),
                next.source_dim(),
            ));
        }
        Ok(AffineTransform {
            matrix: &next.matrix * &self.matrix,
        })
    }

    /// Invert the transform. Only square, non-singular transforms have an
    /// inverse.
    pub fn inverse(&self) -> Result<AffineTransform> {
        if self.source_dim() != self.target_dim() {
            return Err(TransformError::NonInvertible(format!(
                "{}D -> {}D transform is not square",
                self.source_dim(),
                self.target_dim()
            )));
        }
        self.matrix
            .clone()
            .try_inverse()
            .map(|matrix| AffineTransform { matrix })
            .ok_or_else(|| TransformError::NonInvertible("matrix is singular".to_string()))
    }

    /// Embed `inner` between `lead` untouched leading dimensions and
    /// `trail` untouched trailing dimensions, producing a block-diagonal
    /// transform that applies the identity outside the middle block.
    pub fn pass_through(lead: usize, inner: &AffineTransform, trail: usize) -> AffineTransform {
        let src = lead + inner.source_dim() + trail;
        let tgt = lead + inner.target_dim() + trail;
        let mut matrix = DMatrix::zeros(tgt + 1, src + 1);
        for i in 0..lead {
            matrix[(i, i)] = 1.0;
        }
        for r in 0..inner.target_dim() {
            for c in 0..inner.source_dim() {
                matrix[(lead + r, lead + c)] = inner.coefficient(r, c);
            }
            matrix[(lead + r, src)] = inner.offset(r);
        }
        for i in 0..trail {
            matrix[(lead + inner.target_dim() + i, lead + inner.source_dim() + i)] = 1.0;
        }
        matrix[(tgt, src)] = 1.0;
        AffineTransform { matrix }
    }

    /// Compare coefficient-wise within an absolute tolerance. Transforms
    /// of different shapes are never equivalent.
    pub fn equivalent_to(&self, other: &AffineTransform, tolerance: f64) -> bool {
        if self.matrix.shape() != other.matrix.shape() {
            return false;
        }
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Whether this transform is the identity within `tolerance`.
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.source_dim() == self.target_dim()
            && self.equivalent_to(&AffineTransform::identity(self.source_dim()), tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_apply() {
        let t = AffineTransform::identity(3);
        assert_eq!(t.source_dim(), 3);
        assert_eq!(t.target_dim(), 3);
        let out = t.apply(&[1.0, -2.0, 3.5]).unwrap();
        assert_eq!(out, vec![1.0, -2.0, 3.5]);
        assert!(t.is_identity(0.0));
    }

    #[test]
    fn test_translation_and_scaling() {
        let t = AffineTransform::translation(&[10.0, 20.0]);
        assert_eq!(t.apply(&[1.0, 2.0]).unwrap(), vec![11.0, 22.0]);

        let s = AffineTransform::scaling(&[2.0, 0.5]);
        assert_eq!(s.apply(&[4.0, 4.0]).unwrap(), vec![8.0, 2.0]);
    }

    #[test]
    fn test_grid_to_world_2d() {
        // Quarter-degree grid anchored at (-180, 90), rows growing south.
        let t = AffineTransform::grid_to_world_2d(-180.0, 90.0, 0.25, -0.25);
        let (x, y) = t.apply_2d(4.0, 8.0).unwrap();
        assert_eq!(x, -179.0);
        assert_eq!(y, 88.0);
    }

    #[test]
    fn test_then_composes_in_order() {
        let scale = AffineTransform::scaling(&[2.0, 2.0]);
        let shift = AffineTransform::translation(&[1.0, 1.0]);
        // Scale first, then shift.
        let combined = scale.then(&shift).unwrap();
        assert_eq!(combined.apply(&[3.0, 0.0]).unwrap(), vec![7.0, 1.0]);
    }

    #[test]
    fn test_then_dimension_check() {
        let a = AffineTransform::identity(2);
        let b = AffineTransform::identity(3);
        assert!(matches!(
            a.then(&b),
            Err(TransformError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = AffineTransform::affine_2d(0.25, 0.0, 0.0, -0.25, -180.0, 90.0);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply_2d(12.0, 40.0).unwrap();
        let (col, row) = inv.apply_2d(x, y).unwrap();
        assert!((col - 12.0).abs() < 1e-9);
        assert!((row - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_singular() {
        let t = AffineTransform::scaling(&[1.0, 0.0]);
        assert!(matches!(t.inverse(), Err(TransformError::NonInvertible(_))));
    }

    #[test]
    fn test_pass_through() {
        let inner = AffineTransform::scale_offset(&[0.25, -0.25], &[-180.0, 90.0]).unwrap();
        let t = AffineTransform::pass_through(1, &inner, 1);
        assert_eq!(t.source_dim(), 4);
        assert_eq!(t.target_dim(), 4);
        let out = t.apply(&[7.0, 4.0, 8.0, 3.0]).unwrap();
        assert_eq!(out[0], 7.0);
        assert_eq!(out[1], -179.0);
        assert_eq!(out[2], 88.0);
        assert_eq!(out[3], 3.0);
    }

    #[test]
    fn test_from_matrix_rejects_bad_bottom_row() {
        let mut m = DMatrix::identity(3, 3);
        m[(2, 0)] = 0.5;
        assert!(matches!(
            AffineTransform::from_matrix(m),
            Err(TransformError::InvalidMatrix(_))
        ));
    }

    #[test]
    fn test_apply_wrong_length() {
        let t = AffineTransform::identity(2);
        assert!(matches!(
            t.apply(&[1.0]),
            Err(TransformError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_equivalent_to_tolerance() {
        let a = AffineTransform::scaling(&[1.0, 1.0]);
        let b = AffineTransform::scaling(&[1.0 + 1e-12, 1.0]);
        assert!(a.equivalent_to(&b, 1e-9));
        assert!(!a.equivalent_to(&b, 1e-15));

        let c = AffineTransform::identity(3);
        assert!(!a.equivalent_to(&c, 1.0));
    }
}
