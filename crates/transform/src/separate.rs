//! Carving independent sub-transforms out of a larger transform.
//!
//! Splitting a grid-to-world transform into the part acting on a chosen
//! run of source dimensions is only meaningful when those dimensions do
//! not mix with the remaining ones. The check here is structural: in the
//! homogeneous matrix, the target rows fed by the selected columns must
//! not be fed by any other column, and together they must form one
//! contiguous block.

use std::ops::Range;

use nalgebra::DMatrix;

use crate::affine::AffineTransform;
use crate::error::{Result, TransformError};

/// A sub-transform carved out of a larger transform, together with the
/// contiguous run of target dimensions it produces.
#[derive(Debug, Clone)]
pub struct SeparatedTransform {
    /// The carved transform over the selected source dimensions.
    pub transform: AffineTransform,
    /// Target dimensions of the original transform this part produces.
    pub target_range: Range<usize>,
}

impl AffineTransform {
    /// Carve the sub-transform consuming exactly the source dimensions in
    /// `source_range`.
    ///
    /// Fails with [`TransformError::Unseparable`] when a target dimension
    /// mixes selected and unselected source dimensions, when the selected
    /// dimensions feed no target dimension at all, or when the fed target
    /// dimensions are not contiguous.
    pub fn separate(&self, source_range: Range<usize>) -> Result<SeparatedTransform> {
        let src = self.source_dim();
        let tgt = self.target_dim();
        if source_range.start >= source_range.end || source_range.end > src {
            return Err(TransformError::unseparable(format!(
                "source range {}..{} out of bounds for a {}D source",
                source_range.start, source_range.end, src
            )));
        }

        // Target rows fed by any selected column.
        let mut fed = Vec::new();
        for r in 0..tgt {
            if source_range.clone().any(|c| self.coefficient(r, c) != 0.0) {
                fed.push(r);
            }
        }
        if fed.is_empty() {
            return Err(TransformError::unseparable(format!(
                "source dimensions {}..{} feed no target dimension",
                source_range.start, source_range.end
            )));
        }
        let target_range = fed[0]..fed[fed.len() - 1] + 1;
        if target_range.len() != fed.len() {
            return Err(TransformError::unseparable(format!(
                "source dimensions {}..{} feed non-contiguous target dimensions {:?}",
                source_range.start, source_range.end, fed
            )));
        }

        // Independence: a fed row must not also depend on unselected columns.
        for &r in &fed {
            for c in (0..src).filter(|c| !source_range.contains(c)) {
                if self.coefficient(r, c) != 0.0 {
                    return Err(TransformError::unseparable(format!(
                        "target dimension {} mixes source dimension {} into {}..{}",
                        r, c, source_range.start, source_range.end
                    )));
                }
            }
        }

        let mut matrix = DMatrix::zeros(target_range.len() + 1, source_range.len() + 1);
        for (ri, r) in target_range.clone().enumerate() {
            for (ci, c) in source_range.clone().enumerate() {
                matrix[(ri, ci)] = self.coefficient(r, c);
            }
            matrix[(ri, source_range.len())] = self.offset(r);
        }
        matrix[(target_range.len(), source_range.len())] = 1.0;

        Ok(SeparatedTransform {
            transform: AffineTransform::from_matrix_unchecked(matrix),
            target_range,
        })
    }
}

/// Reassemble a transform from optional leading and trailing parts around
/// a middle part, as a block-diagonal composition. Inverse of carving a
/// transform into three independent runs with
/// [`AffineTransform::separate`].
pub fn recompose(
    lead: Option<&AffineTransform>,
    middle: &AffineTransform,
    trail: Option<&AffineTransform>,
) -> AffineTransform {
    let parts: Vec<&AffineTransform> = lead
        .into_iter()
        .chain(std::iter::once(middle))
        .chain(trail)
        .collect();
    let src: usize = parts.iter().map(|t| t.source_dim()).sum();
    let tgt: usize = parts.iter().map(|t| t.target_dim()).sum();

    let mut matrix = DMatrix::zeros(tgt + 1, src + 1);
    let mut row0 = 0;
    let mut col0 = 0;
    for part in parts {
        for r in 0..part.target_dim() {
            for c in 0..part.source_dim() {
                matrix[(row0 + r, col0 + c)] = part.coefficient(r, c);
            }
            matrix[(row0 + r, src)] = part.offset(r);
        }
        row0 += part.target_dim();
        col0 += part.source_dim();
    }
    matrix[(tgt, src)] = 1.0;

    AffineTransform::from_matrix_unchecked(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4D transform: time scale, a rotated 2D spatial block, height offset.
    fn block_transform() -> AffineTransform {
        let time = AffineTransform::scale_offset(&[3600.0], &[0.0]).unwrap();
        let spatial = AffineTransform::affine_2d(0.5, 0.1, -0.1, 0.5, -180.0, 90.0);
        let height = AffineTransform::translation(&[100.0]);
        recompose(Some(&time), &spatial, Some(&height))
    }

    #[test]
    fn test_separate_diagonal() {
        let t = AffineTransform::scale_offset(&[2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap();
        let part = t.separate(1..2).unwrap();
        assert_eq!(part.target_range, 1..2);
        assert_eq!(part.transform.apply(&[10.0]).unwrap(), vec![32.0]);
    }

    #[test]
    fn test_separate_middle_block() {
        let t = block_transform();
        assert_eq!(t.source_dim(), 4);

        let spatial = t.separate(1..3).unwrap();
        assert_eq!(spatial.target_range, 1..3);
        let (x, y) = spatial.transform.apply_2d(2.0, 4.0).unwrap();
        assert!((x - (-178.6)).abs() < 1e-9);
        assert!((y - 91.8).abs() < 1e-9);

        let lead = t.separate(0..1).unwrap();
        assert_eq!(lead.target_range, 0..1);
        let trail = t.separate(3..4).unwrap();
        assert_eq!(trail.target_range, 3..4);
    }

    #[test]
    fn test_separate_rejects_mixing() {
        // Row 0 depends on both source 0 and source 1.
        let t = AffineTransform::affine_2d(1.0, 0.5, 0.0, 1.0, 0.0, 0.0);
        let err = t.separate(0..1).unwrap_err();
        assert!(matches!(err, TransformError::Unseparable(_)));
    }

    #[test]
    fn test_separate_rejects_empty_feed() {
        // Source dimension 1 feeds nothing: its column is all zeros.
        let mut m = DMatrix::identity(3, 3);
        m[(1, 1)] = 0.0;
        m[(1, 0)] = 1.0;
        let t = AffineTransform::from_matrix(m).unwrap();
        assert!(matches!(
            t.separate(1..2),
            Err(TransformError::Unseparable(_))
        ));
    }

    #[test]
    fn test_separate_out_of_bounds() {
        let t = AffineTransform::identity(2);
        assert!(matches!(
            t.separate(1..4),
            Err(TransformError::Unseparable(_))
        ));
    }

    #[test]
    fn test_recompose_round_trip() {
        let t = block_transform();
        let lead = t.separate(0..1).unwrap();
        let spatial = t.separate(1..3).unwrap();
        let trail = t.separate(3..4).unwrap();

        let rebuilt = recompose(
            Some(&lead.transform),
            &spatial.transform,
            Some(&trail.transform),
        );
        assert!(rebuilt.equivalent_to(&t, 1e-9));
    }

    #[test]
    fn test_recompose_without_ends() {
        let spatial = AffineTransform::affine_2d(0.5, 0.1, -0.1, 0.5, -180.0, 90.0);
        let rebuilt = recompose(None, &spatial, None);
        assert!(rebuilt.equivalent_to(&spatial, 0.0));
    }
}
