//! Splitting an N-D grid-to-world transform around its horizontal plane.
//!
//! Reprojection only ever touches the two horizontal axes; the remaining
//! dimensions (time, vertical levels) must ride along untouched. The
//! decomposition carves a coverage's transform and CRS into a leading
//! run, the 2D horizontal block, and a trailing run, so the horizontal
//! block can be swapped out and the whole thing reassembled.

use std::ops::Range;

use coverage_common::{Coverage, Crs, CrsKind};
use transform::{recompose, AffineTransform, Result, TransformError};

/// A grid-to-world transform and its CRS, split around the horizontal
/// axes. Produced by [`decompose`].
#[derive(Debug, Clone)]
pub struct DecomposedTransform {
    /// Transform over the dimensions before the horizontal block.
    pub lead: Option<AffineTransform>,
    /// The 2D horizontal block.
    pub spatial: AffineTransform,
    /// Transform over the dimensions after the horizontal block.
    pub trail: Option<AffineTransform>,
    /// CRS component spanning the horizontal block.
    pub spatial_crs: Crs,
    /// CRS components before the horizontal block.
    pub head_crs: Option<Crs>,
    /// CRS components after the horizontal block.
    pub tail_crs: Option<Crs>,
    /// Dimensions the horizontal block occupies.
    pub spatial_range: Range<usize>,
}

impl DecomposedTransform {
    /// Reassemble a full transform with the horizontal block replaced.
    pub fn recompose_with(&self, spatial: &AffineTransform) -> AffineTransform {
        recompose(self.lead.as_ref(), spatial, self.trail.as_ref())
    }

    /// Reassemble a full CRS with the horizontal component replaced.
    pub fn recompose_crs_with(&self, spatial: &Crs) -> Crs {
        let mut parts = Vec::with_capacity(3);
        if let Some(head) = &self.head_crs {
            parts.push(head.clone());
        }
        parts.push(spatial.clone());
        if let Some(tail) = &self.tail_crs {
            parts.push(tail.clone());
        }
        Crs::compound(parts)
    }

    /// Whether the parts outside the horizontal block match another
    /// decomposition's, CRS components and transforms both. Two
    /// coverages passing this check differ only in their horizontal
    /// plane.
    pub fn non_spatial_equivalent(&self, other: &DecomposedTransform, tolerance: f64) -> bool {
        let crs_matches = |a: &Option<Crs>, b: &Option<Crs>| match (a, b) {
            (Some(a), Some(b)) => a.equivalent_to(b),
            (None, None) => true,
            _ => false,
        };
        let transform_matches =
            |a: &Option<AffineTransform>, b: &Option<AffineTransform>| match (a, b) {
                (Some(a), Some(b)) => a.equivalent_to(b, tolerance),
                (None, None) => true,
                _ => false,
            };
        self.spatial_range == other.spatial_range
            && crs_matches(&self.head_crs, &other.head_crs)
            && crs_matches(&self.tail_crs, &other.tail_crs)
            && transform_matches(&self.lead, &other.lead)
            && transform_matches(&self.trail, &other.trail)
    }
}

/// Split `transform` and `crs` around the horizontal axes `axis0` and
/// `axis1`.
///
/// Fails with [`TransformError::Unseparable`] when the CRS has no 2D
/// horizontal component spanning exactly those dimensions, or when
/// other dimensions mix into the carved blocks; fails with
/// [`TransformError::UnstableDimensions`] when a carved block lands on
/// target dimensions other than its own.
pub fn decompose(
    transform: &AffineTransform,
    crs: &Crs,
    axis0: usize,
    axis1: usize,
) -> Result<DecomposedTransform> {
    let dim = crs.dimension();
    if transform.source_dim() != dim {
        return Err(TransformError::dimension_mismatch(
            dim,
            transform.source_dim(),
        ));
    }
    if transform.target_dim() != dim {
        return Err(TransformError::dimension_mismatch(
            dim,
            transform.target_dim(),
        ));
    }
    if axis0 == axis1 || axis0 >= dim || axis1 >= dim {
        return Err(TransformError::unseparable(format!(
            "horizontal axes ({}, {}) invalid for a {}D system",
            axis0, axis1, dim
        )));
    }

    let lower = axis0.min(axis1);
    let upper = axis0.max(axis1) + 1;

    let spatial_crs = crs.sub_crs(lower..upper).ok_or_else(|| {
        TransformError::unseparable(format!(
            "dimensions {}..{} do not cover whole CRS components of '{}'",
            lower, upper, crs
        ))
    })?;
    if !matches!(spatial_crs.kind(), CrsKind::Horizontal(_)) {
        return Err(TransformError::unseparable(format!(
            "dimensions {}..{} of '{}' are not a single horizontal system",
            lower, upper, crs
        )));
    }

    let head_crs = if lower > 0 {
        Some(crs.sub_crs(0..lower).ok_or_else(|| {
            TransformError::unseparable(format!(
                "dimensions 0..{} do not cover whole CRS components of '{}'",
                lower, crs
            ))
        })?)
    } else {
        None
    };
    let tail_crs = if upper < dim {
        Some(crs.sub_crs(upper..dim).ok_or_else(|| {
            TransformError::unseparable(format!(
                "dimensions {}..{} do not cover whole CRS components of '{}'",
                upper, dim, crs
            ))
        })?)
    } else {
        None
    };

    let spatial = carve_stable(transform, lower..upper)?;
    let lead = if lower > 0 {
        Some(carve_stable(transform, 0..lower)?)
    } else {
        None
    };
    let trail = if upper < dim {
        Some(carve_stable(transform, upper..dim)?)
    } else {
        None
    };

    Ok(DecomposedTransform {
        lead,
        spatial,
        trail,
        spatial_crs,
        head_crs,
        tail_crs,
        spatial_range: lower..upper,
    })
}

/// Split a coverage's grid-to-world transform around its declared
/// spatial axes.
pub fn decompose_coverage(coverage: &Coverage) -> Result<DecomposedTransform> {
    let (axis0, axis1) = coverage.geometry().spatial_axes();
    decompose(
        coverage.geometry().grid_to_world(),
        coverage.crs(),
        axis0,
        axis1,
    )
}

/// Carve a sub-transform and require it to land on its own dimensions.
/// A carved block landing elsewhere would permute axes on recomposition.
fn carve_stable(transform: &AffineTransform, range: Range<usize>) -> Result<AffineTransform> {
    let part = transform.separate(range.clone())?;
    if part.target_range != range {
        return Err(TransformError::unstable(format!(
            "source dimensions {}..{} land on target dimensions {}..{}",
            range.start, range.end, part.target_range.start, part.target_range.end
        )));
    }
    Ok(part.transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coverage_common::{CrsCode, TemporalAxis, Unit, VerticalAxis, VerticalDirection};
    use nalgebra::DMatrix;

    fn forecast_crs() -> Crs {
        Crs::compound(vec![
            Crs::temporal(
                "time",
                TemporalAxis::hours_since(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
            ),
            Crs::horizontal(CrsCode::Epsg4326),
            Crs::vertical(
                "isobaric",
                VerticalAxis::new(Unit::new("hPa"), VerticalDirection::Down),
            ),
        ])
    }

    fn forecast_transform() -> AffineTransform {
        let time = AffineTransform::scale_offset(&[6.0], &[0.0]).unwrap();
        let spatial = AffineTransform::grid_to_world_2d(-130.0, 55.0, 0.25, -0.25);
        let level = AffineTransform::scale_offset(&[-150.0], &[1000.0]).unwrap();
        recompose(Some(&time), &spatial, Some(&level))
    }

    #[test]
    fn test_decompose_2d() {
        let crs = Crs::horizontal(CrsCode::Epsg4326);
        let transform = AffineTransform::grid_to_world_2d(-130.0, 55.0, 0.25, -0.25);
        let parts = decompose(&transform, &crs, 0, 1).unwrap();

        assert!(parts.lead.is_none());
        assert!(parts.trail.is_none());
        assert!(parts.head_crs.is_none());
        assert!(parts.tail_crs.is_none());
        assert_eq!(parts.spatial_range, 0..2);
        assert!(parts.spatial.equivalent_to(&transform, 0.0));
        assert!(parts.spatial_crs.equivalent_to(&crs));
    }

    #[test]
    fn test_decompose_4d_round_trip() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        let parts = decompose(&transform, &crs, 1, 2).unwrap();

        assert_eq!(parts.spatial_range, 1..3);
        assert!(parts.lead.is_some());
        assert!(parts.trail.is_some());
        assert!(matches!(parts.head_crs.as_ref().unwrap().kind(), CrsKind::Temporal(_)));
        assert!(matches!(parts.tail_crs.as_ref().unwrap().kind(), CrsKind::Vertical(_)));

        let rebuilt = parts.recompose_with(&parts.spatial);
        assert!(rebuilt.equivalent_to(&transform, 1e-9));

        let rebuilt_crs = parts.recompose_crs_with(&parts.spatial_crs);
        assert!(rebuilt_crs.equivalent_to(&crs));
    }

    #[test]
    fn test_axis_order_does_not_matter() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        let a = decompose(&transform, &crs, 1, 2).unwrap();
        let b = decompose(&transform, &crs, 2, 1).unwrap();
        assert_eq!(a.spatial_range, b.spatial_range);
        assert!(a.spatial.equivalent_to(&b.spatial, 0.0));
    }

    #[test]
    fn test_replacing_spatial_block() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        let parts = decompose(&transform, &crs, 1, 2).unwrap();

        let finer = AffineTransform::grid_to_world_2d(-130.0, 55.0, 0.125, -0.125);
        let rebuilt = parts.recompose_with(&finer);
        assert_eq!(rebuilt.source_dim(), 4);
        // Leading and trailing dimensions are untouched.
        let out = rebuilt.apply(&[2.0, 0.0, 0.0, 1.0]).unwrap();
        assert!((out[0] - 12.0).abs() < 1e-9);
        assert!((out[1] - -130.0).abs() < 1e-9);
        assert!((out[2] - 55.0).abs() < 1e-9);
        assert!((out[3] - 850.0).abs() < 1e-9);

        let mercator = parts.recompose_crs_with(&Crs::horizontal(CrsCode::Epsg3857));
        assert_eq!(mercator.dimension(), 4);
        assert!(!mercator.equivalent_to(&crs));
    }

    #[test]
    fn test_non_adjacent_axes_rejected() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        // Axes 0 and 2 would span the temporal component as well.
        assert!(matches!(
            decompose(&transform, &crs, 0, 2),
            Err(TransformError::Unseparable(_))
        ));
    }

    #[test]
    fn test_axes_must_cover_horizontal_component() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        // Axes 0 and 1 split the horizontal component.
        assert!(matches!(
            decompose(&transform, &crs, 0, 1),
            Err(TransformError::Unseparable(_))
        ));
    }

    #[test]
    fn test_mixing_transform_rejected() {
        let crs = Crs::compound(vec![
            Crs::temporal(
                "time",
                TemporalAxis::hours_since(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
            ),
            Crs::horizontal(CrsCode::Epsg4326),
        ]);
        // Longitude shifts with time: row 1 reads both column 0 and 1.
        let mut m = DMatrix::identity(4, 4);
        m[(1, 0)] = 0.5;
        let transform = AffineTransform::from_matrix(m).unwrap();
        assert!(matches!(
            decompose(&transform, &crs, 1, 2),
            Err(TransformError::Unseparable(_))
        ));
    }

    #[test]
    fn test_permuting_transform_rejected() {
        let crs = Crs::compound(vec![
            Crs::horizontal(CrsCode::Epsg4326),
            Crs::vertical(
                "height",
                VerticalAxis::new(Unit::new("m"), VerticalDirection::Up),
            ),
        ]);
        // Cyclic permutation: the horizontal block lands on rows 1..3.
        let mut m = DMatrix::zeros(4, 4);
        m[(0, 2)] = 1.0;
        m[(1, 0)] = 1.0;
        m[(2, 1)] = 1.0;
        m[(3, 3)] = 1.0;
        let transform = AffineTransform::from_matrix(m).unwrap();
        assert!(matches!(
            decompose(&transform, &crs, 0, 1),
            Err(TransformError::UnstableDimensions(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let crs = forecast_crs();
        let transform = AffineTransform::identity(2);
        assert!(matches!(
            decompose(&transform, &crs, 1, 2),
            Err(TransformError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_non_spatial_equivalence() {
        let crs = forecast_crs();
        let transform = forecast_transform();
        let a = decompose(&transform, &crs, 1, 2).unwrap();

        // Same outer structure, different horizontal block.
        let finer = a.recompose_with(&AffineTransform::grid_to_world_2d(0.0, 0.0, 1.0, -1.0));
        let b = decompose(&finer, &crs, 1, 2).unwrap();
        assert!(a.non_spatial_equivalent(&b, 1e-9));

        // Different time step breaks it.
        let hourly = recompose(
            Some(&AffineTransform::scale_offset(&[1.0], &[0.0]).unwrap()),
            &a.spatial,
            a.trail.as_ref(),
        );
        let c = decompose(&hourly, &crs, 1, 2).unwrap();
        assert!(!a.non_spatial_equivalent(&c, 1e-9));
    }
}
