//! Bringing operation sources onto one grid before pixels are touched.
//!
//! Pixel functions combine buffers index by index, so every source must
//! first share a horizontal CRS, grid-to-world transform, and extent.
//! The default reconciler aligns stragglers by invoking the registered
//! "Resample" operation through the executor, which keeps reprojection
//! replaceable like any other operation: registering a different
//! "Resample" changes how reconciliation itself resamples.

use std::sync::Arc;

use coverage_common::{Coverage, Crs, GridExtent, GridGeometry};
use tracing::debug;
use transform::{AffineTransform, DEFAULT_TOLERANCE};

use crate::decompose::decompose_coverage;
use crate::error::{ProcessingError, Result};
use crate::executor::OperationExecutor;
use crate::interpolation::InterpolationMethod;
use crate::params::{ParamValue, ParameterSet};

/// Aligns operation sources onto a shared horizontal geometry in place.
pub trait GeometryReconciler: Send + Sync {
    /// Align `sources` on a shared horizontal geometry, replacing
    /// whichever entries need resampling.
    ///
    /// `target_crs` and `target_transform` pin the horizontal CRS and
    /// grid-to-world to align on; when `None`, the first source supplies
    /// them. Failures surface as
    /// [`ProcessingError::CannotReproject`](crate::error::ProcessingError)
    /// naming the source that could not be aligned.
    fn reconcile(
        &self,
        executor: &OperationExecutor,
        sources: &mut Vec<Arc<Coverage>>,
        target_crs: Option<&Crs>,
        target_transform: Option<&AffineTransform>,
    ) -> Result<()>;
}

/// Reconciler resampling stragglers via the registered "Resample"
/// operation.
pub struct DefaultReconciler {
    tolerance: f64,
    interpolation: InterpolationMethod,
}

impl DefaultReconciler {
    pub fn new(tolerance: f64, interpolation: InterpolationMethod) -> Self {
        Self {
            tolerance,
            interpolation,
        }
    }
}

impl Default for DefaultReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, InterpolationMethod::default())
    }
}

impl GeometryReconciler for DefaultReconciler {
    fn reconcile(
        &self,
        executor: &OperationExecutor,
        sources: &mut Vec<Arc<Coverage>>,
        target_crs: Option<&Crs>,
        target_transform: Option<&AffineTransform>,
    ) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }

        // The first source donates whatever the caller did not pin: the
        // horizontal CRS, the horizontal grid-to-world, and always the
        // horizontal extent.
        let reference = decompose_coverage(&sources[0]).map_err(|err| {
            ProcessingError::cannot_reproject(sources[0].name(), err.to_string())
        })?;
        let reference_extent = sources[0].geometry().extent().clone();
        let ref_x = reference.spatial_range.start;
        let ref_y = ref_x + 1;
        let spatial_crs = match target_crs {
            Some(crs) => crs.clone(),
            None => reference.spatial_crs.clone(),
        };
        let spatial = match target_transform {
            Some(transform) => transform.clone(),
            None => reference.spatial.clone(),
        };

        for source in sources.iter_mut() {
            let parts = decompose_coverage(source).map_err(|err| {
                ProcessingError::cannot_reproject(source.name(), err.to_string())
            })?;
            let extent = source.geometry().extent();
            let x_dim = parts.spatial_range.start;
            let y_dim = x_dim + 1;

            let aligned = parts.spatial_crs.equivalent_to(&spatial_crs)
                && parts.spatial.equivalent_to(&spatial, self.tolerance)
                && extent.low(x_dim) == reference_extent.low(ref_x)
                && extent.high(x_dim) == reference_extent.high(ref_x)
                && extent.low(y_dim) == reference_extent.low(ref_y)
                && extent.high(y_dim) == reference_extent.high(ref_y);
            if aligned {
                continue;
            }

            let mut low = Vec::with_capacity(extent.dimension());
            let mut high = Vec::with_capacity(extent.dimension());
            for d in 0..extent.dimension() {
                if d == x_dim {
                    low.push(reference_extent.low(ref_x));
                    high.push(reference_extent.high(ref_x));
                } else if d == y_dim {
                    low.push(reference_extent.low(ref_y));
                    high.push(reference_extent.high(ref_y));
                } else {
                    low.push(extent.low(d));
                    high.push(extent.high(d));
                }
            }

            let name = source.name().to_string();
            let wrap = |err: ProcessingError| match err {
                ProcessingError::CannotReproject { .. } => err,
                other => ProcessingError::cannot_reproject(&name, other.to_string()),
            };
            let target_extent =
                GridExtent::new(low, high).map_err(|err| wrap(err.into()))?;
            let target_geometry = GridGeometry::new(
                target_extent,
                parts.recompose_with(&spatial),
                source.geometry().spatial_axes(),
            )
            .map_err(|err| wrap(err.into()))?;
            let target_crs = parts.recompose_crs_with(&spatial_crs);

            debug!(
                source = %name,
                from = %source.crs(),
                to = %target_crs,
                "Resampling source onto shared geometry"
            );
            let params = ParameterSet::new()
                .with_source(0, Arc::clone(source))
                .with("crs", ParamValue::Crs(target_crs))
                .with("grid_geometry", ParamValue::GridGeometry(target_geometry))
                .with(
                    "interpolation",
                    ParamValue::Interpolation(self.interpolation),
                );
            *source = executor.run_named("Resample", &params).map_err(wrap)?;
        }
        Ok(())
    }
}
