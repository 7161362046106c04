//! Running operations end to end.
//!
//! The executor owns the fixed execution order: resolve parameters,
//! reconcile source geometries, verify the reconciliation took, invoke
//! the pixel function, derive output semantics, and assemble the result
//! coverage. Descriptors only plug capabilities into that order; they
//! never change it.

use std::sync::Arc;

use coverage_common::Coverage;
use tracing::debug;
use transform::DEFAULT_TOLERANCE;

use crate::decompose::decompose_coverage;
use crate::descriptor::{OperationDescriptor, PixelInput};
use crate::error::{ProcessingError, Result};
use crate::params::{ParameterSet, ResolvedParams};
use crate::reconcile::{DefaultReconciler, GeometryReconciler};
use crate::registry::OperationRegistry;
use crate::semantics::derive_sample_dimensions;

/// Executes operations against a registry, reconciling source geometries
/// first.
pub struct OperationExecutor {
    registry: Arc<OperationRegistry>,
    reconciler: Arc<dyn GeometryReconciler>,
    tolerance: f64,
}

impl OperationExecutor {
    /// An executor with the default reconciler and tolerance.
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self {
            registry,
            reconciler: Arc::new(DefaultReconciler::default()),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Replace the geometry reconciler.
    pub fn with_reconciler(mut self, reconciler: Arc<dyn GeometryReconciler>) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Replace the tolerance used when comparing reconciled geometries.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Look an operation up, resolve the caller's parameters, and run it.
    pub fn run_named(&self, name: &str, params: &ParameterSet) -> Result<Arc<Coverage>> {
        let descriptor = self.registry.lookup(name)?;
        let resolved = descriptor.resolve(params)?;
        self.run(&descriptor, &resolved)
    }

    /// Run a resolved operation.
    pub fn run(
        &self,
        descriptor: &OperationDescriptor,
        params: &ResolvedParams,
    ) -> Result<Arc<Coverage>> {
        let mut sources = params.sources();
        if sources.is_empty() {
            return Err(ProcessingError::invalid_parameter(
                "Source0",
                format!(
                    "operation '{}' resolved no source coverages",
                    descriptor.name()
                ),
            ));
        }
        debug!(
            operation = %descriptor.name(),
            sources = sources.len(),
            "Executing operation"
        );

        self.reconciler.reconcile(self, &mut sources, None, None)?;
        self.check_reconciled(&sources)?;

        let input = PixelInput {
            sources: &sources,
            params,
        };
        let buffer = descriptor.invoke(&input)?;

        // Output band semantics, falling back to the first source's bands
        // when the descriptor declines to derive them. The primary source
        // is the first one whose own bands came through unchanged; it
        // donates the result's CRS and grid geometry.
        let (primary, bands) = match derive_sample_dimensions(descriptor, &sources, params) {
            Some(bands) => {
                let index = sources
                    .iter()
                    .position(|s| s.bands() == bands.as_slice())
                    .unwrap_or(0);
                (&sources[index], bands)
            }
            None => (&sources[0], sources[0].bands().to_vec()),
        };

        let source_names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        let name = format!("{}({})", descriptor.name(), source_names.join(", "));

        let (crs, geometry) = match descriptor.output_geometry() {
            Some(output_geometry) => output_geometry(&input)?,
            None => (primary.crs().clone(), primary.geometry().clone()),
        };

        let result = Coverage::new(name, crs, geometry, bands, Arc::new(buffer))?;
        debug!(operation = %descriptor.name(), result = %result.name(), "Operation complete");
        Ok(Arc::new(result))
    }

    /// Verify that reconciliation left every source on one horizontal
    /// geometry. Failing here means the reconciler misbehaved, not that
    /// the caller's inputs were bad.
    fn check_reconciled(&self, sources: &[Arc<Coverage>]) -> Result<()> {
        if sources.len() < 2 {
            return Ok(());
        }
        let reference = decompose_coverage(&sources[0]).map_err(|err| {
            ProcessingError::incompatible_geometry(format!(
                "source '{}' has no separable horizontal block: {}",
                sources[0].name(),
                err
            ))
        })?;
        let reference_extent = sources[0].geometry().extent();
        let x_dim = reference.spatial_range.start;
        let y_dim = x_dim + 1;

        for source in &sources[1..] {
            let parts = decompose_coverage(source).map_err(|err| {
                ProcessingError::incompatible_geometry(format!(
                    "source '{}' has no separable horizontal block: {}",
                    source.name(),
                    err
                ))
            })?;
            let extent = source.geometry().extent();
            let aligned = parts.spatial_range == reference.spatial_range
                && parts.spatial_crs.equivalent_to(&reference.spatial_crs)
                && parts.spatial.equivalent_to(&reference.spatial, self.tolerance)
                && extent.size(x_dim) == reference_extent.size(x_dim)
                && extent.size(y_dim) == reference_extent.size(y_dim);
            if !aligned {
                return Err(ProcessingError::incompatible_geometry(format!(
                    "source '{}' still differs from '{}' after reconciliation",
                    source.name(),
                    sources[0].name()
                )));
            }
        }
        Ok(())
    }
}
