//! Operation descriptors.
//!
//! An operation is a value, not a type: a name, a parameter schema, a
//! pixel function, and optional derivation capabilities. Specialized
//! operations are built by factory functions producing differently
//! configured descriptors (see the `ops` module) rather than by
//! subclassing anything.

use std::sync::Arc;

use coverage_common::{Coverage, Crs, GridGeometry, NumberRange, PixelBuffer, Unit};

use crate::error::{ProcessingError, Result};
use crate::params::{ParamDescriptor, ParamKind, ParamValue, ParameterSet, ResolvedParams};

/// Everything a pixel function sees: the post-reconciliation sources and
/// the resolved parameters.
pub struct PixelInput<'a> {
    pub sources: &'a [Arc<Coverage>],
    pub params: &'a ResolvedParams,
}

/// The per-pixel computation: sources in, raw output buffer out.
pub type PixelFn = Arc<dyn Fn(&PixelInput<'_>) -> Result<PixelBuffer> + Send + Sync>;

/// Range policy: per-source quantitative ranges for one band, the resolved
/// parameters, and the output band index.
pub type RangeFn = Arc<dyn Fn(&[NumberRange], &ResolvedParams, usize) -> NumberRange + Send + Sync>;

/// Unit policy: per-source units for one band plus the resolved parameters.
pub type UnitFn = Arc<dyn Fn(&[Option<Unit>], &ResolvedParams) -> Option<Unit> + Send + Sync>;

/// Output-geometry override for operations that change the grid, such as
/// reprojection. When absent, the executor copies CRS and geometry from
/// the primary source.
pub type GeometryFn = Arc<dyn Fn(&PixelInput<'_>) -> Result<(Crs, GridGeometry)> + Send + Sync>;

/// How an operation's output bands derive their numeric semantics from
/// the inputs.
pub struct SampleDerivation {
    pub range: RangeFn,
    pub unit: UnitFn,
}

impl SampleDerivation {
    pub fn new(range: RangeFn, unit: UnitFn) -> Self {
        Self { range, unit }
    }
}

/// A registered operation: parameter schema plus capabilities.
///
/// Immutable once registered; shared via `Arc` from the registry.
pub struct OperationDescriptor {
    name: String,
    params: Vec<ParamDescriptor>,
    pixel_fn: PixelFn,
    derivation: Option<SampleDerivation>,
    output_geometry: Option<GeometryFn>,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<ParamDescriptor>, pixel_fn: PixelFn) -> Self {
        Self {
            name: name.into(),
            params,
            pixel_fn,
            derivation: None,
            output_geometry: None,
        }
    }

    /// Attach a numeric derivation policy.
    pub fn with_derivation(mut self, derivation: SampleDerivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    /// Attach an output-geometry override.
    pub fn with_output_geometry(mut self, geometry: GeometryFn) -> Self {
        self.output_geometry = Some(geometry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn derivation(&self) -> Option<&SampleDerivation> {
        self.derivation.as_ref()
    }

    pub fn output_geometry(&self) -> Option<&GeometryFn> {
        self.output_geometry.as_ref()
    }

    /// Number of source-coverage slots in the schema.
    pub fn num_sources(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Coverage)
            .count()
    }

    /// Validate a caller's parameter set against the schema and snapshot
    /// it in schema order.
    ///
    /// Missing required slots, kind mismatches, and names the schema does
    /// not declare all fail with `InvalidParameter`. The caller's set is
    /// never modified and never aliased by the result.
    pub fn resolve(&self, set: &ParameterSet) -> Result<ResolvedParams> {
        for name in set.names() {
            if !self.params.iter().any(|p| p.name == name) {
                return Err(ProcessingError::invalid_parameter(
                    name,
                    format!("operation '{}' declares no such parameter", self.name),
                ));
            }
        }

        let mut values: Vec<(String, ParamValue)> = Vec::with_capacity(self.params.len());
        for descriptor in &self.params {
            match set.get(&descriptor.name) {
                Some(value) => {
                    if value.kind() != descriptor.kind {
                        return Err(ProcessingError::invalid_parameter(
                            &descriptor.name,
                            format!("expected {}, got {}", descriptor.kind, value.kind()),
                        ));
                    }
                    values.push((descriptor.name.clone(), value.clone()));
                }
                None => match (&descriptor.default, descriptor.required) {
                    (Some(default), _) => {
                        values.push((descriptor.name.clone(), default.clone()));
                    }
                    (None, true) => {
                        return Err(ProcessingError::invalid_parameter(
                            &descriptor.name,
                            "missing required parameter",
                        ));
                    }
                    (None, false) => {}
                },
            }
        }

        Ok(ResolvedParams::new(self.name.clone(), values))
    }

    /// Run the pixel function.
    pub fn invoke(&self, input: &PixelInput<'_>) -> Result<PixelBuffer> {
        (self.pixel_fn)(input)
    }
}
