//! Coverage Operation Pipeline
//!
//! This crate runs named pointwise operations over multi-dimensional
//! coverages. It provides:
//!
//! - **Operations as values**: descriptors bundling a parameter schema,
//!   a pixel function, and optional semantic-derivation policies
//! - **Geometry reconciliation**: sources on differing grids or CRSs are
//!   resampled onto a common geometry before the pixel function runs
//! - **Semantic derivation**: output band ranges, units, and categories
//!   follow from the sources without rescanning pixel data
//! - **Result caching**: weakly-held memoization with per-key single
//!   flight for concurrent callers
//!
//! # Architecture
//!
//! ```text
//! CoverageProcessor::apply(name, params)
//!      │
//!      ▼
//! ResultCache ── hit? ──► return cached Arc<Coverage>
//!      │ miss (per-key lock)
//!      ▼
//! OperationExecutor::run
//!      │
//!      ├─► GeometryReconciler: resample stragglers onto the
//!      │   common 2D geometry (via the registered "Resample" op)
//!      │
//!      ├─► pixel function over band-interleaved buffers
//!      │
//!      └─► derive output sample dimensions, assemble Coverage
//! ```
//!
//! # Example
//!
//! ```ignore
//! use coverage_processor::{CoverageProcessor, ParamValue, ParameterSet};
//!
//! let processor = CoverageProcessor::with_default_operations();
//!
//! let params = ParameterSet::new()
//!     .with_source(0, temperature)
//!     .with("constants", ParamValue::FloatList(vec![-273.15]));
//! let celsius = processor.apply("AddConst", &params)?;
//!
//! assert_eq!(processor.cache_stats().misses, 1);
//! ```

pub mod cache;
pub mod config;
pub mod decompose;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod interpolation;
pub mod ops;
pub mod params;
pub mod processor;
pub mod reconcile;
pub mod registry;
pub mod semantics;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, ResultCache};
pub use config::ProcessorConfig;
pub use decompose::{decompose, decompose_coverage, DecomposedTransform};
pub use descriptor::{
    GeometryFn, OperationDescriptor, PixelFn, PixelInput, RangeFn, SampleDerivation, UnitFn,
};
pub use error::{ProcessingError, Result};
pub use executor::OperationExecutor;
pub use interpolation::{sample_plane, InterpolationMethod};
pub use params::{
    CacheKey, ParamDescriptor, ParamKind, ParamValue, ParameterSet, ResolvedParams,
};
pub use processor::CoverageProcessor;
pub use reconcile::{DefaultReconciler, GeometryReconciler};
pub use registry::OperationRegistry;
pub use semantics::derive_sample_dimensions;
