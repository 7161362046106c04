//! Top-level processor facade.
//!
//! Bundles a registry, an executor wired from configuration, and the
//! result cache into one entry point. There is no process-wide
//! instance; construct one per embedding and share it behind an `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! use coverage_processor::{CoverageProcessor, ParamValue, ParameterSet};
//!
//! let processor = CoverageProcessor::with_default_operations();
//! let params = ParameterSet::new()
//!     .with_source(0, coverage)
//!     .with("constants", ParamValue::FloatList(vec![10.0]));
//! let result = processor.apply("AddConst", &params)?;
//! ```

use std::sync::Arc;

use coverage_common::Coverage;

use crate::cache::{CacheStats, ResultCache};
use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::executor::OperationExecutor;
use crate::params::ParameterSet;
use crate::reconcile::DefaultReconciler;
use crate::registry::OperationRegistry;

/// Applies named operations to coverages, caching results.
pub struct CoverageProcessor {
    config: ProcessorConfig,
    cache: ResultCache,
}

impl CoverageProcessor {
    /// A processor over the given registry.
    pub fn new(registry: Arc<OperationRegistry>, config: ProcessorConfig) -> Self {
        let reconciler =
            DefaultReconciler::new(config.geometry_tolerance, config.interpolation);
        let executor = OperationExecutor::new(registry)
            .with_reconciler(Arc::new(reconciler))
            .with_tolerance(config.geometry_tolerance);
        let cache = ResultCache::new(executor, config.cache_capacity);
        Self { config, cache }
    }

    /// A processor with the builtin operations and default configuration.
    pub fn with_default_operations() -> Self {
        Self::new(
            Arc::new(OperationRegistry::with_defaults()),
            ProcessorConfig::default(),
        )
    }

    /// Apply a named operation to the sources and parameters in `params`.
    ///
    /// Results are cached by operation and resolved parameters; a repeat
    /// call whose result is still alive returns the same `Arc`.
    pub fn apply(&self, name: &str, params: &ParameterSet) -> Result<Arc<Coverage>> {
        self.cache.apply(name, params)
    }

    /// Get cache statistics for monitoring.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cache entries whose results no caller holds anymore.
    pub fn purge_reclaimed(&self) -> usize {
        self.cache.purge_reclaimed()
    }

    /// Clear the result cache.
    ///
    /// # Returns
    /// The number of entries dropped.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        self.cache.executor().registry()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }
}

impl Default for CoverageProcessor {
    fn default() -> Self {
        Self::with_default_operations()
    }
}
