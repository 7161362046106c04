//! Configuration for the coverage processor.

use serde::{Deserialize, Serialize};

use crate::interpolation::InterpolationMethod;

/// Configuration for the coverage processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Maximum number of results the cache index tracks.
    pub cache_capacity: usize,

    /// Interpolation method used when reconciliation has to resample.
    pub interpolation: InterpolationMethod,

    /// Tolerance for treating grid geometries as equivalent.
    pub geometry_tolerance: f64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            interpolation: InterpolationMethod::Bilinear,
            geometry_tolerance: 1e-9,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COVERAGE_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.cache_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("COVERAGE_INTERPOLATION") {
            config.interpolation = InterpolationMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("COVERAGE_GEOMETRY_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                config.geometry_tolerance = tolerance;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        if !self.geometry_tolerance.is_finite() || self.geometry_tolerance < 0.0 {
            return Err("geometry_tolerance must be finite and >= 0".to_string());
        }

        Ok(())
    }
}
