//! Units of measure attached to sample dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of measure, stored by symbol ("K", "m/s", "Pa").
///
/// Units are compared by symbol; there is no conversion machinery here.
/// Operations that cannot name a meaningful output unit drop the unit
/// instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(String);

impl Unit {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The unit of pure numbers.
    pub fn dimensionless() -> Self {
        Self(String::new())
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Unit of `1/x` values.
    pub fn reciprocal(&self) -> Unit {
        if self.is_dimensionless() {
            Self::dimensionless()
        } else {
            Self(format!("1/{}", self.0))
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
