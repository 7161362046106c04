//! Categories: named value ranges within a band.

use serde::{Deserialize, Serialize};

use crate::range::NumberRange;

/// A named range of sample values within a band.
///
/// Quantitative categories describe measured values; qualitative ones
/// describe flags such as no-data or cloud masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub range: NumberRange,
    /// Render color as RGBA, when one is defined.
    pub color: Option<[u8; 4]>,
    /// Whether the range represents measured values rather than flags.
    pub quantitative: bool,
}

impl Category {
    /// A category of measured values.
    pub fn quantitative(name: impl Into<String>, range: NumberRange) -> Self {
        Self {
            name: name.into(),
            range,
            color: None,
            quantitative: true,
        }
    }

    /// A flag category (no-data, masked, …).
    pub fn qualitative(name: impl Into<String>, range: NumberRange) -> Self {
        Self {
            name: name.into(),
            range,
            color: None,
            quantitative: false,
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = Some(color);
        self
    }
}
