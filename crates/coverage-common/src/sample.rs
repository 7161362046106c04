//! Sample dimensions: per-band semantics of a coverage.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::range::NumberRange;
use crate::unit::Unit;

/// Description of one band of a coverage: an optional title, an ordered
/// category list, and an optional unit.
///
/// Untitled dimensions take their display name from the dominant
/// (single quantitative) category, so synthesized bands stay readable
/// without inventing titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDimension {
    pub title: Option<String>,
    pub categories: Vec<Category>,
    pub unit: Option<Unit>,
}

impl SampleDimension {
    pub fn new(title: Option<String>, categories: Vec<Category>, unit: Option<Unit>) -> Self {
        Self {
            title,
            categories,
            unit,
        }
    }

    pub fn titled(
        title: impl Into<String>,
        categories: Vec<Category>,
        unit: Option<Unit>,
    ) -> Self {
        Self::new(Some(title.into()), categories, unit)
    }

    pub fn untitled(categories: Vec<Category>, unit: Option<Unit>) -> Self {
        Self::new(None, categories, unit)
    }

    /// The only quantitative category, or `None` when there are zero or
    /// several. Ambiguity here is what makes derivation decline for the
    /// band.
    pub fn single_quantitative(&self) -> Option<&Category> {
        let mut found = None;
        for category in &self.categories {
            if category.quantitative {
                if found.is_some() {
                    return None;
                }
                found = Some(category);
            }
        }
        found
    }

    /// The quantitative value range, when unambiguous.
    pub fn quantitative_range(&self) -> Option<NumberRange> {
        self.single_quantitative().map(|c| c.range)
    }

    /// Display name: the title when present, else the dominant
    /// quantitative category's name, else "untitled".
    pub fn display_name(&self) -> &str {
        if let Some(title) = &self.title {
            return title;
        }
        if let Some(category) = self.single_quantitative() {
            return &category.name;
        }
        "untitled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_band() -> SampleDimension {
        SampleDimension::titled(
            "2m temperature",
            vec![
                Category::qualitative("no-data", NumberRange::new(-1.0, 0.0)),
                Category::quantitative("temperature", NumberRange::new(0.0, 255.0)),
            ],
            Some(Unit::new("K")),
        )
    }

    #[test]
    fn test_single_quantitative() {
        let band = temperature_band();
        let category = band.single_quantitative().unwrap();
        assert_eq!(category.name, "temperature");
        assert_eq!(
            band.quantitative_range(),
            Some(NumberRange::new(0.0, 255.0))
        );
    }

    #[test]
    fn test_zero_quantitative_is_ambiguous() {
        let band = SampleDimension::untitled(
            vec![Category::qualitative("no-data", NumberRange::new(0.0, 1.0))],
            None,
        );
        assert!(band.single_quantitative().is_none());
    }

    #[test]
    fn test_several_quantitative_is_ambiguous() {
        let band = SampleDimension::untitled(
            vec![
                Category::quantitative("low", NumberRange::new(0.0, 100.0)),
                Category::quantitative("high", NumberRange::new(100.0, 200.0)),
            ],
            None,
        );
        assert!(band.single_quantitative().is_none());
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(temperature_band().display_name(), "2m temperature");

        let untitled = SampleDimension::untitled(
            vec![Category::quantitative(
                "reflectivity",
                NumberRange::new(0.0, 80.0),
            )],
            None,
        );
        assert_eq!(untitled.display_name(), "reflectivity");

        let bare = SampleDimension::untitled(vec![], None);
        assert_eq!(bare.display_name(), "untitled");
    }
}
