//! Deriving the sample dimensions of an operation result.
//!
//! An operation that maps pixel values also maps their meaning: adding
//! 10 to a temperature band shifts its value range, inverting moves the
//! unit to its reciprocal. The derivation here applies the descriptor's
//! range and unit policies band by band, and declines (returns `None`)
//! whenever a band's semantics are ambiguous rather than guessing. A
//! declined derivation falls back to the primary source's bands.

use std::sync::Arc;

use coverage_common::{Coverage, SampleDimension};

use crate::descriptor::OperationDescriptor;
use crate::params::ResolvedParams;

/// Derive the result's sample dimensions from the sources' under the
/// descriptor's range and unit policies.
///
/// Returns `None` when the descriptor declares no derivation, when the
/// multi-band sources disagree on band count, or when any contributing
/// band lacks a single quantitative category. Single-band sources
/// broadcast against multi-band ones.
pub fn derive_sample_dimensions(
    descriptor: &OperationDescriptor,
    sources: &[Arc<Coverage>],
    params: &ResolvedParams,
) -> Option<Vec<SampleDimension>> {
    let derivation = descriptor.derivation()?;
    if sources.is_empty() {
        return None;
    }

    let mut num_bands = 1;
    for source in sources {
        let n = source.num_bands();
        if n > 1 {
            if num_bands > 1 && n != num_bands {
                return None;
            }
            num_bands = n;
        }
    }

    let mut derived = Vec::with_capacity(num_bands);
    for band in 0..num_bands {
        let mut ranges = Vec::with_capacity(sources.len());
        let mut units = Vec::with_capacity(sources.len());
        for source in sources {
            let dim = contributing_band(source, band);
            ranges.push(dim.quantitative_range()?);
            units.push(dim.unit.clone());
        }

        let range = (derivation.range)(&ranges, params, band);
        let unit = (derivation.unit)(&units, params);

        // The first source's band is the template. When the policies
        // leave its semantics unchanged the whole dimension survives,
        // titles and qualitative categories included.
        let primary = contributing_band(&sources[0], band);
        if range == ranges[0] && unit == primary.unit {
            derived.push(primary.clone());
            continue;
        }

        let categories = primary
            .categories
            .iter()
            .map(|category| {
                if category.quantitative {
                    let mut rescaled = category.clone();
                    rescaled.range = range;
                    rescaled
                } else {
                    category.clone()
                }
            })
            .collect();
        derived.push(SampleDimension::untitled(categories, unit));
    }
    Some(derived)
}

/// The sample dimension a source contributes to an output band.
/// Single-band sources contribute their only band everywhere.
fn contributing_band(source: &Coverage, band: usize) -> &SampleDimension {
    if source.num_bands() == 1 {
        &source.bands()[0]
    } else {
        &source.bands()[band]
    }
}
