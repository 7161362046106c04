//! Pointwise arithmetic operations.
//!
//! Three families share their plumbing: constant operations taking a
//! per-band `constants` list (a single value broadcasts across bands),
//! plain unary maps, and binary operations over two sources. Each
//! descriptor pairs its pixel function with interval-arithmetic range
//! policies and a unit policy, so derived coverages keep honest
//! semantics without recomputing statistics.

use std::sync::Arc;

use coverage_common::{NumberRange, Unit};

use crate::descriptor::{OperationDescriptor, PixelInput, SampleDerivation, UnitFn};
use crate::error::{ProcessingError, Result};
use crate::params::{ParamDescriptor, ParamKind, ResolvedParams};

/// Expand a `constants` list to one value per band.
///
/// A single constant broadcasts; otherwise the list length must equal
/// the band count.
fn constants_for_bands(constants: &[f64], num_bands: usize) -> Result<Vec<f64>> {
    match constants.len() {
        0 => Err(ProcessingError::invalid_parameter(
            "constants",
            "needs at least one value",
        )),
        1 => Ok(vec![constants[0]; num_bands]),
        n if n == num_bands => Ok(constants.to_vec()),
        n => Err(ProcessingError::invalid_parameter(
            "constants",
            format!("{} values for {} bands", n, num_bands),
        )),
    }
}

/// The constant a range policy sees for one band, honoring broadcast.
fn band_constant(constants: &[f64], band: usize) -> f64 {
    constants
        .get(band)
        .or_else(|| constants.first())
        .copied()
        .unwrap_or(0.0)
}

/// Unit policy keeping the first source's unit.
fn preserved_unit() -> UnitFn {
    Arc::new(|units: &[Option<Unit>], _| units[0].clone())
}

/// Unit policy keeping the unit only when every source agrees.
fn agreeing_unit() -> UnitFn {
    Arc::new(|units: &[Option<Unit>], _| {
        if units.iter().all(|u| *u == units[0]) {
            units[0].clone()
        } else {
            None
        }
    })
}

/// Unit policy for outputs that are pure numbers.
fn dimensionless_unit() -> UnitFn {
    Arc::new(|_: &[Option<Unit>], _| Some(Unit::dimensionless()))
}

// ============================================================================
// Constant operations
// ============================================================================

fn unary_const_descriptor(
    name: &str,
    apply: fn(f32, f64) -> f32,
    range: fn(&NumberRange, f64) -> NumberRange,
) -> OperationDescriptor {
    OperationDescriptor::new(
        name,
        vec![
            ParamDescriptor::source(0),
            ParamDescriptor::required("constants", ParamKind::FloatList),
        ],
        Arc::new(move |input: &PixelInput<'_>| {
            let source = &input.sources[0];
            let constants =
                constants_for_bands(&input.params.float_list("constants")?, source.num_bands())?;
            Ok(source.buffer().map(|band, v| apply(v, constants[band])))
        }),
    )
    .with_derivation(SampleDerivation::new(
        Arc::new(
            move |ranges: &[NumberRange], params: &ResolvedParams, band| {
                let constants = params.float_list("constants").unwrap_or_default();
                range(&ranges[0], band_constant(&constants, band))
            },
        ),
        preserved_unit(),
    ))
}

/// "AddConst": add a per-band constant.
pub fn add_const() -> OperationDescriptor {
    unary_const_descriptor("AddConst", |v, c| v + c as f32, |r, c| r.shift(c))
}

/// "SubtractConst": subtract a per-band constant.
pub fn subtract_const() -> OperationDescriptor {
    unary_const_descriptor("SubtractConst", |v, c| v - c as f32, |r, c| r.shift(-c))
}

/// "MultiplyConst": scale by a per-band constant.
pub fn multiply_const() -> OperationDescriptor {
    unary_const_descriptor("MultiplyConst", |v, c| v * c as f32, |r, c| r.scale(c))
}

/// "DivideByConst": divide by a per-band constant. Zero divisors are
/// rejected before any pixel is touched.
pub fn divide_by_const() -> OperationDescriptor {
    OperationDescriptor::new(
        "DivideByConst",
        vec![
            ParamDescriptor::source(0),
            ParamDescriptor::required("constants", ParamKind::FloatList),
        ],
        Arc::new(|input: &PixelInput<'_>| {
            let source = &input.sources[0];
            let constants =
                constants_for_bands(&input.params.float_list("constants")?, source.num_bands())?;
            if constants.iter().any(|&c| c == 0.0) {
                return Err(ProcessingError::invalid_parameter(
                    "constants",
                    "division by zero",
                ));
            }
            Ok(source.buffer().map(|band, v| v / constants[band] as f32))
        }),
    )
    .with_derivation(SampleDerivation::new(
        Arc::new(|ranges: &[NumberRange], params: &ResolvedParams, band| {
            let constants = params.float_list("constants").unwrap_or_default();
            let c = band_constant(&constants, band);
            if c == 0.0 {
                ranges[0]
            } else {
                ranges[0].scale(1.0 / c)
            }
        }),
        preserved_unit(),
    ))
}

/// "Rescale": `v * scale + offset` per band. `offsets` defaults to zero.
pub fn rescale() -> OperationDescriptor {
    OperationDescriptor::new(
        "Rescale",
        vec![
            ParamDescriptor::source(0),
            ParamDescriptor::required("scales", ParamKind::FloatList),
            ParamDescriptor::with_default(
                "offsets",
                crate::params::ParamValue::FloatList(vec![0.0]),
            ),
        ],
        Arc::new(|input: &PixelInput<'_>| {
            let source = &input.sources[0];
            let bands = source.num_bands();
            let scales = constants_for_bands(&input.params.float_list("scales")?, bands)?;
            let offsets = constants_for_bands(&input.params.float_list("offsets")?, bands)?;
            Ok(source
                .buffer()
                .map(|band, v| v * scales[band] as f32 + offsets[band] as f32))
        }),
    )
    .with_derivation(SampleDerivation::new(
        Arc::new(|ranges: &[NumberRange], params: &ResolvedParams, band| {
            let scales = params.float_list("scales").unwrap_or_default();
            let offsets = params.float_list("offsets").unwrap_or_default();
            ranges[0]
                .scale(band_constant(&scales, band))
                .shift(band_constant(&offsets, band))
        }),
        preserved_unit(),
    ))
}

// ============================================================================
// Unary maps
// ============================================================================

fn unary_map_descriptor(
    name: &str,
    apply: fn(f32) -> f32,
    range: fn(&NumberRange) -> NumberRange,
    unit: UnitFn,
) -> OperationDescriptor {
    OperationDescriptor::new(
        name,
        vec![ParamDescriptor::source(0)],
        Arc::new(move |input: &PixelInput<'_>| {
            Ok(input.sources[0].buffer().map(|_, v| apply(v)))
        }),
    )
    .with_derivation(SampleDerivation::new(
        Arc::new(move |ranges: &[NumberRange], _, _| range(&ranges[0])),
        unit,
    ))
}

/// "Absolute": `|v|`.
pub fn absolute() -> OperationDescriptor {
    unary_map_descriptor("Absolute", |v| v.abs(), |r| r.abs(), preserved_unit())
}

/// "Invert": `1/v`, with the unit moving to its reciprocal.
pub fn invert() -> OperationDescriptor {
    unary_map_descriptor(
        "Invert",
        |v| 1.0 / v,
        |r| r.reciprocal(),
        Arc::new(|units: &[Option<Unit>], _| units[0].as_ref().map(Unit::reciprocal)),
    )
}

/// "Log": natural logarithm; output is a pure number.
pub fn log() -> OperationDescriptor {
    unary_map_descriptor("Log", |v| v.ln(), |r| r.ln(), dimensionless_unit())
}

/// "Exp": `e^v`; output is a pure number.
pub fn exp() -> OperationDescriptor {
    unary_map_descriptor("Exp", |v| v.exp(), |r| r.exp(), dimensionless_unit())
}

// ============================================================================
// Binary operations
// ============================================================================

fn binary_descriptor(
    name: &str,
    combine: fn(f32, f32) -> f32,
    range: fn(&NumberRange, &NumberRange) -> NumberRange,
    unit: UnitFn,
) -> OperationDescriptor {
    OperationDescriptor::new(
        name,
        vec![ParamDescriptor::source(0), ParamDescriptor::source(1)],
        Arc::new(move |input: &PixelInput<'_>| {
            let combined = input.sources[0]
                .buffer()
                .zip_map(input.sources[1].buffer(), |_, a, b| combine(a, b))?;
            Ok(combined)
        }),
    )
    .with_derivation(SampleDerivation::new(
        Arc::new(move |ranges: &[NumberRange], _, _| range(&ranges[0], &ranges[1])),
        unit,
    ))
}

/// "Add": cell-wise sum of two sources.
pub fn add() -> OperationDescriptor {
    binary_descriptor("Add", |a, b| a + b, |a, b| a.add(b), agreeing_unit())
}

/// "Subtract": cell-wise difference of two sources.
pub fn subtract() -> OperationDescriptor {
    binary_descriptor(
        "Subtract",
        |a, b| a - b,
        |a, b| a.subtract(b),
        agreeing_unit(),
    )
}

/// "Multiply": cell-wise product; no meaningful output unit.
pub fn multiply() -> OperationDescriptor {
    binary_descriptor(
        "Multiply",
        |a, b| a * b,
        |a, b| a.multiply(b),
        Arc::new(|_: &[Option<Unit>], _| None),
    )
}

/// "Min": cell-wise minimum. NaN counts as missing: the other side wins.
pub fn min() -> OperationDescriptor {
    binary_descriptor(
        "Min",
        f32::min,
        |a, b| a.elementwise_min(b),
        agreeing_unit(),
    )
}

/// "Max": cell-wise maximum. NaN counts as missing: the other side wins.
pub fn max() -> OperationDescriptor {
    binary_descriptor(
        "Max",
        f32::max,
        |a, b| a.elementwise_max(b),
        agreeing_unit(),
    )
}
