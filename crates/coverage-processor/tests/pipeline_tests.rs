//! End-to-end tests for the operation pipeline: lookup, reconciliation,
//! pixel execution, and semantic derivation working together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coverage_common::{
    Category, Coverage, Crs, CrsCode, GridGeometry, NumberRange, PixelBuffer, SampleDimension,
    Unit,
};
use coverage_processor::{
    ops, CoverageProcessor, OperationDescriptor, OperationRegistry, ParamDescriptor, ParamValue,
    ParameterSet, PixelFn, PixelInput, ProcessingError, ProcessorConfig,
};
use test_utils::fixtures::{bands, grid, ranges, units};
use test_utils::generators::{
    create_constant_grid, create_grid_with_nans, create_temperature_grid, create_u_wind_grid,
    create_v_wind_grid, interleave_bands,
};
use test_utils::{assert_approx_eq, assert_range_approx_eq};
use transform::AffineTransform;

// ============================================================================
// Fixtures
// ============================================================================

fn quantitative_band(name: &str, range: NumberRange, unit: Option<Unit>) -> SampleDimension {
    SampleDimension::untitled(vec![Category::quantitative(name, range)], unit)
}

fn coverage_on(
    spec: grid::GridSpec,
    name: &str,
    values: Vec<f32>,
    bands: Vec<SampleDimension>,
) -> Arc<Coverage> {
    let geometry = GridGeometry::d2(
        spec.width,
        spec.height,
        AffineTransform::grid_to_world_2d(spec.origin_x, spec.origin_y, spec.x_res, spec.y_res),
    )
    .unwrap();
    let buffer =
        Arc::new(PixelBuffer::new(vec![spec.width, spec.height], bands.len(), values).unwrap());
    Arc::new(
        Coverage::new(
            name,
            Crs::horizontal(CrsCode::Epsg4326),
            geometry,
            bands,
            buffer,
        )
        .unwrap(),
    )
}

fn geographic_coverage(
    name: &str,
    width: usize,
    height: usize,
    values: Vec<f32>,
    bands: Vec<SampleDimension>,
) -> Arc<Coverage> {
    let spec = grid::GridSpec {
        width,
        height,
        origin_x: -120.0,
        origin_y: 50.0,
        x_res: 1.0,
        y_res: -1.0,
    };
    coverage_on(spec, name, values, bands)
}

/// A web-mercator coverage whose cell centers span the footprint between
/// the given geographic corners.
fn mercator_coverage(
    name: &str,
    size: usize,
    west: f64,
    north: f64,
    east: f64,
    south: f64,
    values: Vec<f32>,
    bands: Vec<SampleDimension>,
) -> Arc<Coverage> {
    let (x0, y0) = CrsCode::Epsg3857.from_geographic(west, north).unwrap();
    let (x1, y1) = CrsCode::Epsg3857.from_geographic(east, south).unwrap();
    let geometry = GridGeometry::d2(
        size,
        size,
        AffineTransform::grid_to_world_2d(
            x0,
            y0,
            (x1 - x0) / size as f64,
            (y1 - y0) / size as f64,
        ),
    )
    .unwrap();
    let buffer = Arc::new(PixelBuffer::new(vec![size, size], bands.len(), values).unwrap());
    Arc::new(
        Coverage::new(
            name,
            Crs::horizontal(CrsCode::Epsg3857),
            geometry,
            bands,
            buffer,
        )
        .unwrap(),
    )
}

/// Registry whose "Resample" delegates to the builtin but records every
/// source it is handed.
fn spying_registry() -> (
    Arc<OperationRegistry>,
    Arc<AtomicUsize>,
    Arc<Mutex<Vec<String>>>,
) {
    let registry = OperationRegistry::with_defaults();
    let count = Arc::new(AtomicUsize::new(0));
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let real = Arc::new(ops::resample());
    let pixel_fn: PixelFn = {
        let real = Arc::clone(&real);
        let count = Arc::clone(&count);
        let seen = Arc::clone(&seen);
        Arc::new(move |input: &PixelInput<'_>| {
            count.fetch_add(1, Ordering::SeqCst);
            seen.lock()
                .unwrap()
                .push(input.sources[0].name().to_string());
            real.invoke(input)
        })
    };
    let mut spy = OperationDescriptor::new("Resample", real.params().to_vec(), pixel_fn);
    if let Some(geometry) = real.output_geometry() {
        spy = spy.with_output_geometry(geometry.clone());
    }
    registry.register(spy);

    (Arc::new(registry), count, seen)
}

// ============================================================================
// Single-source execution
// ============================================================================

#[test]
fn test_add_const_end_to_end() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![1.0, 2.0, 3.0, 4.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 255.0),
            Some(Unit::new("K")),
        )],
    );
    let params = ParameterSet::new()
        .with_source(0, source.clone())
        .with("constants", ParamValue::FloatList(vec![10.0]));

    let result = processor.apply("AddConst", &params).unwrap();

    assert_eq!(result.name(), "AddConst(A)");
    assert_eq!(result.buffer().samples(), &[11.0, 12.0, 13.0, 14.0]);
    assert_eq!(
        result.bands()[0].quantitative_range(),
        Some(NumberRange::new(10.0, 265.0))
    );
    assert_eq!(result.bands()[0].unit, Some(Unit::new("K")));
    assert!(result.crs().equivalent_to(source.crs()));
    assert!(result.geometry().equivalent_to(source.geometry(), 0.0));
    assert_ne!(result.id(), source.id());
}

#[test]
fn test_rescale_derives_range_through_both_policies() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![1.0, 2.0, 3.0, 4.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 100.0),
            None,
        )],
    );
    let params = ParameterSet::new()
        .with_source(0, source)
        .with("scales", ParamValue::FloatList(vec![2.0]))
        .with("offsets", ParamValue::FloatList(vec![5.0]));

    let result = processor.apply("Rescale", &params).unwrap();

    assert_eq!(result.buffer().samples(), &[7.0, 9.0, 11.0, 13.0]);
    assert_eq!(
        result.bands()[0].quantitative_range(),
        Some(NumberRange::new(5.0, 205.0))
    );
}

#[test]
fn test_kelvin_to_celsius_conversion() {
    let processor = CoverageProcessor::with_default_operations();
    let spec = grid::SMALL;
    let source = coverage_on(
        spec,
        "t2m",
        create_temperature_grid(spec.width, spec.height),
        vec![SampleDimension::titled(
            bands::TEMPERATURE,
            vec![Category::quantitative(
                bands::TEMPERATURE,
                NumberRange::new(ranges::TEMPERATURE_K.0, ranges::TEMPERATURE_K.1),
            )],
            Some(Unit::new(units::KELVIN)),
        )],
    );
    let params = ParameterSet::new()
        .with_source(0, source)
        .with("constants", ParamValue::FloatList(vec![-273.15]));

    let result = processor.apply("AddConst", &params).unwrap();

    // Corners of the 250..310 K ramp, now in Celsius.
    assert_approx_eq!(result.sample(&[0, 0], 0).unwrap(), -23.15, 1e-4);
    assert_approx_eq!(
        result.sample(&[spec.width - 1, spec.height - 1], 0).unwrap(),
        36.85,
        1e-4
    );
    assert_range_approx_eq!(
        result.bands()[0].quantitative_range().unwrap(),
        NumberRange::new(
            ranges::TEMPERATURE_K.0 - 273.15,
            ranges::TEMPERATURE_K.1 - 273.15
        ),
        1e-9
    );
    // The shifted band is synthesized, so the source title does not survive.
    assert!(result.bands()[0].title.is_none());
    assert_eq!(result.bands()[0].unit, Some(Unit::new(units::KELVIN)));
}

#[test]
fn test_nan_cells_pass_through_arithmetic() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "terrain",
        4,
        4,
        create_grid_with_nans(4, 4, 5),
        vec![quantitative_band(
            bands::ELEVATION,
            NumberRange::new(0.0, 4000.0),
            Some(Unit::new(units::METERS)),
        )],
    );
    let params = ParameterSet::new()
        .with_source(0, source)
        .with("constants", ParamValue::FloatList(vec![2.0]));

    let result = processor.apply("MultiplyConst", &params).unwrap();

    // NaN holes stay NaN; everything else doubles.
    assert!(result.sample(&[0, 0], 0).unwrap().is_nan());
    assert!(result.sample(&[1, 1], 0).unwrap().is_nan());
    assert_eq!(result.sample(&[2, 1], 0).unwrap(), 4002.0);
    assert_eq!(result.sample(&[1, 2], 0).unwrap(), 2004.0);
    assert_eq!(
        result.bands()[0].quantitative_range(),
        Some(NumberRange::new(0.0, 8000.0))
    );
}

#[test]
fn test_divide_by_zero_is_rejected() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![1.0, 2.0, 3.0, 4.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 100.0),
            None,
        )],
    );
    let params = ParameterSet::new()
        .with_source(0, source)
        .with("constants", ParamValue::FloatList(vec![0.0]));

    let err = processor.apply("DivideByConst", &params).unwrap_err();
    assert!(matches!(
        err,
        ProcessingError::InvalidParameter { ref param, .. } if param == "constants"
    ));
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_aligned_sources_are_never_resampled() {
    let (registry, resample_count, _) = spying_registry();
    let processor = CoverageProcessor::new(registry, ProcessorConfig::default());
    let band = || quantitative_band("values", NumberRange::new(0.0, 100.0), None);
    let a = geographic_coverage("a", 4, 4, create_constant_grid(4, 4, 1.0), vec![band()]);
    let b = geographic_coverage("b", 4, 4, create_constant_grid(4, 4, 2.0), vec![band()]);

    let params = ParameterSet::new().with_source(0, a).with_source(1, b);
    let result = processor.apply("Add", &params).unwrap();

    assert_eq!(resample_count.load(Ordering::SeqCst), 0);
    assert_eq!(result.sample(&[2, 2], 0).unwrap(), 3.0);
}

#[test]
fn test_mismatched_crs_resamples_only_the_straggler() {
    let (registry, resample_count, resampled_names) = spying_registry();
    let processor = CoverageProcessor::new(registry, ProcessorConfig::default());

    let band = |name: &str| {
        quantitative_band(name, NumberRange::new(0.0, 100.0), Some(Unit::new("K")))
    };
    // A is geographic; B covers the same footprint in web mercator with
    // a margin so every A cell interpolates inside B's plane.
    let a = geographic_coverage(
        "A",
        8,
        8,
        interleave_bands(&[
            create_constant_grid(8, 8, 1.0),
            create_constant_grid(8, 8, 10.0),
        ]),
        vec![band("first"), band("second")],
    );
    let b = mercator_coverage(
        "B",
        10,
        -121.0,
        51.0,
        -112.0,
        42.0,
        interleave_bands(&[
            create_constant_grid(10, 10, 2.0),
            create_constant_grid(10, 10, 20.0),
        ]),
        vec![band("first"), band("second")],
    );

    let params = ParameterSet::new()
        .with_source(0, a.clone())
        .with_source(1, b);
    let result = processor.apply("Add", &params).unwrap();

    assert_eq!(resample_count.load(Ordering::SeqCst), 1);
    assert_eq!(*resampled_names.lock().unwrap(), vec!["B".to_string()]);

    // The result lands on A's geometry, and B's constant planes survive
    // the warp.
    assert!(result.crs().equivalent_to(a.crs()));
    assert!(result.geometry().equivalent_to(a.geometry(), 1e-9));
    assert_approx_eq!(result.sample(&[3, 3], 0).unwrap(), 3.0, 1e-4);
    assert_approx_eq!(result.sample(&[3, 3], 1).unwrap(), 30.0, 1e-4);
    assert_approx_eq!(result.sample(&[0, 7], 0).unwrap(), 3.0, 1e-4);
}

// ============================================================================
// Semantic derivation across sources
// ============================================================================

#[test]
fn test_single_band_source_broadcasts_across_bands() {
    let processor = CoverageProcessor::with_default_operations();
    let band = |name: &str, range| quantitative_band(name, range, None);
    let a = geographic_coverage(
        "a",
        2,
        2,
        interleave_bands(&[
            create_constant_grid(2, 2, 1.0),
            create_constant_grid(2, 2, 2.0),
            create_constant_grid(2, 2, 3.0),
        ]),
        vec![
            band("one", NumberRange::new(0.0, 10.0)),
            band("two", NumberRange::new(0.0, 20.0)),
            band("three", NumberRange::new(0.0, 30.0)),
        ],
    );
    let b = geographic_coverage(
        "b",
        2,
        2,
        create_constant_grid(2, 2, 100.0),
        vec![band("offset", NumberRange::new(0.0, 100.0))],
    );

    let params = ParameterSet::new().with_source(0, a).with_source(1, b);
    let result = processor.apply("Add", &params).unwrap();

    assert_eq!(result.num_bands(), 3);
    assert_eq!(result.sample(&[0, 0], 0).unwrap(), 101.0);
    assert_eq!(result.sample(&[0, 0], 1).unwrap(), 102.0);
    assert_eq!(result.sample(&[0, 0], 2).unwrap(), 103.0);
    // Each output range is the interval sum of the band's own range and
    // the broadcast single-band range.
    assert_eq!(
        result.bands()[2].quantitative_range(),
        Some(NumberRange::new(0.0, 130.0))
    );
}

#[test]
fn test_disagreeing_units_drop_from_result() {
    let processor = CoverageProcessor::with_default_operations();
    let a = geographic_coverage(
        "a",
        2,
        2,
        create_constant_grid(2, 2, 1.0),
        vec![quantitative_band(
            "kelvin",
            NumberRange::new(0.0, 100.0),
            Some(Unit::new("K")),
        )],
    );
    let b = geographic_coverage(
        "b",
        2,
        2,
        create_constant_grid(2, 2, 2.0),
        vec![quantitative_band(
            "meters",
            NumberRange::new(0.0, 100.0),
            Some(Unit::new("m")),
        )],
    );

    let params = ParameterSet::new().with_source(0, a).with_source(1, b);
    let result = processor.apply("Add", &params).unwrap();

    assert_eq!(result.bands()[0].unit, None);
    assert_eq!(
        result.bands()[0].quantitative_range(),
        Some(NumberRange::new(0.0, 200.0))
    );
}

// ============================================================================
// Failure surfacing
// ============================================================================

#[test]
fn test_unknown_operation_is_reported_without_side_effects() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![1.0, 2.0, 3.0, 4.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 100.0),
            None,
        )],
    );
    let params = ParameterSet::new().with_source(0, source);

    let err = processor.apply("NoSuchOp", &params).unwrap_err();
    assert!(matches!(
        err,
        ProcessingError::OperationNotFound(ref name) if name == "NoSuchOp"
    ));

    let stats = processor.cache_stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.entries, 0);
}

#[test]
fn test_missing_required_parameter_is_reported() {
    let processor = CoverageProcessor::with_default_operations();
    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![1.0, 2.0, 3.0, 4.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 100.0),
            None,
        )],
    );
    // AddConst requires a constants list.
    let params = ParameterSet::new().with_source(0, source);

    let err = processor.apply("AddConst", &params).unwrap_err();
    assert!(matches!(
        err,
        ProcessingError::InvalidParameter { ref param, .. } if param == "constants"
    ));
}

#[test]
fn test_unbridgeable_crs_pair_cannot_reconcile() {
    let processor = CoverageProcessor::with_default_operations();
    let band = || quantitative_band("values", NumberRange::new(0.0, 100.0), None);
    let a = geographic_coverage("a", 4, 4, create_constant_grid(4, 4, 1.0), vec![band()]);
    // Albers has no built-in geographic bridge, so it cannot be warped
    // onto a's grid.
    let geometry = GridGeometry::d2(
        4,
        4,
        AffineTransform::grid_to_world_2d(0.0, 0.0, 1000.0, -1000.0),
    )
    .unwrap();
    let buffer = Arc::new(PixelBuffer::filled(vec![4, 4], 1, 2.0));
    let b = Arc::new(
        Coverage::new(
            "albers",
            Crs::horizontal(CrsCode::Epsg5070),
            geometry,
            vec![band()],
            buffer,
        )
        .unwrap(),
    );

    let params = ParameterSet::new().with_source(0, a).with_source(1, b);
    let err = processor.apply("Add", &params).unwrap_err();
    assert!(matches!(
        err,
        ProcessingError::CannotReproject { ref coverage, .. } if coverage == "albers"
    ));
}

// ============================================================================
// Custom operations
// ============================================================================

#[test]
fn test_registered_custom_operation_runs_through_pipeline() {
    let registry = OperationRegistry::with_defaults();
    registry.register(OperationDescriptor::new(
        "Halve",
        vec![ParamDescriptor::source(0)],
        Arc::new(|input: &PixelInput<'_>| Ok(input.sources[0].buffer().map(|_, v| v / 2.0))),
    ));
    let processor = CoverageProcessor::new(Arc::new(registry), ProcessorConfig::default());

    let source = geographic_coverage(
        "A",
        2,
        2,
        vec![2.0, 4.0, 6.0, 8.0],
        vec![quantitative_band(
            "values",
            NumberRange::new(0.0, 100.0),
            None,
        )],
    );
    let params = ParameterSet::new().with_source(0, source.clone());

    let result = processor.apply("Halve", &params).unwrap();
    assert_eq!(result.name(), "Halve(A)");
    assert_eq!(result.buffer().samples(), &[1.0, 2.0, 3.0, 4.0]);
    // No derivation policy: the source's bands carry over.
    assert_eq!(result.bands(), source.bands());
}

#[test]
fn test_multi_source_custom_operation() {
    let registry = OperationRegistry::with_defaults();
    registry.register(OperationDescriptor::new(
        "WindSpeed",
        vec![ParamDescriptor::source(0), ParamDescriptor::source(1)],
        Arc::new(|input: &PixelInput<'_>| {
            let u = input.sources[0].buffer();
            let v = input.sources[1].buffer();
            Ok(u.zip_map(v, |_, a, b| (a * a + b * b).sqrt())?)
        }),
    ));
    let processor = CoverageProcessor::new(Arc::new(registry), ProcessorConfig::default());

    let spec = grid::SMALL;
    let wind_band = |name: &str| {
        quantitative_band(
            name,
            NumberRange::new(ranges::WIND_MS.0, ranges::WIND_MS.1),
            Some(Unit::new(units::METERS_PER_SECOND)),
        )
    };
    let u = coverage_on(
        spec,
        "U",
        create_u_wind_grid(spec.width, spec.height),
        vec![wind_band(bands::U_WIND)],
    );
    let v = coverage_on(
        spec,
        "V",
        create_v_wind_grid(spec.width, spec.height),
        vec![wind_band(bands::V_WIND)],
    );

    let params = ParameterSet::new()
        .with_source(0, u.clone())
        .with_source(1, v);
    let result = processor.apply("WindSpeed", &params).unwrap();

    assert_eq!(result.name(), "WindSpeed(U, V)");
    // u is 0 m/s on row 8 and v is -5 m/s on column 4.
    assert_eq!(result.sample(&[4, 8], 0).unwrap(), 5.0);
    assert_approx_eq!(result.sample(&[0, 0], 0).unwrap(), 325.0f32.sqrt(), 1e-4);
    assert_eq!(result.bands(), u.bands());
}
