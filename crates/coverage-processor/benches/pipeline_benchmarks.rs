//! Benchmarks for the coverage-processor crate - pointwise operations,
//! resampling, and the result cache.
//!
//! Run with: cargo bench --package coverage-processor -- pointwise
//! Or: cargo bench --package coverage-processor --bench pipeline_benchmarks

use std::sync::Arc;

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use rand::Rng;

use coverage_common::{
    Category, Coverage, Crs, CrsCode, GridGeometry, NumberRange, PixelBuffer, SampleDimension,
    Unit,
};
use coverage_processor::{
    decompose_coverage, CoverageProcessor, OperationExecutor, OperationRegistry, ParamValue,
    ParameterSet,
};
use transform::AffineTransform;

/// Generate a temperature-like field with realistic spatial structure.
/// Values are in Kelvin (typical surface temps: 220K to 320K).
fn generate_temperature_values(width: usize, height: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0.0f32; width * height];

    for y in 0..height {
        for x in 0..width {
            // Base temperature varies with latitude (y position)
            let lat_factor = (y as f32 / height as f32 - 0.5) * 60.0;
            // Add some longitudinal variation
            let lon_factor = ((x as f32 / width as f32) * std::f32::consts::PI * 4.0).sin() * 5.0;
            // Add noise
            let noise = rng.gen_range(-3.0..3.0);

            data[y * width + x] = 273.15 + lat_factor + lon_factor + noise;
        }
    }
    data
}

/// Build a single-band geographic coverage over the given values.
fn temperature_coverage(name: &str, width: usize, height: usize) -> Arc<Coverage> {
    let geometry = GridGeometry::d2(
        width,
        height,
        AffineTransform::grid_to_world_2d(-130.0, 55.0, 70.0 / width as f64, -35.0 / height as f64),
    )
    .unwrap();
    let buffer = Arc::new(
        PixelBuffer::new(
            vec![width, height],
            1,
            generate_temperature_values(width, height),
        )
        .unwrap(),
    );
    let band = SampleDimension::untitled(
        vec![Category::quantitative(
            "temperature",
            NumberRange::new(180.0, 330.0),
        )],
        Some(Unit::new("K")),
    );
    Arc::new(
        Coverage::new(
            name,
            Crs::horizontal(CrsCode::Epsg4326),
            geometry,
            vec![band],
            buffer,
        )
        .unwrap(),
    )
}

fn default_executor() -> OperationExecutor {
    OperationExecutor::new(Arc::new(OperationRegistry::with_defaults()))
}

// =============================================================================
// POINTWISE OPERATION BENCHMARKS
// =============================================================================

fn bench_pointwise_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("pointwise");
    let executor = default_executor();

    let sizes = [(128, 128), (256, 256), (512, 512)];

    for (width, height) in sizes {
        let source = temperature_coverage("tmp", width, height);
        let other = temperature_coverage("tmp2", width, height);

        group.throughput(Throughput::Elements((width * height) as u64));

        group.bench_with_input(
            BenchmarkId::new("add_const", format!("{}x{}", width, height)),
            &source,
            |b, source| {
                let params = ParameterSet::new()
                    .with_source(0, Arc::clone(source))
                    .with("constants", ParamValue::FloatList(vec![-273.15]));
                b.iter(|| executor.run_named("AddConst", black_box(&params)).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("rescale", format!("{}x{}", width, height)),
            &source,
            |b, source| {
                let params = ParameterSet::new()
                    .with_source(0, Arc::clone(source))
                    .with("scales", ParamValue::FloatList(vec![1.8]))
                    .with("offsets", ParamValue::FloatList(vec![-459.67]));
                b.iter(|| executor.run_named("Rescale", black_box(&params)).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("add_binary", format!("{}x{}", width, height)),
            &(source, other),
            |b, (source, other)| {
                let params = ParameterSet::new()
                    .with_source(0, Arc::clone(source))
                    .with_source(1, Arc::clone(other));
                b.iter(|| executor.run_named("Add", black_box(&params)).unwrap());
            },
        );
    }

    group.finish();
}

// =============================================================================
// RESAMPLE BENCHMARKS
// =============================================================================

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let executor = default_executor();

    // Source -> target grid sizes for a same-CRS warp.
    let scenarios = [
        (512, 512, 256, 256, "downscale_2x"),
        (256, 256, 512, 512, "upscale_2x"),
        (512, 512, 512, 512, "shift_half_cell"),
    ];

    for (src_w, src_h, dst_w, dst_h, name) in scenarios {
        let source = temperature_coverage("tmp", src_w, src_h);
        let cell_x = 70.0 / dst_w as f64;
        let cell_y = -35.0 / dst_h as f64;
        let target = GridGeometry::d2(
            dst_w,
            dst_h,
            AffineTransform::grid_to_world_2d(-130.0 + cell_x / 2.0, 55.0, cell_x, cell_y),
        )
        .unwrap();

        group.throughput(Throughput::Elements((dst_w * dst_h) as u64));
        group.bench_with_input(BenchmarkId::new(name, "bilinear"), &source, |b, source| {
            let params = ParameterSet::new()
                .with_source(0, Arc::clone(source))
                .with("grid_geometry", ParamValue::GridGeometry(target.clone()));
            b.iter(|| executor.run_named("Resample", black_box(&params)).unwrap());
        });
    }

    // Cross-CRS warp through the geographic bridge.
    let source = temperature_coverage("tmp", 512, 512);
    let (x0, y0) = CrsCode::Epsg3857.from_geographic(-125.0, 50.0).unwrap();
    let (x1, y1) = CrsCode::Epsg3857.from_geographic(-70.0, 25.0).unwrap();
    let mercator = GridGeometry::d2(
        256,
        256,
        AffineTransform::grid_to_world_2d(x0, y0, (x1 - x0) / 256.0, (y1 - y0) / 256.0),
    )
    .unwrap();

    group.throughput(Throughput::Elements(256 * 256));
    group.bench_with_input(
        BenchmarkId::new("reproject_to_mercator", "bilinear"),
        &source,
        |b, source| {
            let params = ParameterSet::new()
                .with_source(0, Arc::clone(source))
                .with("crs", ParamValue::Crs(Crs::horizontal(CrsCode::Epsg3857)))
                .with("grid_geometry", ParamValue::GridGeometry(mercator.clone()));
            b.iter(|| executor.run_named("Resample", black_box(&params)).unwrap());
        },
    );

    group.finish();
}

// =============================================================================
// CACHE BENCHMARKS
// =============================================================================

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    let processor = CoverageProcessor::with_default_operations();
    let source = temperature_coverage("tmp", 256, 256);
    let params = ParameterSet::new()
        .with_source(0, Arc::clone(&source))
        .with("constants", ParamValue::FloatList(vec![-273.15]));

    // Keep the result alive so every benched call takes the hit path.
    let held = processor.apply("AddConst", &params).unwrap();

    group.bench_function("hit_path", |b| {
        b.iter(|| {
            let result = processor.apply("AddConst", black_box(&params)).unwrap();
            black_box(result)
        });
    });
    drop(held);

    // Key construction alone: lookup, resolve, and token rendering.
    group.bench_function("stats_snapshot", |b| {
        b.iter(|| black_box(processor.cache_stats()));
    });

    group.finish();
}

// =============================================================================
// DECOMPOSITION BENCHMARKS
// =============================================================================

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");

    let source = temperature_coverage("tmp", 256, 256);
    group.bench_function("coverage_2d", |b| {
        b.iter(|| decompose_coverage(black_box(&source)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pointwise_ops,
    bench_resample,
    bench_cache,
    bench_decompose,
);
criterion_main!(benches);
