//! The "Resample" operation: warping a coverage onto a new grid.
//!
//! Each target cell is inverse-mapped through the target grid-to-world,
//! the horizontal CRS bridge, and the source world-to-grid, then
//! interpolated from the source's 2D plane. Non-spatial axes (time,
//! vertical levels) ride along untouched: the kernel iterates their
//! index tuples and warps one plane per tuple and band. Cells falling
//! outside the source grid become NaN.

use std::sync::Arc;

use coverage_common::{Coverage, Crs, GridGeometry, PixelBuffer};
use transform::DEFAULT_TOLERANCE;

use crate::decompose::{decompose, decompose_coverage};
use crate::descriptor::{OperationDescriptor, PixelInput};
use crate::error::{ProcessingError, Result};
use crate::interpolation::{sample_plane, InterpolationMethod};
use crate::params::{ParamDescriptor, ParamKind, ParamValue, ResolvedParams};

/// Build the "Resample" descriptor.
///
/// Parameters: `Source0`, optional `crs` and `grid_geometry` (defaulting
/// to the source's own), optional `interpolation` (defaulting to
/// bilinear). Output bands are the source's bands unchanged.
pub fn resample() -> OperationDescriptor {
    OperationDescriptor::new(
        "Resample",
        vec![
            ParamDescriptor::source(0),
            ParamDescriptor::optional("crs", ParamKind::Crs),
            ParamDescriptor::optional("grid_geometry", ParamKind::GridGeometry),
            ParamDescriptor::with_default(
                "interpolation",
                ParamValue::Interpolation(InterpolationMethod::default()),
            ),
        ],
        Arc::new(resample_pixels),
    )
    .with_output_geometry(Arc::new(|input: &PixelInput<'_>| {
        resolve_target(&input.sources[0], input.params)
    }))
}

/// Target CRS and grid geometry of an invocation, defaulting to the
/// source's own.
fn resolve_target(source: &Coverage, params: &ResolvedParams) -> Result<(Crs, GridGeometry)> {
    let crs = match params.crs("crs") {
        Some(crs) => crs.clone(),
        None => source.crs().clone(),
    };
    let geometry = match params.grid_geometry("grid_geometry") {
        Some(geometry) => geometry.clone(),
        None => source.geometry().clone(),
    };
    if crs.dimension() != geometry.dimension() {
        return Err(ProcessingError::invalid_parameter(
            "grid_geometry",
            format!(
                "target geometry is {}D but target CRS '{}' is {}D",
                geometry.dimension(),
                crs,
                crs.dimension()
            ),
        ));
    }
    Ok((crs, geometry))
}

fn resample_pixels(input: &PixelInput<'_>) -> Result<PixelBuffer> {
    let source = &input.sources[0];
    let (target_crs, target_geometry) = resolve_target(source, input.params)?;
    let method = input
        .params
        .interpolation("interpolation")
        .unwrap_or_default();

    let coverage_name = source.name();
    let wrap = |message: String| ProcessingError::cannot_reproject(coverage_name, message);

    let source_parts = decompose_coverage(source).map_err(|err| wrap(err.to_string()))?;
    let (tx_axis, ty_axis) = target_geometry.spatial_axes();
    let target_parts = decompose(
        target_geometry.grid_to_world(),
        &target_crs,
        tx_axis,
        ty_axis,
    )
    .map_err(|err| wrap(err.to_string()))?;

    // Resampling only moves the horizontal plane. Everything outside it
    // must already match between source and target.
    if !source_parts.non_spatial_equivalent(&target_parts, DEFAULT_TOLERANCE) {
        return Err(wrap(
            "source and target differ outside the horizontal plane".to_string(),
        ));
    }
    let source_extent = source.geometry().extent();
    let target_extent = target_geometry.extent();
    let x_dim = source_parts.spatial_range.start;
    let y_dim = x_dim + 1;
    for d in (0..source_extent.dimension()).filter(|&d| d != x_dim && d != y_dim) {
        if source_extent.low(d) != target_extent.low(d)
            || source_extent.high(d) != target_extent.high(d)
        {
            return Err(wrap(format!(
                "non-spatial extents differ in dimension {}",
                d
            )));
        }
    }

    let source_code = source_parts
        .spatial_crs
        .horizontal_component()
        .map(|(code, _)| code)
        .ok_or_else(|| wrap("source has no horizontal CRS component".to_string()))?;
    let target_code = target_parts
        .spatial_crs
        .horizontal_component()
        .map(|(code, _)| code)
        .ok_or_else(|| wrap("target has no horizontal CRS component".to_string()))?;

    let world_to_source_grid = source_parts
        .spatial
        .inverse()
        .map_err(|err| wrap(err.to_string()))?;

    // Grid coordinates of each target cell in the source buffer,
    // precomputed once and reused across planes and bands.
    let source_low_x = source_extent.low(x_dim) as f64;
    let source_low_y = source_extent.low(y_dim) as f64;
    let target_width = target_extent.size(x_dim);
    let target_height = target_extent.size(y_dim);
    let mut mapping = Vec::with_capacity(target_width * target_height);
    for row in 0..target_height {
        for col in 0..target_width {
            let gx = (target_extent.low(x_dim) + col as i64) as f64;
            let gy = (target_extent.low(y_dim) + row as i64) as f64;
            let (wx, wy) = target_parts
                .spatial
                .apply_2d(gx, gy)
                .map_err(|err| wrap(err.to_string()))?;
            let (sx, sy) = if source_code == target_code {
                (wx, wy)
            } else {
                let (lon, lat) = target_code
                    .to_geographic(wx, wy)
                    .ok_or_else(|| wrap(format!("no geographic bridge from {}", target_code)))?;
                source_code
                    .from_geographic(lon, lat)
                    .ok_or_else(|| wrap(format!("no geographic bridge to {}", source_code)))?
            };
            let (sgx, sgy) = world_to_source_grid
                .apply_2d(sx, sy)
                .map_err(|err| wrap(err.to_string()))?;
            mapping.push((sgx - source_low_x, sgy - source_low_y));
        }
    }

    let source_width = source_extent.size(x_dim);
    let source_height = source_extent.size(y_dim);
    let non_spatial: Vec<usize> = (0..source_extent.dimension())
        .filter(|&d| d != x_dim && d != y_dim)
        .collect();

    let mut output = PixelBuffer::filled_nan(target_extent.sizes(), source.num_bands());
    let mut index = vec![0usize; target_extent.dimension()];
    for tuple in target_extent.index_tuples_excluding(&[x_dim, y_dim]) {
        let fixed: Vec<(usize, usize)> = non_spatial
            .iter()
            .zip(&tuple)
            .map(|(&d, &v)| (d, (v - source_extent.low(d)) as usize))
            .collect();
        for &(d, v) in &fixed {
            index[d] = v;
        }
        for band in 0..source.num_bands() {
            let plane = source
                .buffer()
                .extract_plane(x_dim, y_dim, &fixed, band)?;
            for row in 0..target_height {
                index[y_dim] = row;
                for col in 0..target_width {
                    index[x_dim] = col;
                    let (sgx, sgy) = mapping[row * target_width + col];
                    let value =
                        sample_plane(&plane, source_width, source_height, sgx, sgy, method);
                    output.set_sample(&index, band, value)?;
                }
            }
        }
    }
    Ok(output)
}
