//! Deterministic grid data generators.
//!
//! All generators produce row-major `Vec<f32>` planes (column varies fastest)
//! so the values land directly in a 2D pixel buffer without reshaping.

/// Creates a grid where each cell encodes its own position.
///
/// The value at `(col, row)` is `col * 1000 + row`, which makes it trivial
/// to verify that a resampling or arithmetic step read the cell it claims
/// to have read.
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a smooth temperature-like field in kelvin.
///
/// Values ramp from 250 K at the top-left corner to 310 K at the
/// bottom-right corner.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let max_dist = ((width - 1) + (height - 1)).max(1) as f32;
    for row in 0..height {
        for col in 0..width {
            let dist = (col + row) as f32 / max_dist;
            data.push(250.0 + 60.0 * dist);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a test grid with NaN holes at every `nan_stride`-th cell.
///
/// Non-NaN cells carry the same positional encoding as [`create_test_grid`].
pub fn create_grid_with_nans(width: usize, height: usize, nan_stride: usize) -> Vec<f32> {
    let mut data = create_test_grid(width, height);
    for (i, v) in data.iter_mut().enumerate() {
        if nan_stride > 0 && i % nan_stride == 0 {
            *v = f32::NAN;
        }
    }
    data
}

/// Creates an eastward wind component field in m/s, varying by row.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for _col in 0..width {
            data.push(-15.0 + 30.0 * row as f32 / height.max(1) as f32);
        }
    }
    data
}

/// Creates a northward wind component field in m/s, varying by column.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(-10.0 + 20.0 * col as f32 / width.max(1) as f32);
        }
    }
    data
}

/// Interleaves per-band planes into a single cell-major sample vector.
///
/// The output holds all bands of cell 0, then all bands of cell 1, matching
/// the multi-band pixel buffer layout. Panics if the planes differ in length.
pub fn interleave_bands(planes: &[Vec<f32>]) -> Vec<f32> {
    assert!(!planes.is_empty(), "at least one band plane required");
    let cells = planes[0].len();
    for plane in planes {
        assert_eq!(plane.len(), cells, "band planes must have equal length");
    }
    let mut data = Vec::with_capacity(cells * planes.len());
    for cell in 0..cells {
        for plane in planes {
            data.push(plane[cell]);
        }
    }
    data
}
