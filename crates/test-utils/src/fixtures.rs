//! Common fixture constants for coverage tests.

/// Grid layouts used across the test suite.
pub mod grid {
    /// A 2D grid layout with a north-up affine georeference.
    ///
    /// World coordinates follow `origin + index * resolution` per axis, so a
    /// negative `y_res` walks south as the row index grows.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub origin_x: f64,
        pub origin_y: f64,
        pub x_res: f64,
        pub y_res: f64,
    }

    impl GridSpec {
        pub const fn cells(&self) -> usize {
            self.width * self.height
        }

        /// World coordinate of a cell center on the x axis.
        pub fn world_x(&self, col: usize) -> f64 {
            self.origin_x + col as f64 * self.x_res
        }

        /// World coordinate of a cell center on the y axis.
        pub fn world_y(&self, row: usize) -> f64 {
            self.origin_y + row as f64 * self.y_res
        }
    }

    /// Tiny 2x2 grid over the US Pacific Northwest, 1 degree resolution.
    pub const TINY: GridSpec = GridSpec {
        width: 2,
        height: 2,
        origin_x: -123.0,
        origin_y: 46.0,
        x_res: 1.0,
        y_res: -1.0,
    };

    /// 16x16 grid over CONUS at quarter-degree resolution.
    pub const SMALL: GridSpec = GridSpec {
        width: 16,
        height: 16,
        origin_x: -100.0,
        origin_y: 42.0,
        x_res: 0.25,
        y_res: -0.25,
    };
}

/// Sample value ranges as `(min, max)` pairs, half-open.
pub mod ranges {
    pub const TEMPERATURE_K: (f64, f64) = (180.0, 330.0);
    pub const WIND_MS: (f64, f64) = (-60.0, 60.0);
}

/// Unit symbols shared by fixture bands.
pub mod units {
    pub const KELVIN: &str = "K";
    pub const METERS_PER_SECOND: &str = "m/s";
    pub const METERS: &str = "m";
}

/// Band titles shared by fixture coverages.
pub mod bands {
    pub const TEMPERATURE: &str = "temperature";
    pub const U_WIND: &str = "u_wind";
    pub const V_WIND: &str = "v_wind";
    pub const ELEVATION: &str = "elevation";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_world_coords() {
        assert_eq!(grid::TINY.world_x(1), -122.0);
        assert_eq!(grid::TINY.world_y(1), 45.0);
        assert_eq!(grid::TINY.cells(), 4);
    }

    #[test]
    fn test_small_grid_spans_four_degrees() {
        let spec = grid::SMALL;
        assert_eq!(spec.width as f64 * spec.x_res, 4.0);
        assert_eq!(spec.height as f64 * spec.y_res, -4.0);
    }
}
