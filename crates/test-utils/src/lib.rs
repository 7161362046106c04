//! Shared test helpers for the coverage-processing workspace.
//!
//! Provides deterministic grid generators, common fixture constants, and
//! assertion macros used across the workspace's unit and integration tests.

pub mod fixtures;
pub mod generators;

/// Asserts that two floating point values are equal within an epsilon.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left, $right, $epsilon);
        assert!(
            (left - right).abs() <= epsilon,
            "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n   eps: `{:?}`",
            left,
            right,
            (left - right).abs(),
            epsilon
        );
    }};
}

/// Asserts that two coordinate pairs are equal within an epsilon.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (lx, ly) = $left;
        let (rx, ry) = $right;
        $crate::assert_approx_eq!(lx, rx, $epsilon);
        $crate::assert_approx_eq!(ly, ry, $epsilon);
    }};
}

/// Asserts that two value ranges agree on both endpoints within an epsilon.
///
/// Works with any type exposing public `min`/`max` fields.
#[macro_export]
macro_rules! assert_range_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = (&$left, &$right);
        $crate::assert_approx_eq!(left.min, right.min, $epsilon);
        $crate::assert_approx_eq!(left.max, right.max, $epsilon);
    }};
}
