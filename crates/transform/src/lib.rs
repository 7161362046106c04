//! Affine transform machinery for gridded coverages.
//!
//! Transforms are homogeneous `f64` matrices supporting arbitrary source
//! and target dimension counts. Beyond plain application, composition,
//! and inversion, this crate provides the two capabilities the coverage
//! pipeline is built on:
//!
//! - **Pass-through embedding**: wrap a low-dimensional transform with
//!   untouched leading/trailing dimensions
//!   ([`AffineTransform::pass_through`]).
//! - **Separation**: carve out the sub-transform acting on a chosen run
//!   of source dimensions, verifying that those dimensions are
//!   independent of the rest ([`AffineTransform::separate`]).

pub mod affine;
pub mod error;
pub mod separate;

pub use affine::{AffineTransform, DEFAULT_TOLERANCE};
pub use error::{Result, TransformError};
pub use separate::{recompose, SeparatedTransform};
