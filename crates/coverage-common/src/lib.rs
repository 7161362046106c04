//! Common types shared across the coverage-processing workspace.

pub mod buffer;
pub mod category;
pub mod coverage;
pub mod crs;
pub mod error;
pub mod geom;
pub mod range;
pub mod sample;
pub mod unit;

pub use buffer::PixelBuffer;
pub use category::Category;
pub use coverage::Coverage;
pub use crs::{Crs, CrsCode, CrsKind, TemporalAxis, VerticalAxis, VerticalDirection};
pub use error::{CoverageError, CoverageResult};
pub use geom::{GridExtent, GridGeometry};
pub use range::NumberRange;
pub use sample::SampleDimension;
pub use unit::Unit;
