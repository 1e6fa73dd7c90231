#![deny(missing_docs)]
//! Raster buffer and sample types for flux-conserving resampling

/// single band raster representation.
pub mod raster;

/// sample types and the missing value convention.
pub mod pixel;

/// Error types for the raster module.
pub mod error;

pub use crate::error::RasterError;
pub use crate::pixel::Pixel;
pub use crate::raster::{Raster, RasterSize};
