//! Flux-conserving projective warps of rasters.
//!
//! Each output pixel is mapped back into the input as a quadrilateral, which is clipped against
//! every input pixel it overlaps. The output value is the overlap-weighted sum of the input values,
//! so the total flux of the input is kept.
//!
//! This module provides:
//!
//! - Homographies with a cached inverse, and builders for common transforms
//! - Polygon clipping and the half-integer rounding policy at pixel boundaries
//! - Planning of the output canvas and the parallel resampling job
//! - Finalization: output sample type, provenance keywords and the updated coordinate system
//!
//! # Examples
//!
//! Rotating a raster by 30 degrees:
//!
//! ```
//! use fluxwarp_image::Raster;
//! use fluxwarp_imgproc::warp::{finalize, rotation_matrix, warp_flux, WarpConfig};
//!
//! let src = Raster::<f32>::from_fn([16, 8].into(), |x, y| (x * y) as f32);
//! let output = warp_flux(&src, &rotation_matrix(30.0), &WarpConfig::default()).unwrap();
//! let done = finalize::<f32>(output, None);
//!
//! assert!((done.raster.sum() - src.sum()).abs() < 1e-2);
//! ```

mod config;
mod error;
mod finalize;
mod flux;
mod homography;
mod job;
mod plan;
mod polygon;
mod rounding;
mod wcs;

pub use config::{MissingDataPolicy, WarpConfig};
pub use error::WarpError;
pub use finalize::{
    finalize, provenance_keywords, FinalizedWarp, MatrixKeyword, WarpSink, WarpedRaster,
    MATRIX_KEYWORD_COMMENT,
};
pub use flux::PixelAccumulator;
pub use homography::{
    compose, flip_matrix, from_linear, invert, map_point, map_point_checked, matmul3x3,
    parse_matrix, projection_matrix, rotation_matrix, scale_matrix, shear_matrix,
    translation_matrix, Homography, IDENTITY,
};
pub use job::{warp_flux, WarpJob, WarpOutput};
pub use plan::{plan_output, ExtremalCorners, OutputPixelPlan};
pub use polygon::{
    area, clip, order_corners_anticlockwise, pixel_square, reorder, Point2, Polygon, Quad,
    GEOMETRY_TOLERANCE,
};
pub use rounding::{round_boundary_high, round_boundary_low};
pub use wcs::LinearWcs;
