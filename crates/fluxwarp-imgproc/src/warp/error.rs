use fluxwarp_image::RasterError;
use thiserror::Error;

use crate::parallel::ParallelError;

/// Errors that abort a warp job.
///
/// Every variant is raised before any output pixel is computed; a job either completes or fails
/// without producing output.
#[derive(Error, Debug, PartialEq)]
pub enum WarpError {
    /// The output buffer of the given number of pixels cannot be sized or allocated.
    #[error("cannot allocate output buffer of {0} pixels")]
    AllocationFailure(usize),

    /// The transform is singular or maps a defining corner to infinity.
    #[error("degenerate transform: {0}")]
    DegenerateTransform(String),

    /// The job configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The worker pool could not be set up.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// A raster could not be built.
    #[error(transparent)]
    Raster(#[from] RasterError),
}
