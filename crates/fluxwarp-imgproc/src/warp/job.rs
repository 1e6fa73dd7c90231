use fluxwarp_image::{Pixel, Raster};

use crate::parallel::par_for_blocks;

use super::{
    config::WarpConfig,
    flux::PixelResampler,
    homography::Homography,
    plan::{plan_output, OutputPixelPlan},
    WarpError,
};

/// The joined result of a warp job, before conversion to the output sample type.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpOutput {
    /// The resampled raster, with missing pixels as NaN unless zero-filled.
    pub raster: Raster<f64>,
    /// Number of output pixels written as missing.
    pub num_missing: usize,
    /// The transform the job ran with.
    pub homography: Homography,
    /// The output geometry the job ran with.
    pub plan: OutputPixelPlan,
    /// Whether the caller asked to keep `f64` output.
    pub force_float: bool,
}

/// A planned warp of one input raster.
///
/// Construction validates the configuration and plans the output canvas, so every fatal error
/// surfaces here; [`WarpJob::run`] only fails on allocation or worker pool setup, both before any
/// output pixel is computed.
///
/// # Example
///
/// ```
/// use fluxwarp_image::Raster;
/// use fluxwarp_imgproc::warp::{rotation_matrix, Homography, WarpConfig, WarpJob};
///
/// let src = Raster::<f32>::from_size_val([4, 2].into(), 1.0).unwrap();
/// let homography = Homography::new(rotation_matrix(90.0)).unwrap();
///
/// let job = WarpJob::new(&src, homography, WarpConfig::default()).unwrap();
/// assert_eq!(job.plan().size, [2, 4].into());
///
/// let output = job.run().unwrap();
/// assert_eq!(output.num_missing, 0);
/// ```
pub struct WarpJob<'a, T> {
    src: &'a Raster<T>,
    homography: Homography,
    plan: OutputPixelPlan,
    config: WarpConfig,
}

impl<'a, T: Pixel> WarpJob<'a, T> {
    /// Validate the configuration and plan the output canvas.
    ///
    /// # Errors
    ///
    /// Any error of [`WarpConfig::validate`] or [`plan_output`].
    pub fn new(
        src: &'a Raster<T>,
        homography: Homography,
        config: WarpConfig,
    ) -> Result<Self, WarpError> {
        config.validate()?;
        let plan = plan_output(src.size(), &homography)?;
        log::debug!(
            "warp job planned: {} {} -> {} with {:?}",
            T::NAME,
            src.size(),
            plan.size,
            config.strategy
        );
        Ok(Self {
            src,
            homography,
            plan,
            config,
        })
    }

    /// The output geometry.
    pub fn plan(&self) -> &OutputPixelPlan {
        &self.plan
    }

    /// The transform from input to output pixel coordinates.
    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// Resample every output pixel and join the workers.
    ///
    /// # Errors
    ///
    /// * [`WarpError::AllocationFailure`] if the output buffer cannot be reserved.
    /// * [`WarpError::Parallel`] if a dedicated worker pool cannot be built.
    pub fn run(self) -> Result<WarpOutput, WarpError> {
        let num_pixels = self.plan.size.num_pixels();

        let mut data = Vec::<f64>::new();
        data.try_reserve_exact(num_pixels)
            .map_err(|_| WarpError::AllocationFailure(num_pixels))?;
        data.resize(num_pixels, f64::NAN);

        let resampler = PixelResampler::new(
            self.src,
            &self.homography,
            &self.plan,
            self.config.missing,
        );
        log::debug!("warp job dispatched: {num_pixels} output pixels");
        let num_missing = par_for_blocks(self.config.strategy, &mut data, |start, block| {
            resampler.resample_block(start, block)
        })?;
        log::debug!("warp job joined: {num_missing} missing output pixels");

        if num_missing > 0 {
            log::warn!("{num_missing} of {num_pixels} output pixels have no usable input");
        }

        Ok(WarpOutput {
            raster: Raster::new(self.plan.size, data)?,
            num_missing,
            homography: self.homography,
            plan: self.plan,
            force_float: self.config.force_float,
        })
    }
}

/// Warp a raster with a flux-conserving projective transform.
///
/// Every output pixel is mapped back into the input, clipped against the input pixels it
/// overlaps, and receives the area-weighted sum of their values. Total flux is conserved up to
/// the input that falls outside the output canvas, which holds the full footprint of the input.
///
/// # Arguments
///
/// * `src` - The input raster. Blank samples count as missing.
/// * `m` - The row-major 3x3 transform from input to output pixel coordinates.
/// * `config` - The job parameters.
///
/// # Errors
///
/// Any error of [`Homography::new`], [`WarpJob::new`] or [`WarpJob::run`].
///
/// # Example
///
/// ```
/// use fluxwarp_image::Raster;
/// use fluxwarp_imgproc::warp::{scale_matrix, warp_flux, WarpConfig};
///
/// let src = Raster::<f64>::from_size_val([4, 4].into(), 1.0).unwrap();
/// let output = warp_flux(&src, &scale_matrix(0.5, 0.5), &WarpConfig::default()).unwrap();
///
/// assert_eq!(output.raster.size(), [3, 3].into());
/// assert!((output.raster.sum() - 16.0).abs() < 1e-9);
/// ```
pub fn warp_flux<T: Pixel>(
    src: &Raster<T>,
    m: &[f64; 9],
    config: &WarpConfig,
) -> Result<WarpOutput, WarpError> {
    WarpJob::new(src, Homography::new(*m)?, *config)?.run()
}
