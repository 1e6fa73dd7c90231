use fluxwarp_image::{Pixel, Raster};

use super::{
    config::MissingDataPolicy,
    homography::Homography,
    plan::OutputPixelPlan,
    polygon::{area, clip, pixel_square, reorder},
    rounding::{round_boundary_high, round_boundary_low},
};

/// Area-weighted sums gathered for one output pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelAccumulator {
    /// Sum of `value * overlap` over the valid input pixels.
    pub flux: f64,
    /// Overlap area of the missing input pixels.
    pub missing_area: f64,
    /// Number of valid input pixels inside the candidate range.
    pub valid_contributors: usize,
}

impl PixelAccumulator {
    /// Add one input pixel with its overlap area; a NaN value counts as missing.
    #[inline]
    pub fn add(&mut self, value: f64, overlap: f64) {
        if value.is_nan() {
            self.missing_area += overlap;
        } else {
            self.flux += value * overlap;
            self.valid_contributors += 1;
        }
    }

    /// Resolve the output value, or `None` if the pixel is missing.
    ///
    /// When part of the covered area is missing, the flux measured over the valid area `a` is
    /// extrapolated to the full pixel area `A` as `f·A/a`, as long as the missing fraction stays
    /// below `max_missing_fraction`. At or above it the pixel is discarded.
    ///
    /// # Example
    ///
    /// ```
    /// use fluxwarp_imgproc::warp::PixelAccumulator;
    ///
    /// let mut acc = PixelAccumulator::default();
    /// acc.add(4.0, 0.75);
    /// acc.add(f64::NAN, 0.25);
    ///
    /// assert_eq!(acc.finish(1.0, 0.5), Some(4.0));
    /// assert_eq!(acc.finish(1.0, 0.1), None);
    /// ```
    pub fn finish(&self, unit_pixel_area: f64, max_missing_fraction: f64) -> Option<f64> {
        if self.valid_contributors == 0 {
            return None;
        }
        let mut flux = self.flux;
        if self.missing_area > 0.0 {
            if self.missing_area / unit_pixel_area < max_missing_fraction {
                flux *= unit_pixel_area / (unit_pixel_area - self.missing_area);
            } else {
                return None;
            }
        }
        Some(flux)
    }
}

/// Computes output pixels from read-only shared state.
///
/// Each output pixel depends only on the input raster, the homography and the plan, so any
/// number of workers can share one resampler.
pub(crate) struct PixelResampler<'a, T> {
    src: &'a Raster<T>,
    homography: &'a Homography,
    plan: &'a OutputPixelPlan,
    policy: MissingDataPolicy,
}

impl<'a, T: Pixel> PixelResampler<'a, T> {
    pub fn new(
        src: &'a Raster<T>,
        homography: &'a Homography,
        plan: &'a OutputPixelPlan,
        policy: MissingDataPolicy,
    ) -> Self {
        Self {
            src,
            homography,
            plan,
            policy,
        }
    }

    /// Gather the overlap sums of output pixel `index`.
    ///
    /// Returns `None` if a corner of the pixel maps to infinity in input space.
    pub fn accumulate(&self, index: usize) -> Option<PixelAccumulator> {
        let raw = self
            .plan
            .output_corners(index)
            .map(|p| self.homography.inverse_point(p));
        if raw.iter().flatten().any(|v| !v.is_finite()) {
            return None;
        }
        let quad = reorder(&raw, &self.plan.corner_order);

        let (width, height) = (self.src.width() as i64, self.src.height() as i64);
        let ext = self.plan.extremal_corners;
        // candidate centres are one-based, input pixel x lives at column x - 1
        let x_start = round_boundary_high(raw[ext.x_min][0]).max(1);
        let x_end = (round_boundary_low(raw[ext.x_max][0]) + 1).min(width + 1);
        let y_start = round_boundary_high(raw[ext.y_min][1]).max(1);
        let y_end = (round_boundary_low(raw[ext.y_max][1]) + 1).min(height + 1);

        let mut acc = PixelAccumulator::default();
        for y in y_start..y_end {
            for x in x_start..x_end {
                let Some(sample) = self.src.get((x - 1) as usize, (y - 1) as usize) else {
                    continue;
                };
                let overlap = area(&clip(&quad, &pixel_square(x as f64, y as f64)));
                acc.add(sample.to_f64(), overlap);
            }
        }
        Some(acc)
    }

    /// Value of output pixel `index`, or `None` if it has no usable input.
    pub fn resample(&self, index: usize) -> Option<f64> {
        self.accumulate(index)?.finish(
            self.plan.unit_pixel_area,
            self.policy.max_missing_fraction,
        )
    }

    /// Fill a block of the output starting at flat index `start`.
    ///
    /// Returns the number of pixels written as missing.
    pub fn resample_block(&self, start: usize, block: &mut [f64]) -> usize {
        let mut num_missing = 0;
        for (i, dst) in block.iter_mut().enumerate() {
            *dst = match self.resample(start + i) {
                Some(value) => value,
                None if self.policy.zero_for_missing => 0.0,
                None => {
                    num_missing += 1;
                    f64::NAN
                }
            };
        }
        num_missing
    }
}
