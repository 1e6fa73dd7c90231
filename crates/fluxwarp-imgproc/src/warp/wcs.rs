use super::homography::Homography;

// PC off-diagonal terms below this magnitude are rounding noise
const PC_ZERO_TOLERANCE: f64 = 1e-10;

// relative difference below which the two PC diagonal magnitudes are taken as equal
const PC_DIAGONAL_TOLERANCE: f64 = 1e-6;

/// The linear part of a world coordinate system attached to a raster.
///
/// `crpix` is one-based as stored in image headers; `pc` is row-major 2x2.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearWcs {
    /// Reference pixel, one-based.
    pub crpix: [f64; 2],
    /// Rotation and skew matrix `[pc11, pc12, pc21, pc22]`.
    pub pc: [f64; 4],
    /// Per-axis scale applied on top of `pc`.
    pub cdelt: [f64; 2],
}

impl Default for LinearWcs {
    fn default() -> Self {
        Self {
            crpix: [1.0, 1.0],
            pc: [1.0, 0.0, 0.0, 1.0],
            cdelt: [1.0, 1.0],
        }
    }
}

impl LinearWcs {
    /// World units per pixel along each axis: the column norms of `diag(cdelt) · pc`.
    pub fn pixel_scale(&self) -> [f64; 2] {
        let [c1, c2] = self.cdelt;
        let [p11, p12, p21, p22] = self.pc;
        [(c1 * p11).hypot(c2 * p21), (c1 * p12).hypot(c2 * p22)]
    }

    /// The coordinate system of the raster produced by warping with `homography`.
    ///
    /// `reference_offset` is the transform-space position of the output raster's first pixel, as
    /// found in [`OutputPixelPlan`](super::OutputPixelPlan). Transform space uses the same
    /// one-based pixel centres as `crpix`, so the reference pixel maps through unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use fluxwarp_imgproc::warp::{scale_matrix, Homography, LinearWcs};
    ///
    /// let wcs = LinearWcs { crpix: [2.0, 2.0], ..Default::default() };
    /// let warped = wcs.warped(&Homography::new(scale_matrix(2.0, 2.0)).unwrap(), [1, 1]);
    ///
    /// assert_eq!(warped.crpix, [4.0, 4.0]);
    /// assert_eq!(warped.pc, [0.5, 0.0, 0.0, 0.5]);
    /// ```
    pub fn warped(&self, homography: &Homography, reference_offset: [i64; 2]) -> LinearWcs {
        let inv = homography.inverse();
        let w = if inv[8] != 0.0 { inv[8] } else { 1.0 };
        let t = [inv[0] / w, inv[1] / w, inv[3] / w, inv[4] / w];
        let pc = self.pc;

        let mut new_pc = [
            pc[0] * t[0] + pc[1] * t[2],
            pc[0] * t[1] + pc[1] * t[3],
            pc[2] * t[0] + pc[3] * t[2],
            pc[2] * t[1] + pc[3] * t[3],
        ];
        clean_pc(&mut new_pc);

        let [x, y] = homography.forward_point(self.crpix);
        let crpix = [
            x - reference_offset[0] as f64 + 1.0,
            y - reference_offset[1] as f64 + 1.0,
        ];

        LinearWcs {
            crpix,
            pc: new_pc,
            cdelt: self.cdelt,
        }
    }
}

fn clean_pc(pc: &mut [f64; 4]) {
    for i in [1, 2] {
        if pc[i].abs() < PC_ZERO_TOLERANCE {
            pc[i] = 0.0;
        }
    }
    let scale = pc[0].hypot(pc[2]);
    if scale > 0.0 && (pc[0].abs() - pc[3].abs()).abs() / scale < PC_DIAGONAL_TOLERANCE {
        pc[3] = pc[0].abs().copysign(pc[3]);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::warp::{
        homography::{rotation_matrix, translation_matrix},
        WarpError,
    };

    #[test]
    fn identity_keeps_wcs() {
        let wcs = LinearWcs {
            crpix: [10.5, -3.0],
            pc: [0.8, 0.6, -0.6, 0.8],
            cdelt: [2.0e-4, 2.0e-4],
        };
        assert_eq!(wcs.warped(&Homography::identity(), [1, 1]), wcs);
    }

    #[test]
    fn translation_moves_reference_pixel() -> Result<(), WarpError> {
        let wcs = LinearWcs::default();
        let h = Homography::new(translation_matrix(3.0, 4.0))?;
        let warped = wcs.warped(&h, [4, 5]);
        assert_eq!(warped.crpix, [1.0, 1.0]);
        assert_eq!(warped.pc, wcs.pc);

        let warped = wcs.warped(&h, [1, 1]);
        assert_eq!(warped.crpix, [4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn rotation_updates_pc_and_crpix() -> Result<(), WarpError> {
        let wcs = LinearWcs {
            crpix: [1.0, 1.0],
            ..Default::default()
        };
        let h = Homography::new(rotation_matrix(90.0))?;
        // a 5x3 raster rotated by 90 degrees starts at column -3
        let warped = wcs.warped(&h, [-3, 1]);

        assert_relative_eq!(warped.crpix[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(warped.crpix[1], 1.0, epsilon = 1e-12);
        assert_eq!(warped.pc[1], 1.0);
        assert_eq!(warped.pc[2], -1.0);
        assert_relative_eq!(warped.pc[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(warped.pc[3], 0.0, epsilon = 1e-12);

        let scale = warped.pixel_scale();
        assert_relative_eq!(scale[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(scale[1], 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn pc_cleanup() {
        let mut pc = [0.5, 3e-11, -4e-12, -0.500_000_000_1];
        clean_pc(&mut pc);
        assert_eq!(pc, [0.5, 0.0, 0.0, -0.5]);

        let mut pc = [0.5, 0.1, 0.0, 0.6];
        clean_pc(&mut pc);
        assert_eq!(pc, [0.5, 0.1, 0.0, 0.6]);
    }

    #[test]
    fn pixel_scale_of_rotated_wcs() {
        let wcs = LinearWcs {
            crpix: [1.0, 1.0],
            pc: [0.8, -0.6, 0.6, 0.8],
            cdelt: [0.5, 0.5],
        };
        let [sx, sy] = wcs.pixel_scale();
        assert_relative_eq!(sx, 0.5, epsilon = 1e-12);
        assert_relative_eq!(sy, 0.5, epsilon = 1e-12);
    }
}
