use fluxwarp_image::RasterSize;

use super::{
    homography::{map_point_checked, Homography},
    polygon::{area, order_corners_anticlockwise, reorder, Point2, Quad},
    rounding::{round_boundary_high, round_boundary_low},
    WarpError,
};

/// Corner offsets of a pixel around its centre, in the order every pixel's corners are built:
/// bottom-left, bottom-right, top-left, top-right.
pub(crate) const PIXEL_CORNER_OFFSETS: Quad = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]];

/// Indices of the raw mapped corners realising the extremes of an output pixel in input space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtremalCorners {
    /// Corner with the smallest x.
    pub x_min: usize,
    /// Corner with the largest x.
    pub x_max: usize,
    /// Corner with the smallest y.
    pub y_min: usize,
    /// Corner with the largest y.
    pub y_max: usize,
}

impl ExtremalCorners {
    fn of(quad: &Quad) -> Self {
        let mut ext = ExtremalCorners {
            x_min: 0,
            x_max: 0,
            y_min: 0,
            y_max: 0,
        };
        for (i, p) in quad.iter().enumerate().skip(1) {
            if p[0] < quad[ext.x_min][0] {
                ext.x_min = i;
            }
            if p[0] > quad[ext.x_max][0] {
                ext.x_max = i;
            }
            if p[1] < quad[ext.y_min][1] {
                ext.y_min = i;
            }
            if p[1] > quad[ext.y_max][1] {
                ext.y_max = i;
            }
        }
        ext
    }
}

/// Per-job output geometry, computed once before dispatch and shared read-only by all workers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputPixelPlan {
    /// Size of the output canvas.
    pub size: RasterSize,
    /// Transform-space coordinate of the centre of output pixel `(0, 0)`.
    pub reference_offset: [i64; 2],
    /// Permutation listing the mapped corners of any output pixel anti-clockwise.
    pub corner_order: [usize; 4],
    /// Which mapped corners bound an output pixel along each input axis.
    pub extremal_corners: ExtremalCorners,
    /// Area of one output pixel in input pixel units.
    pub unit_pixel_area: f64,
}

impl OutputPixelPlan {
    /// Transform-space corners of the output pixel at flat index `index`, in
    /// [`PIXEL_CORNER_OFFSETS`] order.
    #[inline]
    pub(crate) fn output_corners(&self, index: usize) -> Quad {
        let width = self.size.width;
        let cx = (index % width) as f64 + self.reference_offset[0] as f64;
        let cy = (index / width) as f64 + self.reference_offset[1] as f64;
        PIXEL_CORNER_OFFSETS.map(|[dx, dy]| [cx + dx, cy + dy])
    }
}

/// Plan the output canvas of a warp.
///
/// The corners of the input raster are mapped forward to size the canvas; the corners of one
/// output pixel are mapped back to fix the corner order and the input-space pixel area, which are
/// the same for every output pixel because a projective map keeps the cyclic order of a convex
/// quadrilateral's corners.
///
/// Pixel coordinates are one-based: the input sample at column `c`, row `r` is centred at
/// `(c + 1, r + 1)`.
///
/// # Arguments
///
/// * `src_size` - The size of the input raster.
/// * `homography` - The transform from input to output pixel coordinates.
///
/// # Errors
///
/// * [`WarpError::InvalidConfiguration`] for an empty input raster.
/// * [`WarpError::DegenerateTransform`] if a defining corner maps to infinity, the canvas would
///   hold no pixel, or an output pixel has no area in input space.
/// * [`WarpError::AllocationFailure`] if the pixel count does not fit in `usize`.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::{plan_output, Homography};
///
/// let plan = plan_output([4, 3].into(), &Homography::identity()).unwrap();
///
/// assert_eq!(plan.size, [4, 3].into());
/// assert_eq!(plan.reference_offset, [1, 1]);
/// assert_eq!(plan.unit_pixel_area, 1.0);
/// ```
pub fn plan_output(
    src_size: RasterSize,
    homography: &Homography,
) -> Result<OutputPixelPlan, WarpError> {
    if src_size.width == 0 || src_size.height == 0 {
        return Err(WarpError::InvalidConfiguration(format!(
            "input raster is empty: {src_size}"
        )));
    }

    // outer edges of the input raster; pixel centres sit at 1..=w and 1..=h
    let (w, h) = (src_size.width as f64, src_size.height as f64);
    let input_corners: Quad = [[0.5, 0.5], [w + 0.5, 0.5], [0.5, h + 0.5], [w + 0.5, h + 0.5]];

    // the whole raster must stay on one side of the line mapped to infinity
    let m = homography.matrix();
    let denominators = input_corners.map(|[x, y]| m[6] * x + m[7] * y + m[8]);
    if !(denominators.iter().all(|w| *w > 0.0) || denominators.iter().all(|w| *w < 0.0)) {
        return Err(WarpError::DegenerateTransform(format!(
            "input raster crosses the line at infinity (denominators {denominators:?})"
        )));
    }

    let (mut xmin, mut xmax) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut ymin, mut ymax) = (f64::INFINITY, f64::NEG_INFINITY);
    for corner in input_corners {
        let [x, y] = map_point_checked(homography.matrix(), corner)?;
        xmin = xmin.min(x);
        xmax = xmax.max(x);
        ymin = ymin.min(y);
        ymax = ymax.max(y);
    }

    let (x0, x1) = (round_boundary_high(xmin), round_boundary_low(xmax));
    let (y0, y1) = (round_boundary_high(ymin), round_boundary_low(ymax));
    if x1 < x0 || y1 < y0 {
        return Err(WarpError::DegenerateTransform(format!(
            "warped input [{xmin}, {xmax}] x [{ymin}, {ymax}] contains no pixel centre"
        )));
    }

    let size = RasterSize {
        width: extent(x0, x1)?,
        height: extent(y0, y1)?,
    };
    let num_pixels = size
        .checked_num_pixels()
        .ok_or(WarpError::AllocationFailure(usize::MAX))?;
    log::debug!("planned output canvas {size} ({num_pixels} pixels), first pixel at ({x0}, {y0})");

    // one output pixel mapped back into input space
    let raw = canonical_input_quad(homography, [x0, y0])?;
    let corner_order = order_corners_anticlockwise(&raw);
    let unit_pixel_area = area(&reorder(&raw, &corner_order));
    if !unit_pixel_area.is_finite() || unit_pixel_area <= 0.0 {
        return Err(WarpError::DegenerateTransform(format!(
            "output pixel covers no input area ({unit_pixel_area})"
        )));
    }

    let plan = OutputPixelPlan {
        size,
        reference_offset: [x0, y0],
        corner_order,
        extremal_corners: ExtremalCorners::of(&raw),
        unit_pixel_area,
    };
    log::debug!(
        "corner order {:?}, output pixel area {} input pixels",
        plan.corner_order,
        plan.unit_pixel_area
    );

    Ok(plan)
}

fn extent(first: i64, last: i64) -> Result<usize, WarpError> {
    last.checked_sub(first)
        .and_then(|d| d.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(WarpError::AllocationFailure(usize::MAX))
}

fn canonical_input_quad(homography: &Homography, offset: [i64; 2]) -> Result<Quad, WarpError> {
    let (cx, cy) = (offset[0] as f64, offset[1] as f64);
    let mut quad: Quad = [[0.0; 2]; 4];
    for (q, [dx, dy]) in quad.iter_mut().zip(PIXEL_CORNER_OFFSETS) {
        let corner: Point2 = [cx + dx, cy + dy];
        *q = map_point_checked(homography.inverse(), corner)?;
    }
    Ok(quad)
}
