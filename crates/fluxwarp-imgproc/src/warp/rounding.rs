//! Mapping continuous boundary coordinates to pixel centres.
//!
//! Pixel centres sit on integers and a pixel spans half a unit on each side, so a boundary at an
//! exact half-integer touches two pixels. The two functions below settle that tie in opposite
//! directions: minima keep the pixel above the tie, maxima keep the pixel below it. Coordinates
//! within [`GEOMETRY_TOLERANCE`] of a half-integer are treated as lying on it.

use super::polygon::GEOMETRY_TOLERANCE;

/// Nearest pixel centre for a lower boundary; an exact half-integer rounds up.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::round_boundary_high;
///
/// assert_eq!(round_boundary_high(-0.5), 0);
/// assert_eq!(round_boundary_high(2.3), 2);
/// assert_eq!(round_boundary_high(2.5), 3);
/// ```
#[inline]
pub fn round_boundary_high(d: f64) -> i64 {
    let c = d.ceil();
    if c - d > 0.5 + GEOMETRY_TOLERANCE {
        (c - 1.0) as i64
    } else {
        c as i64
    }
}

/// Nearest pixel centre for an upper boundary; an exact half-integer rounds down.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::round_boundary_low;
///
/// assert_eq!(round_boundary_low(9.5), 9);
/// assert_eq!(round_boundary_low(2.3), 2);
/// assert_eq!(round_boundary_low(2.7), 3);
/// ```
#[inline]
pub fn round_boundary_low(d: f64) -> i64 {
    let c = d.ceil();
    if c - d > 0.5 - GEOMETRY_TOLERANCE {
        (c - 1.0) as i64
    } else {
        c as i64
    }
}
