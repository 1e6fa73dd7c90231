use std::str::FromStr;

use super::{polygon::Point2, WarpError};

/// The identity 3x3 homogeneous matrix.
pub const IDENTITY: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Relative tolerance under which a determinant counts as zero.
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[rustfmt::skip]
fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Compute the algebraic inverse of a 3x3 homogeneous matrix.
///
/// # Errors
///
/// Returns [`WarpError::DegenerateTransform`] if a coefficient is not finite or the determinant
/// is zero relative to the magnitude of the coefficients.
pub fn invert(m: &[f64; 9]) -> Result<[f64; 9], WarpError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(WarpError::DegenerateTransform(format!(
            "matrix has non-finite coefficients: {m:?}"
        )));
    }

    let det = determinant3x3(m);
    let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !det.is_finite() || det.abs() <= SINGULAR_TOLERANCE * scale.powi(3) {
        return Err(WarpError::DegenerateTransform(format!(
            "matrix is singular (determinant {det:e})"
        )));
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for i in 0..9 {
        inv_m[i] = adj[i] * inv_det;
    }

    Ok(inv_m)
}

/// Map a point through a 3x3 homogeneous matrix.
///
/// No check is done on the homogeneous denominator; a point on the line at infinity maps to
/// non-finite coordinates.
#[inline]
pub fn map_point(m: &[f64; 9], p: Point2) -> Point2 {
    let [x, y] = p;
    let w = m[6] * x + m[7] * y + m[8];
    [
        (m[0] * x + m[1] * y + m[2]) / w,
        (m[3] * x + m[4] * y + m[5]) / w,
    ]
}

/// Map a point through a 3x3 homogeneous matrix, failing on a vanishing denominator.
pub fn map_point_checked(m: &[f64; 9], p: Point2) -> Result<Point2, WarpError> {
    let w = m[6] * p[0] + m[7] * p[1] + m[8];
    let q = map_point(m, p);
    if w.abs() < f64::EPSILON || !q[0].is_finite() || !q[1].is_finite() {
        return Err(WarpError::DegenerateTransform(format!(
            "point ({}, {}) maps to infinity (denominator {w:e})",
            p[0], p[1]
        )));
    }
    Ok(q)
}

/// Multiply two 3x3 row-major matrices, `a · b`.
pub fn matmul3x3(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut out = [0.0; 9];
    for r in 0..3 {
        for c in 0..3 {
            out[r * 3 + c] =
                a[r * 3] * b[c] + a[r * 3 + 1] * b[3 + c] + a[r * 3 + 2] * b[6 + c];
        }
    }
    out
}

/// The matrix applying `first` and then `then`.
pub fn compose(first: &[f64; 9], then: &[f64; 9]) -> [f64; 9] {
    matmul3x3(then, first)
}

/// Embed a row-major 2x2 linear map into a 3x3 homogeneous matrix.
pub fn from_linear(l: [f64; 4]) -> [f64; 9] {
    [l[0], l[1], 0.0, l[2], l[3], 0.0, 0.0, 0.0, 1.0]
}

/// Rotation about the origin by `degrees`, anti-clockwise with the y axis pointing up.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::rotation_matrix;
///
/// let m = rotation_matrix(90.0);
/// assert!((m[1] + 1.0).abs() < 1e-12);
/// assert!((m[3] - 1.0).abs() < 1e-12);
/// ```
pub fn rotation_matrix(degrees: f64) -> [f64; 9] {
    let (s, c) = degrees.to_radians().sin_cos();
    from_linear([c, -s, s, c])
}

/// Scaling along the two axes.
pub fn scale_matrix(sx: f64, sy: f64) -> [f64; 9] {
    from_linear([sx, 0.0, 0.0, sy])
}

/// Translation by `(tx, ty)`.
pub fn translation_matrix(tx: f64, ty: f64) -> [f64; 9] {
    [1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0]
}

/// Shear: `x' = x + a·y`, `y' = b·x + y`.
pub fn shear_matrix(a: f64, b: f64) -> [f64; 9] {
    from_linear([1.0, a, b, 1.0])
}

/// Mirror along the selected axes.
pub fn flip_matrix(flip_x: bool, flip_y: bool) -> [f64; 9] {
    let sign = |f: bool| if f { -1.0 } else { 1.0 };
    from_linear([sign(flip_x), 0.0, 0.0, sign(flip_y)])
}

/// Pure projective component, with `a` and `b` in the bottom row.
pub fn projection_matrix(a: f64, b: f64) -> [f64; 9] {
    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, a, b, 1.0]
}

/// Parse a matrix from 4 (2x2 linear) or 9 (3x3 homogeneous) row-major coefficients separated by
/// commas and/or whitespace.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::parse_matrix;
///
/// let m = parse_matrix("2, 0, 0, 0.5").unwrap();
/// assert_eq!(m, [2.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0]);
/// ```
pub fn parse_matrix(s: &str) -> Result<[f64; 9], WarpError> {
    let values = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>().map_err(|e| {
                WarpError::InvalidConfiguration(format!("bad matrix coefficient '{t}': {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.len() {
        4 => Ok(from_linear([values[0], values[1], values[2], values[3]])),
        9 => {
            let mut m = [0.0; 9];
            m.copy_from_slice(&values);
            Ok(m)
        }
        n => Err(WarpError::InvalidConfiguration(format!(
            "a warp matrix needs 4 or 9 coefficients, got {n}"
        ))),
    }
}

/// A non-degenerate projective transform together with its cached inverse.
///
/// The forward matrix maps input pixel coordinates to output pixel coordinates. The inverse is
/// computed once at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    forward: [f64; 9],
    inverse: [f64; 9],
}

impl Homography {
    /// Validate the matrix and cache its inverse.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::DegenerateTransform`] for a singular or non-finite matrix.
    pub fn new(m: [f64; 9]) -> Result<Self, WarpError> {
        let inverse = invert(&m)?;
        Ok(Self {
            forward: m,
            inverse,
        })
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            forward: IDENTITY,
            inverse: IDENTITY,
        }
    }

    /// The forward matrix.
    pub fn matrix(&self) -> &[f64; 9] {
        &self.forward
    }

    /// The cached inverse matrix.
    pub fn inverse(&self) -> &[f64; 9] {
        &self.inverse
    }

    /// Map an input point into output space.
    #[inline]
    pub fn forward_point(&self, p: Point2) -> Point2 {
        map_point(&self.forward, p)
    }

    /// Map an output point back into input space.
    #[inline]
    pub fn inverse_point(&self, p: Point2) -> Point2 {
        map_point(&self.inverse, p)
    }
}

impl FromStr for Homography {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Homography::new(parse_matrix(s)?)
    }
}
