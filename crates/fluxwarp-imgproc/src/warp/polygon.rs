use smallvec::SmallVec;

/// Tolerance absorbing floating point jitter at pixel boundaries.
///
/// A vertex closer than this to a clipping edge counts as lying on it, and boundary coordinates
/// within this distance of a half-integer round as if they were exactly on it.
pub const GEOMETRY_TOLERANCE: f64 = 1e-5;

/// A point in a flat 2D coordinate system, `[x, y]`.
pub type Point2 = [f64; 2];

/// The four corners of a convex quadrilateral.
pub type Quad = [Point2; 4];

/// A convex polygon produced by clipping. Clipping a quadrilateral against a quadrilateral gives
/// at most 8 vertices, which are kept inline.
pub type Polygon = SmallVec<[Point2; 8]>;

/// Anti-clockwise unit square of the pixel centred at `(x, y)`.
#[inline]
pub fn pixel_square(x: f64, y: f64) -> Quad {
    [
        [x - 0.5, y - 0.5],
        [x + 0.5, y - 0.5],
        [x + 0.5, y + 0.5],
        [x - 0.5, y + 0.5],
    ]
}

/// Find the permutation that lists the corners of a convex quadrilateral anti-clockwise.
///
/// Corners are sorted by their polar angle around the centroid, starting from the most negative
/// angle. Equal angles keep their input order, so the result is deterministic even for
/// degenerate input (repeated or collinear corners); such input yields a polygon with zero or
/// near-zero [`area`], which callers must check.
///
/// Applying the permutation and calling this function again returns the identity permutation.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::{area, order_corners_anticlockwise, reorder};
///
/// // a unit square listed row by row instead of around its boundary
/// let quad = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
/// let order = order_corners_anticlockwise(&quad);
///
/// assert_eq!(order, [0, 1, 3, 2]);
/// assert_eq!(area(&reorder(&quad, &order)), 1.0);
/// ```
pub fn order_corners_anticlockwise(quad: &Quad) -> [usize; 4] {
    let cx = quad.iter().map(|p| p[0]).sum::<f64>() / 4.0;
    let cy = quad.iter().map(|p| p[1]).sum::<f64>() / 4.0;
    let angles = quad.map(|p| (p[1] - cy).atan2(p[0] - cx));

    let mut order = [0, 1, 2, 3];
    order.sort_by(|&a, &b| angles[a].total_cmp(&angles[b]));
    order
}

/// Apply a corner permutation to a quadrilateral.
#[inline]
pub fn reorder(quad: &Quad, order: &[usize; 4]) -> Quad {
    order.map(|i| quad[i])
}

/// Signed area of a polygon with the shoelace formula.
///
/// Positive for anti-clockwise vertices, negative for clockwise ones, and 0 for fewer than three
/// vertices.
pub fn area(polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let [x0, y0] = polygon[i];
        let [x1, y1] = polygon[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

// positive when `p` lies left of the directed line `a -> b`, in units of distance
#[inline]
fn signed_distance(a: Point2, b: Point2, p: Point2) -> f64 {
    let (ex, ey) = (b[0] - a[0], b[1] - a[1]);
    let cross = ex * (p[1] - a[1]) - ey * (p[0] - a[0]);
    let len = ex.hypot(ey);
    if len > 0.0 {
        cross / len
    } else {
        cross
    }
}

// intersection of the segment `p -> q` with the line `a -> b`, clamped to the segment
#[inline]
fn intersect(p: Point2, q: Point2, a: Point2, b: Point2) -> Point2 {
    let (ex, ey) = (b[0] - a[0], b[1] - a[1]);
    let (dx, dy) = (q[0] - p[0], q[1] - p[1]);
    let denom = ex * dy - ey * dx;
    if denom.abs() < f64::EPSILON {
        return p;
    }
    let t = (-(ex * (p[1] - a[1]) - ey * (p[0] - a[0])) / denom).clamp(0.0, 1.0);
    [p[0] + t * dx, p[1] + t * dy]
}

/// Clip a convex polygon against a convex clip polygon (Sutherland–Hodgman).
///
/// Both polygons must be anti-clockwise. A vertex within [`GEOMETRY_TOLERANCE`] of a clip edge
/// counts as inside. Returns an empty polygon when the overlap has fewer than three vertices.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::warp::{area, clip, pixel_square};
///
/// let overlap = clip(&pixel_square(0.5, 0.5), &pixel_square(0.0, 0.0));
/// assert_eq!(area(&overlap), 0.25);
///
/// let disjoint = clip(&pixel_square(3.0, 0.0), &pixel_square(0.0, 0.0));
/// assert!(disjoint.is_empty());
/// ```
pub fn clip(subject: &[Point2], clip: &[Point2]) -> Polygon {
    let mut output: Polygon = subject.iter().copied().collect();
    let n = clip.len();

    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let (a, b) = (clip[i], clip[(i + 1) % n]);
        let input = std::mem::take(&mut output);

        let mut prev = input[input.len() - 1];
        let mut prev_inside = signed_distance(a, b, prev) > -GEOMETRY_TOLERANCE;
        for &curr in input.iter() {
            let curr_inside = signed_distance(a, b, curr) > -GEOMETRY_TOLERANCE;
            if curr_inside {
                if !prev_inside {
                    output.push(intersect(prev, curr, a, b));
                }
                output.push(curr);
            } else if prev_inside {
                output.push(intersect(prev, curr, a, b));
            }
            prev = curr;
            prev_inside = curr_inside;
        }
    }

    if output.len() < 3 {
        output.clear();
    }
    output
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const PERMUTATIONS: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [0, 1, 3, 2],
        [0, 2, 1, 3],
        [0, 2, 3, 1],
        [0, 3, 1, 2],
        [0, 3, 2, 1],
    ];

    #[test]
    fn area_of_simple_shapes() {
        assert_eq!(area(&pixel_square(3.0, -7.0)), 1.0);
        let mut square = pixel_square(0.0, 0.0);
        square.reverse();
        assert_eq!(area(&square), -1.0);
        assert_eq!(area(&[[0.0, 0.0], [1.0, 1.0]]), 0.0);
        assert_eq!(area(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]), 2.0);
    }

    #[test]
    fn ordering_gives_positive_area_for_any_input_order() {
        let quads: [Quad; 3] = [
            pixel_square(10.0, 4.0),
            [[0.0, 0.0], [3.0, 0.5], [3.5, 2.0], [-0.5, 1.5]],
            [[1.0, -2.0], [2.5, 0.0], [1.0, 2.0], [-1.0, 0.1]],
        ];
        for quad in quads {
            let expected = area(&quad);
            assert!(expected > 0.0);
            for perm in PERMUTATIONS {
                let shuffled = reorder(&quad, &perm);
                let order = order_corners_anticlockwise(&shuffled);
                let ordered = reorder(&shuffled, &order);
                assert_relative_eq!(area(&ordered), expected, epsilon = 1e-12);

                // ordering an ordered quad is the identity
                assert_eq!(order_corners_anticlockwise(&ordered), [0, 1, 2, 3]);
            }
        }
    }

    #[test]
    fn ordering_degenerate_quad_is_deterministic() {
        let collapsed = [[1.0, 1.0]; 4];
        assert_eq!(order_corners_anticlockwise(&collapsed), [0, 1, 2, 3]);

        let collinear = [[0.0, 0.0], [2.0, 0.0], [1.0, 0.0], [3.0, 0.0]];
        let order = order_corners_anticlockwise(&collinear);
        assert_eq!(order, order_corners_anticlockwise(&collinear));
        assert_eq!(area(&reorder(&collinear, &order)), 0.0);
    }

    #[test]
    fn clip_identical_squares() {
        let square = pixel_square(2.0, 5.0);
        let clipped = clip(&square, &square);
        assert_eq!(clipped.len(), 4);
        assert_eq!(area(&clipped), 1.0);
    }

    #[test]
    fn clip_neighbours_share_only_an_edge() {
        let clipped = clip(&pixel_square(0.0, 0.0), &pixel_square(1.0, 0.0));
        assert_relative_eq!(area(&clipped), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn clip_partial_overlap() {
        let clipped = clip(&pixel_square(0.25, 0.5), &pixel_square(0.0, 0.0));
        assert_relative_eq!(area(&clipped), 0.375, epsilon = 1e-12);
    }

    #[test]
    fn clip_rotated_square() {
        // a diamond of area 0.5 inside the unit square around the origin
        let diamond = [[0.0, -0.5], [0.5, 0.0], [0.0, 0.5], [-0.5, 0.0]];
        let clipped = clip(&diamond, &pixel_square(0.0, 0.0));
        assert_relative_eq!(area(&clipped), 0.5, epsilon = 1e-12);

        // the unit square clipped by the diamond is the diamond itself
        let clipped = clip(&pixel_square(0.0, 0.0), &diamond);
        assert_relative_eq!(area(&clipped), 0.5, epsilon = 1e-12);

        // the diamond shifted right by half a pixel overlaps half of itself
        let shifted = diamond.map(|p| [p[0] + 0.5, p[1]]);
        let clipped = clip(&shifted, &pixel_square(0.0, 0.0));
        assert_relative_eq!(area(&clipped), 0.25, epsilon = 1e-12);
        assert!(clipped.len() <= 8);
    }

    #[test]
    fn clip_disjoint_is_empty() {
        let clipped = clip(&pixel_square(0.0, 0.0), &pixel_square(0.0, 2.0));
        assert!(clipped.is_empty());
        assert_eq!(area(&clipped), 0.0);
    }
}
