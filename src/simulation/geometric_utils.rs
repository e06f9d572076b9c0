//! Geometric utility functions for distance calculations.

use ndarray::Array1;

/// Euclidean length of the vector `(dx, dy)`.
#[inline]
pub fn distance(dx: f32, dy: f32) -> f32 {
    dx.hypot(dy)
}

/// Returns `true` if `a` and `b` differ by less than `epsilon`.
#[inline]
pub fn almost_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// Calculates the perpendicular distance from a point to the infinite line
/// through two points.
///
/// # Arguments
///
/// * `line_start` - First point on the line
/// * `line_end` - Second point on the line
/// * `point` - Point to measure from
///
/// # Returns
///
/// The distance, or `f32::INFINITY` when the two line points coincide.
pub fn distance_from_line(
    line_start: &Array1<f32>,
    line_end: &Array1<f32>,
    point: &Array1<f32>,
) -> f32 {
    let (x1, y1) = (line_start[0], line_start[1]);
    let (x2, y2) = (line_end[0], line_end[1]);
    let length = distance(x2 - x1, y2 - y1);
    if length == 0.0 {
        return f32::INFINITY;
    }

    ((y2 - y1) * point[0] - (x2 - x1) * point[1] + x2 * y1 - y2 * x1).abs() / length
}
