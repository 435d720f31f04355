pub type Point = [f64; 2];

pub const ORIGIN: Point = [0.0, 0.0];

pub fn vec_length(a: Point, b: Point) -> f64 {
    vec_length_squared(a, b).sqrt()
}

pub fn vec_length_squared(a: Point, b: Point) -> f64 {
    let x = a[0] - b[0];
    let y = a[1] - b[1];
    x * x + y * y
}

/// Length of `a` measured from the origin.
pub fn vec_magnitude(a: Point) -> f64 {
    vec_length(a, ORIGIN)
}

/// Counterclockwise angle in `(-pi, pi]` between the positive x axis and `a -> b`.
pub fn vec_angle(a: Point, b: Point) -> f64 {
    (b[1] - a[1]).atan2(b[0] - a[0])
}

pub fn vec_add(a: Point, b: Point) -> Point {
    [a[0] + b[0], a[1] + b[1]]
}

pub fn vec_subtract(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1]]
}

/// 2D cross product of `origin -> a` and `origin -> b`.
///
/// Positive when `origin, a, b` turn counterclockwise, negative for a
/// clockwise turn and zero when the three points are collinear.
pub fn vec_cross(a: Point, b: Point, origin: Option<Point>) -> f64 {
    let origin = origin.unwrap_or(ORIGIN);
    let p = vec_subtract(a, origin);
    let q = vec_subtract(b, origin);
    p[0] * q[1] - p[1] * q[0]
}

/// Linear interpolation; `t` outside `[0, 1]` extrapolates.
pub fn vec_interp(a: Point, b: Point, t: f64) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}
