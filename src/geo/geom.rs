use super::vector::{vec_cross, vec_interp, vec_length, vec_subtract, Point};

/// Axis-aligned extent as `[[min_x, min_y], [max_x, max_y]]`.
pub type Extent = [Point; 2];

pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|pair| vec_length(pair[0], pair[1])).sum()
}

/// Closed ring tracing the border of `extent`, used as a viewport polygon.
pub fn extent_polygon(extent: &Extent) -> Vec<Point> {
    let [[x0, y0], [x1, y1]] = *extent;
    vec![[x0, y0], [x0, y1], [x1, y1], [x1, y0], [x0, y0]]
}

/// Returns true when any vertex of `inner` lies inside `outer`, or, when
/// `check_segments` is set, when any edge of one crosses an edge of the other.
pub fn polygon_intersects_polygon(outer: &[Point], inner: &[Point], check_segments: bool) -> bool {
    inner.iter().any(|point| point_in_polygon(*point, outer))
        || (check_segments && path_has_intersections(outer, inner))
}

/// Intersection point of two finite segments.
///
/// Collinear or parallel segments yield `None` even when they overlap, and so
/// does a pair where the second segment starts exactly on the first one's
/// supporting line.
pub fn line_intersection(a: [Point; 2], b: [Point; 2]) -> Option<Point> {
    let [p, p2] = a;
    let [q, q2] = b;
    let r = vec_subtract(p2, p);
    let s = vec_subtract(q2, q);
    let u_numerator = vec_cross(vec_subtract(q, p), r, None);
    let denominator = vec_cross(r, s, None);

    if u_numerator == 0.0 || denominator == 0.0 {
        return None;
    }
    let u = u_numerator / denominator;
    let t = vec_cross(vec_subtract(q, p), s, None) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(vec_interp(p, p2, t))
    } else {
        None
    }
}

pub fn path_has_intersections(path1: &[Point], path2: &[Point]) -> bool {
    path1.windows(2).any(|a| {
        path2
            .windows(2)
            .any(|b| line_intersection([a[0], a[1]], [b[0], b[1]]).is_some())
    })
}

/// Even-odd ray casting. Points exactly on an edge may land on either side.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let [x, y] = point;
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        let intersect = (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi;
        if intersect {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Planar signed area of a ring (positive for counterclockwise in a y-up frame).
pub fn polygon_area(ring: &[Point]) -> f64 {
    ring_segments(ring)
        .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
        .sum::<f64>()
        / 2.0
}

/// Planar centroid of a polygon given as rings (outer first, then holes).
///
/// Rings are weighted by signed area, so holes wound opposite to the outer
/// ring are subtracted. A zero-area polygon falls back to the length-weighted
/// midpoint of its edges and then to the mean of its vertices.
pub fn polygon_centroid(rings: &[Vec<Point>]) -> Option<Point> {
    let mut area_x = 0.0;
    let mut area_y = 0.0;
    let mut area_z = 0.0;
    let mut line_x = 0.0;
    let mut line_y = 0.0;
    let mut line_z = 0.0;
    let mut point_x = 0.0;
    let mut point_y = 0.0;
    let mut point_n = 0usize;

    for ring in rings {
        for (a, b) in ring_segments(ring) {
            let z = a[0] * b[1] - b[0] * a[1];
            area_x += (a[0] + b[0]) * z;
            area_y += (a[1] + b[1]) * z;
            area_z += z * 3.0;

            let len = vec_length(a, b);
            line_x += (a[0] + b[0]) / 2.0 * len;
            line_y += (a[1] + b[1]) / 2.0 * len;
            line_z += len;
        }
        for point in ring {
            point_x += point[0];
            point_y += point[1];
            point_n += 1;
        }
    }

    let centroid = if area_z != 0.0 {
        [area_x / area_z, area_y / area_z]
    } else if line_z != 0.0 {
        [line_x / line_z, line_y / line_z]
    } else if point_n > 0 {
        [point_x / point_n as f64, point_y / point_n as f64]
    } else {
        return None;
    };
    if centroid[0].is_finite() && centroid[1].is_finite() {
        Some(centroid)
    } else {
        None
    }
}

/// Bounding extent of a point list, `None` when empty.
pub fn path_bounds(points: &[Point]) -> Option<Extent> {
    let first = *points.first()?;
    let mut min = first;
    let mut max = first;
    for point in &points[1..] {
        min[0] = min[0].min(point[0]);
        min[1] = min[1].min(point[1]);
        max[0] = max[0].max(point[0]);
        max[1] = max[1].max(point[1]);
    }
    Some([min, max])
}

/// Clips a polyline to `extent`, returning the visible runs in order.
///
/// A run ends wherever the line leaves the extent; consecutive visible
/// segments that share an endpoint stay in one run.
pub fn clip_polyline(points: &[Point], extent: &Extent) -> Vec<Vec<Point>> {
    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    if points.len() == 1 {
        if contains(extent, points[0]) {
            runs.push(vec![points[0]]);
        }
        return runs;
    }

    for pair in points.windows(2) {
        let Some((a, b, clipped_start, clipped_end)) = clip_segment(pair[0], pair[1], extent)
        else {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            continue;
        };
        if clipped_start || current.is_empty() {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            current.push(a);
        }
        current.push(b);
        if clipped_end {
            runs.push(std::mem::take(&mut current));
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

fn contains(extent: &Extent, point: Point) -> bool {
    let [[x0, y0], [x1, y1]] = *extent;
    point[0] >= x0 && point[0] <= x1 && point[1] >= y0 && point[1] <= y1
}

// Liang-Barsky; the flags report whether either endpoint was moved.
fn clip_segment(a: Point, b: Point, extent: &Extent) -> Option<(Point, Point, bool, bool)> {
    let [[x0, y0], [x1, y1]] = *extent;
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-dx, a[0] - x0),
        (dx, x1 - a[0]),
        (-dy, a[1] - y0),
        (dy, y1 - a[1]),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }
    let start = if t0 > 0.0 { vec_interp(a, b, t0) } else { a };
    let end = if t1 < 1.0 { vec_interp(a, b, t1) } else { b };
    Some((start, end, t0 > 0.0, t1 < 1.0))
}

fn ring_segments(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2)
        .map(|pair| (pair[0], pair[1]))
        .chain(closing)
}
