//! Path helpers for labels drawn along a line.

use super::index::BBox;
use crate::geo::{vec_angle, vec_interp, vec_length, Point};
use std::f64::consts::FRAC_PI_2;

/// The part of `points` between distances `from` and `to` along the path.
///
/// Returns `None` when the path is shorter than `to`.
pub fn subpath(points: &[Point], from: f64, to: f64) -> Option<Vec<Point>> {
    let mut sofar = 0.0;
    let mut start = None;
    let mut end = None;
    let mut first_inner = 0;
    let mut last_inner = 0;

    for (i, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let current = vec_length(a, b);
        let portion = |at: f64| if current > 0.0 { (at - sofar) / current } else { 0.0 };

        if start.is_none() && sofar + current >= from {
            start = Some(vec_interp(a, b, portion(from)));
            first_inner = i + 1;
        }
        if end.is_none() && sofar + current >= to {
            end = Some(vec_interp(a, b, portion(to)));
            last_inner = i + 1;
        }
        sofar += current;
    }

    let (start, end) = (start?, end?);
    let mut result = vec![start];
    result.extend_from_slice(points.get(first_inner..last_inner).unwrap_or(&[]));
    result.push(end);
    Some(result)
}

/// Text must read left to right: flip unless the path starts heading right.
pub fn should_reverse(sub: &[Point]) -> bool {
    let (Some(first), Some(last)) = (sub.first(), sub.last()) else {
        return false;
    };
    let angle = match sub.get(1) {
        Some(next) => vec_angle(*first, *next),
        None => 0.0,
    };
    let reads_forward = first[0] < last[0] && angle > -FRAC_PI_2 && angle < FRAC_PI_2;
    !reads_forward
}

/// Collision boxes covering the path at a spacing of one box diameter.
pub fn collision_boxes(sub: &[Point], height: f64, padding: f64) -> Vec<BBox> {
    let boxsize = (height + 2.0) / 2.0;
    let half = boxsize + padding;
    let mut boxes = Vec::new();
    for pair in sub.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = vec_length(a, b);
        let num = ((len / boxsize / 2.0).floor() as usize).max(1);
        for step in 0..num {
            let p = vec_interp(a, b, step as f64 / num as f64);
            boxes.push(BBox::around(p, half));
        }
    }
    boxes
}

/// SVG path data `M x,y L x,y ...` without separating spaces.
pub fn line_string(points: &[Point]) -> String {
    let mut d = String::from("M");
    for (idx, point) in points.iter().enumerate() {
        if idx > 0 {
            d.push('L');
        }
        d.push_str(&format!("{},{}", point[0], point[1]));
    }
    d
}
