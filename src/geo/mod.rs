//! Pure 2D geometry used by the classifier, marker and label passes.
//!
//! Points are plain `[f64; 2]` arrays in whatever space the caller works in
//! (geographic degrees before projection, layer pixels after). Nothing here
//! allocates except the path helpers that return new point lists.

pub mod geom;
pub mod vector;

pub use geom::{
    clip_polyline, line_intersection, path_bounds, path_has_intersections, path_length,
    point_in_polygon, polygon_area, polygon_centroid, polygon_intersects_polygon, Extent,
};
pub use vector::{
    vec_add, vec_angle, vec_cross, vec_interp, vec_length, vec_length_squared, vec_magnitude,
    vec_subtract, Point, ORIGIN,
};
