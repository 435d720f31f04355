//! Projection from source coordinates to layer pixels.
//!
//! The label and marker passes never project on their own terms; they take a
//! `&dyn Projection` from the caller so that the same entities can be laid out
//! for any map view.

use crate::geo::Point;
use std::f64::consts::PI;

/// Maximum latitude representable in spherical mercator.
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;
const TILE_SIZE: f64 = 256.0;

pub trait Projection {
    /// Projects a `[lon, lat]` (or already-planar) coordinate to pixels.
    fn project(&self, point: Point) -> Point;

    fn project_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|point| self.project(*point)).collect()
    }
}

/// Coordinates are already in pixel space.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Projection for Identity {
    fn project(&self, point: Point) -> Point {
        point
    }
}

/// Spherical web mercator at a zoom level, shifted by a pixel origin.
///
/// Matches the layer-point convention of slippy maps: `x` grows east, `y`
/// grows south, and the world is `256 * 2^zoom` pixels wide.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    pub zoom: f64,
    pub origin: Point,
}

impl WebMercator {
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            origin: [0.0, 0.0],
        }
    }

    /// A projection whose pixel origin puts `center` in the middle of a
    /// `width` x `height` viewport.
    pub fn centered(zoom: f64, center: Point, width: f64, height: f64) -> Self {
        let world = Self::new(zoom).project(center);
        Self {
            zoom,
            origin: [world[0] - width / 2.0, world[1] - height / 2.0],
        }
    }

    pub fn scale(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }
}

impl Projection for WebMercator {
    fn project(&self, point: Point) -> Point {
        let [lon, lat] = point;
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let sin = (lat * PI / 180.0).sin();
        let x = (lon + 180.0) / 360.0;
        let y = 0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI);
        let scale = self.scale();
        [x * scale - self.origin[0], y * scale - self.origin[1]]
    }
}
