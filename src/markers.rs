//! Periodic direction markers along line geometry (oneway and flow arrows).
//!
//! Each visible point pair that is long enough to hold at least one marker
//! becomes a small path `a, p0, p1, .., b`; a renderer hangs its arrow on
//! the interior vertices. The distance left over at the end of one pair is
//! carried into the next so markers stay evenly spaced along the line.

use crate::entity::{Entity, Geometry, NO};
use crate::geo::{clip_polyline, vec_add, vec_angle, vec_length, Extent, Point};
use crate::projection::Projection;
use crate::tags::implies_oneway;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Spacing between oneway arrows, in projected pixels.
pub const ONEWAY_SPACING: f64 = 35.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSegment {
    pub id: String,
    pub index: usize,
    pub d: String,
}

impl MarkerSegment {
    pub fn key(&self) -> (&str, usize) {
        (self.id.as_str(), self.index)
    }
}

#[derive(Debug, Clone)]
pub struct MarkerGenerator {
    pub spacing: f64,
    pub clip: Extent,
}

impl MarkerGenerator {
    pub fn new(spacing: f64, clip: Extent) -> Self {
        Self { spacing, clip }
    }

    /// Markers for `entity`, whose geometry has already been projected to
    /// `points`.
    pub fn generate(
        &self,
        entity: &Entity,
        points: &[Point],
        should_reverse: bool,
        both_directions: bool,
    ) -> Vec<MarkerSegment> {
        generate_marker_segments(
            &entity.id,
            points,
            &self.clip,
            self.spacing,
            should_reverse,
            both_directions,
        )
    }
}

pub fn generate_marker_segments(
    id: &str,
    points: &[Point],
    clip: &Extent,
    spacing: f64,
    reverse: bool,
    both_directions: bool,
) -> Vec<MarkerSegment> {
    let mut segments = Vec::new();
    if spacing <= 0.0 || !spacing.is_finite() {
        return segments;
    }

    let mut coordinates = points.to_vec();
    if reverse {
        coordinates.reverse();
    }

    let mut index = 0usize;
    let mut offset = spacing;
    for run in clip_polyline(&coordinates, clip) {
        for pair in run.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let mut span = vec_length(a, b) - offset;
            if span >= 0.0 {
                let heading = vec_angle(a, b);
                let step = [spacing * heading.cos(), spacing * heading.sin()];
                let mut p = [a[0] + offset * heading.cos(), a[1] + offset * heading.sin()];

                let mut coords = vec![a, p];
                span -= spacing;
                while span >= 0.0 {
                    p = vec_add(p, step);
                    coords.push(p);
                    span -= spacing;
                }
                coords.push(b);

                segments.push(MarkerSegment {
                    id: id.to_string(),
                    index,
                    d: path_data(coords.iter()),
                });
                index += 1;
                if both_directions {
                    segments.push(MarkerSegment {
                        id: id.to_string(),
                        index,
                        d: path_data(coords.iter().rev()),
                    });
                    index += 1;
                }
            }
            offset = -span;
        }
    }
    segments
}

fn path_data<'a>(points: impl Iterator<Item = &'a Point>) -> String {
    let mut d = String::new();
    for (idx, point) in points.enumerate() {
        d.push(if idx == 0 { 'M' } else { 'L' });
        d.push_str(&format!("{},{}", point[0], point[1]));
    }
    d
}

/// Keys of `previous` that a keyed renderer must drop before drawing
/// `current`. When an entity's segment count changes, every one of its old
/// indices is stale.
pub fn invalidated_keys(previous: &[MarkerSegment], current: &[MarkerSegment]) -> Vec<(String, usize)> {
    fn counts(segments: &[MarkerSegment]) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for segment in segments {
            *counts.entry(segment.id.as_str()).or_insert(0) += 1;
        }
        counts
    }
    let before = counts(previous);
    let after = counts(current);

    let mut stale: BTreeMap<(String, usize), ()> = BTreeMap::new();
    for segment in previous {
        let id = segment.id.as_str();
        let changed = after.get(id) != before.get(id);
        let gone = !current
            .iter()
            .any(|other| other.id == segment.id && other.index == segment.index);
        if changed || gone {
            stale.insert((segment.id.clone(), segment.index), ());
        }
    }
    stale.into_keys().collect()
}

/// Which lines get direction markers, and which way they point.
#[derive(Debug, Clone)]
pub struct OnewayMarkers {
    generator: MarkerGenerator,
}

impl OnewayMarkers {
    pub fn new(spacing: f64, clip: Extent) -> Self {
        Self {
            generator: MarkerGenerator::new(spacing, clip),
        }
    }

    pub fn applies_to(entity: &Entity) -> bool {
        let tags = &entity.tags;
        if tags.get("oneway") == Some(NO) {
            return false;
        }
        tags.active("oneway").is_some() || implies_oneway(tags) || tags.contains("waterway")
    }

    pub fn is_reversed(entity: &Entity) -> bool {
        entity.tags.get("oneway") == Some("-1")
    }

    pub fn is_bidirectional(entity: &Entity) -> bool {
        matches!(entity.tags.get("oneway"), Some("reversible" | "alternating"))
    }

    /// Markers for a single entity. Only `LineString` geometry carries them.
    pub fn segments(&self, entity: &Entity, projection: &dyn Projection) -> Vec<MarkerSegment> {
        let Geometry::LineString(coords) = &entity.geometry else {
            return Vec::new();
        };
        if !Self::applies_to(entity) {
            return Vec::new();
        }
        let points = projection.project_all(coords);
        self.generator.generate(
            entity,
            &points,
            Self::is_reversed(entity),
            Self::is_bidirectional(entity),
        )
    }

    pub fn collect(&self, entities: &[Entity], projection: &dyn Projection) -> Vec<MarkerSegment> {
        let segments: Vec<MarkerSegment> = entities
            .iter()
            .flat_map(|entity| self.segments(entity, projection))
            .collect();
        log::debug!("generated {} direction markers", segments.len());
        segments
    }
}
