//! Greedy, collision-free label placement.
//!
//! A pass runs in three steps:
//!
//! 1. every point reserves its marker footprint and every nameable entity
//!    is filed into the bucket of its first matching [`LabelRule`];
//! 2. buckets are visited in priority order, and for each entity candidate
//!    positions are generated from its projected geometry;
//! 3. a candidate is committed only if none of its boxes touches a box
//!    already in the *drawn* index.
//!
//! Placement is greedy: an earlier label never moves to make room for a
//! later one, so the result depends on stack order and then input order.

pub mod index;
pub mod line;
pub mod stack;

use crate::config::{ConfigError, LabelConfig};
use crate::entity::{Entity, Geometry};
use crate::geo::geom::extent_polygon;
use crate::geo::{path_bounds, path_length, polygon_centroid, polygon_intersects_polygon, Extent, Point};
use crate::projection::Projection;
use crate::text_metrics::{MeasureText, TextWidthCache};
use index::{BBox, LabelIndex};
use serde::Serialize;
use stack::{LabelRule, LabelStack};
use std::collections::HashMap;

/// Visible part of the map, in projected pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub extent: Extent,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, zoom: f64) -> Self {
        Self {
            extent: [[0.0, 0.0], [width, height]],
            zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLabel {
    pub entity_id: String,
    pub class: String,
    pub text: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub text_anchor: TextAnchor,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaText {
    pub x: f64,
    pub y: f64,
    pub text_anchor: TextAnchor,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaLabel {
    pub entity_id: String,
    pub class: String,
    pub text: String,
    pub font_size: f64,
    pub label: Option<AreaText>,
    /// `translate(x,y)` of the icon when only the icon found room.
    pub icon_transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineLabel {
    pub entity_id: String,
    pub class: String,
    pub text: String,
    pub font_size: f64,
    pub path: String,
    pub start_offset: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelSet {
    pub points: Vec<PointLabel>,
    pub lines: Vec<LineLabel>,
    pub areas: Vec<AreaLabel>,
}

impl LabelSet {
    pub fn len(&self) -> usize {
        self.points.len() + self.lines.len() + self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.points
            .iter()
            .map(|l| l.entity_id.as_str())
            .chain(self.lines.iter().map(|l| l.entity_id.as_str()))
            .chain(self.areas.iter().map(|l| l.entity_id.as_str()))
    }
}

pub struct LabelEngine {
    config: LabelConfig,
    stack: LabelStack,
    drawn: LabelIndex,
    skipped: LabelIndex,
    entity_boxes: HashMap<String, Vec<BBox>>,
    widths: TextWidthCache,
    measurer: Option<Box<dyn MeasureText>>,
}

impl std::fmt::Debug for LabelEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelEngine")
            .field("rules", &self.stack.len())
            .field("drawn", &self.drawn.len())
            .field("skipped", &self.skipped.len())
            .field("measurer", &self.measurer.is_some())
            .finish()
    }
}

/// Id of the footprint a point marker reserves.
pub fn footprint_id(entity_id: &str) -> String {
    format!("{entity_id}P")
}

/// Id of an area's fallback icon.
pub fn icon_id(entity_id: &str) -> String {
    format!("{entity_id}I")
}

impl LabelEngine {
    pub fn new(config: LabelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stack = LabelStack::new(config.label_stack.clone())?;
        Ok(Self {
            config,
            stack,
            drawn: LabelIndex::new(),
            skipped: LabelIndex::new(),
            entity_boxes: HashMap::new(),
            widths: TextWidthCache::new(),
            measurer: None,
        })
    }

    /// Uses `measurer` for exact text widths instead of the estimate.
    pub fn with_measurer(mut self, measurer: Box<dyn MeasureText>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn drawn(&self) -> &LabelIndex {
        &self.drawn
    }

    pub fn skipped(&self) -> &LabelIndex {
        &self.skipped
    }

    /// Number of exact text widths the last pass obtained from the measurer.
    pub fn measured_widths(&self) -> usize {
        self.widths.len()
    }

    /// Boxes last recorded for `id` during the current pass.
    pub fn entity_boxes(&self, id: &str) -> Option<&[BBox]> {
        self.entity_boxes.get(id).map(Vec::as_slice)
    }

    pub fn compute_labels(
        &mut self,
        entities: &[Entity],
        projection: &dyn Projection,
        viewport: &Viewport,
    ) -> LabelSet {
        self.drawn.clear();
        self.skipped.clear();
        self.entity_boxes.clear();
        self.widths.clear();

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); self.stack.len()];
        for (idx, entity) in entities.iter().enumerate() {
            if let Geometry::Point(coord) = &entity.geometry {
                self.reserve_footprint(entity, projection.project(*coord), viewport);
            }
            if entity.display_name(&self.config.name_keys).is_none() {
                continue;
            }
            if let Some(bucket) = self.stack.bucket_of(entity) {
                buckets[bucket].push(idx);
            }
        }

        let mut labels = LabelSet::default();
        let viewport_ring = extent_polygon(&viewport.extent);
        for (bucket, members) in buckets.iter().enumerate() {
            let rule = self.stack.rules()[bucket].clone();
            for &idx in members {
                let entity = &entities[idx];
                let Some(name) = entity.display_name(&self.config.name_keys) else {
                    continue;
                };
                let width = self
                    .widths
                    .width(name, rule.font_size, self.measurer.as_deref());
                let class = format!("{} tag-{}", rule.geometry.as_str(), rule.key);

                match &entity.geometry {
                    Geometry::Point(coord) => {
                        let point = projection.project(*coord);
                        if let Some(label) = self.place_point(entity, &rule, point, name, width, class) {
                            labels.points.push(label);
                        }
                    }
                    Geometry::LineString(coords) => {
                        let points = projection.project_all(coords);
                        let label = self.place_line(entity, &rule, &points, &viewport_ring, name, width, class);
                        if let Some(label) = label {
                            labels.lines.push(label);
                        }
                    }
                    Geometry::Polygon(rings) => {
                        let rings: Vec<Vec<Point>> =
                            rings.iter().map(|ring| projection.project_all(ring)).collect();
                        if let Some(label) = self.place_area(entity, &rule, &rings, name, width, class) {
                            labels.areas.push(label);
                        }
                    }
                    _ => {}
                }
            }
        }

        log::debug!(
            "placed {} labels ({} points, {} lines, {} areas); {} boxes drawn, {} skipped",
            labels.len(),
            labels.points.len(),
            labels.lines.len(),
            labels.areas.len(),
            self.drawn.len(),
            self.skipped.len()
        );
        labels
    }

    fn reserve_footprint(&mut self, entity: &Entity, point: Point, viewport: &Viewport) {
        let pad = self.config.node_padding;
        let mut bbox = BBox::around(point, pad);
        if viewport.zoom >= self.config.marker_padding_zoom {
            bbox.min_y -= self.config.marker_padding;
        }
        self.force_insert(bbox, &footprint_id(&entity.id));
    }

    fn place_point(
        &mut self,
        entity: &Entity,
        rule: &LabelRule,
        point: Point,
        name: &str,
        width: f64,
        class: String,
    ) -> Option<PointLabel> {
        let height = rule.font_size;
        let pad = self.config.text_padding;
        let x = point[0] + self.config.point_offset_x;
        let y = point[1] + self.config.point_offset_y;
        let bbox = BBox::new(
            x - pad,
            y - height / 2.0 - pad,
            x + width + pad,
            y + height / 2.0 + pad,
        );
        if !self.try_insert(vec![bbox], &entity.id, true) {
            log::trace!("point label {} collides", entity.id);
            return None;
        }
        Some(PointLabel {
            entity_id: entity.id.clone(),
            class,
            text: name.to_string(),
            font_size: rule.font_size,
            x,
            y,
            text_anchor: TextAnchor::Start,
            width,
            height,
        })
    }

    fn place_area(
        &mut self,
        entity: &Entity,
        rule: &LabelRule,
        rings: &[Vec<Point>],
        name: &str,
        width: f64,
        class: String,
    ) -> Option<AreaLabel> {
        let centroid = polygon_centroid(rings).filter(|c| c[0].is_finite() && c[1].is_finite());
        let all_points: Vec<Point> = rings.concat();
        let area_width = path_bounds(&all_points).map_or(0.0, |[min, max]| max[0] - min[0]);
        let Some(centroid) = centroid else {
            log::trace!("area {} has no centroid", entity.id);
            return None;
        };
        if area_width < self.config.area_min_width {
            return None;
        }

        let height = rule.font_size;
        let pad = self.config.text_padding;
        let mut label = None;
        if width > 0.0 && area_width >= width + self.config.area_label_margin {
            let bbox = BBox::new(
                centroid[0] - width / 2.0 - pad,
                centroid[1] - height / 2.0 - pad,
                centroid[0] + width / 2.0 + pad,
                centroid[1] + height / 2.0 + pad,
            );
            if self.try_insert(vec![bbox], &entity.id, true) {
                label = Some(AreaText {
                    x: centroid[0],
                    y: centroid[1],
                    text_anchor: TextAnchor::Middle,
                    height,
                });
            }
        }

        let mut icon_transform = None;
        if label.is_none() && self.config.area_icons {
            let half = self.config.area_icon_size / 2.0;
            let bbox = BBox::around(centroid, half);
            if self.try_insert(vec![bbox], &icon_id(&entity.id), true) {
                icon_transform = Some(format!("translate({},{})", centroid[0], centroid[1]));
            }
        }

        if label.is_none() && icon_transform.is_none() {
            return None;
        }
        Some(AreaLabel {
            entity_id: entity.id.clone(),
            class,
            text: name.to_string(),
            font_size: rule.font_size,
            label,
            icon_transform,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn place_line(
        &mut self,
        entity: &Entity,
        rule: &LabelRule,
        points: &[Point],
        viewport_ring: &[Point],
        name: &str,
        width: f64,
        class: String,
    ) -> Option<LineLabel> {
        let length = path_length(points);
        if length < width + self.config.line_label_margin {
            return None;
        }

        let height = rule.font_size;
        let offsets = self.config.line_offsets.clone();
        for offset in offsets {
            let middle = offset / 100.0 * length;
            let start = middle - width / 2.0;
            if start < 0.0 || start + width > length {
                continue;
            }
            let Some(mut sub) = line::subpath(points, start, start + width) else {
                continue;
            };
            if !polygon_intersects_polygon(viewport_ring, &sub, true) {
                continue;
            }
            if line::should_reverse(&sub) {
                sub.reverse();
            }

            let boxes = line::collision_boxes(&sub, height, self.config.line_box_padding);
            if self.try_insert(boxes, &entity.id, false) {
                return Some(LineLabel {
                    entity_id: entity.id.clone(),
                    class,
                    text: name.to_string(),
                    font_size: height + 2.0,
                    path: line::line_string(&sub),
                    start_offset: format!("{offset}%"),
                });
            }
        }
        log::trace!("no room along line {}", entity.id);
        None
    }

    /// Commits all of `boxes` under `id` unless one of them touches a drawn
    /// box. Rejected boxes go to the skipped index when `save_skipped`.
    fn try_insert(&mut self, mut boxes: Vec<BBox>, id: &str, save_skipped: bool) -> bool {
        for bbox in &mut boxes {
            bbox.id = id.to_string();
        }
        let collides = boxes.iter().any(|bbox| self.drawn.collides(bbox));
        self.entity_boxes.insert(id.to_string(), boxes.clone());
        if !collides {
            self.drawn.load(boxes);
        } else if save_skipped {
            self.skipped.load(boxes);
        }
        !collides
    }

    fn force_insert(&mut self, bbox: BBox, id: &str) {
        let bbox = bbox.with_id(id);
        self.entity_boxes.insert(id.to_string(), vec![bbox.clone()]);
        self.drawn.insert(bbox);
    }
}
