use crate::config::{Config, ConfigError, RenderConfig};
use crate::entity::{Entity, Geometry};
use crate::geo::{clip_polyline, path_bounds, polygon_area, Extent, Point};
use crate::labels::index::BBox;
use crate::labels::{LabelEngine, LabelSet, Viewport};
use crate::markers::{MarkerSegment, OnewayMarkers};
use crate::projection::Projection;
use crate::tags::vocabulary::PATH_HIGHWAY_VALUES;
use crate::tags::TagClassifier;
use crate::text_metrics::FontMeasurer;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const HIGHWAY_STACK: [&str; 12] = [
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "service",
    "footway",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Major,
    Road,
    Path,
    Rail,
    Water,
    Other,
}

impl LineStyle {
    fn of(entity: &Entity) -> Self {
        let tags = &entity.tags;
        if let Some(highway) = tags.active("highway") {
            return if PATH_HIGHWAY_VALUES.contains(&highway) {
                Self::Path
            } else if HIGHWAY_STACK[..6].contains(&highway) {
                Self::Major
            } else {
                Self::Road
            };
        }
        if tags.active("railway").is_some() {
            Self::Rail
        } else if tags.active("waterway").is_some() {
            Self::Water
        } else {
            Self::Other
        }
    }

    fn stroke<'a>(self, theme: &'a Theme) -> &'a str {
        match self {
            Self::Major => &theme.major_road_color,
            Self::Road => &theme.road_color,
            Self::Path => &theme.path_color,
            Self::Rail => &theme.rail_color,
            Self::Water => &theme.water_color,
            Self::Other => &theme.area_stroke,
        }
    }

    fn width(self) -> f64 {
        match self {
            Self::Major => 5.0,
            Self::Road => 3.0,
            Self::Water => 2.5,
            Self::Path | Self::Rail | Self::Other => 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneArea {
    pub id: String,
    pub data_key: String,
    pub class: String,
    pub rings: Vec<Vec<Point>>,
    pub area: f64,
    pub water: bool,
}

#[derive(Debug, Clone)]
pub struct SceneLine {
    pub id: String,
    pub data_key: String,
    pub class: String,
    pub points: Vec<Point>,
    pub style: LineStyle,
}

#[derive(Debug, Clone)]
pub struct ScenePoint {
    pub id: String,
    pub data_key: String,
    pub class: String,
    pub at: Point,
}

/// Everything the SVG writer needs, already projected and ordered.
#[derive(Debug, Clone)]
pub struct MapScene {
    pub width: f64,
    pub height: f64,
    pub areas: Vec<SceneArea>,
    pub lines: Vec<SceneLine>,
    pub points: Vec<ScenePoint>,
    pub markers: Vec<MarkerSegment>,
    pub labels: LabelSet,
    pub drawn_boxes: Vec<BBox>,
    pub skipped_boxes: Vec<BBox>,
}

/// Draw priority of a line: lower draws first, so motorways end up on top.
fn way_stack_score(entity: &Entity) -> i32 {
    match entity.tags.get("highway") {
        Some(highway) => match HIGHWAY_STACK.iter().position(|v| *v == highway) {
            Some(rank) => -(rank as i32),
            None => -(HIGHWAY_STACK.len() as i32),
        },
        None => 0,
    }
}

fn visible_extent(points: &[Point], extent: &Extent) -> bool {
    path_bounds(points).is_some_and(|[min, max]| {
        min[0] <= extent[1][0] && max[0] >= extent[0][0] && min[1] <= extent[1][1] && max[1] >= extent[0][1]
    })
}

fn contains(extent: &Extent, point: Point) -> bool {
    point[0] >= extent[0][0] && point[0] <= extent[1][0] && point[1] >= extent[0][1] && point[1] <= extent[1][1]
}

pub fn build_scene(
    entities: &[Entity],
    projection: &dyn Projection,
    viewport: &Viewport,
    config: &Config,
) -> Result<MapScene, ConfigError> {
    let classifier = TagClassifier::default();
    let extent = viewport.extent;

    let mut areas = Vec::new();
    let mut lines: Vec<(i32, SceneLine)> = Vec::new();
    let mut points = Vec::new();

    for entity in entities {
        match &entity.geometry {
            Geometry::Polygon(rings) => {
                let rings: Vec<Vec<Point>> = rings.iter().map(|r| projection.project_all(r)).collect();
                if !visible_extent(&rings.concat(), &extent) {
                    continue;
                }
                let area = rings.first().map_or(0.0, |outer| polygon_area(outer).abs());
                areas.push(SceneArea {
                    id: entity.id.clone(),
                    data_key: entity.data_key(),
                    class: classifier.classify(&entity.tags, "way area fill"),
                    rings,
                    area,
                    water: entity.tags.get("natural") == Some("water") || entity.tags.contains("water"),
                });
            }
            Geometry::LineString(coords) => {
                let projected = projection.project_all(coords);
                if clip_polyline(&projected, &extent).is_empty() {
                    continue;
                }
                lines.push((
                    way_stack_score(entity),
                    SceneLine {
                        id: entity.id.clone(),
                        data_key: entity.data_key(),
                        class: classifier.classify(&entity.tags, "way line stroke"),
                        points: projected,
                        style: LineStyle::of(entity),
                    },
                ));
            }
            Geometry::Point(coord) => {
                let at = projection.project(*coord);
                if !contains(&extent, at) {
                    continue;
                }
                points.push(ScenePoint {
                    id: entity.id.clone(),
                    data_key: entity.data_key(),
                    class: classifier.classify(&entity.tags, "node point"),
                    at,
                });
            }
            other => log::debug!("not drawing {} {}", other.kind().as_str(), entity.id),
        }
    }

    areas.sort_by(|a, b| b.area.total_cmp(&a.area));
    lines.sort_by_key(|(score, _)| *score);
    let lines: Vec<SceneLine> = lines.into_iter().map(|(_, line)| line).collect();

    let markers = OnewayMarkers::new(config.markers.spacing, extent).collect(entities, projection);

    let mut engine = LabelEngine::new(config.labels.clone())?;
    if config.render.measure_text {
        engine = engine.with_measurer(Box::new(FontMeasurer::new(config.theme.font_family.clone())));
    }
    let labels = engine.compute_labels(entities, projection, viewport);

    log::debug!(
        "scene: {} areas, {} lines, {} points, {} labels, {} measured widths",
        areas.len(),
        lines.len(),
        points.len(),
        labels.len(),
        engine.measured_widths()
    );

    Ok(MapScene {
        width: extent[1][0] - extent[0][0],
        height: extent[1][1] - extent[0][1],
        areas,
        lines,
        points,
        markers,
        labels,
        drawn_boxes: engine.drawn().iter().cloned().collect(),
        skipped_boxes: engine.skipped().iter().cloned().collect(),
    })
}

pub fn render_svg(scene: &MapScene, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = scene.width.max(1.0);
    let height = scene.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"oneway-marker\" viewBox=\"0 0 10 5\" refX=\"5\" refY=\"2.5\" markerWidth=\"10\" markerHeight=\"5\" orient=\"auto\" markerUnits=\"userSpaceOnUse\"><path d=\"M 5,2.5 L 0,0.5 L 0.5,2.5 L 0,4.5 Z\" fill=\"{}\"/></marker>",
        theme.oneway_color
    ));
    for label in &scene.labels.lines {
        svg.push_str(&format!(
            "<path id=\"labelpath-{}\" d=\"{}\"/>",
            escape_xml(&label.entity_id),
            label.path
        ));
    }
    svg.push_str("</defs>");

    svg.push_str("<g class=\"layer-areas\">");
    for area in &scene.areas {
        let fill = if area.water { &theme.water_color } else { &theme.area_fill };
        svg.push_str(&format!(
            "<path class=\"{}\" data-key=\"{}\" d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\" stroke-width=\"1\"/>",
            escape_xml(&area.class),
            escape_xml(&area.data_key),
            rings_to_path(&area.rings),
            fill,
            theme.area_stroke
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"layer-lines\">");
    for line in &scene.lines {
        svg.push_str(&format!(
            "<path class=\"{}\" data-key=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            escape_xml(&line.class),
            escape_xml(&line.data_key),
            points_to_path(&line.points),
            line.style.stroke(theme),
            line.style.width()
        ));
    }
    svg.push_str("</g>");

    if config.show_markers && !scene.markers.is_empty() {
        svg.push_str("<g class=\"onewaygroup\">");
        for marker in &scene.markers {
            svg.push_str(&format!(
                "<path class=\"oneway\" data-key=\"{}-{}\" d=\"{}\" fill=\"none\" stroke=\"none\" marker-mid=\"url(#oneway-marker)\"/>",
                escape_xml(&marker.id),
                marker.index,
                marker.d
            ));
        }
        svg.push_str("</g>");
    }

    svg.push_str("<g class=\"layer-points\">");
    for point in &scene.points {
        svg.push_str(&format!(
            "<circle class=\"{}\" data-key=\"{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            escape_xml(&point.class),
            escape_xml(&point.data_key),
            point.at[0],
            point.at[1],
            theme.point_fill,
            theme.point_stroke
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"layer-labels\">");
    for (group, halo) in [("halo", true), ("label", false)] {
        svg.push_str(&format!("<g class=\"labels-group {group}\">"));
        push_labels(&mut svg, &scene.labels, theme, halo);
        svg.push_str("</g>");
    }
    svg.push_str("</g>");

    if config.debug_boxes {
        svg.push_str("<g class=\"debug\">");
        for (boxes, color) in [
            (&scene.skipped_boxes, &theme.skipped_box_color),
            (&scene.drawn_boxes, &theme.drawn_box_color),
        ] {
            for bbox in boxes {
                svg.push_str(&format!(
                    "<rect class=\"debug-box\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"0.5\"/>",
                    bbox.min_x,
                    bbox.min_y,
                    bbox.width(),
                    bbox.height(),
                    color
                ));
            }
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn push_labels(svg: &mut String, labels: &LabelSet, theme: &Theme, halo: bool) {
    let paint = if halo {
        format!(
            "fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linejoin=\"round\"",
            theme.halo_color
        )
    } else {
        format!("fill=\"{}\"", theme.text_color)
    };

    for label in &labels.lines {
        svg.push_str(&format!(
            "<text class=\"pathlabel {}\" font-family=\"{}\" font-size=\"{}\" {}><textPath xlink:href=\"#labelpath-{}\" startOffset=\"{}\" text-anchor=\"middle\">{}</textPath></text>",
            escape_xml(&label.class),
            escape_xml(&theme.font_family),
            label.font_size,
            paint,
            escape_xml(&label.entity_id),
            label.start_offset,
            escape_xml(&label.text)
        ));
    }

    for label in &labels.points {
        svg.push_str(&format!(
            "<text class=\"pointlabel {}\" x=\"{:.2}\" y=\"{:.2}\" dominant-baseline=\"middle\" text-anchor=\"{}\" font-family=\"{}\" font-size=\"{}\" {}>{}</text>",
            escape_xml(&label.class),
            label.x,
            label.y,
            label.text_anchor.as_str(),
            escape_xml(&theme.font_family),
            label.font_size,
            paint,
            escape_xml(&label.text)
        ));
    }

    for label in &labels.areas {
        if let Some(text) = &label.label {
            svg.push_str(&format!(
                "<text class=\"arealabel {}\" x=\"{:.2}\" y=\"{:.2}\" dominant-baseline=\"middle\" text-anchor=\"{}\" font-family=\"{}\" font-size=\"{}\" {}>{}</text>",
                escape_xml(&label.class),
                text.x,
                text.y,
                text.text_anchor.as_str(),
                escape_xml(&theme.font_family),
                label.font_size,
                paint,
                escape_xml(&label.text)
            ));
        }
        if let (Some(transform), false) = (&label.icon_transform, halo) {
            svg.push_str(&format!(
                "<g class=\"areaicon {}\" transform=\"{}\"><circle r=\"6\" fill=\"{}\" stroke=\"{}\"/></g>",
                escape_xml(&label.class),
                transform,
                theme.point_fill,
                theme.point_stroke
            ));
        }
    }
}

fn points_to_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (idx, point) in points.iter().enumerate() {
        let cmd = if idx == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{cmd}{:.2},{:.2}", point[0], point[1]));
    }
    d
}

fn rings_to_path(rings: &[Vec<Point>]) -> String {
    rings
        .iter()
        .filter(|ring| !ring.is_empty())
        .map(|ring| format!("{}Z", points_to_path(ring)))
        .collect()
}

/// Writes rendered text to `output`, or stdout when there is none.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "Arial".to_string());
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width as f32, render_cfg.height as f32)
        .ok_or_else(|| anyhow::anyhow!("invalid output size {}x{}", render_cfg.width, render_cfg.height))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
