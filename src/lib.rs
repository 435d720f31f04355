#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod entity;
pub mod geo;
pub mod label_dump;
pub mod labels;
pub mod markers;
pub mod projection;
pub mod render;
pub mod tags;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

pub use config::{Config, ConfigError, LabelConfig};
pub use entity::{parse_geojson, Entity, Geometry, GeometryKind, Tags};
pub use labels::{LabelEngine, LabelSet, Viewport};
pub use markers::{generate_marker_segments, MarkerGenerator, MarkerSegment};
pub use projection::{Identity, Projection, WebMercator};
pub use tags::TagClassifier;

use geo::{path_bounds, Point};
use label_dump::LabelDump;
use render::{build_scene, render_svg, MapScene};

/// How input coordinates map onto the output viewport.
#[derive(Debug, Clone)]
pub struct MapView {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    /// `[lon, lat]` at the middle of the viewport. Defaults to the center of
    /// the input's bounds.
    pub center: Option<Point>,
    /// Coordinates are already layer pixels.
    pub projected: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            zoom: 17.0,
            center: None,
            projected: false,
        }
    }
}

impl MapView {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height, self.zoom)
    }

    pub fn projection(&self, entities: &[Entity]) -> Box<dyn Projection> {
        if self.projected {
            return Box::new(Identity);
        }
        let center = self.center.unwrap_or_else(|| {
            let positions: Vec<Point> = entities.iter().flat_map(|e| e.geometry.positions()).collect();
            path_bounds(&positions)
                .map(|[min, max]| [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0])
                .unwrap_or([0.0, 0.0])
        });
        Box::new(WebMercator::centered(self.zoom, center, self.width, self.height))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub config: Config,
    pub view: MapView,
}

pub fn scene_from_geojson(input: &str, options: &RenderOptions) -> anyhow::Result<MapScene> {
    let entities = parse_geojson(input)?;
    let projection = options.view.projection(&entities);
    let scene = build_scene(&entities, projection.as_ref(), &options.view.viewport(), &options.config)?;
    Ok(scene)
}

pub fn render_geojson(input: &str, options: &RenderOptions) -> anyhow::Result<String> {
    let scene = scene_from_geojson(input, options)?;
    Ok(render_svg(&scene, &options.config.theme, &options.config.render))
}

pub fn label_geojson(input: &str, options: &RenderOptions) -> anyhow::Result<LabelDump> {
    let scene = scene_from_geojson(input, options)?;
    Ok(LabelDump::from_scene(&scene))
}
