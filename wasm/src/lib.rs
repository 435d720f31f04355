use map_labels::config::parse_config;
use map_labels::{MapView, RenderOptions, Tags, TagClassifier, label_geojson, render_geojson};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapRenderOptions {
    width: Option<f64>,
    height: Option<f64>,
    zoom: Option<f64>,
    center: Option<[f64; 2]>,
    projected: Option<bool>,
    /// Same shape as the CLI's config file.
    config: Option<serde_json::Value>,
}

fn build_render_options(options: MapRenderOptions) -> Result<RenderOptions, String> {
    let config = match options.config {
        Some(value) => parse_config(&value.to_string()).map_err(|error| error.to_string())?,
        None => Default::default(),
    };
    let mut view = MapView {
        width: config.render.width,
        height: config.render.height,
        ..Default::default()
    };
    if let Some(width) = options.width {
        view.width = width;
    }
    if let Some(height) = options.height {
        view.height = height;
    }
    if let Some(zoom) = options.zoom {
        view.zoom = zoom;
    }
    view.center = options.center;
    view.projected = options.projected.unwrap_or(false);
    Ok(RenderOptions { config, view })
}

fn parse_options(options_json: Option<String>) -> Result<RenderOptions, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<MapRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        MapRenderOptions::default()
    };
    build_render_options(options).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn render_map_svg(geojson: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    render_geojson(geojson, &options).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn compute_labels_json(geojson: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    label_geojson(geojson, &options)
        .and_then(|dump| dump.to_json())
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Class string for a JSON object of OSM tags.
#[wasm_bindgen]
pub fn classify_tags(tags_json: &str, base: &str) -> Result<String, JsValue> {
    let properties: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(tags_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let tags = Tags::from_properties(&properties);
    Ok(TagClassifier::default().classify(&tags, base))
}
