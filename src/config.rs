use crate::labels::stack::{default_rules, LabelRule, LabelStack};
use crate::markers::ONEWAY_SPACING;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("label stack is empty")]
    EmptyLabelStack,
    #[error("label rule {index}: {reason}")]
    InvalidRule { index: usize, reason: String },
    #[error("no display name keys configured")]
    NoNameKeys,
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("line offset {0} is outside 0..=100")]
    InvalidOffset(f64),
}

/// Placement constants for the label engine, in projected pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    /// Tried in order; the first non-empty value is the label text.
    pub name_keys: Vec<String>,
    pub label_stack: Vec<LabelRule>,
    pub node_padding: f64,
    pub marker_padding: f64,
    pub marker_padding_zoom: f64,
    pub point_offset_x: f64,
    pub point_offset_y: f64,
    pub text_padding: f64,
    pub area_min_width: f64,
    pub area_label_margin: f64,
    pub area_icons: bool,
    pub area_icon_size: f64,
    pub line_label_margin: f64,
    pub line_box_padding: f64,
    /// Positions along the line, in percent, tried in order.
    pub line_offsets: Vec<f64>,
}

pub const LINE_OFFSETS: [f64; 19] = [
    50.0, 45.0, 55.0, 40.0, 60.0, 35.0, 65.0, 30.0, 70.0, 25.0, 75.0, 20.0, 80.0, 15.0, 95.0, 10.0,
    90.0, 5.0, 95.0,
];

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            name_keys: vec!["name:zh".to_string(), "name".to_string()],
            label_stack: default_rules(),
            node_padding: 10.0,
            marker_padding: 20.0,
            marker_padding_zoom: 18.0,
            point_offset_x: 15.0,
            point_offset_y: -12.0,
            text_padding: 2.0,
            area_min_width: 20.0,
            area_label_margin: 20.0,
            area_icons: false,
            area_icon_size: 17.0,
            line_label_margin: 20.0,
            line_box_padding: 3.0,
            line_offsets: LINE_OFFSETS.to_vec(),
        }
    }
}

impl LabelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name_keys.iter().all(|key| key.is_empty()) {
            return Err(ConfigError::NoNameKeys);
        }
        LabelStack::new(self.label_stack.clone())?;
        let non_negative = [
            ("nodePadding", self.node_padding),
            ("markerPadding", self.marker_padding),
            ("textPadding", self.text_padding),
            ("areaMinWidth", self.area_min_width),
            ("areaLabelMargin", self.area_label_margin),
            ("areaIconSize", self.area_icon_size),
            ("lineLabelMargin", self.line_label_margin),
            ("lineBoxPadding", self.line_box_padding),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        for (field, value) in [
            ("markerPaddingZoom", self.marker_padding_zoom),
            ("pointOffsetX", self.point_offset_x),
            ("pointOffsetY", self.point_offset_y),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        if let Some(offset) = self
            .line_offsets
            .iter()
            .find(|offset| !(0.0..=100.0).contains(*offset))
        {
            return Err(ConfigError::InvalidOffset(*offset));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub spacing: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            spacing: ONEWAY_SPACING,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub show_markers: bool,
    /// Outline every box in the drawn and skipped indexes.
    pub debug_boxes: bool,
    /// Measure label text with the theme's system font instead of estimating.
    pub measure_text: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#F2EFE9".to_string(),
            show_markers: true,
            debug_boxes: false,
            measure_text: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub labels: LabelConfig,
    pub markers: MarkerConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::osm();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            labels: LabelConfig::default(),
            markers: MarkerConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    text_color: Option<String>,
    halo_color: Option<String>,
    area_fill: Option<String>,
    area_stroke: Option<String>,
    water_color: Option<String>,
    road_color: Option<String>,
    major_road_color: Option<String>,
    rail_color: Option<String>,
    path_color: Option<String>,
    point_fill: Option<String>,
    point_stroke: Option<String>,
    oneway_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LabelConfigFile {
    name_keys: Option<Vec<String>>,
    label_stack: Option<Vec<LabelRule>>,
    node_padding: Option<f64>,
    marker_padding: Option<f64>,
    marker_padding_zoom: Option<f64>,
    point_offset_x: Option<f64>,
    point_offset_y: Option<f64>,
    text_padding: Option<f64>,
    area_min_width: Option<f64>,
    area_label_margin: Option<f64>,
    area_icons: Option<bool>,
    area_icon_size: Option<f64>,
    line_label_margin: Option<f64>,
    line_box_padding: Option<f64>,
    line_offsets: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    show_markers: Option<bool>,
    debug_boxes: Option<bool>,
    measure_text: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    labels: Option<LabelConfigFile>,
    marker_spacing: Option<f64>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON document of overrides on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    match parsed.theme.as_deref() {
        Some("dark") => config.theme = Theme::dark(),
        Some("osm" | "default") | None => {}
        Some(other) => log::warn!("unknown theme {other:?}, keeping the default"),
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        let slots = [
            (vars.font_family, &mut theme.font_family),
            (vars.background, &mut theme.background),
            (vars.text_color, &mut theme.text_color),
            (vars.halo_color, &mut theme.halo_color),
            (vars.area_fill, &mut theme.area_fill),
            (vars.area_stroke, &mut theme.area_stroke),
            (vars.water_color, &mut theme.water_color),
            (vars.road_color, &mut theme.road_color),
            (vars.major_road_color, &mut theme.major_road_color),
            (vars.rail_color, &mut theme.rail_color),
            (vars.path_color, &mut theme.path_color),
            (vars.point_fill, &mut theme.point_fill),
            (vars.point_stroke, &mut theme.point_stroke),
            (vars.oneway_color, &mut theme.oneway_color),
        ];
        for (value, slot) in slots {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
    config.render.background = config.theme.background.clone();

    if let Some(labels) = parsed.labels {
        let target = &mut config.labels;
        if let Some(v) = labels.name_keys {
            target.name_keys = v;
        }
        if let Some(v) = labels.label_stack {
            target.label_stack = v;
        }
        if let Some(v) = labels.area_icons {
            target.area_icons = v;
        }
        if let Some(v) = labels.line_offsets {
            target.line_offsets = v;
        }
        let numbers = [
            (labels.node_padding, &mut target.node_padding),
            (labels.marker_padding, &mut target.marker_padding),
            (labels.marker_padding_zoom, &mut target.marker_padding_zoom),
            (labels.point_offset_x, &mut target.point_offset_x),
            (labels.point_offset_y, &mut target.point_offset_y),
            (labels.text_padding, &mut target.text_padding),
            (labels.area_min_width, &mut target.area_min_width),
            (labels.area_label_margin, &mut target.area_label_margin),
            (labels.area_icon_size, &mut target.area_icon_size),
            (labels.line_label_margin, &mut target.line_label_margin),
            (labels.line_box_padding, &mut target.line_box_padding),
        ];
        for (value, slot) in numbers {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }

    if let Some(v) = parsed.marker_spacing {
        config.markers.spacing = v;
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.show_markers {
            config.render.show_markers = v;
        }
        if let Some(v) = render.debug_boxes {
            config.render.debug_boxes = v;
        }
        if let Some(v) = render.measure_text {
            config.render.measure_text = v;
        }
    }

    config.labels.validate()?;
    Ok(config)
}
