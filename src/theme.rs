use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub text_color: String,
    pub halo_color: String,
    pub area_fill: String,
    pub area_stroke: String,
    pub water_color: String,
    pub road_color: String,
    pub major_road_color: String,
    pub rail_color: String,
    pub path_color: String,
    pub point_fill: String,
    pub point_stroke: String,
    pub oneway_color: String,
    pub drawn_box_color: String,
    pub skipped_box_color: String,
}

impl Theme {
    pub fn osm() -> Self {
        Self {
            font_family: "Arial, \"Helvetica Neue\", Helvetica, sans-serif".to_string(),
            background: "#F2EFE9".to_string(),
            text_color: "#333333".to_string(),
            halo_color: "rgba(255,255,255,0.75)".to_string(),
            area_fill: "rgba(170,170,170,0.3)".to_string(),
            area_stroke: "#AAAAAA".to_string(),
            water_color: "#77D3DE".to_string(),
            road_color: "#FFFFFF".to_string(),
            major_road_color: "#F99806".to_string(),
            rail_color: "#555555".to_string(),
            path_color: "#998888".to_string(),
            point_fill: "#FFFFFF".to_string(),
            point_stroke: "#444444".to_string(),
            oneway_color: "#000000".to_string(),
            drawn_box_color: "#00B000".to_string(),
            skipped_box_color: "#D00000".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#1E2127".to_string(),
            text_color: "#E6E6E6".to_string(),
            halo_color: "rgba(0,0,0,0.7)".to_string(),
            area_fill: "rgba(90,100,120,0.35)".to_string(),
            area_stroke: "#5A6478".to_string(),
            water_color: "#2C5D7A".to_string(),
            road_color: "#8A8F99".to_string(),
            major_road_color: "#C8902E".to_string(),
            rail_color: "#B0B0B0".to_string(),
            path_color: "#7A6F6F".to_string(),
            point_fill: "#2B2F36".to_string(),
            point_stroke: "#D0D0D0".to_string(),
            oneway_color: "#E6E6E6".to_string(),
            drawn_box_color: "#3DDC84".to_string(),
            skipped_box_color: "#FF6B6B".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::osm()
    }
}
