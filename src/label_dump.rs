use crate::labels::index::BBox;
use crate::labels::LabelSet;
use crate::markers::MarkerSegment;
use crate::render::MapScene;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub width: f64,
    pub height: f64,
    pub labels: LabelSet,
    pub markers: Vec<MarkerSegment>,
    pub features: Vec<FeatureDump>,
    pub drawn: IndexDump,
    pub skipped: IndexDump,
}

#[derive(Debug, Serialize)]
pub struct FeatureDump {
    pub id: String,
    pub kind: &'static str,
    pub class: String,
}

#[derive(Debug, Serialize)]
pub struct IndexDump {
    pub count: usize,
    pub boxes: Vec<BBox>,
}

impl IndexDump {
    fn from_boxes(boxes: &[BBox]) -> Self {
        Self {
            count: boxes.len(),
            boxes: boxes.to_vec(),
        }
    }
}

impl LabelDump {
    pub fn from_scene(scene: &MapScene) -> Self {
        let areas = scene.areas.iter().map(|a| FeatureDump {
            id: a.id.clone(),
            kind: "area",
            class: a.class.clone(),
        });
        let lines = scene.lines.iter().map(|l| FeatureDump {
            id: l.id.clone(),
            kind: "line",
            class: l.class.clone(),
        });
        let points = scene.points.iter().map(|p| FeatureDump {
            id: p.id.clone(),
            kind: "point",
            class: p.class.clone(),
        });
        Self {
            width: scene.width,
            height: scene.height,
            labels: scene.labels.clone(),
            markers: scene.markers.clone(),
            features: areas.chain(lines).chain(points).collect(),
            drawn: IndexDump::from_boxes(&scene.drawn_boxes),
            skipped: IndexDump::from_boxes(&scene.skipped_boxes),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_label_dump(path: &Path, scene: &MapScene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LabelDump::from_scene(scene))?;
    Ok(())
}
