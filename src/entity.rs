//! Map entities and the GeoJSON boundary that produces them.

use crate::geo::Point;
use crate::tags::is_interesting_tag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tag value that marks a key as explicitly absent (`bridge=no`).
pub const NO: &str = "no";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Point" => Some(Self::Point),
            "LineString" => Some(Self::LineString),
            "Polygon" => Some(Self::Polygon),
            "MultiPoint" => Some(Self::MultiPoint),
            "MultiLineString" => Some(Self::MultiLineString),
            "MultiPolygon" => Some(Self::MultiPolygon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    Polygon(Vec<Vec<Point>>),
    MultiPoint(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    MultiPolygon(Vec<Vec<Vec<Point>>>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
            Self::MultiPoint(_) => GeometryKind::MultiPoint,
            Self::MultiLineString(_) => GeometryKind::MultiLineString,
            Self::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Every vertex of the geometry, in document order.
    pub fn positions(&self) -> Vec<Point> {
        match self {
            Self::Point(point) => vec![*point],
            Self::LineString(points) | Self::MultiPoint(points) => points.clone(),
            Self::Polygon(rings) | Self::MultiLineString(rings) => rings.concat(),
            Self::MultiPolygon(polygons) => polygons.iter().flat_map(|rings| rings.concat()).collect(),
        }
    }
}

/// Ordered tag bag. Scan order matters to surface inference, so insertion
/// order is kept rather than sorting keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an earlier value in place. Empty values are
    /// treated as unset and dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.entries.retain(|(k, _)| *k != key);
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Tags::get`], but a value of `"no"` also counts as absent.
    pub fn active(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| *value != NO)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds tags from GeoJSON `properties`, keeping scalar members only.
    /// Bookkeeping keys (`source`, `created_by`, `tiger:*`, ...) are dropped.
    pub fn from_properties(properties: &serde_json::Map<String, Value>) -> Self {
        let mut tags = Self::new();
        for (key, value) in properties {
            if !is_interesting_tag(key) {
                continue;
            }
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => continue,
            };
            tags.insert(key.clone(), text);
        }
        tags
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub geometry: Geometry,
    pub tags: Tags,
    pub version: Option<u64>,
}

impl Entity {
    pub fn new(id: impl Into<String>, geometry: Geometry, tags: Tags) -> Self {
        Self {
            id: id.into(),
            geometry,
            tags,
            version: None,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    /// Identity for keyed joins: changes whenever the entity is re-versioned.
    pub fn data_key(&self) -> String {
        format!("{}v{}", self.id, self.version.unwrap_or(0))
    }

    /// First non-empty value among `name_keys`.
    pub fn display_name<S: AsRef<str>>(&self, name_keys: &[S]) -> Option<&str> {
        name_keys
            .iter()
            .find_map(|key| self.tags.get(key.as_ref()))
    }
}

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a GeoJSON FeatureCollection or Feature, found {0}")]
    NotFeatures(String),
    #[error("feature {id}: {reason}")]
    Feature { id: String, reason: String },
}

/// Parses a GeoJSON `FeatureCollection` (or a single `Feature`).
///
/// Features without a usable geometry are skipped and logged rather than
/// failing the whole document.
pub fn parse_geojson(input: &str) -> Result<Vec<Entity>, EntityError> {
    let document: Value = serde_json::from_str(input)?;
    let features = match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => document
            .get("features")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        Some("Feature") => vec![document],
        other => return Err(EntityError::NotFeatures(other.unwrap_or("nothing").to_string())),
    };

    let mut entities = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        match parse_feature(feature, idx) {
            Ok(entity) => entities.push(entity),
            Err(err) => log::warn!("skipping feature: {err}"),
        }
    }
    log::debug!("parsed {} of {} features", entities.len(), features.len());
    Ok(entities)
}

fn parse_feature(feature: &Value, idx: usize) -> Result<Entity, EntityError> {
    let empty = serde_json::Map::new();
    let properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let id = feature
        .get("id")
        .or_else(|| properties.get("id"))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("f{idx}"));
    let fail = |reason: &str| EntityError::Feature {
        id: id.clone(),
        reason: reason.to_string(),
    };

    let geometry = feature
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or_else(|| fail("missing geometry"))?;
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .and_then(GeometryKind::from_token)
        .ok_or_else(|| fail("unsupported geometry type"))?;
    let coords = geometry
        .get("coordinates")
        .ok_or_else(|| fail("missing coordinates"))?;
    let geometry = parse_geometry(kind, coords).ok_or_else(|| fail("malformed coordinates"))?;

    let version = properties
        .get("version")
        .and_then(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

    Ok(Entity {
        id,
        geometry,
        tags: Tags::from_properties(properties),
        version,
    })
}

fn parse_geometry(kind: GeometryKind, coords: &Value) -> Option<Geometry> {
    Some(match kind {
        GeometryKind::Point => Geometry::Point(position(coords)?),
        GeometryKind::LineString => Geometry::LineString(positions(coords)?),
        GeometryKind::MultiPoint => Geometry::MultiPoint(positions(coords)?),
        GeometryKind::Polygon => Geometry::Polygon(rings(coords)?),
        GeometryKind::MultiLineString => Geometry::MultiLineString(rings(coords)?),
        GeometryKind::MultiPolygon => Geometry::MultiPolygon(
            coords
                .as_array()?
                .iter()
                .map(rings)
                .collect::<Option<Vec<_>>>()?,
        ),
    })
}

// Extra dimensions (elevation) are ignored.
fn position(value: &Value) -> Option<Point> {
    let array = value.as_array()?;
    let x = array.first()?.as_f64()?;
    let y = array.get(1)?.as_f64()?;
    Some([x, y])
}

fn positions(value: &Value) -> Option<Vec<Point>> {
    value.as_array()?.iter().map(position).collect()
}

fn rings(value: &Value) -> Option<Vec<Vec<Point>>> {
    value.as_array()?.iter().map(positions).collect()
}
