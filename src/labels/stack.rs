//! Priority table deciding which entities get a label and at what size.

use crate::config::ConfigError;
use crate::entity::{Entity, GeometryKind};
use serde::{Deserialize, Serialize};

pub const LINE_FONT_SIZE: f64 = 12.0;
pub const POINT_FONT_SIZE: f64 = 10.0;

/// Value side of a rule. Serialized as the tag value, with `"*"` for any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagMatch {
    Any,
    Value(String),
}

impl TagMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Value(expected) => expected == value,
        }
    }
}

impl From<String> for TagMatch {
    fn from(value: String) -> Self {
        if value == "*" {
            Self::Any
        } else {
            Self::Value(value)
        }
    }
}

impl From<TagMatch> for String {
    fn from(value: TagMatch) -> Self {
        match value {
            TagMatch::Any => "*".to_string(),
            TagMatch::Value(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRule {
    pub geometry: GeometryKind,
    pub key: String,
    pub value: TagMatch,
    pub font_size: f64,
}

impl LabelRule {
    pub fn new(geometry: GeometryKind, key: &str, value: TagMatch, font_size: f64) -> Self {
        Self {
            geometry,
            key: key.to_string(),
            value,
            font_size,
        }
    }

    /// Geometry kind agrees and the tag is present (any non-empty value,
    /// `"no"` included) and matches.
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.kind() == self.geometry
            && entity
                .tags
                .get(&self.key)
                .is_some_and(|value| self.value.matches(value))
    }
}

pub fn default_rules() -> Vec<LabelRule> {
    use GeometryKind::{LineString, Point, Polygon};
    let value = |v: &str| TagMatch::Value(v.to_string());

    let mut rules = vec![LabelRule::new(LineString, "aeroway", TagMatch::Any, LINE_FONT_SIZE)];
    for road in ["motorway", "trunk", "primary", "secondary", "tertiary"] {
        rules.push(LabelRule::new(LineString, "highway", value(road), LINE_FONT_SIZE));
    }
    for key in ["highway", "railway", "waterway"] {
        rules.push(LabelRule::new(LineString, key, TagMatch::Any, LINE_FONT_SIZE));
    }

    const FEATURE_KEYS: [&str; 10] = [
        "aeroway",
        "amenity",
        "building",
        "historic",
        "leisure",
        "man_made",
        "natural",
        "shop",
        "tourism",
        "camp_site",
    ];
    for (kind, size) in [(Polygon, LINE_FONT_SIZE), (Point, POINT_FONT_SIZE)] {
        for key in FEATURE_KEYS {
            rules.push(LabelRule::new(kind, key, TagMatch::Any, size));
        }
    }

    for key in ["ref", "name"] {
        rules.push(LabelRule::new(LineString, key, TagMatch::Any, LINE_FONT_SIZE));
        rules.push(LabelRule::new(Polygon, key, TagMatch::Any, LINE_FONT_SIZE));
        rules.push(LabelRule::new(Point, key, TagMatch::Any, POINT_FONT_SIZE));
    }
    rules
}

#[derive(Debug, Clone)]
pub struct LabelStack {
    rules: Vec<LabelRule>,
}

impl Default for LabelStack {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl LabelStack {
    pub fn new(rules: Vec<LabelRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::EmptyLabelStack);
        }
        for (index, rule) in rules.iter().enumerate() {
            if !matches!(
                rule.geometry,
                GeometryKind::Point | GeometryKind::LineString | GeometryKind::Polygon
            ) {
                return Err(ConfigError::InvalidRule {
                    index,
                    reason: format!("{} geometry is never labelled", rule.geometry.as_str()),
                });
            }
            if rule.key.is_empty() || rule.key.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidRule {
                    index,
                    reason: format!("invalid tag key {:?}", rule.key),
                });
            }
            if matches!(&rule.value, TagMatch::Value(v) if v.is_empty()) {
                return Err(ConfigError::InvalidRule {
                    index,
                    reason: "empty tag value".to_string(),
                });
            }
            if !rule.font_size.is_finite() || rule.font_size <= 0.0 {
                return Err(ConfigError::InvalidRule {
                    index,
                    reason: format!("font size {} must be positive", rule.font_size),
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the first rule that accepts `entity`.
    pub fn bucket_of(&self, entity: &Entity) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(entity))
    }
}
