//! Resolves a tag bag into the class string used to style a feature.
//!
//! The output is a space-joined list in a fixed order: caller base classes,
//! the primary tag, at most one lifecycle status, every secondary tag, an
//! inferred surface for roads and runways, and a wikidata marker.

use super::vocabulary::{
    remove_lifecycle_prefix, table_lookup, LifecycleStatus, PATH_HIGHWAY_VALUES, PAVED_TAGS, PRIMARY_KEYS, SECONDARY_KEYS,
    SEMIPAVED_TAGS, WIKIDATA_KEYS,
};
use crate::entity::{Tags, NO};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static STROKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bstroke\b").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagTableError {
    #[error("{list} table is empty")]
    Empty { list: &'static str },
    #[error("{list} table has an invalid key {key:?}")]
    InvalidKey { list: &'static str, key: String },
    #[error("{list} table lists {key:?} twice")]
    DuplicateKey { list: &'static str, key: String },
}

/// Lookup tables driving [`TagClassifier`]. Order is significant in every
/// list: the first matching primary wins and statuses are tried in order.
#[derive(Debug, Clone)]
pub struct TagClassTable {
    pub primaries: Vec<String>,
    pub secondaries: Vec<String>,
    pub statuses: Vec<LifecycleStatus>,
    pub path_highway_values: Vec<String>,
    pub paved: Vec<(String, Vec<String>)>,
    pub semipaved: Vec<(String, Vec<String>)>,
    pub wikidata_keys: Vec<String>,
}

impl Default for TagClassTable {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|value| value.to_string()).collect()
        }
        fn owned_table(table: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
            table
                .iter()
                .map(|(key, values)| (key.to_string(), owned(values)))
                .collect()
        }
        Self {
            primaries: owned(&PRIMARY_KEYS),
            secondaries: owned(&SECONDARY_KEYS),
            statuses: LifecycleStatus::ALL.to_vec(),
            path_highway_values: owned(&PATH_HIGHWAY_VALUES),
            paved: owned_table(&PAVED_TAGS),
            semipaved: owned_table(&SEMIPAVED_TAGS),
            wikidata_keys: owned(&WIKIDATA_KEYS),
        }
    }
}

impl TagClassTable {
    pub fn validate(&self) -> Result<(), TagTableError> {
        check_keys("primary", &self.primaries, true)?;
        check_keys("secondary", &self.secondaries, false)?;
        check_keys("wikidata", &self.wikidata_keys, false)?;
        let paved_keys: Vec<String> = self.paved.iter().map(|(k, _)| k.clone()).collect();
        check_keys("paved", &paved_keys, false)?;
        let semipaved_keys: Vec<String> = self.semipaved.iter().map(|(k, _)| k.clone()).collect();
        check_keys("semipaved", &semipaved_keys, false)?;
        for (idx, status) in self.statuses.iter().enumerate() {
            if self.statuses[..idx].contains(status) {
                return Err(TagTableError::DuplicateKey {
                    list: "status",
                    key: status.as_str().to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_keys(list: &'static str, keys: &[String], required: bool) -> Result<(), TagTableError> {
    if required && keys.is_empty() {
        return Err(TagTableError::Empty { list });
    }
    for (idx, key) in keys.iter().enumerate() {
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(TagTableError::InvalidKey {
                list,
                key: key.clone(),
            });
        }
        if keys[..idx].contains(key) {
            return Err(TagTableError::DuplicateKey {
                list,
                key: key.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct PrimaryKey {
    key: String,
    // `piste:type` -> `piste_type`, keeps ':' out of class names
    token: String,
}

#[derive(Debug, Clone)]
pub struct TagClassifier {
    primaries: Vec<PrimaryKey>,
    table: TagClassTable,
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self::from_valid(TagClassTable::default())
    }
}

impl TagClassifier {
    pub fn new(table: TagClassTable) -> Result<Self, TagTableError> {
        table.validate()?;
        Ok(Self::from_valid(table))
    }

    fn from_valid(table: TagClassTable) -> Self {
        let primaries = table
            .primaries
            .iter()
            .map(|key| PrimaryKey {
                key: key.clone(),
                token: key.replace(':', "_"),
            })
            .collect();
        Self { primaries, table }
    }

    pub fn table(&self) -> &TagClassTable {
        &self.table
    }

    /// Class string for `tags`, keeping the non-`tag-` tokens of `base`.
    ///
    /// When `base` contains `stroke` and the feature carries a barrier, the
    /// `line`/`area` base tokens are both rendered as `line`.
    pub fn classify(&self, tags: &Tags, base: &str) -> String {
        let override_line = STROKE_RE.is_match(base) && tags.active("barrier").is_some();
        let mut classes: Vec<String> = base
            .split_whitespace()
            .filter(|class| !class.starts_with("tag-"))
            .map(|class| {
                if override_line && (class == "line" || class == "area") {
                    "line".to_string()
                } else {
                    class.to_string()
                }
            })
            .collect();

        let mut primary: Option<&str> = None;
        let mut status: Option<LifecycleStatus> = None;

        for entry in &self.primaries {
            let Some(value) = tags.active(&entry.key) else {
                continue;
            };
            primary = Some(entry.token.as_str());
            classes.push(format!("tag-{}", entry.token));
            match self.status_for_value(value) {
                // e.g. `railway=abandoned`
                Some(found) => status = Some(found),
                None => classes.push(format!("tag-{}-{}", entry.token, value)),
            }
            break;
        }

        // e.g. `demolished:building=yes`; the status latest in the table wins
        if primary.is_none() {
            status = tags
                .iter()
                .filter(|(_, value)| *value != NO)
                .filter_map(|(key, _)| {
                    let base = remove_lifecycle_prefix(key);
                    if base.len() == key.len() || !self.primaries.iter().any(|entry| entry.key == base) {
                        return None;
                    }
                    let prefix = &key[..key.len() - base.len() - 1];
                    self.table
                        .statuses
                        .iter()
                        .position(|candidate| candidate.as_str() == prefix)
                })
                .max()
                .map(|idx| self.table.statuses[idx]);
        }

        // at most one bare status, and only when it relates to the primary
        if status.is_none() {
            for candidate in &self.table.statuses {
                let Some(value) = tags.active(candidate.as_str()) else {
                    continue;
                };
                if value == "yes" {
                    // e.g. `railway=rail + abandoned=yes`
                    status = Some(*candidate);
                } else if primary.is_some_and(|p| p == value) {
                    // e.g. `railway=rail + abandoned=railway`
                    status = Some(*candidate);
                } else if primary.is_none() {
                    // e.g. `abandoned=railway`
                    if let Some(entry) = self.primaries.iter().find(|entry| entry.key == value) {
                        status = Some(*candidate);
                        primary = Some(entry.token.as_str());
                        classes.push(format!("tag-{}", entry.token));
                    }
                }
                if status.is_some() {
                    break;
                }
            }
        }

        if let Some(status) = status {
            classes.push("tag-status".to_string());
            classes.push(format!("tag-status-{}", status.as_str()));
        }

        for key in &self.table.secondaries {
            let Some(value) = tags.active(key) else {
                continue;
            };
            if primary == Some(key.as_str()) {
                continue;
            }
            classes.push(format!("tag-{key}"));
            classes.push(format!("tag-{key}-{value}"));
        }

        if let Some(surface) = self.surface(tags, primary) {
            classes.push(format!("tag-{surface}"));
        }

        if self.table.wikidata_keys.iter().any(|key| tags.contains(key)) {
            classes.push("tag-wikidata".to_string());
        }

        classes.join(" ").trim().to_string()
    }

    fn status_for_value(&self, value: &str) -> Option<LifecycleStatus> {
        LifecycleStatus::from_token(value).filter(|status| self.table.statuses.contains(status))
    }

    fn surface(&self, tags: &Tags, primary: Option<&str>) -> Option<&'static str> {
        let highway = tags.get("highway");
        let is_road = primary == Some("highway")
            && !highway.is_some_and(|value| {
                self.table.path_highway_values.iter().any(|path| path == value)
            });
        if !is_road && primary != Some("aeroway") {
            return None;
        }

        let mut surface = if highway == Some("track") {
            "unpaved"
        } else {
            "paved"
        };
        for (key, value) in tags.iter() {
            if let Some(values) = table_lookup(&self.table.paved, key) {
                surface = if values.iter().any(|v| v == value) {
                    "paved"
                } else {
                    "unpaved"
                };
            }
            if table_lookup(&self.table.semipaved, key).is_some_and(|values| values.iter().any(|v| v == value)) {
                surface = "semipaved";
            }
        }
        Some(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(pairs: &[(&str, &str)]) -> String {
        let tags: Tags = pairs.iter().copied().collect();
        TagClassifier::default().classify(&tags, "")
    }

    fn tokens(classes: &str) -> Vec<&str> {
        classes.split(' ').collect()
    }

    #[test]
    fn first_primary_wins() {
        let out = classify(&[("railway", "rail"), ("highway", "motorway")]);
        let tokens = tokens(&out);
        assert!(tokens.contains(&"tag-highway"));
        assert!(tokens.contains(&"tag-highway-motorway"));
        assert!(!tokens.contains(&"tag-railway"));
    }

    #[test]
    fn lifecycle_value_becomes_status() {
        let out = classify(&[("railway", "abandoned")]);
        assert_eq!(out, "tag-railway tag-status tag-status-abandoned");
    }

    #[test]
    fn colon_keys_are_rewritten() {
        assert_eq!(
            classify(&[("piste:type", "nordic")]),
            "tag-piste_type tag-piste_type-nordic"
        );
        assert_eq!(
            classify(&[("building:part", "yes")]),
            "tag-building_part tag-building_part-yes"
        );
    }

    #[test]
    fn no_valued_primary_is_skipped() {
        assert_eq!(
            classify(&[("building", "no"), ("amenity", "cafe")]),
            "tag-amenity tag-amenity-cafe"
        );
    }

    #[test]
    fn compound_status_key_without_primary() {
        assert_eq!(
            classify(&[("demolished:building", "yes")]),
            "tag-status tag-status-demolished"
        );
        // later statuses in lifecycle order override earlier ones
        assert_eq!(
            classify(&[("demolished:building", "yes"), ("proposed:highway", "primary")]),
            "tag-status tag-status-demolished"
        );
        assert_eq!(
            classify(&[("abandoned:railway", "rail"), ("planned:highway", "primary")]),
            "tag-status tag-status-abandoned"
        );
        assert_eq!(
            classify(&[("disused:piste:type", "downhill")]),
            "tag-status tag-status-disused"
        );
    }

    #[test]
    fn compound_status_needs_known_primary_and_active_value() {
        assert_eq!(classify(&[("disused:shop", "yes")]), "");
        assert_eq!(classify(&[("disused:railway", "no")]), "");
        assert_eq!(classify(&[("historic:railway", "rail")]), "");
    }

    #[test]
    fn bare_status_yes_or_matching_primary() {
        assert_eq!(
            classify(&[("railway", "rail"), ("abandoned", "yes")]),
            "tag-railway tag-railway-rail tag-status tag-status-abandoned"
        );
        assert_eq!(
            classify(&[("railway", "rail"), ("disused", "railway")]),
            "tag-railway tag-railway-rail tag-status tag-status-disused"
        );
        // unrelated status value is ignored
        assert_eq!(
            classify(&[("highway", "path"), ("abandoned", "railway")]),
            "tag-highway tag-highway-path"
        );
    }

    #[test]
    fn bare_status_naming_primary_defines_it() {
        assert_eq!(
            classify(&[("abandoned", "railway")]),
            "tag-railway tag-status tag-status-abandoned"
        );
    }

    #[test]
    fn secondaries_emit_all_in_list_order() {
        let out = classify(&[
            ("highway", "footway"),
            ("tunnel", "yes"),
            ("bridge", "no"),
            ("footway", "sidewalk"),
            ("oneway", "yes"),
        ]);
        assert_eq!(
            out,
            "tag-highway tag-highway-footway tag-oneway tag-oneway-yes tag-tunnel tag-tunnel-yes \
             tag-footway tag-footway-sidewalk"
        );
        assert!(!out.contains("tag-bridge"));
    }

    #[test]
    fn secondary_equal_to_primary_is_not_repeated() {
        let out = classify(&[("leisure", "park"), ("man_made", "tower")]);
        assert_eq!(out, "tag-leisure tag-leisure-park tag-man_made tag-man_made-tower");
    }

    #[test]
    fn surface_inference() {
        assert!(tokens(&classify(&[("highway", "track")])).contains(&"tag-unpaved"));
        assert!(
            tokens(&classify(&[("highway", "residential"), ("surface", "asphalt")]))
                .contains(&"tag-paved")
        );
        assert!(
            tokens(&classify(&[("highway", "residential"), ("surface", "gravel")]))
                .contains(&"tag-unpaved")
        );
        assert!(
            tokens(&classify(&[("highway", "residential"), ("surface", "sett")]))
                .contains(&"tag-semipaved")
        );
        assert!(tokens(&classify(&[("aeroway", "runway")])).contains(&"tag-paved"));
        // paths never get a surface class
        let path = classify(&[("highway", "cycleway"), ("surface", "asphalt")]);
        assert!(!path.contains("paved"));
    }

    #[test]
    fn surface_last_match_wins() {
        let out = classify(&[
            ("highway", "track"),
            ("surface", "sett"),
            ("tracktype", "grade1"),
        ]);
        assert!(out.ends_with("tag-paved"));
        let out = classify(&[
            ("highway", "track"),
            ("tracktype", "grade1"),
            ("surface", "sett"),
        ]);
        assert!(out.ends_with("tag-semipaved"));
    }

    #[test]
    fn wikidata_marker_comes_last() {
        let out = classify(&[("amenity", "bank"), ("brand:wikidata", "Q123")]);
        assert_eq!(out, "tag-amenity tag-amenity-bank tag-wikidata");
    }

    #[test]
    fn base_classes_preserved_and_overridden() {
        let tags: Tags = [("barrier", "fence"), ("landuse", "farmland")]
            .into_iter()
            .collect();
        let classifier = TagClassifier::default();
        assert_eq!(
            classifier.classify(&tags, " way area stroke tag-old "),
            "way line stroke tag-landuse tag-landuse-farmland tag-barrier tag-barrier-fence"
        );
        assert_eq!(
            classifier.classify(&tags, "way area fill"),
            "way area fill tag-landuse tag-landuse-farmland tag-barrier tag-barrier-fence"
        );
        // `stroked` is not the word `stroke`
        assert!(classifier.classify(&tags, "area stroked").starts_with("area stroked"));
    }

    #[test]
    fn empty_tags_yield_base_only() {
        let classifier = TagClassifier::default();
        assert_eq!(classifier.classify(&Tags::new(), "node point"), "node point");
        assert_eq!(classifier.classify(&Tags::new(), ""), "");
    }

    #[test]
    fn table_validation_rejects_bad_keys() {
        let mut table = TagClassTable::default();
        table.primaries.push("highway".to_string());
        assert_eq!(
            TagClassifier::new(table).unwrap_err(),
            TagTableError::DuplicateKey {
                list: "primary",
                key: "highway".to_string()
            }
        );

        let mut table = TagClassTable::default();
        table.secondaries.push("two words".to_string());
        assert!(matches!(
            TagClassifier::new(table),
            Err(TagTableError::InvalidKey { .. })
        ));

        let table = TagClassTable {
            primaries: Vec::new(),
            ..TagClassTable::default()
        };
        assert_eq!(
            TagClassifier::new(table).unwrap_err(),
            TagTableError::Empty { list: "primary" }
        );
    }

    #[test]
    fn custom_table_changes_precedence() {
        let table = TagClassTable {
            primaries: vec!["railway".to_string(), "highway".to_string()],
            ..TagClassTable::default()
        };
        let classifier = TagClassifier::new(table).unwrap();
        let tags: Tags = [("highway", "motorway"), ("railway", "rail")].into_iter().collect();
        assert!(classifier.classify(&tags, "").starts_with("tag-railway tag-railway-rail"));
    }
}
