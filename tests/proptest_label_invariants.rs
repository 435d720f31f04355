//! Property-based invariant tests for label placement and tag classification.
//!
//! 1. Committed label boxes never touch a box of another entity.
//! 2. A second pass over the same input yields the same labels.
//! 3. At most one label per entity.
//! 4. Collision-checked inserts into a bare index never overlap.
//! 5. Classification is deterministic and never emits a `-no` token.

use map_labels::labels::index::{BBox, LabelIndex};
use map_labels::{Entity, Geometry, Identity, LabelConfig, LabelEngine, Tags, TagClassifier, Viewport};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn entity_strategy(idx: usize) -> impl Strategy<Value = Entity> {
    (0.0f64..600.0, 0.0f64..400.0, 0u8..3, 1usize..12, 20.0f64..400.0, -1.0f64..1.0).prop_map(
        move |(x, y, kind, name_len, span, slope)| {
            let name = "a".repeat(name_len);
            let id = format!("e{idx}");
            match kind {
                0 => Entity::new(
                    id,
                    Geometry::Point([x, y]),
                    [("amenity", "cafe"), ("name", name.as_str())].into_iter().collect(),
                ),
                1 => Entity::new(
                    id,
                    Geometry::LineString(vec![[x, y], [x + span, y + slope * span]]),
                    [("highway", "primary"), ("name", name.as_str())].into_iter().collect(),
                ),
                _ => {
                    let size = span / 2.0;
                    let ring = vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]];
                    Entity::new(
                        id,
                        Geometry::Polygon(vec![ring]),
                        [("building", "yes"), ("name", name.as_str())].into_iter().collect(),
                    )
                }
            }
        },
    )
}

fn entities_strategy() -> impl Strategy<Value = Vec<Entity>> {
    (1usize..40).prop_flat_map(|count| (0..count).map(entity_strategy).collect::<Vec<_>>())
}

fn tags_strategy() -> impl Strategy<Value = Tags> {
    let keys = prop_oneof![
        Just("highway"),
        Just("railway"),
        Just("building"),
        Just("abandoned"),
        Just("disused:railway"),
        Just("bridge"),
        Just("surface"),
        Just("tracktype"),
        Just("wikidata"),
        Just("oneway"),
    ];
    let values = prop_oneof![
        Just("yes"),
        Just("no"),
        Just("rail"),
        Just("railway"),
        Just("residential"),
        Just("track"),
        Just("asphalt"),
        Just("sett"),
        Just("grade1"),
        Just("abandoned"),
    ];
    proptest::collection::vec((keys, values), 0..8).prop_map(|pairs| pairs.into_iter().collect())
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0, 17.0)
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Engine invariants
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn committed_boxes_never_touch_other_entities(entities in entities_strategy()) {
        let mut engine = LabelEngine::new(LabelConfig::default()).unwrap();
        engine.compute_labels(&entities, &Identity, &viewport());

        let boxes: Vec<&BBox> = engine.drawn().iter().collect();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                let both_footprints = a.id.ends_with('P') && b.id.ends_with('P');
                if a.id == b.id || both_footprints {
                    continue;
                }
                prop_assert!(!a.intersects(b), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn repeated_pass_is_identical(entities in entities_strategy()) {
        let mut engine = LabelEngine::new(LabelConfig::default()).unwrap();
        let first = engine.compute_labels(&entities, &Identity, &viewport());
        let drawn = engine.drawn().len();
        let skipped = engine.skipped().len();
        let second = engine.compute_labels(&entities, &Identity, &viewport());
        prop_assert_eq!(first, second);
        prop_assert_eq!(engine.drawn().len(), drawn);
        prop_assert_eq!(engine.skipped().len(), skipped);
    }

    #[test]
    fn at_most_one_label_per_entity(entities in entities_strategy()) {
        let mut engine = LabelEngine::new(LabelConfig::default()).unwrap();
        let labels = engine.compute_labels(&entities, &Identity, &viewport());
        let mut ids: Vec<&str> = labels.entity_ids().collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Bare index
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn checked_inserts_do_not_overlap(
        rects in proptest::collection::vec((0.0f64..200.0, 0.0f64..200.0, 1.0f64..40.0, 1.0f64..40.0), 1..60)
    ) {
        let mut index = LabelIndex::new();
        for (i, (x, y, w, h)) in rects.into_iter().enumerate() {
            let bbox = BBox::new(x, y, x + w, y + h).with_id(format!("b{i}"));
            if !index.collides(&bbox) {
                index.load(vec![bbox]);
            }
        }
        let boxes: Vec<&BBox> = index.iter().collect();
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                prop_assert!(!a.intersects(b));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Classifier
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn classification_is_deterministic(tags in tags_strategy()) {
        let classifier = TagClassifier::default();
        let first = classifier.classify(&tags, "way line");
        let second = classifier.classify(&tags, "way line");
        prop_assert_eq!(&first, &second);
        prop_assert!(first.starts_with("way line"));
        prop_assert!(first.split(' ').all(|token| !token.ends_with("-no")), "{}", first);
    }
}
