use std::path::Path;

use map_labels::label_dump::LabelDump;
use map_labels::render::{build_scene, render_svg};
use map_labels::{
    label_geojson, parse_geojson, render_geojson, Config, GeometryKind, Identity, LabelEngine,
    MapView, RenderOptions, TagClassifier, Viewport,
};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn projected_options() -> RenderOptions {
    RenderOptions {
        view: MapView {
            width: 800.0,
            height: 600.0,
            projected: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn render_all_fixtures() {
    let candidates = [
        ("city_block.geojson", RenderOptions::default()),
        ("dense_projected.geojson", projected_options()),
        ("lifecycle.geojson", projected_options()),
    ];
    for (name, options) in candidates {
        let svg = render_geojson(&fixture(name), &options).expect("render failed");
        assert_valid_svg(&svg, name);
    }
}

#[test]
fn city_block_labels() {
    let dump = label_geojson(&fixture("city_block.geojson"), &RenderOptions::default()).unwrap();
    let labels = &dump.labels;

    let main = labels
        .lines
        .iter()
        .find(|l| l.entity_id == "w1")
        .expect("primary road is labelled");
    assert_eq!(main.text, "南京路");
    assert_eq!(main.class, "LineString tag-highway");
    assert!(main.path.starts_with('M'));

    // too short for its name
    assert!(labels.lines.iter().all(|l| l.entity_id != "w4"));

    let park = labels
        .areas
        .iter()
        .find(|a| a.entity_id == "a1")
        .expect("park is labelled");
    assert_eq!(park.class, "Polygon tag-leisure");
    assert!(park.label.is_some());
    // narrower than the minimum
    assert!(labels.areas.iter().all(|a| a.entity_id != "a2"));

    let ids: Vec<&str> = labels.entity_ids().collect();
    assert!(!ids.contains(&"n4"), "unnamed bench has no label");
    assert!(!ids.contains(&"n5"), "multipoints are never labelled");
}

#[test]
fn city_block_markers_follow_oneway_tags() {
    let dump = label_geojson(&fixture("city_block.geojson"), &RenderOptions::default()).unwrap();
    let marked: Vec<&str> = dump.markers.iter().map(|m| m.id.as_str()).collect();
    assert!(marked.contains(&"w1"));
    assert!(marked.contains(&"w3"), "rivers carry flow markers");
    assert!(marked.contains(&"w5"));
    assert!(!marked.contains(&"w2"));
    for (idx, marker) in dump.markers.iter().filter(|m| m.id == "w1").enumerate() {
        assert_eq!(marker.index, idx);
    }
}

#[test]
fn city_block_feature_classes() {
    let svg = render_geojson(&fixture("city_block.geojson"), &RenderOptions::default()).unwrap();
    assert!(svg.contains("way line stroke tag-highway tag-highway-primary"));
    assert!(svg.contains("tag-paved"));
    assert!(svg.contains("tag-wikidata"));
    assert!(svg.contains("tag-railway tag-status tag-status-abandoned"));
    assert!(svg.contains("南京路"));
}

#[test]
fn lifecycle_fixture_classes() {
    let classifier = TagClassifier::default();
    let entities = parse_geojson(&fixture("lifecycle.geojson")).unwrap();
    let classes: Vec<(String, String)> = entities
        .iter()
        .map(|e| (e.id.clone(), classifier.classify(&e.tags, "")))
        .collect();
    let class_of = |id: &str| {
        classes
            .iter()
            .find(|(entity, _)| entity == id)
            .map(|(_, class)| class.as_str())
            .unwrap()
    };
    assert_eq!(class_of("r1"), "tag-railway tag-status tag-status-abandoned");
    assert_eq!(
        class_of("r2"),
        "tag-railway tag-railway-rail tag-status tag-status-disused"
    );
    assert_eq!(class_of("r3"), "tag-status tag-status-abandoned");
    assert_eq!(class_of("r4"), "tag-railway tag-status tag-status-abandoned");
    assert!(class_of("h1").ends_with("tag-paved"));
    assert!(class_of("h2").ends_with("tag-unpaved"));
    assert_eq!(class_of("p1"), "tag-piste_type tag-piste_type-downhill");
}

#[test]
fn dense_points_never_overlap() {
    let entities = parse_geojson(&fixture("dense_projected.geojson")).unwrap();
    let mut engine = LabelEngine::new(Config::default().labels).unwrap();
    let labels = engine.compute_labels(&entities, &Identity, &Viewport::new(800.0, 600.0, 17.0));

    assert!(!labels.points.is_empty());
    assert!(labels.points.len() < 48, "some cafes must give way");
    assert!(!engine.skipped().is_empty());
    assert_eq!(labels.lines[0].entity_id, "w1", "motorway placed before service road");

    let footprints: Vec<String> = entities
        .iter()
        .filter(|e| e.kind() == GeometryKind::Point)
        .map(|e| format!("{}P", e.id))
        .collect();
    let boxes: Vec<_> = engine.drawn().iter().collect();
    for (i, a) in boxes.iter().enumerate() {
        for b in &boxes[i + 1..] {
            if a.id == b.id || (footprints.contains(&a.id) && footprints.contains(&b.id)) {
                continue;
            }
            assert!(!a.intersects(b), "{} overlaps {}", a.id, b.id);
        }
    }
}

#[test]
fn json_dump_matches_scene() {
    let entities = parse_geojson(&fixture("dense_projected.geojson")).unwrap();
    let config = Config::default();
    let scene = build_scene(&entities, &Identity, &Viewport::new(800.0, 600.0, 17.0), &config).unwrap();
    let dump = LabelDump::from_scene(&scene);
    assert_eq!(dump.drawn.count, scene.drawn_boxes.len());
    assert_eq!(dump.labels, scene.labels);
    let svg = render_svg(&scene, &config.theme, &config.render);
    assert_eq!(svg.matches("class=\"pointlabel").count(), 2 * scene.labels.points.len());
}
