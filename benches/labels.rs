use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use map_labels::markers::OnewayMarkers;
use map_labels::render::{build_scene, render_svg};
use map_labels::{Config, Entity, Geometry, Identity, LabelEngine, Tags, TagClassifier, Viewport};
use std::hint::black_box;

const NAMES: [&str; 6] = ["Main", "Harbour Road", "外滩", "Station", "Elm Street", "Riverside Park"];

fn synthetic_map(size: usize) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(size * 3);
    let step = 1000.0 / size as f64;
    for i in 0..size {
        let offset = i as f64 * step;
        let name = NAMES[i % NAMES.len()];
        let road: Tags = [("highway", if i % 4 == 0 { "primary" } else { "residential" }), ("name", name)]
            .into_iter()
            .collect();
        entities.push(Entity::new(
            format!("w{i}"),
            Geometry::LineString(vec![[0.0, offset], [400.0, offset + 30.0], [1000.0, offset + 10.0]]),
            road,
        ));
        let poi: Tags = [("amenity", "cafe"), ("name", name)].into_iter().collect();
        entities.push(Entity::new(format!("n{i}"), Geometry::Point([offset, 1000.0 - offset]), poi));
        let x = (i * 37 % 900) as f64;
        let y = (i * 53 % 900) as f64;
        let ring = vec![[x, y], [x + 90.0, y], [x + 90.0, y + 60.0], [x, y + 60.0], [x, y]];
        let area: Tags = [("building", "yes"), ("name", name), ("wikidata", "Q1")].into_iter().collect();
        entities.push(Entity::new(format!("a{i}"), Geometry::Polygon(vec![ring]), area));
    }
    entities
}

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");
    let viewport = Viewport::new(1000.0, 1000.0, 17.0);
    for size in [10usize, 100, 500] {
        let entities = synthetic_map(size);
        let mut engine = LabelEngine::new(Config::default().labels).expect("default config");
        group.bench_with_input(BenchmarkId::from_parameter(size), &entities, |b, entities| {
            b.iter(|| {
                let labels = engine.compute_labels(black_box(entities), &Identity, &viewport);
                black_box(labels.len());
            });
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let classifier = TagClassifier::default();
    let entities = synthetic_map(500);
    c.bench_function("classify/500", |b| {
        b.iter(|| {
            for entity in &entities {
                black_box(classifier.classify(black_box(&entity.tags), "way line stroke"));
            }
        });
    });
}

fn bench_markers(c: &mut Criterion) {
    let entities: Vec<Entity> = synthetic_map(500)
        .into_iter()
        .map(|mut entity| {
            entity.tags.insert("oneway", "yes");
            entity
        })
        .collect();
    let markers = OnewayMarkers::new(35.0, [[0.0, 0.0], [1000.0, 1000.0]]);
    c.bench_function("markers/500", |b| {
        b.iter(|| black_box(markers.collect(black_box(&entities), &Identity).len()));
    });
}

fn bench_render(c: &mut Criterion) {
    let config = Config::default();
    let viewport = Viewport::new(1000.0, 1000.0, 17.0);
    let entities = synthetic_map(100);
    c.bench_function("render/100", |b| {
        b.iter(|| {
            let scene = build_scene(black_box(&entities), &Identity, &viewport, &config).expect("scene");
            black_box(render_svg(&scene, &config.theme, &config.render).len());
        });
    });
}

criterion_group!(benches, bench_labels, bench_classify, bench_markers, bench_render);
criterion_main!(benches);
