//! R-tree of label boxes used for collision arbitration.

use crate::geo::Extent;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub id: String,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            id: String::new(),
        }
    }

    /// Square of half-width `half` centered on `center`.
    pub fn around(center: [f64; 2], half: f64) -> Self {
        Self::new(
            center[0] - half,
            center[1] - half,
            center[0] + half,
            center[1] + half,
        )
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive overlap test: touching edges count.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

impl RTreeObject for BBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

#[derive(Debug, Default)]
pub struct LabelIndex {
    tree: RTree<BBox>,
    // boxes filed under each id, so replacing an id never walks the tree
    by_id: HashMap<String, Vec<BBox>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `bbox`, first removing every box already filed under its id.
    pub fn insert(&mut self, bbox: BBox) {
        self.remove_id(&bbox.id);
        self.by_id.insert(bbox.id.clone(), vec![bbox.clone()]);
        self.tree.insert(bbox);
    }

    /// Adds many boxes at once. Existing boxes are kept even when ids repeat.
    pub fn load(&mut self, boxes: Vec<BBox>) {
        for bbox in &boxes {
            self.by_id.entry(bbox.id.clone()).or_default().push(bbox.clone());
        }
        if self.tree.size() == 0 {
            self.tree = RTree::bulk_load(boxes);
            return;
        }
        for bbox in boxes {
            self.tree.insert(bbox);
        }
    }

    /// Removes the boxes filed under `id`, returning how many were dropped.
    pub fn remove_id(&mut self, id: &str) -> usize {
        let Some(stale) = self.by_id.remove(id) else {
            return 0;
        };
        stale
            .iter()
            .filter(|bbox| self.tree.remove(bbox).is_some())
            .count()
    }

    pub fn boxes_for(&self, id: &str) -> &[BBox] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn collides(&self, bbox: &BBox) -> bool {
        self.tree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .next()
            .is_some()
    }

    pub fn search(&self, extent: &Extent) -> Vec<&BBox> {
        let envelope = AABB::from_corners(extent[0], extent[1]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BBox> {
        self.tree.iter()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_collide() {
        let mut index = LabelIndex::new();
        index.load(vec![BBox::new(0.0, 0.0, 10.0, 10.0).with_id("a")]);
        assert!(index.collides(&BBox::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!index.collides(&BBox::new(10.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn insert_replaces_boxes_with_same_id() {
        let mut index = LabelIndex::new();
        index.insert(BBox::new(0.0, 0.0, 10.0, 10.0).with_id("n1P"));
        index.insert(BBox::new(50.0, 50.0, 60.0, 60.0).with_id("n1P"));
        assert_eq!(index.len(), 1);
        assert!(!index.collides(&BBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(index.collides(&BBox::new(55.0, 55.0, 56.0, 56.0)));
    }

    #[test]
    fn load_keeps_duplicates_and_merges_into_existing_tree() {
        let mut index = LabelIndex::new();
        index.load(vec![
            BBox::new(0.0, 0.0, 1.0, 1.0).with_id("w1"),
            BBox::new(2.0, 0.0, 3.0, 1.0).with_id("w1"),
        ]);
        index.load(vec![BBox::new(5.0, 0.0, 6.0, 1.0).with_id("w2")]);
        assert_eq!(index.len(), 3);
        let hits = index.search(&[[1.5, -1.0], [5.5, 2.0]]);
        let mut ids: Vec<&str> = hits.iter().map(|b| b.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["w1", "w2"]);
        index.clear();
        assert!(index.is_empty());
        assert!(index.boxes_for("w1").is_empty());
    }

    #[test]
    fn remove_id_only_touches_its_own_boxes() {
        let mut index = LabelIndex::new();
        for i in 0..2000 {
            let x = (i % 50) as f64 * 30.0;
            let y = (i / 50) as f64 * 30.0;
            index.insert(BBox::around([x, y], 10.0).with_id(format!("n{i}P")));
        }
        index.load(vec![
            BBox::new(0.0, 0.0, 5.0, 5.0).with_id("w1"),
            BBox::new(8.0, 0.0, 12.0, 5.0).with_id("w1"),
        ]);
        assert_eq!(index.len(), 2002);
        assert_eq!(index.boxes_for("w1").len(), 2);
        assert_eq!(index.boxes_for("n7P"), &[BBox::around([210.0, 0.0], 10.0).with_id("n7P")]);

        assert_eq!(index.remove_id("w1"), 2);
        assert_eq!(index.remove_id("w1"), 0);
        assert_eq!(index.remove_id("missing"), 0);
        assert_eq!(index.len(), 2000);
        assert_eq!(index.by_id.len(), 2000);

        // re-inserting an id moves its single box
        index.insert(BBox::around([5000.0, 5000.0], 10.0).with_id("n7P"));
        assert_eq!(index.len(), 2000);
        assert!(!index.collides(&BBox::around([210.0, 0.0], 1.0)));
        assert!(index.collides(&BBox::around([5000.0, 5000.0], 1.0)));
    }
}
