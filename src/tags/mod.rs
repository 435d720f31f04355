//! OSM-style tag vocabulary and the tag-to-class classifier.

pub mod classes;
pub mod vocabulary;

pub use classes::{TagClassTable, TagClassifier, TagTableError};
pub use vocabulary::{
    LifecycleStatus, implies_oneway, is_interesting_tag, remove_lifecycle_prefix,
};
