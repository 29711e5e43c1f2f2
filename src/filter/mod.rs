//! Predicate filtering of annotations.
//!
//! Annotations failing the predicate are dropped, and so is every image
//! left without a surviving annotation: an image with no boxes is not a
//! useful training example, and keeping it around would leave a file on
//! disk that nothing refers to.

mod report;

pub use report::FilterStats;

use std::collections::HashSet;

use crate::collection::{Annotation, Collection, ImageId};

/// Keeps the annotations for which `keep_annotation` returns true.
///
/// Surviving images and annotations keep their original relative order.
/// Categories and pass-through keys are copied unchanged. Rejecting every
/// annotation is not an error; the result is simply empty.
pub fn filter_collection<P>(
    collection: &Collection,
    keep_annotation: P,
) -> (Collection, FilterStats)
where
    P: Fn(&Annotation) -> bool,
{
    let names = collection.category_names();
    let mut stats = FilterStats {
        original_images: collection.images.len(),
        original_annotations: collection.annotations.len(),
        ..Default::default()
    };

    let mut filtered = collection.empty_like();

    for ann in &collection.annotations {
        let label = names.get(ann.category_id).to_string();
        if keep_annotation(ann) {
            *stats.kept_by_category.entry(label).or_insert(0) += 1;
            filtered.annotations.push(ann.clone());
        } else {
            *stats.removed_by_category.entry(label).or_insert(0) += 1;
        }
    }

    let annotated: HashSet<ImageId> = filtered
        .annotations
        .iter()
        .filter_map(|ann| ann.image_id)
        .collect();

    for image in &collection.images {
        if annotated.contains(&image.id) {
            filtered.images.push(image.clone());
        } else {
            stats.removed_image_files.push(image.file_name.clone());
        }
    }

    stats.kept_annotations = filtered.annotations.len();
    stats.removed_annotations = stats.original_annotations - stats.kept_annotations;
    stats.kept_images = filtered.images.len();
    stats.removed_images = stats.original_images - stats.kept_images;

    (filtered, stats)
}

/// Predicate keeping annotations whose `area` is at least `threshold`.
///
/// An annotation without an `area` is rejected.
pub fn min_area(threshold: f64) -> impl Fn(&Annotation) -> bool {
    move |ann| ann.area.is_some_and(|area| area >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Category, Image};

    fn sample() -> Collection {
        Collection::new(
            vec![Category::new(1u64, "pedestrian"), Category::new(2u64, "cyclist")],
            vec![
                Image::new(1u64, "a.jpg", 640, 480).with_source("X"),
                Image::new(2u64, "b.jpg", 640, 480).with_source("Y"),
            ],
            vec![
                Annotation::new(1u64, 1u64, 1u64, [0.0, 0.0, 10.0, 10.0], 500.0),
                Annotation::new(2u64, 2u64, 1u64, [0.0, 0.0, 50.0, 50.0], 2000.0),
            ],
        )
    }

    #[test]
    fn small_objects_and_their_images_are_removed() {
        let (filtered, stats) = filter_collection(&sample(), min_area(1024.0));

        assert_eq!(filtered.images.len(), 1);
        assert_eq!(filtered.images[0].id, ImageId(2));
        assert_eq!(filtered.annotations.len(), 1);
        assert_eq!(filtered.annotations[0].id, Some(2u64.into()));

        assert_eq!(stats.removed_annotations, 1);
        assert_eq!(stats.removed_images, 1);
        assert_eq!(stats.removed_image_files, vec!["a.jpg".to_string()]);
        assert_eq!(stats.removed_by_category.get("pedestrian"), Some(&1));
        assert_eq!(stats.kept_by_category.get("pedestrian"), Some(&1));
    }

    #[test]
    fn rejecting_everything_yields_empty_collection() {
        let (filtered, stats) = filter_collection(&sample(), |_| false);

        assert!(filtered.images.is_empty());
        assert!(filtered.annotations.is_empty());
        assert_eq!(filtered.categories.len(), 2);
        assert_eq!(stats.removed_images, 2);
        assert_eq!(stats.kept_annotations, 0);
    }

    #[test]
    fn order_and_passthrough_are_preserved() {
        let mut collection = sample();
        collection.images.push(Image::new(3u64, "c.jpg", 640, 480));
        collection.annotations.insert(
            0,
            Annotation::new(3u64, 3u64, 2u64, [0.0, 0.0, 40.0, 40.0], 1600.0),
        );
        collection
            .extensions
            .insert("licenses".into(), serde_json::json!([]));

        let (filtered, _) = filter_collection(&collection, min_area(1024.0));

        let image_ids: Vec<u64> = filtered.images.iter().map(|i| i.id.as_u64()).collect();
        assert_eq!(image_ids, vec![2, 3]);
        let ann_ids: Vec<u64> = filtered
            .annotations
            .iter()
            .filter_map(|a| a.id.map(|id| id.as_u64()))
            .collect();
        assert_eq!(ann_ids, vec![3, 2]);
        assert!(filtered.extensions.contains_key("licenses"));
    }

    #[test]
    fn missing_area_is_rejected_by_min_area() {
        let mut ann = Annotation::new(1u64, 1u64, 1u64, [0.0, 0.0, 100.0, 100.0], 0.0);
        ann.area = None;
        assert!(!min_area(1024.0)(&ann));
    }

    #[test]
    fn input_is_not_mutated() {
        let original = sample();
        let snapshot = original.clone();
        let _ = filter_collection(&original, min_area(1024.0));
        assert_eq!(original, snapshot);
    }
}
