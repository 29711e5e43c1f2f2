//! Splitting a collection in two by image provenance.

mod report;

pub use report::PartitionStats;

use std::collections::HashSet;

use crate::collection::{Collection, Image, ImageId};

/// Splits `collection` into `(remainder, extract)`.
///
/// Images for which `is_extract` holds go to `extract`, the rest to
/// `remainder`, each side keeping input order. Every annotation follows its
/// image; an annotation whose image is not extracted (including one with no
/// `image_id`) stays in the remainder. Both sides get their own copy of the
/// categories and pass-through keys.
pub fn partition_collection<P>(
    collection: &Collection,
    is_extract: P,
) -> (Collection, Collection, PartitionStats)
where
    P: Fn(&Image) -> bool,
{
    let mut remainder = collection.empty_like();
    let mut extract = collection.empty_like();
    let mut stats = PartitionStats {
        original_images: collection.images.len(),
        original_annotations: collection.annotations.len(),
        ..Default::default()
    };

    let mut extracted_ids: HashSet<ImageId> = HashSet::new();
    for image in &collection.images {
        *stats
            .sources
            .entry(image.source_tag().to_string())
            .or_insert(0) += 1;

        if is_extract(image) {
            extracted_ids.insert(image.id);
            stats.extracted_files.push(image.file_name.clone());
            extract.images.push(image.clone());
        } else {
            remainder.images.push(image.clone());
        }
    }

    for ann in &collection.annotations {
        let follows_extract = ann
            .image_id
            .is_some_and(|image_id| extracted_ids.contains(&image_id));
        if follows_extract {
            extract.annotations.push(ann.clone());
        } else {
            remainder.annotations.push(ann.clone());
        }
    }

    stats.extracted_images = extract.images.len();
    stats.remaining_images = remainder.images.len();
    stats.extracted_annotations = extract.annotations.len();
    stats.remaining_annotations = remainder.annotations.len();

    (remainder, extract, stats)
}

/// Predicate selecting images whose provenance tag equals `source`.
pub fn source_is(source: impl Into<String>) -> impl Fn(&Image) -> bool {
    let source = source.into();
    move |image| image.source.as_deref() == Some(source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Annotation, Category};

    fn sample() -> Collection {
        let mut collection = Collection::new(
            vec![Category::new(1u64, "pedestrian")],
            vec![
                Image::new(1u64, "golden_1.jpg", 640, 480).with_source("golden"),
                Image::new(2u64, "rsud_1.jpg", 640, 480).with_source("rsud20k"),
                Image::new(3u64, "plain.jpg", 640, 480),
                Image::new(4u64, "rsud_2.jpg", 640, 480).with_source("rsud20k"),
            ],
            vec![
                Annotation::new(1u64, 2u64, 1u64, [0.0; 4], 2000.0),
                Annotation::new(2u64, 1u64, 1u64, [0.0; 4], 2000.0),
                Annotation::new(3u64, 4u64, 1u64, [0.0; 4], 2000.0),
                Annotation::new(4u64, 3u64, 1u64, [0.0; 4], 2000.0),
            ],
        );
        collection
            .extensions
            .insert("info".into(), serde_json::json!({"version": "8.0"}));
        collection
    }

    #[test]
    fn extracted_images_take_their_annotations() {
        let (remainder, extract, stats) = partition_collection(&sample(), source_is("rsud20k"));

        let extract_ids: Vec<u64> = extract.images.iter().map(|i| i.id.as_u64()).collect();
        assert_eq!(extract_ids, vec![2, 4]);
        let remainder_ids: Vec<u64> = remainder.images.iter().map(|i| i.id.as_u64()).collect();
        assert_eq!(remainder_ids, vec![1, 3]);

        let extract_anns: Vec<u64> = extract
            .annotations
            .iter()
            .filter_map(|a| a.id.map(|id| id.as_u64()))
            .collect();
        assert_eq!(extract_anns, vec![1, 3]);
        assert_eq!(remainder.annotations.len(), 2);

        assert_eq!(stats.extracted_images, 2);
        assert_eq!(stats.remaining_images, 2);
        assert_eq!(stats.extracted_annotations, 2);
        assert_eq!(stats.remaining_annotations, 2);
        assert_eq!(stats.extracted_files, vec!["rsud_1.jpg", "rsud_2.jpg"]);
        assert_eq!(stats.sources.get("unknown"), Some(&1));
        assert_eq!(stats.sources.get("rsud20k"), Some(&2));
    }

    #[test]
    fn both_sides_inherit_categories_and_passthrough() {
        let (mut remainder, extract, _) = partition_collection(&sample(), source_is("rsud20k"));

        assert_eq!(extract.extensions["info"]["version"], "8.0");
        assert_eq!(remainder.extensions["info"]["version"], "8.0");

        remainder.categories[0].name = "renamed".into();
        assert_eq!(extract.categories[0].name, "pedestrian");
    }

    #[test]
    fn annotation_without_image_id_stays_in_remainder() {
        let mut collection = sample();
        collection.annotations[0].image_id = None;

        let (remainder, extract, _) = partition_collection(&collection, source_is("rsud20k"));
        assert_eq!(extract.annotations.len(), 1);
        assert_eq!(remainder.annotations.len(), 3);
    }

    #[test]
    fn nothing_matches() {
        let (remainder, extract, stats) = partition_collection(&sample(), source_is("kitti"));
        assert!(extract.images.is_empty());
        assert!(extract.annotations.is_empty());
        assert_eq!(remainder, sample());
        assert!(stats.extracted_files.is_empty());
    }
}
