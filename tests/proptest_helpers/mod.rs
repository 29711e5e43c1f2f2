#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};

use cococurate::collection::{Annotation, Category, Collection, Image, ImageId};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const SOURCES: [&str; 3] = ["rsud20k", "nuimages", "golden"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Per-annotation choices: which image, which category, how large.
#[derive(Clone, Debug)]
struct AnnSeed {
    image_index: usize,
    category_id: u64,
    side: u32,
}

fn ann_seed_strategy() -> impl Strategy<Value = AnnSeed> {
    (any::<usize>(), 1u64..=2, 1u32..=80).prop_map(|(image_index, category_id, side)| AnnSeed {
        image_index,
        category_id,
        side,
    })
}

/// `None` leaves the image without a provenance tag.
fn source_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some(SOURCES[0])),
        Just(Some(SOURCES[1])),
        Just(Some(SOURCES[2])),
    ]
}

/// A referentially sound collection with sparse ids.
///
/// Every annotation points at a generated image and at one of two fixed
/// categories. Image ids are distinct, annotation ids are distinct and
/// spaced by a random stride, and areas range from 1 to 6400.
pub fn arb_collection(max_images: usize, max_anns: usize) -> BoxedStrategy<Collection> {
    (
        proptest::collection::btree_set(0u64..10_000, 0..=max_images),
        proptest::collection::vec(source_strategy(), max_images..=max_images),
        proptest::collection::vec(ann_seed_strategy(), 0..=max_anns),
        0u64..10_000,
        1u64..=4,
    )
        .prop_map(|(image_ids, sources, seeds, ann_start, ann_stride)| {
            build_collection(image_ids, sources, seeds, ann_start, ann_stride)
        })
        .boxed()
}

fn build_collection(
    image_ids: BTreeSet<u64>,
    sources: Vec<Option<&'static str>>,
    seeds: Vec<AnnSeed>,
    ann_start: u64,
    ann_stride: u64,
) -> Collection {
    let images: Vec<Image> = image_ids
        .iter()
        .zip(sources)
        .map(|(&id, source)| {
            let image = Image::new(id, format!("img_{id:05}.jpg"), 640, 480);
            match source {
                Some(tag) => image.with_source(tag),
                None => image,
            }
        })
        .collect();

    let annotations = if images.is_empty() {
        Vec::new()
    } else {
        seeds
            .iter()
            .enumerate()
            .map(|(idx, seed)| {
                let image = &images[seed.image_index % images.len()];
                let side = seed.side as f64;
                Annotation::new(
                    ann_start + idx as u64 * ann_stride,
                    image.id,
                    seed.category_id,
                    [0.0, 0.0, side, side],
                    side * side,
                )
            })
            .collect()
    };

    Collection::new(
        vec![Category::new(1u64, "pedestrian"), Category::new(2u64, "cyclist")],
        images,
        annotations,
    )
}

pub fn image_id_set(collection: &Collection) -> HashSet<u64> {
    collection.images.iter().map(|img| img.id.as_u64()).collect()
}

pub fn annotation_id_set(collection: &Collection) -> HashSet<u64> {
    collection
        .annotations
        .iter()
        .filter_map(|ann| ann.id.map(|id| id.as_u64()))
        .collect()
}

/// Every annotation's `image_id` resolves to an image of the collection.
pub fn assert_references_resolve(collection: &Collection) -> Result<(), String> {
    let images: HashSet<ImageId> = collection.images.iter().map(|img| img.id).collect();
    for ann in &collection.annotations {
        match ann.image_id {
            Some(id) if images.contains(&id) => {}
            other => {
                return Err(format!(
                    "annotation {:?} references unresolved image {:?}",
                    ann.id, other
                ))
            }
        }
    }
    Ok(())
}
