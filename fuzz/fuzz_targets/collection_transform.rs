//! Fuzz target running every transformation and the validator over
//! whatever parses as a collection. Only panics are interesting; merge
//! errors on bad input are expected.
//!
//! Run with:
//!   cargo +nightly fuzz run collection_transform

#![no_main]

use std::collections::BTreeSet;

use cococurate::collection::io_coco_json::from_collection_slice;
use cococurate::filter::{filter_collection, min_area};
use cococurate::merge::{merge_collections, MergeOptions};
use cococurate::partition::{partition_collection, source_is};
use cococurate::validation::{validate_collection, ValidateOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(collection) = from_collection_slice(data) else {
        return;
    };

    let _ = filter_collection(&collection, min_area(1024.0));
    let (remainder, extract, _) = partition_collection(&collection, source_is("rsud20k"));

    let opts = MergeOptions {
        require_matching_categories: false,
        ..MergeOptions::default()
    };
    let _ = merge_collections(&remainder, &extract, &opts, opts.default_rename());

    let files: BTreeSet<String> = collection
        .images
        .iter()
        .map(|img| img.file_name.clone())
        .collect();
    let _ = validate_collection(&collection, || files, &ValidateOptions::default());
});
