//! Fuzz target for annotation collection parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run collection_parse

#![no_main]

use cococurate::collection::io_coco_json::{from_collection_slice, to_collection_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for an annotation file.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(collection) = from_collection_slice(data) {
        let _ = to_collection_string(&collection);
    }
});
