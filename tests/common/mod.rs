#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

pub const ANNOTATION_FILE: &str = "_annotations.coco.json";

pub fn categories() -> Value {
    json!([
        {"id": 1, "name": "pedestrian", "supercategory": "vru"},
        {"id": 2, "name": "cyclist", "supercategory": "vru"}
    ])
}

/// Writes `<root>/<split>/_annotations.coco.json` plus a small placeholder
/// file for every name in `files`.
pub fn write_split(root: &Path, split: &str, document: &Value, files: &[&str]) {
    let dir = root.join(split);
    fs::create_dir_all(&dir).expect("create split dir");
    for name in files {
        fs::write(dir.join(name), b"\xff\xd8\xff").expect("write image file");
    }
    fs::write(
        dir.join(ANNOTATION_FILE),
        serde_json::to_vec_pretty(document).expect("serialize document"),
    )
    .expect("write annotation file");
}

pub fn read_split(root: &Path, split: &str) -> Value {
    let bytes = fs::read(root.join(split).join(ANNOTATION_FILE)).expect("read annotation file");
    serde_json::from_slice(&bytes).expect("parse annotation file")
}

/// A split with two small objects on `rsud_0.jpg` and `golden_0.jpg` and
/// one large object on each of the other two images.
pub fn mixed_split() -> Value {
    json!({
        "info": {"description": "golden-vru", "version": "7.0"},
        "licenses": [{"id": 1, "name": "CC BY 4.0"}],
        "categories": categories(),
        "images": [
            {"id": 1, "file_name": "rsud_0.jpg", "width": 640, "height": 480, "source": "rsud20k"},
            {"id": 2, "file_name": "rsud_1.jpg", "width": 640, "height": 480, "source": "rsud20k"},
            {"id": 3, "file_name": "golden_0.jpg", "width": 640, "height": 480, "source": "golden"},
            {"id": 4, "file_name": "golden_1.jpg", "width": 640, "height": 480}
        ],
        "annotations": [
            {"id": 1, "image_id": 1, "category_id": 1, "bbox": [0, 0, 10, 10], "area": 100, "iscrowd": 0},
            {"id": 2, "image_id": 2, "category_id": 2, "bbox": [0, 0, 40, 40], "area": 1600, "iscrowd": 0},
            {"id": 3, "image_id": 3, "category_id": 1, "bbox": [0, 0, 20, 20], "area": 400, "iscrowd": 0},
            {"id": 4, "image_id": 4, "category_id": 1, "bbox": [5, 5, 64, 64], "area": 4096, "iscrowd": 0,
             "segmentation": []}
        ]
    })
}

pub const MIXED_FILES: [&str; 4] = ["rsud_0.jpg", "rsud_1.jpg", "golden_0.jpg", "golden_1.jpg"];

/// A second source to merge: image ids start at 1, annotation ids at 1.
pub fn incoming_split() -> Value {
    json!({
        "categories": categories(),
        "images": [
            {"id": 1, "file_name": "cam_front_0.jpg", "width": 1600, "height": 900},
            {"id": 2, "file_name": "cam_front_1.jpg", "width": 1600, "height": 900}
        ],
        "annotations": [
            {"id": 1, "image_id": 1, "category_id": 2, "bbox": [0, 0, 50, 50], "area": 2500},
            {"id": 2, "image_id": 2, "category_id": 1, "bbox": [0, 0, 40, 60], "area": 2400, "iscrowd": 1}
        ]
    })
}

pub const INCOMING_FILES: [&str; 2] = ["cam_front_0.jpg", "cam_front_1.jpg"];

pub fn ids(values: &Value, key: &str) -> Vec<u64> {
    values
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v[key].as_u64().expect("numeric id"))
        .collect()
}
