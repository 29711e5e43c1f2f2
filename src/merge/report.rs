//! Statistics produced by the merger.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// An incoming image file and the name it takes in the merged split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub original: String,
    pub renamed: String,
}

/// Counts for one merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub base_images: usize,
    pub base_annotations: usize,
    pub incoming_images: usize,
    pub incoming_annotations: usize,
    pub merged_images: usize,
    pub merged_annotations: usize,

    /// New id of the smallest incoming image id (`1 + max base image id`).
    pub first_image_id: u64,
    /// New id of the smallest incoming annotation id.
    pub first_annotation_id: u64,

    /// Merged annotations per category name.
    pub by_category: BTreeMap<String, usize>,

    /// Incoming files to copy into the split under their new names.
    pub renamed_files: Vec<RenamedFile>,
}

impl MergeStats {
    /// Adds another split's counts into this one. The first-id fields are
    /// per split and are left alone.
    pub fn accumulate(&mut self, other: &MergeStats) {
        self.base_images += other.base_images;
        self.base_annotations += other.base_annotations;
        self.incoming_images += other.incoming_images;
        self.incoming_annotations += other.incoming_annotations;
        self.merged_images += other.merged_images;
        self.merged_annotations += other.merged_annotations;
        for (name, count) in &other.by_category {
            *self.by_category.entry(name.clone()).or_insert(0) += count;
        }
        self.renamed_files
            .extend(other.renamed_files.iter().cloned());
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  base:     {} images, {} annotations",
            self.base_images, self.base_annotations
        )?;
        writeln!(
            f,
            "  incoming: {} images, {} annotations (new ids from {} / {})",
            self.incoming_images,
            self.incoming_annotations,
            self.first_image_id,
            self.first_annotation_id
        )?;
        writeln!(
            f,
            "  merged:   {} images, {} annotations",
            self.merged_images, self.merged_annotations
        )?;

        if self.merged_annotations > 0 {
            for (name, count) in &self.by_category {
                let pct = *count as f64 / self.merged_annotations as f64 * 100.0;
                writeln!(f, "    {name}: {count} ({pct:.1}%)")?;
            }
        }

        Ok(())
    }
}
