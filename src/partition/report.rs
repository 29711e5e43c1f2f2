//! Statistics produced by the source partitioner.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Counts for one partition pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub original_images: usize,
    pub extracted_images: usize,
    pub remaining_images: usize,

    pub original_annotations: usize,
    pub extracted_annotations: usize,
    pub remaining_annotations: usize,

    /// Images per provenance tag in the input.
    pub sources: BTreeMap<String, usize>,

    /// File names of the extracted images, in input order.
    pub extracted_files: Vec<String>,
}

impl PartitionStats {
    /// Adds another split's counts into this one.
    pub fn accumulate(&mut self, other: &PartitionStats) {
        self.original_images += other.original_images;
        self.extracted_images += other.extracted_images;
        self.remaining_images += other.remaining_images;
        self.original_annotations += other.original_annotations;
        self.extracted_annotations += other.extracted_annotations;
        self.remaining_annotations += other.remaining_annotations;
        for (source, count) in &other.sources {
            *self.sources.entry(source.clone()).or_insert(0) += count;
        }
        self.extracted_files
            .extend(other.extracted_files.iter().cloned());
    }
}

impl fmt::Display for PartitionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self
            .sources
            .iter()
            .map(|(source, count)| format!("{source} {count}"))
            .collect();
        writeln!(f, "  sources:   {}", sources.join(", "))?;
        writeln!(
            f,
            "  original:  {} images, {} annotations",
            self.original_images, self.original_annotations
        )?;
        writeln!(
            f,
            "  extracted: {} images, {} annotations",
            self.extracted_images, self.extracted_annotations
        )?;
        writeln!(
            f,
            "  remaining: {} images, {} annotations",
            self.remaining_images, self.remaining_annotations
        )
    }
}
