//! Statistics produced by the predicate filter.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// What a filter pass kept and removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub original_images: usize,
    pub kept_images: usize,
    pub removed_images: usize,

    pub original_annotations: usize,
    pub kept_annotations: usize,
    pub removed_annotations: usize,

    /// Surviving annotations per category name.
    pub kept_by_category: BTreeMap<String, usize>,
    /// Removed annotations per category name.
    pub removed_by_category: BTreeMap<String, usize>,

    /// File names of images dropped because no annotation survived.
    pub removed_image_files: Vec<String>,
}

impl FilterStats {
    /// Adds another split's counts into this one.
    pub fn accumulate(&mut self, other: &FilterStats) {
        self.original_images += other.original_images;
        self.kept_images += other.kept_images;
        self.removed_images += other.removed_images;
        self.original_annotations += other.original_annotations;
        self.kept_annotations += other.kept_annotations;
        self.removed_annotations += other.removed_annotations;
        for (name, count) in &other.kept_by_category {
            *self.kept_by_category.entry(name.clone()).or_insert(0) += count;
        }
        for (name, count) in &other.removed_by_category {
            *self.removed_by_category.entry(name.clone()).or_insert(0) += count;
        }
        self.removed_image_files
            .extend(other.removed_image_files.iter().cloned());
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  original: {} images, {} annotations",
            self.original_images, self.original_annotations
        )?;
        writeln!(
            f,
            "  removed:  {} images, {} annotations",
            self.removed_images, self.removed_annotations
        )?;
        writeln!(
            f,
            "  final:    {} images, {} annotations",
            self.kept_images, self.kept_annotations
        )?;

        if !self.removed_by_category.is_empty() {
            let parts: Vec<String> = self
                .removed_by_category
                .iter()
                .map(|(name, count)| format!("{name} {count}"))
                .collect();
            writeln!(f, "  removed by category: {}", parts.join(", "))?;
        }

        if self.kept_annotations > 0 {
            let parts: Vec<String> = self
                .kept_by_category
                .iter()
                .map(|(name, count)| {
                    let pct = *count as f64 / self.kept_annotations as f64 * 100.0;
                    format!("{name} {count} ({pct:.1}%)")
                })
                .collect();
            writeln!(f, "  class distribution: {}", parts.join(", "))?;
        }

        Ok(())
    }
}
