//! Consistency checks for a single annotation collection.
//!
//! The validator runs a fixed battery of checks, all of them, in order:
//! - every image record has a file on disk
//! - the number of files on disk matches the number of image records
//! - every annotation points at a known image
//! - every annotation points at a known category
//! - no annotation is smaller than the size threshold
//! - every annotation carries its required keys
//!
//! It never mutates the collection and never touches storage beyond the
//! one call to the file lister it is given.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::collection::{Annotation, AnnotationField, CategoryId, Collection, ImageId};

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// Smallest acceptable annotation area, in square pixels.
    pub min_area: f64,

    /// How many missing files are reported by name before the rest are
    /// folded into one summary finding.
    pub max_listed_missing: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            min_area: 1024.0,
            max_listed_missing: 5,
        }
    }
}

/// Validates `collection` against itself and against the files returned
/// by `list_backing_files`.
///
/// The lister is called exactly once.
pub fn validate_collection<L>(
    collection: &Collection,
    list_backing_files: L,
    opts: &ValidateOptions,
) -> ValidationReport
where
    L: FnOnce() -> BTreeSet<String>,
{
    let mut report = ValidationReport::new();
    let files = list_backing_files();

    check_image_files(collection, &files, opts, &mut report);
    check_file_count(collection, &files, &mut report);
    check_image_refs(collection, &mut report);
    check_category_refs(collection, &mut report);
    check_small_objects(collection, opts.min_area, &mut report);
    check_required_fields(collection, &mut report);

    report
}

fn check_image_files(
    collection: &Collection,
    files: &BTreeSet<String>,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let mut missing = 0usize;

    for image in &collection.images {
        if files.contains(&image.file_name) {
            continue;
        }
        missing += 1;
        if missing <= opts.max_listed_missing {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageFile,
                format!("Missing image file: {}", image.file_name),
                1,
                IssueContext::Image {
                    id: image.id.as_u64(),
                },
            ));
        }
    }

    if missing > opts.max_listed_missing {
        let rest = missing - opts.max_listed_missing;
        report.add(ValidationIssue::error(
            IssueCode::MissingImageFile,
            format!("... and {} more missing image files", rest),
            rest,
            IssueContext::Collection,
        ));
    }
}

fn check_file_count(
    collection: &Collection,
    files: &BTreeSet<String>,
    report: &mut ValidationReport,
) {
    let on_disk = files.len();
    let recorded = collection.images.len();

    if on_disk > recorded {
        let extra = on_disk - recorded;
        report.add(ValidationIssue::warning(
            IssueCode::UntrackedImageFiles,
            format!(
                "{} image file(s) on disk but only {} image record(s): {} untracked",
                on_disk, recorded, extra
            ),
            extra,
            IssueContext::Collection,
        ));
    } else if on_disk < recorded {
        let short = recorded - on_disk;
        report.add(ValidationIssue::error(
            IssueCode::ImageFileShortfall,
            format!(
                "{} image record(s) but only {} image file(s) on disk: {} short",
                recorded, on_disk, short
            ),
            short,
            IssueContext::Collection,
        ));
    }
}

fn check_image_refs(collection: &Collection, report: &mut ValidationReport) {
    let image_ids: HashSet<ImageId> = collection.images.iter().map(|i| i.id).collect();

    let offenders = offending(collection, |ann| {
        ann.image_id.filter(|id| !image_ids.contains(id)).map(|id| id.as_u64())
    });

    if let Some((count, first)) = offenders {
        report.add(ValidationIssue::error(
            IssueCode::InvalidImageRef,
            format!(
                "{} annotation(s) reference non-existent images (first: {})",
                count, first
            ),
            count,
            IssueContext::Collection,
        ));
    }
}

fn check_category_refs(collection: &Collection, report: &mut ValidationReport) {
    let category_ids: HashSet<CategoryId> =
        collection.categories.iter().map(|c| c.id).collect();

    let offenders = offending(collection, |ann| {
        ann.category_id
            .filter(|id| !category_ids.contains(id))
            .map(|id| id.as_u64())
    });

    if let Some((count, first)) = offenders {
        report.add(ValidationIssue::error(
            IssueCode::InvalidCategoryRef,
            format!(
                "{} annotation(s) reference non-existent categories (first: {})",
                count, first
            ),
            count,
            IssueContext::Collection,
        ));
    }
}

fn check_small_objects(collection: &Collection, min_area: f64, report: &mut ValidationReport) {
    let offenders = offending(collection, |ann| ann.area.filter(|area| *area < min_area));

    if let Some((count, first)) = offenders {
        report.add(ValidationIssue::error(
            IssueCode::SmallObject,
            format!(
                "{} annotation(s) with area below {} (first: {})",
                count, min_area, first
            ),
            count,
            IssueContext::Collection,
        ));
    }
}

fn check_required_fields(collection: &Collection, report: &mut ValidationReport) {
    let mut missing: BTreeMap<AnnotationField, usize> = BTreeMap::new();
    for ann in &collection.annotations {
        for field in ann.missing_fields() {
            *missing.entry(field).or_insert(0) += 1;
        }
    }

    for (field, count) in missing {
        report.add(ValidationIssue::error(
            IssueCode::MissingAnnotationField,
            format!("{} annotation(s) missing field '{}'", count, field),
            count,
            IssueContext::Collection,
        ));
    }
}

/// Counts annotations for which `bad` yields a value and describes the
/// first of them as `annotation <id> -> <value>`.
fn offending<T, F>(collection: &Collection, bad: F) -> Option<(usize, String)>
where
    T: std::fmt::Display,
    F: Fn(&Annotation) -> Option<T>,
{
    let mut count = 0usize;
    let mut first = None;

    for (idx, ann) in collection.annotations.iter().enumerate() {
        if let Some(value) = bad(ann) {
            count += 1;
            if first.is_none() {
                first = Some(format!("{} -> {}", describe(idx, ann), value));
            }
        }
    }

    first.map(|first| (count, first))
}

fn describe(idx: usize, ann: &Annotation) -> String {
    match ann.id {
        Some(id) => format!("annotation {}", id),
        None => format!("annotation at index {}", idx),
    }
}
