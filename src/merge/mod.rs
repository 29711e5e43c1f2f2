//! Merging a collection from another source into a base collection.
//!
//! Base records are kept exactly as they are. Incoming ids are shifted so
//! that they start right above the base id range:
//!
//! ```text
//! start  = 1 + max(base ids, default 0)
//! new id = start + (old id - min(incoming ids))
//! ```
//!
//! With a base whose largest image id is 5, incoming image 1 becomes 6.
//! This is not the plain `old id + start` offset, which would turn that
//! image into 7; subtracting the smallest incoming id first lets an
//! incoming range starting at 1 continue directly after the base range.
//! The shift is the same for every incoming id of a kind, so distinct
//! incoming ids stay distinct, and every new id is at least `start`. Image
//! and annotation ids are shifted independently, and each annotation's
//! `image_id` goes through the image mapping.
//!
//! Incoming file names go through a rename function (by default a
//! `<source>_` prefix) so they cannot shadow base files in the shared split
//! directory.

mod report;

pub use report::{MergeStats, RenamedFile};

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::collection::{AnnotationId, Collection, ImageId};
use crate::error::CurateError;

/// Merge behavior.
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// Provenance tag stamped on every incoming image.
    pub source_tag: String,
    /// Fail with [`CurateError::CategoryMismatch`] unless both sides define
    /// the same `(id, name)` pairs. When false, the base categories are
    /// kept and the incoming ones are discarded unchecked.
    pub require_matching_categories: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            source_tag: "nuimages".to_string(),
            require_matching_categories: true,
        }
    }
}

impl MergeOptions {
    /// The default rename for this source: `<source_tag>_<file_name>`.
    pub fn default_rename(&self) -> impl Fn(&str) -> String {
        prefix_rename(format!("{}_", self.source_tag))
    }
}

/// Rename function prepending `prefix` to a file name.
pub fn prefix_rename(prefix: impl Into<String>) -> impl Fn(&str) -> String {
    let prefix = prefix.into();
    move |file_name| format!("{prefix}{file_name}")
}

/// Merges `incoming` into `base`, renaming incoming files with `rename`.
///
/// The merged collection lists all base records first, then the remapped
/// incoming records, each side in its original order. Categories come from
/// `base`.
///
/// # Errors
/// - [`CurateError::CategoryMismatch`] if categories are checked and differ.
/// - [`CurateError::ReferentialIntegrity`] if an incoming annotation has no
///   id, has no image id, or points at an image missing from `incoming`, or
///   if `incoming` repeats an image or annotation id.
/// - [`CurateError::FileNameCollision`] if a renamed file name is already
///   used by a base image or by another incoming image.
/// - [`CurateError::IdOverflow`] if an id cannot be shifted within `u64`.
pub fn merge_collections<R>(
    base: &Collection,
    incoming: &Collection,
    opts: &MergeOptions,
    rename: R,
) -> Result<(Collection, MergeStats), CurateError>
where
    R: Fn(&str) -> String,
{
    if opts.require_matching_categories {
        check_categories(base, incoming)?;
    }

    let image_rebase = IdRebase::new(
        "image",
        base.max_image_id().map(|id| id.as_u64()),
        incoming.images.iter().map(|img| img.id.as_u64()).min(),
    )?;
    let annotation_rebase = IdRebase::new(
        "annotation",
        base.max_annotation_id().map(|id| id.as_u64()),
        incoming
            .annotations
            .iter()
            .filter_map(|ann| ann.id.map(|id| id.as_u64()))
            .min(),
    )?;

    let mut merged = base.clone();
    let mut stats = MergeStats {
        base_images: base.images.len(),
        base_annotations: base.annotations.len(),
        incoming_images: incoming.images.len(),
        incoming_annotations: incoming.annotations.len(),
        first_image_id: image_rebase.start,
        first_annotation_id: annotation_rebase.start,
        ..Default::default()
    };

    let mut file_names: HashSet<String> =
        base.images.iter().map(|img| img.file_name.clone()).collect();
    let mut image_map: HashMap<ImageId, ImageId> = HashMap::with_capacity(incoming.images.len());

    for image in &incoming.images {
        let new_id = ImageId::new(image_rebase.apply(image.id.as_u64())?);
        if image_map.insert(image.id, new_id).is_some() {
            return Err(CurateError::ReferentialIntegrity {
                message: format!("incoming image id {} appears more than once", image.id),
            });
        }

        let renamed = rename(&image.file_name);
        if !file_names.insert(renamed.clone()) {
            return Err(CurateError::FileNameCollision { file_name: renamed });
        }

        let mut remapped = image.clone();
        remapped.id = new_id;
        remapped.file_name = renamed.clone();
        remapped.source = Some(opts.source_tag.clone());
        merged.images.push(remapped);

        stats.renamed_files.push(RenamedFile {
            original: image.file_name.clone(),
            renamed,
        });
    }

    let mut seen_annotations: HashSet<AnnotationId> = HashSet::new();
    for (index, ann) in incoming.annotations.iter().enumerate() {
        let old_id = ann.id.ok_or_else(|| CurateError::ReferentialIntegrity {
            message: format!("incoming annotation at index {index} has no id"),
        })?;
        if !seen_annotations.insert(old_id) {
            return Err(CurateError::ReferentialIntegrity {
                message: format!("incoming annotation id {old_id} appears more than once"),
            });
        }

        let old_image_id = ann.image_id.ok_or_else(|| CurateError::ReferentialIntegrity {
            message: format!("incoming annotation {old_id} has no image_id"),
        })?;
        let new_image_id =
            image_map
                .get(&old_image_id)
                .copied()
                .ok_or_else(|| CurateError::ReferentialIntegrity {
                    message: format!(
                        "incoming annotation {old_id} references image {old_image_id}, \
                         which is not in the incoming collection"
                    ),
                })?;

        let new_id = AnnotationId::new(annotation_rebase.apply(old_id.as_u64())?);

        let mut remapped = ann.clone();
        remapped.id = Some(new_id);
        remapped.image_id = Some(new_image_id);
        remapped.iscrowd = Some(ann.iscrowd.unwrap_or(0));
        merged.annotations.push(remapped);
    }

    stats.merged_images = merged.images.len();
    stats.merged_annotations = merged.annotations.len();

    let names = merged.category_names();
    for ann in &merged.annotations {
        *stats
            .by_category
            .entry(names.get(ann.category_id).to_string())
            .or_insert(0) += 1;
    }

    Ok((merged, stats))
}

/// Checks that both collections define the same `(id, name)` categories.
pub fn check_categories(base: &Collection, incoming: &Collection) -> Result<(), CurateError> {
    let left: BTreeSet<(u64, &str)> = base
        .categories
        .iter()
        .map(|c| (c.id.as_u64(), c.name.as_str()))
        .collect();
    let right: BTreeSet<(u64, &str)> = incoming
        .categories
        .iter()
        .map(|c| (c.id.as_u64(), c.name.as_str()))
        .collect();

    if left == right {
        return Ok(());
    }

    let describe = |set: Vec<&(u64, &str)>| {
        set.iter()
            .map(|(id, name)| format!("{id}:{name}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    Err(CurateError::CategoryMismatch {
        message: format!(
            "only in base [{}], only in incoming [{}]",
            describe(left.difference(&right).collect()),
            describe(right.difference(&left).collect()),
        ),
    })
}

/// Shift of one id kind: the smallest incoming id maps to `start`.
#[derive(Clone, Copy, Debug)]
struct IdRebase {
    kind: &'static str,
    start: u64,
    incoming_min: u64,
}

impl IdRebase {
    fn new(
        kind: &'static str,
        base_max: Option<u64>,
        incoming_min: Option<u64>,
    ) -> Result<Self, CurateError> {
        let base_max = base_max.unwrap_or(0);
        let start = base_max
            .checked_add(1)
            .ok_or(CurateError::IdOverflow { kind, id: base_max })?;
        Ok(Self {
            kind,
            start,
            incoming_min: incoming_min.unwrap_or(0),
        })
    }

    /// `old` must not be below the incoming minimum.
    fn apply(&self, old: u64) -> Result<u64, CurateError> {
        self.start
            .checked_add(old - self.incoming_min)
            .ok_or(CurateError::IdOverflow {
                kind: self.kind,
                id: old,
            })
    }
}
