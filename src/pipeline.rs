//! Per-split orchestration of the curation commands.
//!
//! Each command loads one collection per configured split, runs a pure
//! transformation over it, and in [`Mode::Apply`] carries out the side
//! effects: back up the annotation file, sync image files, write the new
//! collection. [`Mode::DryRun`] stops after the transformation and touches
//! nothing.
//!
//! A failure to load or write an annotation file aborts the whole run.
//! Backup and file-sync problems are counted and logged instead, with one
//! exception: an apply run refuses to start when a split already has a
//! backup under the configured tag that differs from its current annotation
//! file, since that version would otherwise be overwritten without a copy.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::collection::io_coco_json::{
    backup_path, ensure_backup, read_collection, write_collection, BackupOutcome,
};
use crate::config::CurateConfig;
use crate::error::CurateError;
use crate::filter::{filter_collection, min_area, FilterStats};
use crate::merge::{merge_collections, MergeOptions, MergeStats};
use crate::partition::{partition_collection, source_is, PartitionStats};
use crate::sync::{copy_files, delete_files, list_image_files, CopyCounts, DeleteCounts};
use crate::validation::{validate_collection, ValidateOptions, ValidationReport};

/// Whether a command only reports or also writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    DryRun,
    Apply,
}

impl Mode {
    pub fn is_apply(self) -> bool {
        self == Mode::Apply
    }
}

/// Side effects carried out for one split in apply mode.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Effects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied: Option<CopyCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DeleteCounts>,
    /// Annotation files written, in write order.
    pub written: Vec<String>,
}

/// What a command did to one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitOutcome<S> {
    pub split: String,
    pub stats: S,
    /// `None` in dry-run mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl<S: fmt::Display> fmt::Display for SplitOutcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.split)?;
        write!(f, "{}", self.stats)?;

        let Some(effects) = &self.effects else {
            return writeln!(f, "  dry run: no files changed");
        };
        if let Some(backup) = &effects.backup {
            writeln!(f, "  backup: {}", backup)?;
        }
        if let Some(copied) = &effects.copied {
            writeln!(f, "  images copied: {}", copied)?;
        }
        if let Some(deleted) = &effects.deleted {
            writeln!(f, "  images deleted: {}", deleted)?;
        }
        for path in &effects.written {
            writeln!(f, "  wrote {}", path)?;
        }
        Ok(())
    }
}

/// Validation result for one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitValidation {
    pub split: String,
    pub ok: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub report: ValidationReport,
}

impl fmt::Display for SplitValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.is_clean() {
            return writeln!(f, "[{}] ok: no issues found", self.split);
        }

        writeln!(
            f,
            "[{}] {}: {} error(s), {} warning(s)",
            self.split,
            if self.ok { "ok" } else { "FAILED" },
            self.error_count,
            self.warning_count
        )?;
        for issue in &self.report.issues {
            writeln!(f, "  [{}] {}", self.split, issue)?;
        }
        Ok(())
    }
}

/// Fails if any split has a backup under `config.backup_tag` whose content
/// differs from the split's current annotation file.
fn check_backup_tag(config: &CurateConfig) -> Result<(), CurateError> {
    for split in &config.splits {
        let path = config.annotation_path(split);
        let backup = backup_path(&path, &config.backup_tag);
        if !backup.exists() {
            continue;
        }

        let read = |p: &Path| {
            fs::read(p).map_err(|source| CurateError::CollectionRead {
                path: p.to_path_buf(),
                source,
            })
        };
        if read(backup.as_path())? != read(path.as_path())? {
            return Err(CurateError::BackupConflict { path: backup });
        }
    }
    Ok(())
}

/// Fails if `other` is the same directory as `split_dir`.
fn check_distinct_dir(split_dir: &Path, other: &Path, role: &str) -> Result<(), CurateError> {
    if let (Ok(split_dir), Ok(other_dir)) = (fs::canonicalize(split_dir), fs::canonicalize(other)) {
        if split_dir == other_dir {
            return Err(CurateError::InvalidConfig {
                message: format!(
                    "{} {} is the split directory itself",
                    role,
                    other.display()
                ),
            });
        }
    }
    Ok(())
}

/// Drops annotations smaller than `config.min_area`, and the images left
/// without annotations, from every split.
///
/// Apply: backup, write the filtered collection, delete the dropped image
/// files.
pub fn run_filter(
    config: &CurateConfig,
    mode: Mode,
) -> Result<Vec<SplitOutcome<FilterStats>>, CurateError> {
    if mode.is_apply() {
        check_backup_tag(config)?;
    }
    let mut outcomes = Vec::with_capacity(config.splits.len());

    for split in &config.splits {
        let path = config.annotation_path(split);
        let collection = read_collection(&path)?;
        info!(
            "{}: loaded {} images, {} annotations",
            split,
            collection.images.len(),
            collection.annotations.len()
        );

        let (filtered, stats) = filter_collection(&collection, min_area(config.min_area));

        let effects = if mode.is_apply() {
            let mut effects = Effects {
                backup: Some(ensure_backup(&path, &config.backup_tag)),
                ..Default::default()
            };
            write_collection(&path, &filtered)?;
            effects.written.push(path.display().to_string());

            let removed = stats.removed_image_files.iter().map(String::as_str);
            effects.deleted = Some(delete_files(&config.split_dir(split), removed));
            Some(effects)
        } else {
            None
        };

        outcomes.push(SplitOutcome {
            split: split.clone(),
            stats,
            effects,
        });
    }

    Ok(outcomes)
}

/// Moves the images tagged `source`, with their annotations, out of every
/// split into `output_root/<split>/`.
///
/// Apply: backup, copy the extracted images out, write the extracted
/// collection, delete the extracted images from the split, write the
/// remainder.
pub fn run_extract(
    config: &CurateConfig,
    source: &str,
    output_root: &Path,
    mode: Mode,
) -> Result<Vec<SplitOutcome<PartitionStats>>, CurateError> {
    for split in &config.splits {
        check_distinct_dir(&config.split_dir(split), &output_root.join(split), "output")?;
    }
    if mode.is_apply() {
        check_backup_tag(config)?;
    }
    let mut outcomes = Vec::with_capacity(config.splits.len());

    for split in &config.splits {
        let path = config.annotation_path(split);
        let collection = read_collection(&path)?;

        let (remainder, extracted, stats) = partition_collection(&collection, source_is(source));
        info!(
            "{}: {} of {} images tagged '{}'",
            split, stats.extracted_images, stats.original_images, source
        );

        let effects = if mode.is_apply() {
            let split_dir = config.split_dir(split);
            let out_dir = output_root.join(split);
            let out_path = out_dir.join(&config.annotation_file);

            let mut effects = Effects {
                backup: Some(ensure_backup(&path, &config.backup_tag)),
                ..Default::default()
            };
            let pairs = stats
                .extracted_files
                .iter()
                .map(|name| (name.as_str(), name.as_str()));
            effects.copied = Some(copy_files(&split_dir, &out_dir, pairs));
            write_collection(&out_path, &extracted)?;
            effects.written.push(out_path.display().to_string());

            let names = stats.extracted_files.iter().map(String::as_str);
            effects.deleted = Some(delete_files(&split_dir, names));
            write_collection(&path, &remainder)?;
            effects.written.push(path.display().to_string());
            Some(effects)
        } else {
            None
        };

        outcomes.push(SplitOutcome {
            split: split.clone(),
            stats,
            effects,
        });
    }

    Ok(outcomes)
}

/// Merges `incoming_root/<split>/` into every split.
///
/// Apply: backup, copy the incoming images under their new names, write the
/// merged collection. A split whose merge fails aborts the run before
/// anything of that split is written.
pub fn run_merge<R>(
    config: &CurateConfig,
    incoming_root: &Path,
    opts: &MergeOptions,
    rename: R,
    mode: Mode,
) -> Result<Vec<SplitOutcome<MergeStats>>, CurateError>
where
    R: Fn(&str) -> String,
{
    for split in &config.splits {
        check_distinct_dir(&config.split_dir(split), &incoming_root.join(split), "incoming")?;
    }
    if mode.is_apply() {
        check_backup_tag(config)?;
    }
    let mut outcomes = Vec::with_capacity(config.splits.len());

    for split in &config.splits {
        let path = config.annotation_path(split);
        let incoming_dir = incoming_root.join(split);

        let base = read_collection(&path)?;
        let incoming = read_collection(&incoming_dir.join(&config.annotation_file))?;

        let (merged, stats) = merge_collections(&base, &incoming, opts, &rename)?;
        info!(
            "{}: merging {} images from '{}', new image ids from {}",
            split, stats.incoming_images, opts.source_tag, stats.first_image_id
        );

        let effects = if mode.is_apply() {
            let mut effects = Effects {
                backup: Some(ensure_backup(&path, &config.backup_tag)),
                ..Default::default()
            };
            let pairs = stats
                .renamed_files
                .iter()
                .map(|file| (file.original.as_str(), file.renamed.as_str()));
            effects.copied = Some(copy_files(&incoming_dir, &config.split_dir(split), pairs));
            write_collection(&path, &merged)?;
            effects.written.push(path.display().to_string());
            Some(effects)
        } else {
            None
        };

        outcomes.push(SplitOutcome {
            split: split.clone(),
            stats,
            effects,
        });
    }

    Ok(outcomes)
}

/// Validates every split against its own image directory.
pub fn run_validate(config: &CurateConfig) -> Result<Vec<SplitValidation>, CurateError> {
    let opts = ValidateOptions {
        min_area: config.min_area,
        max_listed_missing: config.max_listed_missing,
    };
    let mut results = Vec::with_capacity(config.splits.len());

    for split in &config.splits {
        let collection = read_collection(&config.annotation_path(split))?;
        let split_dir = config.split_dir(split);

        let report = validate_collection(
            &collection,
            || list_image_files(&split_dir, &config.image_extensions),
            &opts,
        );
        if !report.is_ok() {
            warn!("{}: {} validation error(s)", split, report.error_count());
        }

        results.push(SplitValidation {
            split: split.clone(),
            ok: report.is_ok(),
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Annotation, Category, Collection, Image};

    fn write_split(root: &Path, split: &str, collection: &Collection, files: &[&str]) {
        let dir = root.join(split);
        std::fs::create_dir_all(&dir).unwrap();
        for name in files {
            std::fs::write(dir.join(name), b"img").unwrap();
        }
        write_collection(&dir.join("_annotations.coco.json"), collection).unwrap();
    }

    fn config(root: &Path) -> CurateConfig {
        CurateConfig {
            root: root.to_path_buf(),
            splits: vec!["train".into()],
            ..Default::default()
        }
    }

    fn sample() -> Collection {
        Collection::new(
            vec![Category::new(1u64, "pedestrian")],
            vec![
                Image::new(1u64, "a.jpg", 640, 480),
                Image::new(2u64, "b.jpg", 640, 480),
            ],
            vec![
                Annotation::new(1u64, 1u64, 1u64, [0.0, 0.0, 10.0, 10.0], 100.0),
                Annotation::new(2u64, 2u64, 1u64, [0.0, 0.0, 50.0, 50.0], 2500.0),
            ],
        )
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", &sample(), &["a.jpg", "b.jpg"]);
        let config = config(dir.path());
        let before = std::fs::read(config.annotation_path("train")).unwrap();

        let outcomes = run_filter(&config, Mode::DryRun).unwrap();
        assert_eq!(outcomes[0].stats.removed_images, 1);
        assert!(outcomes[0].effects.is_none());

        assert_eq!(std::fs::read(config.annotation_path("train")).unwrap(), before);
        assert!(dir.path().join("train/a.jpg").exists());
    }

    #[test]
    fn test_filter_apply_backs_up_writes_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", &sample(), &["a.jpg", "b.jpg"]);
        let config = config(dir.path());

        let outcomes = run_filter(&config, Mode::Apply).unwrap();
        let effects = outcomes[0].effects.as_ref().unwrap();
        assert!(matches!(effects.backup, Some(BackupOutcome::Created { .. })));
        assert_eq!(effects.deleted.unwrap().deleted, 1);

        let written = read_collection(&config.annotation_path("train")).unwrap();
        assert_eq!(written.images.len(), 1);
        assert!(dir.path().join("train/_annotations.coco.v7.0.json").exists());
        assert!(!dir.path().join("train/a.jpg").exists());

        let validation = run_validate(&config).unwrap();
        assert!(validation[0].ok, "{}", validation[0]);
    }

    #[test]
    fn test_matching_backup_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", &sample(), &["a.jpg", "b.jpg"]);
        let config = config(dir.path());
        let path = config.annotation_path("train");
        std::fs::copy(&path, backup_path(&path, "v7.0")).unwrap();

        let outcomes = run_filter(&config, Mode::Apply).unwrap();
        let effects = outcomes[0].effects.as_ref().unwrap();
        assert!(matches!(effects.backup, Some(BackupOutcome::AlreadyExists { .. })));
    }

    #[test]
    fn test_stale_backup_blocks_apply() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", &sample(), &["a.jpg", "b.jpg"]);
        let config = config(dir.path());
        run_filter(&config, Mode::Apply).unwrap();
        let filtered = std::fs::read(config.annotation_path("train")).unwrap();

        let err = run_filter(&config, Mode::Apply).unwrap_err();
        assert!(matches!(err, CurateError::BackupConflict { .. }), "{err}");
        assert_eq!(std::fs::read(config.annotation_path("train")).unwrap(), filtered);

        // Dry runs never write, so they are not blocked.
        assert!(run_filter(&config, Mode::DryRun).is_ok());
    }

    #[test]
    fn test_missing_split_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_validate(&config(dir.path())).unwrap_err();
        assert!(matches!(err, CurateError::CollectionRead { .. }), "{err}");
    }
}
