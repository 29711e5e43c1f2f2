//! Image file synchronization.
//!
//! Transformations only change annotation collections; these helpers keep
//! the image files on disk in step with them. Every operation is
//! idempotent and tolerant: a missing source or an I/O failure is counted,
//! logged, and skipped, never returned as an error.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

/// Result of a [`copy_files`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CopyCounts {
    pub copied: usize,
    /// Destination already present; left alone.
    pub skipped: usize,
    /// Source file not found.
    pub missing: usize,
    pub failed: usize,
}

impl fmt::Display for CopyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied, {} skipped, {} missing, {} failed",
            self.copied, self.skipped, self.missing, self.failed
        )
    }
}

/// Result of a [`delete_files`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeleteCounts {
    pub deleted: usize,
    /// Already gone.
    pub missing: usize,
    pub failed: usize,
}

impl fmt::Display for DeleteCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deleted, {} missing, {} failed",
            self.deleted, self.missing, self.failed
        )
    }
}

/// Names of the image files sitting directly in `dir`.
///
/// Only files whose extension matches one of `extensions` (case-insensitive)
/// are listed. Subdirectories are not descended into. A directory that
/// cannot be read lists as empty.
pub fn list_image_files(dir: &Path, extensions: &[String]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("skipping unreadable entry under {}: {}", dir.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names
}

fn has_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// Copies `(source_name, destination_name)` pairs from `src_dir` into
/// `dst_dir`, creating `dst_dir` if needed.
///
/// Existing destinations are never overwritten.
pub fn copy_files<'a, I>(src_dir: &Path, dst_dir: &Path, pairs: I) -> CopyCounts
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut counts = CopyCounts::default();

    if let Err(err) = fs::create_dir_all(dst_dir) {
        warn!("cannot create {}: {}", dst_dir.display(), err);
        counts.failed = pairs.into_iter().count();
        return counts;
    }

    for (src_name, dst_name) in pairs {
        let src = src_dir.join(src_name);
        let dst = dst_dir.join(dst_name);

        if dst.exists() {
            counts.skipped += 1;
            continue;
        }
        if !src.exists() {
            warn!("source image not found: {}", src.display());
            counts.missing += 1;
            continue;
        }

        match fs::copy(&src, &dst) {
            Ok(_) => counts.copied += 1,
            Err(err) => {
                warn!("failed to copy {} to {}: {}", src.display(), dst.display(), err);
                counts.failed += 1;
            }
        }
    }

    debug!("copy into {}: {}", dst_dir.display(), counts);
    counts
}

/// Deletes the named files from `dir`.
pub fn delete_files<'a, I>(dir: &Path, names: I) -> DeleteCounts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = DeleteCounts::default();

    for name in names {
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => counts.deleted += 1,
            Err(err) if err.kind() == ErrorKind::NotFound => counts.missing += 1,
            Err(err) => {
                warn!("failed to delete {}: {}", path.display(), err);
                counts.failed += 1;
            }
        }
    }

    debug!("delete from {}: {}", dir.display(), counts);
    counts
}
