//! Reading and writing collections as COCO JSON documents.
//!
//! A document is one JSON object with `categories`, `images` and
//! `annotations` arrays. Any other top-level key (`info`, `licenses`, ...)
//! is kept in [`Collection::extensions`] and written back as-is.
//!
//! Writes never leave a half-written file behind: the document is
//! serialized into a temporary file next to the destination and then
//! renamed over it. Before a split's annotation file is overwritten, the
//! caller takes a version-tagged backup with [`ensure_backup`]; an existing
//! backup is never replaced.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use tempfile::NamedTempFile;

use super::model::Collection;
use crate::error::CurateError;

/// Reads a collection from a COCO JSON file.
///
/// # Errors
/// Returns [`CurateError::CollectionRead`] if the file cannot be opened and
/// [`CurateError::MalformedCollection`] if it is not a JSON object with the
/// three required arrays.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cococurate::collection::io_coco_json::read_collection;
///
/// let collection = read_collection(Path::new("train/_annotations.coco.json"))?;
/// # Ok::<(), cococurate::CurateError>(())
/// ```
pub fn read_collection(path: &Path) -> Result<Collection, CurateError> {
    let file = File::open(path).map_err(|source| CurateError::CollectionRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CurateError::MalformedCollection {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a collection to `path`, replacing any existing file in one step.
pub fn write_collection(path: &Path, collection: &Collection) -> Result<(), CurateError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(CurateError::Io)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        serde_json::to_writer(&mut writer, collection).map_err(|source| {
            CurateError::CollectionWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(CurateError::Io)?;
    }

    staged
        .persist(path)
        .map_err(|err| CurateError::Io(err.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Parses a collection from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_collection_str(json: &str) -> Result<Collection, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a collection from raw bytes.
pub fn from_collection_slice(bytes: &[u8]) -> Result<Collection, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Serializes a collection to a compact JSON string.
pub fn to_collection_string(collection: &Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string(collection)
}

/// Path of the backup taken before `path` is overwritten.
///
/// `_annotations.coco.json` with tag `v7.0` becomes
/// `_annotations.coco.v7.0.json`; a name without a `.json` suffix simply
/// gets `.<tag>` appended.
pub fn backup_path(path: &Path, tag: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let backup_name = match file_name.strip_suffix(".json") {
        Some(stem) => format!("{stem}.{tag}.json"),
        None => format!("{file_name}.{tag}"),
    };
    path.with_file_name(backup_name)
}

/// What [`ensure_backup`] did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupOutcome {
    /// A new backup was written.
    Created { path: PathBuf },
    /// A backup with this tag was already present and left untouched.
    AlreadyExists { path: PathBuf },
    /// The copy failed; nothing was written.
    Failed { path: PathBuf, reason: String },
}

impl fmt::Display for BackupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupOutcome::Created { path } => write!(f, "created {}", path.display()),
            BackupOutcome::AlreadyExists { path } => {
                write!(f, "kept existing {}", path.display())
            }
            BackupOutcome::Failed { path, reason } => {
                write!(f, "failed for {} ({})", path.display(), reason)
            }
        }
    }
}

/// Copies `path` to its version-tagged backup unless that backup exists.
///
/// Failure to copy is reported in the outcome rather than as an error.
pub fn ensure_backup(path: &Path, tag: &str) -> BackupOutcome {
    let target = backup_path(path, tag);
    if target.exists() {
        return BackupOutcome::AlreadyExists { path: target };
    }

    match fs::copy(path, &target) {
        Ok(_) => BackupOutcome::Created { path: target },
        Err(err) => {
            warn!(
                "could not back up {} to {}: {}",
                path.display(),
                target.display(),
                err
            );
            BackupOutcome::Failed {
                path: target,
                reason: err.to_string(),
            }
        }
    }
}
