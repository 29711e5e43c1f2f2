//! Curation settings.
//!
//! Defaults describe the usual dataset layout: one directory per split
//! under the dataset root, each holding its images and a
//! `_annotations.coco.json`. A YAML file can override any subset of the
//! fields; command-line flags are applied on top by the CLI.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CurateError;

/// Settings shared by every curation command.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurateConfig {
    /// Dataset root holding one directory per split.
    pub root: PathBuf,

    pub splits: Vec<String>,

    /// Annotation file name inside each split directory.
    pub annotation_file: String,

    /// Smallest annotation area kept by `filter` and accepted by `validate`.
    pub min_area: f64,

    /// Extensions counted as image files when listing a split directory.
    pub image_extensions: Vec<String>,

    /// Version tag embedded in backup file names.
    pub backup_tag: String,

    pub max_listed_missing: usize,
}

impl Default for CurateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            splits: vec!["train".into(), "valid".into(), "test".into()],
            annotation_file: "_annotations.coco.json".into(),
            min_area: 1024.0,
            image_extensions: vec!["jpg".into(), "png".into()],
            backup_tag: "v7.0".into(),
            max_listed_missing: 5,
        }
    }
}

impl CurateConfig {
    /// Loads settings from a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, CurateError> {
        let text = fs::read_to_string(path).map_err(CurateError::Io)?;
        Self::from_yaml_str(&text).map_err(|source| CurateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document parses as null, not as an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Rejects settings no command can run with.
    pub fn validate(&self) -> Result<(), CurateError> {
        if self.splits.is_empty() {
            return Err(invalid("at least one split is required"));
        }

        let mut seen = HashSet::new();
        for split in &self.splits {
            if split.trim().is_empty() {
                return Err(invalid("split names must not be empty"));
            }
            if !seen.insert(split.as_str()) {
                return Err(invalid(format!("split '{}' is listed twice", split)));
            }
        }

        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(invalid(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }

        if self.backup_tag.trim().is_empty() {
            return Err(invalid("backup_tag must not be empty"));
        }

        if self.annotation_file.trim().is_empty() {
            return Err(invalid("annotation_file must not be empty"));
        }

        Ok(())
    }

    /// Directory of `split` under the dataset root.
    pub fn split_dir(&self, split: &str) -> PathBuf {
        self.root.join(split)
    }

    /// Annotation file of `split` under the dataset root.
    pub fn annotation_path(&self, split: &str) -> PathBuf {
        self.split_dir(split).join(&self.annotation_file)
    }
}

fn invalid(message: impl Into<String>) -> CurateError {
    CurateError::InvalidConfig {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CurateConfig::from_yaml_str("root: /data/vru\nmin_area: 256\n").unwrap();
        assert_eq!(config.root, PathBuf::from("/data/vru"));
        assert_eq!(config.min_area, 256.0);
        assert_eq!(config.splits, vec!["train", "valid", "test"]);
        assert_eq!(config.backup_tag, "v7.0");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            CurateConfig::from_yaml_str("  \n").unwrap(),
            CurateConfig::default()
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(CurateConfig::from_yaml_str("min_aera: 10\n").is_err());
    }

    #[test]
    fn test_yaml_file_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curate.yaml");
        fs::write(&path, "splits: [train\n").unwrap();

        match CurateConfig::from_yaml_file(&path) {
            Err(CurateError::ConfigParse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let ok = CurateConfig::default();
        assert!(ok.validate().is_ok());

        let cases = [
            CurateConfig {
                splits: vec![],
                ..ok.clone()
            },
            CurateConfig {
                splits: vec!["train".into(), "train".into()],
                ..ok.clone()
            },
            CurateConfig {
                min_area: f64::NAN,
                ..ok.clone()
            },
            CurateConfig {
                min_area: -1.0,
                ..ok.clone()
            },
            CurateConfig {
                backup_tag: " ".into(),
                ..ok.clone()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(CurateError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_paths() {
        let config = CurateConfig {
            root: PathBuf::from("/data"),
            ..Default::default()
        };
        assert_eq!(
            config.annotation_path("valid"),
            PathBuf::from("/data/valid/_annotations.coco.json")
        );
    }
}
