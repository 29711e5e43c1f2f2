//! In-memory model of a COCO-style annotation collection.
//!
//! Records are permissive: an annotation may be missing any of its
//! required fields so that the validator can count and report them
//! instead of the loader rejecting the whole file. Keys the model does
//! not know about are carried along in [`Extensions`] maps and written
//! back unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::ids::{AnnotationId, CategoryId, ImageId};

/// Opaque pass-through keys, kept verbatim on every derived collection.
pub type Extensions = serde_json::Map<String, serde_json::Value>;

/// Label used for a missing provenance tag or an unresolved category.
pub const UNKNOWN: &str = "unknown";

/// All categories, images and annotations of one dataset split.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub categories: Vec<Category>,

    pub images: Vec<Image>,

    pub annotations: Vec<Annotation>,

    /// Top-level keys such as `info` and `licenses`.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Collection {
    /// Builds a collection with no pass-through keys.
    pub fn new(
        categories: Vec<Category>,
        images: Vec<Image>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            categories,
            images,
            annotations,
            extensions: Extensions::new(),
        }
    }

    /// Returns an empty collection that shares this one's categories and
    /// pass-through keys. Transformations start from this shell.
    pub fn empty_like(&self) -> Self {
        Self {
            categories: self.categories.clone(),
            images: Vec::new(),
            annotations: Vec::new(),
            extensions: self.extensions.clone(),
        }
    }

    /// Index of category names by id.
    pub fn category_names(&self) -> CategoryNames<'_> {
        CategoryNames(
            self.categories
                .iter()
                .map(|c| (c.id, c.name.as_str()))
                .collect(),
        )
    }

    /// Largest image id, if there are any images.
    pub fn max_image_id(&self) -> Option<ImageId> {
        self.images.iter().map(|img| img.id).max()
    }

    /// Largest annotation id among annotations that carry one.
    pub fn max_annotation_id(&self) -> Option<AnnotationId> {
        self.annotations.iter().filter_map(|ann| ann.id).max()
    }
}

/// Category id to name lookup borrowed from a collection.
#[derive(Clone, Debug)]
pub struct CategoryNames<'a>(HashMap<CategoryId, &'a str>);

impl<'a> CategoryNames<'a> {
    /// Name for `id`, or `"unknown"` when the id is absent or unresolved.
    pub fn get(&self, id: Option<CategoryId>) -> &'a str {
        id.and_then(|id| self.0.get(&id).copied())
            .unwrap_or(UNKNOWN)
    }
}

/// A class label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    /// Other keys, e.g. `supercategory`.
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Extensions::new(),
        }
    }
}

/// An image record. The file itself lives next to the annotation file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,

    pub file_name: String,

    pub width: u32,

    pub height: u32,

    /// Upstream dataset the image came from (e.g. `rsud20k`, `nuimages`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(flatten)]
    pub extra: Extensions,
}

impl Image {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            source: None,
            extra: Extensions::new(),
        }
    }

    /// Sets the provenance tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The provenance tag, or `"unknown"` when absent.
    pub fn source_tag(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN)
    }
}

/// A bounding-box annotation.
///
/// Every field is optional at this level; see [`Annotation::missing_fields`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    /// COCO box: `[x, y, width, height]` in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iscrowd: Option<u8>,

    /// Other keys, e.g. `segmentation`.
    #[serde(flatten)]
    pub extra: Extensions,
}

impl Annotation {
    /// Creates a fully populated annotation. `area` is taken as given, not
    /// derived from the box.
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: [f64; 4],
        area: f64,
    ) -> Self {
        Self {
            id: Some(id.into()),
            image_id: Some(image_id.into()),
            category_id: Some(category_id.into()),
            bbox: Some(bbox),
            area: Some(area),
            iscrowd: None,
            extra: Extensions::new(),
        }
    }

    /// Sets the crowd flag.
    pub fn with_iscrowd(mut self, iscrowd: u8) -> Self {
        self.iscrowd = Some(iscrowd);
        self
    }

    /// Required fields this annotation lacks, in declaration order.
    pub fn missing_fields(&self) -> impl Iterator<Item = AnnotationField> + '_ {
        AnnotationField::REQUIRED
            .into_iter()
            .filter(move |field| !self.has(*field))
    }

    fn has(&self, field: AnnotationField) -> bool {
        match field {
            AnnotationField::Id => self.id.is_some(),
            AnnotationField::ImageId => self.image_id.is_some(),
            AnnotationField::CategoryId => self.category_id.is_some(),
            AnnotationField::BBox => self.bbox.is_some(),
            AnnotationField::Area => self.area.is_some(),
        }
    }
}

/// The annotation keys every record must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationField {
    Id,
    ImageId,
    CategoryId,
    BBox,
    Area,
}

impl AnnotationField {
    pub const REQUIRED: [AnnotationField; 5] = [
        AnnotationField::Id,
        AnnotationField::ImageId,
        AnnotationField::CategoryId,
        AnnotationField::BBox,
        AnnotationField::Area,
    ];

    /// The JSON key.
    pub fn key(self) -> &'static str {
        match self {
            AnnotationField::Id => "id",
            AnnotationField::ImageId => "image_id",
            AnnotationField::CategoryId => "category_id",
            AnnotationField::BBox => "bbox",
            AnnotationField::Area => "area",
        }
    }
}

impl fmt::Display for AnnotationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
