//! The annotation collection shared by every curation step.
//!
//! A [`Collection`] holds one split's categories, images and annotations,
//! plus whatever extra top-level keys the source file carried. Every
//! transformation takes a collection by reference and returns a new one;
//! nothing here mutates its input.
//!
//! # Example
//!
//! ```
//! use cococurate::collection::{Annotation, Category, Collection, Image};
//!
//! let collection = Collection::new(
//!     vec![Category::new(1u64, "pedestrian")],
//!     vec![Image::new(1u64, "frame_0001.jpg", 1920, 1080).with_source("nuimages")],
//!     vec![Annotation::new(1u64, 1u64, 1u64, [10.0, 20.0, 64.0, 128.0], 8192.0)],
//! );
//! assert_eq!(collection.images[0].source_tag(), "nuimages");
//! ```

mod ids;
pub mod io_coco_json;
mod model;

pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{
    Annotation, AnnotationField, Category, CategoryNames, Collection, Extensions, Image, UNKNOWN,
};
