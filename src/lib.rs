//! Inference over exported vision backbones.
//!
//! The detector path letterboxes an image, runs the exported graph, and turns the raw
//! prediction grid into deduplicated boxes in original-image pixels. The segmentation
//! backbone path renders the backbone's deepest feature map as a heatmap, and the text
//! detector path paints a per-pixel text probability map over the image.

pub mod annotations;
pub mod backbone;
pub mod config;
pub mod error;
pub mod image_utils;
pub mod logging;
pub mod object_detection;

pub use annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
pub use annotations::detection::Detection;
pub use config::{BackboneConfig, PipelineConfig, TextOverlayConfig};
pub use error::{PipelineError, Result};
pub use image_utils::padding::TransformParams;
pub use object_detection::object_detection_model::ForwardPass;
pub use object_detection::pipeline::{postprocess, run_detection_pipeline};
