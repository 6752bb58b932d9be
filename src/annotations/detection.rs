use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A box with the class the detector assigned to it and its confidence in that class.
///
/// The same type flows through every stage. Before unmapping the box lives in letterboxed
/// model-input space; after `unmap` it is in original-image pixels.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Detection {
    pub annotation: BoundingBox,
    pub confidence: f32,
    pub class_id: usize,
}

impl BoundingBoxGeometry for Detection {
    fn left(&self) -> f32 {
        self.annotation.left()
    }

    fn top(&self) -> f32 {
        self.annotation.top()
    }

    fn width(&self) -> f32 {
        self.annotation.width()
    }

    fn height(&self) -> f32 {
        self.annotation.height()
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Detection {{ class_id: {}, confidence: {:.3}, {} }}",
            self.class_id, self.confidence, self.annotation
        )
    }
}
