use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned box in top-left/size form.
///
/// The convention is the usual one for images: x grows to the right and y grows downwards,
/// with (0, 0) the top-left pixel. Boxes are not validated on construction. A detector can
/// emit a zero or negative extent and the geometry below treats such a box as having no area
/// rather than refusing it.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct BoundingBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from the center/size form YOLO heads emit.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        BoundingBox::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

/// Shared geometry for anything that carries a rectangle.
pub trait BoundingBoxGeometry {
    fn left(&self) -> f32;
    fn top(&self) -> f32;
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    fn right(&self) -> f32 {
        self.left() + self.width()
    }

    fn bottom(&self) -> f32 {
        self.top() + self.height()
    }

    /// Area, with non-positive extents counted as zero.
    fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    fn center(&self) -> (f32, f32) {
        (
            self.left() + self.width() / 2.0,
            self.top() + self.height() / 2.0,
        )
    }

    fn as_xyxy(&self) -> (f32, f32, f32, f32) {
        (self.left(), self.top(), self.right(), self.bottom())
    }

    /// Intersection over union. Returns 0 whenever the union is not positive, so two
    /// degenerate boxes never divide by zero.
    fn intersection_over_union<G: BoundingBoxGeometry + ?Sized>(&self, other: &G) -> f32 {
        let inter_w = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let inter_h = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        let intersection = inter_w * inter_h;
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn left(&self) -> f32 {
        self.x
    }

    fn top(&self) -> f32 {
        self.y
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BoundingBox {{ x: {}, y: {}, w: {}, h: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}
