use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in pixel space.
///
/// Which pixel space depends on where the point came from: the original image or the
/// letterboxed model input. `TransformParams` converts between the two.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
