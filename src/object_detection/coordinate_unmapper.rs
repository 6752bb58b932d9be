use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::detection::Detection;
use crate::annotations::point::Point;
use crate::image_utils::padding::TransformParams;

/// Maps detections from letterboxed input space back to original-image pixels.
///
/// The top-left corner goes through the inverse letterbox transform, the width and height
/// are only divided by the scale. Boxes are not clamped: a detection that hangs over the
/// frame edge keeps its out-of-frame extent. Callers that need in-frame boxes (drawing,
/// cropping) use `clamp_to_image` themselves.
pub fn unmap(detections: Vec<Detection>, params: &TransformParams) -> Vec<Detection> {
    detections
        .into_iter()
        .map(|det| {
            let origin = params.inverse_point(Point::new(det.left(), det.top()));
            Detection {
                annotation: BoundingBox::new(
                    origin.x,
                    origin.y,
                    params.inverse_length(det.width()),
                    params.inverse_length(det.height()),
                ),
                ..det
            }
        })
        .collect()
}

/// Clips a detection's box to `[0, width] x [0, height]`.
///
/// A box entirely outside the frame collapses to zero width or height. A box with a
/// non-finite edge collapses to an empty box at the origin.
pub fn clamp_to_image(detection: &Detection, width: u32, height: u32) -> Detection {
    let (l, t, r, b) = detection.as_xyxy();
    if ![l, t, r, b].iter().all(|v| v.is_finite()) {
        return Detection {
            annotation: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            ..*detection
        };
    }
    let (w, h) = (width as f32, height as f32);
    let left = l.max(0.0).min(w);
    let top = t.max(0.0).min(h);
    let right = r.min(w).max(left);
    let bottom = b.min(h).max(top);
    Detection {
        annotation: BoundingBox::new(left, top, right - left, bottom - top),
        ..*detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection {
            annotation: BoundingBox::new(x, y, w, h),
            confidence: 0.9,
            class_id: 3,
        }
    }

    #[test]
    fn subtracts_padding_then_divides_by_scale() {
        let params = TransformParams {
            scale: 2.0,
            pad_x: 10.0,
            pad_y: 20.5,
            target_size: 640,
        };
        let out = unmap(vec![det(30.0, 40.5, 8.0, 6.0)], &params);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].annotation, BoundingBox::new(10.0, 10.0, 4.0, 3.0));
        assert_eq!(out[0].confidence, 0.9);
        assert_eq!(out[0].class_id, 3);
    }

    #[test]
    fn out_of_frame_boxes_are_not_clamped() {
        let params = TransformParams {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 100.0,
            target_size: 640,
        };
        let out = unmap(vec![det(-5.0, 50.0, 20.0, 20.0)], &params);
        assert_eq!(out[0].annotation, BoundingBox::new(-5.0, -50.0, 20.0, 20.0));
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let clamped = clamp_to_image(&det(-5.0, -50.0, 20.0, 80.0), 100, 100);
        assert_eq!(clamped.annotation, BoundingBox::new(0.0, 0.0, 15.0, 30.0));

        let outside = clamp_to_image(&det(150.0, 10.0, 20.0, 20.0), 100, 100);
        assert_eq!(outside.width(), 0.0);
        assert_eq!(outside.left(), 100.0);

        let inside = det(10.0, 10.0, 20.0, 20.0);
        assert_eq!(clamp_to_image(&inside, 100, 100), inside);
    }

    #[test]
    fn clamp_collapses_non_finite_boxes() {
        for bad in [
            det(f32::NAN, 45.0, 10.0, 10.0),
            det(10.0, 10.0, f32::INFINITY, 10.0),
            det(10.0, f32::NEG_INFINITY, 10.0, 10.0),
        ] {
            let clamped = clamp_to_image(&bad, 100, 100);
            assert_eq!(clamped.annotation, BoundingBox::new(0.0, 0.0, 0.0, 0.0));
            assert_eq!(clamped.confidence, bad.confidence);
        }
    }

    #[test]
    fn preserves_order() {
        let params = TransformParams {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 0.0,
            target_size: 640,
        };
        let out = unmap(
            vec![det(1.0, 0.0, 1.0, 1.0), det(0.0, 0.0, 1.0, 1.0)],
            &params,
        );
        assert_eq!(out[0].left(), 2.0);
        assert_eq!(out[1].left(), 0.0);
    }
}
