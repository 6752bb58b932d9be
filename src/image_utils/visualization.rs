use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::Detection;
use crate::error::{PipelineError, Result};
use crate::object_detection::coordinate_unmapper::clamp_to_image;
use crate::object_detection::object_detection_utils::class_label;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET: i32 = 18;

/// Loads a TrueType/OpenType font for box captions.
pub fn load_font(filepath: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(filepath)?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| PipelineError::Font(format!("{}: {}", filepath.display(), e)))
}

/// Draws each detection as a rectangle, plus a `"<label> <score>"` caption when a font is
/// given.
///
/// Detections are clamped to the frame for drawing only. Boxes entirely outside the image,
/// and boxes with a non-finite coordinate, are skipped.
pub fn draw_detections(
    image: &mut RgbImage,
    detections: &[Detection],
    class_names: &[String],
    font: Option<&FontVec>,
) {
    let (width, height) = image.dimensions();
    for detection in detections {
        let (l, t, r, b) = detection.as_xyxy();
        if ![l, t, r, b].iter().all(|v| v.is_finite()) {
            tracing::warn!(%detection, "skipping detection with non-finite box");
            continue;
        }
        let clamped = clamp_to_image(detection, width, height);
        let left = clamped.left().floor() as i32;
        let top = clamped.top().floor() as i32;
        let box_width = clamped.width().round() as u32;
        let box_height = clamped.height().round() as u32;
        if box_width == 0 || box_height == 0 {
            continue;
        }

        for inset in 0..BOX_THICKNESS {
            let (w, h) = (
                box_width.saturating_sub(2 * inset as u32),
                box_height.saturating_sub(2 * inset as u32),
            );
            if w == 0 || h == 0 {
                break;
            }
            draw_hollow_rect_mut(
                image,
                Rect::at(left + inset, top + inset).of_size(w, h),
                BOX_COLOR,
            );
        }

        if let Some(font) = font {
            let caption = format!(
                "{} {:.2}",
                class_label(class_names, detection.class_id),
                detection.confidence
            );
            draw_text_mut(
                image,
                BOX_COLOR,
                left,
                (top - LABEL_OFFSET).max(0),
                PxScale::from(LABEL_FONT_SIZE),
                font,
                &caption,
            );
        }
    }
}
