use crate::backbone::feature_heatmap::preprocess_for_backbone;
use crate::config::{BackboneConfig, TextOverlayConfig};
use crate::error::{PipelineError, Result};
use crate::object_detection::object_detection_model::ForwardPass;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use ndarray::{Array2, ArrayViewD};

/// Highest overlay opacity, reached at probability 1.0.
const MAX_OVERLAY_ALPHA: f32 = 200.0;
const OVERLAY_COLOR: [u8; 3] = [255, 0, 0];

/// Result of one text-detection pass.
#[derive(Debug)]
pub struct TextOverlay {
    /// Model-resolution pixels whose text probability is above the threshold.
    pub text_pixels: usize,
    /// The input image with the overlay composited on top. `None` when no pixel passed.
    pub image: Option<RgbImage>,
}

/// Squeezes a `[1, 1, H, W]`, `[1, H, W]` or `[H, W]` output down to its probability map.
pub fn probability_map(output: ArrayViewD<f32>) -> Result<Array2<f32>> {
    let shape = output.shape().to_vec();
    let rank = shape.len();
    if !(2..=4).contains(&rank) || shape[..rank - 2].iter().any(|&d| d != 1) {
        return Err(PipelineError::ShapeMismatch(format!(
            "expected a single-channel probability map [1, 1, H, W], got shape {:?}",
            shape
        )));
    }
    let (height, width) = (shape[rank - 2], shape[rank - 1]);
    let map = output
        .to_shape((height, width))
        .map_err(|e| PipelineError::ShapeMismatch(e.to_string()))?;
    Ok(map.to_owned())
}

pub fn count_text_pixels(probabilities: &Array2<f32>, threshold: f32) -> usize {
    probabilities.iter().filter(|&&p| p > threshold).count()
}

/// Paints every pixel above `threshold` red with alpha `floor(p * 200)`. The rest stay
/// fully transparent.
pub fn probability_overlay(probabilities: &Array2<f32>, threshold: f32) -> RgbaImage {
    let (rows, cols) = probabilities.dim();
    RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
        let p = probabilities[[y as usize, x as usize]];
        if p > threshold {
            let alpha = (p * MAX_OVERLAY_ALPHA).floor().clamp(0.0, 255.0) as u8;
            let [r, g, b] = OVERLAY_COLOR;
            Rgba([r, g, b, alpha])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Stretches the overlay to the image size and alpha-blends it on top.
pub fn composite_overlay(image: &RgbImage, overlay: &RgbaImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let overlay = imageops::resize(overlay, width, height, FilterType::Triangle);
    let mut canvas = DynamicImage::ImageRgb8(image.clone()).into_rgba8();
    imageops::overlay(&mut canvas, &overlay, 0, 0);
    DynamicImage::ImageRgba8(canvas).into_rgb8()
}

/// Runs a text-detection model and marks where it believes text is.
///
/// The image is stretched to a square (no letterbox) and ImageNet-normalized, the same
/// preprocessing as the segmentation backbone. The first output is read as a per-pixel
/// text probability.
pub fn run_text_overlay<M: ForwardPass + ?Sized>(
    model: &mut M,
    image: &RgbImage,
    config: &TextOverlayConfig,
) -> Result<TextOverlay> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let input = preprocess_for_backbone(
        image,
        &BackboneConfig {
            input_width: config.input_size,
            input_height: config.input_size,
        },
    );
    let output = model.forward_pass(input.view())?;
    let probabilities = probability_map(output.view())?;

    let text_pixels = count_text_pixels(&probabilities, config.threshold);
    tracing::debug!(
        text_pixels,
        threshold = config.threshold,
        "thresholded text probability map"
    );
    if text_pixels == 0 {
        return Ok(TextOverlay {
            text_pixels,
            image: None,
        });
    }

    let overlay = probability_overlay(&probabilities, config.threshold);
    Ok(TextOverlay {
        text_pixels,
        image: Some(composite_overlay(image, &overlay)),
    })
}
