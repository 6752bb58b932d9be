use crate::annotations::point::Point;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::Serialize;

/// How an image is fitted into the model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxOptions {
    pub target_size: u32,
    pub stride: u32,
    /// Pad only up to the next multiple of `stride` instead of the full square.
    pub auto: bool,
    pub allow_upscale: bool,
    pub fill_color: [u8; 3],
}

impl From<&PipelineConfig> for LetterboxOptions {
    fn from(config: &PipelineConfig) -> Self {
        LetterboxOptions {
            target_size: config.target_size,
            stride: config.stride,
            auto: config.auto,
            allow_upscale: config.allow_upscale,
            fill_color: config.fill_color,
        }
    }
}

/// The forward letterbox mapping for one image.
///
/// `pad_x` and `pad_y` are half of the total padding on each axis, kept fractional. The
/// pixel placement of the resized image uses the rounded split, but unmapping always goes
/// through these values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TransformParams {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub target_size: u32,
}

impl TransformParams {
    /// Original-image point to model-input point.
    pub fn forward_point(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale + self.pad_x,
            point.y * self.scale + self.pad_y,
        )
    }

    /// Model-input point back to original-image point.
    pub fn inverse_point(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.pad_x) / self.scale,
            (point.y - self.pad_y) / self.scale,
        )
    }

    pub fn inverse_length(&self, length: f32) -> f32 {
        length / self.scale
    }
}

/// Resizes an image with its aspect ratio preserved and pads it onto a constant-colour
/// canvas.
///
/// The padding split follows the YOLO convention: half the padding on each side, with
/// `round(half - 0.1)` before and `round(half + 0.1)` after, so an odd padding puts the
/// extra pixel on the right or bottom edge.
pub fn letterbox(
    image: &RgbImage,
    options: &LetterboxOptions,
) -> Result<(RgbImage, TransformParams)> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "cannot letterbox an empty image ({}x{})",
            width, height
        )));
    }
    if options.target_size == 0 || options.stride == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "target_size ({}) and stride ({}) must be positive",
            options.target_size, options.stride
        )));
    }

    let target = options.target_size as f64;
    let mut scale = (target / height as f64).min(target / width as f64);
    if !options.allow_upscale {
        scale = scale.min(1.0);
    }

    let new_width = ((width as f64 * scale).round_ties_even() as u32).max(1);
    let new_height = ((height as f64 * scale).round_ties_even() as u32).max(1);

    let mut pad_width = options.target_size.saturating_sub(new_width);
    let mut pad_height = options.target_size.saturating_sub(new_height);
    if options.auto {
        pad_width %= options.stride;
        pad_height %= options.stride;
    }

    let half_pad_width = pad_width as f64 / 2.0;
    let half_pad_height = pad_height as f64 / 2.0;
    let (left, right) = split_padding(half_pad_width);
    let (top, bottom) = split_padding(half_pad_height);

    let resized = if (new_width, new_height) != (width, height) {
        imageops::resize(image, new_width, new_height, FilterType::Triangle)
    } else {
        image.clone()
    };

    let mut canvas = RgbImage::from_pixel(
        left + new_width + right,
        top + new_height + bottom,
        Rgb(options.fill_color),
    );
    imageops::replace(&mut canvas, &resized, left as i64, top as i64);

    tracing::debug!(
        width,
        height,
        scale,
        new_width,
        new_height,
        canvas_width = canvas.width(),
        canvas_height = canvas.height(),
        "letterboxed image"
    );

    let params = TransformParams {
        scale: scale as f32,
        pad_x: half_pad_width as f32,
        pad_y: half_pad_height as f32,
        target_size: options.target_size,
    };
    Ok((canvas, params))
}

fn split_padding(half: f64) -> (u32, u32) {
    let before = (half - 0.1).round().max(0.0) as u32;
    let after = (half + 0.1).round().max(0.0) as u32;
    (before, after)
}
