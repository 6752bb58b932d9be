use crate::config::BackboneConfig;
use crate::error::{PipelineError, Result};
use crate::image_utils::image_conversion::{
    IMAGENET_MEAN, IMAGENET_STD, convert_rgb_image_to_normalized_nchw,
};
use crate::object_detection::object_detection_model::ForwardPass;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::{Array2, Array4, ArrayViewD, Axis, Ix4};

/// Resizes an image to the backbone input (no letterboxing) and applies ImageNet
/// normalization.
pub fn preprocess_for_backbone(image: &RgbImage, config: &BackboneConfig) -> Array4<f32> {
    let resized = imageops::resize(
        image,
        config.input_width,
        config.input_height,
        FilterType::Triangle,
    );
    convert_rgb_image_to_normalized_nchw(&resized, IMAGENET_MEAN, IMAGENET_STD)
}

/// Averages a `[1, channels, height, width]` feature map over its channels.
pub fn channel_mean(feature_map: ArrayViewD<f32>) -> Result<Array2<f32>> {
    let shape = feature_map.shape().to_vec();
    let feature_map = feature_map.into_dimensionality::<Ix4>().map_err(|_| {
        PipelineError::ShapeMismatch(format!(
            "expected a [1, C, H, W] feature map, got shape {:?}",
            shape
        ))
    })?;
    if shape[0] != 1 || shape[1] == 0 {
        return Err(PipelineError::ShapeMismatch(format!(
            "expected a single feature map with at least one channel, got shape {:?}",
            shape
        )));
    }
    feature_map
        .index_axis_move(Axis(0), 0)
        .mean_axis(Axis(0))
        .ok_or_else(|| PipelineError::ShapeMismatch("feature map has no channels".to_string()))
}

/// Min-max stretches values into `0..=255`. A constant map becomes all zeros.
pub fn normalize_to_u8(values: &Array2<f32>) -> GrayImage {
    let (rows, cols) = values.dim();
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = values[[y as usize, x as usize]];
        let scaled = if range > 0.0 {
            (v - min) / range * 255.0
        } else {
            0.0
        };
        Luma([scaled.round().clamp(0.0, 255.0) as u8])
    })
}

/// The classic jet colour map: dark blue through cyan, yellow and red.
pub fn jet_color(value: u8) -> Rgb<u8> {
    let t = value as f32 / 255.0;
    let channel = |offset: f32| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Turns the deepest feature map of a backbone into a colour heatmap of the given size.
///
/// Upscaling uses nearest-neighbour so each feature cell stays a visible block.
pub fn feature_heatmap(
    feature_map: ArrayViewD<f32>,
    output_width: u32,
    output_height: u32,
) -> Result<RgbImage> {
    let mean = channel_mean(feature_map)?;
    let gray = normalize_to_u8(&mean);
    let gray = imageops::resize(&gray, output_width, output_height, FilterType::Nearest);
    let mut heatmap = RgbImage::new(output_width, output_height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        heatmap.put_pixel(x, y, jet_color(pixel[0]));
    }
    Ok(heatmap)
}

/// Runs the segmentation backbone on one image and renders its last feature map.
pub fn run_backbone_heatmap<M: ForwardPass + ?Sized>(
    model: &mut M,
    image: &RgbImage,
    config: &BackboneConfig,
) -> Result<RgbImage> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let input = preprocess_for_backbone(image, config);
    let outputs = model.forward_pass_all(input.view())?;
    for (index, output) in outputs.iter().enumerate() {
        tracing::debug!(index, shape = ?output.shape(), "backbone feature map");
    }
    let deepest = outputs
        .last()
        .ok_or_else(|| PipelineError::ShapeMismatch("backbone produced no outputs".to_string()))?;

    feature_heatmap(deepest.view(), config.input_width, config.input_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, ArrayD, ArrayView4, IxDyn};

    struct StagedBackbone;

    impl ForwardPass for StagedBackbone {
        fn forward_pass_all(&mut self, input: ArrayView4<f32>) -> Result<Vec<ArrayD<f32>>> {
            assert_eq!(input.shape(), &[1, 3, 64, 32]);
            let early = ArrayD::zeros(IxDyn(&[1, 8, 16, 8]));
            // Deepest stage: 2 channels over a 2x2 grid, increasing left to right, top to bottom.
            let deep = Array::from_shape_vec(
                IxDyn(&[1, 2, 2, 2]),
                vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0],
            )
            .unwrap();
            Ok(vec![early, deep])
        }
    }

    #[test]
    fn mean_over_channels() {
        let map = Array::from_shape_vec(
            IxDyn(&[1, 2, 1, 3]),
            vec![1.0, 2.0, 3.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let mean = channel_mean(map.view()).unwrap();
        assert_eq!(mean, ndarray::array![[2.0, 3.0, 4.0]]);
    }

    #[test]
    fn rejects_non_4d_and_batched_maps() {
        let flat = ArrayD::<f32>::zeros(IxDyn(&[1, 16]));
        assert!(matches!(
            channel_mean(flat.view()),
            Err(PipelineError::ShapeMismatch(_))
        ));
        let batched = ArrayD::<f32>::zeros(IxDyn(&[2, 4, 8, 8]));
        assert!(matches!(
            channel_mean(batched.view()),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn min_max_stretch() {
        let gray = normalize_to_u8(&ndarray::array![[-1.0, 0.0], [1.0, 3.0]]);
        assert_eq!(gray.get_pixel(0, 0)[0], 0);
        assert_eq!(gray.get_pixel(1, 1)[0], 255);
        assert_eq!(gray.get_pixel(0, 1)[0], 128);

        let flat = normalize_to_u8(&ndarray::array![[5.0, 5.0]]);
        assert!(flat.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn jet_endpoints() {
        assert_eq!(jet_color(0), Rgb([0, 0, 128]));
        assert_eq!(jet_color(255), Rgb([128, 0, 0]));
        let mid = jet_color(128);
        assert!(mid[1] > 250);
    }

    #[test]
    fn heatmap_uses_the_deepest_output() {
        let image = RgbImage::new(10, 10);
        let config = BackboneConfig {
            input_width: 32,
            input_height: 64,
        };
        let heatmap = run_backbone_heatmap(&mut StagedBackbone, &image, &config).unwrap();
        assert_eq!(heatmap.dimensions(), (32, 64));
        // Top-left cell is the minimum, bottom-right the maximum.
        assert_eq!(heatmap.get_pixel(0, 0), &jet_color(0));
        assert_eq!(heatmap.get_pixel(31, 63), &jet_color(255));
    }
}
