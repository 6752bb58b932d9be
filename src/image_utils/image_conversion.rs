use image::RgbImage;
use ndarray::{Array4, Axis};

/// ImageNet channel statistics, in RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Converts an image to a `(1, 3, height, width)` tensor scaled to `[0, 1]`.
///
/// This is the layout the exported detector takes as input: batch, channel, row, column.
pub fn convert_rgb_image_to_nchw(rgb_image: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb_image.dimensions();
    Array4::from_shape_fn(
        (1, 3, height as usize, width as usize),
        |(_, channel, y, x)| rgb_image.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
    )
}

/// Same layout as `convert_rgb_image_to_nchw`, with per-channel mean/std normalization
/// applied after scaling to `[0, 1]`.
pub fn convert_rgb_image_to_normalized_nchw(
    rgb_image: &RgbImage,
    mean: [f32; 3],
    std: [f32; 3],
) -> Array4<f32> {
    let mut array = convert_rgb_image_to_nchw(rgb_image);
    for (channel, mut plane) in array.axis_iter_mut(Axis(1)).enumerate() {
        plane.mapv_inplace(|v| (v - mean[channel]) / std[channel]);
    }
    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn nchw_layout_is_row_major_per_channel() {
        // 3 wide, 2 tall so that swapped axes would show up.
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 255, 0]));
        img.put_pixel(1, 1, Rgb([0, 0, 255]));

        let array = convert_rgb_image_to_nchw(&img);
        assert_eq!(array.shape(), &[1, 3, 2, 3]);
        assert_eq!(
            (array[[0, 0, 0, 2]], array[[0, 1, 0, 2]], array[[0, 2, 0, 2]]),
            (1.0, 0.0, 0.0)
        );
        assert_eq!(
            (array[[0, 0, 1, 0]], array[[0, 1, 1, 0]], array[[0, 2, 1, 0]]),
            (0.0, 1.0, 0.0)
        );
        assert_eq!(
            (array[[0, 0, 1, 1]], array[[0, 1, 1, 1]], array[[0, 2, 1, 1]]),
            (0.0, 0.0, 1.0)
        );
        assert_eq!(array[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn imagenet_normalization_per_channel() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 128]));
        let array = convert_rgb_image_to_normalized_nchw(&img, IMAGENET_MEAN, IMAGENET_STD);
        assert_eq!(array.shape(), &[1, 3, 2, 2]);

        let r = array[[0, 0, 1, 1]];
        let g = array[[0, 1, 1, 1]];
        let b = array[[0, 2, 1, 1]];
        assert!((r - (1.0 - 0.485) / 0.229).abs() < 1e-5);
        assert!((g - (0.0 - 0.456) / 0.224).abs() < 1e-5);
        assert!((b - (128.0 / 255.0 - 0.406) / 0.225).abs() < 1e-5);
    }
}
