use crate::error::{PipelineError, Result};
use image::{self, RgbImage};
use std::path::Path;

/// Reads any format the `image` crate understands and converts it to 8-bit RGB.
///
/// Unreadable files and images with a zero dimension are both `InvalidImage`.
pub fn load_image(filepath: &Path) -> Result<RgbImage> {
    let img = image::open(filepath)
        .map_err(|e| PipelineError::InvalidImage(format!("{}: {}", filepath.display(), e)))?
        .into_rgb8();
    if img.width() == 0 || img.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "{} is empty ({}x{})",
            filepath.display(),
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

/// Writes an image, picking the encoder from the file extension.
pub fn save_image(filepath: &Path, image: &RgbImage) -> Result<()> {
    image.save(filepath)?;
    Ok(())
}
