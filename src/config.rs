use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grey used by the YOLO family to fill letterbox borders.
pub const DEFAULT_FILL_COLOR: [u8; 3] = [114, 114, 114];

/// Largest model input side any config accepts.
pub const MAX_INPUT_SIZE: u32 = 8192;

/// Everything a detection call needs besides the image and the model.
///
/// Passed by reference into every pipeline call, so two calls running side by side with
/// different thresholds never see each other's settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Side of the square model input.
    pub target_size: u32,
    /// Canvas granularity used when `auto` is on.
    pub stride: u32,
    /// Minimum-rectangle letterbox: pad only up to the next multiple of `stride`.
    pub auto: bool,
    /// Whether images smaller than `target_size` are enlarged.
    pub allow_upscale: bool,
    pub fill_color: [u8; 3],
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    /// Suppress across all classes at once. When false, NMS runs per class id.
    pub class_agnostic: bool,
    /// Expected class count. When set, the raw tensor must carry exactly `4 + n` features.
    pub num_classes: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            target_size: 640,
            stride: 32,
            auto: false,
            allow_upscale: true,
            fill_color: DEFAULT_FILL_COLOR,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            class_agnostic: true,
            num_classes: None,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON file. Missing fields fall back to the defaults.
    pub fn from_json_file(filepath: &Path) -> Result<Self> {
        let contents = fs::read_to_string(filepath)?;
        serde_json::from_str(&contents).map_err(|e| {
            PipelineError::InvalidConfig(format!("{}: {}", filepath.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "target_size must be positive".to_string(),
            ));
        }
        check_input_size("target_size", self.target_size)?;
        if self.stride == 0 {
            return Err(PipelineError::InvalidConfig(
                "stride must be positive".to_string(),
            ));
        }
        if self.auto && self.target_size % self.stride != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "target_size ({}) must be a multiple of stride ({}) in auto mode",
                self.target_size, self.stride
            )));
        }
        validate_threshold("conf_threshold", self.conf_threshold)?;
        validate_threshold("iou_threshold", self.iou_threshold)?;
        if self.num_classes == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "num_classes must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_input_size(name: &str, value: u32) -> Result<()> {
    if value > MAX_INPUT_SIZE {
        return Err(PipelineError::InvalidConfig(format!(
            "{} must be at most {}, got {}",
            name, MAX_INPUT_SIZE, value
        )));
    }
    Ok(())
}

fn validate_threshold(name: &str, value: f32) -> Result<()> {
    if value.is_nan() || value <= 0.0 || value > 1.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Input geometry of the segmentation backbone.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BackboneConfig {
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for BackboneConfig {
    fn default() -> Self {
        BackboneConfig {
            input_width: 512,
            input_height: 512,
        }
    }
}

impl BackboneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "backbone input size must be positive, got {}x{}",
                self.input_width, self.input_height
            )));
        }
        check_input_size("input_width", self.input_width)?;
        check_input_size("input_height", self.input_height)
    }
}

/// Settings for the text-detection probability overlay.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TextOverlayConfig {
    /// Side of the square the image is stretched to before inference.
    pub input_size: u32,
    /// Pixels with a text probability strictly above this are painted.
    pub threshold: f32,
}

impl Default for TextOverlayConfig {
    fn default() -> Self {
        TextOverlayConfig {
            input_size: 640,
            threshold: 0.5,
        }
    }
}

impl TextOverlayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "text overlay input_size must be positive".to_string(),
            ));
        }
        check_input_size("input_size", self.input_size)?;
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "text threshold must be in [0, 1), got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
