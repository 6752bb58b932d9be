use clap::{Args, Parser, Subcommand};
use detection_pipeline::config::{BackboneConfig, PipelineConfig, TextOverlayConfig};
use std::path::PathBuf;

/// Run exported detector and segmentation backbones on images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect objects and draw them onto the image
    Detect(DetectArgs),
    /// Render the segmentation backbone's deepest feature map as a heatmap
    Heatmap(HeatmapArgs),
    /// Paint a text detector's probability map over the image in red
    TextOverlay(TextOverlayArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// ONNX detector model
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    /// Image file, or a directory searched recursively for images
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Annotated image path, or output directory when the input is a directory
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Write detections as JSON (single-image mode; directory mode always writes JSON)
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Class names, one per line. Also fixes the expected class count
    #[arg(long, value_name = "FILE")]
    pub classes: Option<PathBuf>,

    /// Font for box captions; boxes are drawn without captions when omitted
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// JSON pipeline configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Confidence threshold (0.0 - 1.0]
    #[arg(long, value_name = "THRESHOLD")]
    pub conf: Option<f32>,

    /// NMS IoU threshold (0.0 - 1.0]
    #[arg(long, value_name = "THRESHOLD")]
    pub iou: Option<f32>,

    /// Square model input size
    #[arg(long, value_name = "PIXELS")]
    pub target_size: Option<u32>,

    /// Stride used by --auto
    #[arg(long, value_name = "PIXELS")]
    pub stride: Option<u32>,

    /// Pad only to the next stride multiple instead of the full square
    #[arg(long)]
    pub auto: bool,

    /// Never enlarge images smaller than the model input
    #[arg(long)]
    pub no_upscale: bool,

    /// Run NMS separately for each class
    #[arg(long)]
    pub per_class: bool,

    /// onnxruntime intra-op threads
    #[arg(long, default_value = "4", value_name = "COUNT")]
    pub threads: usize,
}

impl DetectArgs {
    /// Applies the command-line overrides on top of a base configuration.
    pub fn apply_to(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(conf) = self.conf {
            config.conf_threshold = conf;
        }
        if let Some(iou) = self.iou {
            config.iou_threshold = iou;
        }
        if let Some(target_size) = self.target_size {
            config.target_size = target_size;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }
        if self.auto {
            config.auto = true;
        }
        if self.no_upscale {
            config.allow_upscale = false;
        }
        if self.per_class {
            config.class_agnostic = false;
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct HeatmapArgs {
    /// ONNX segmentation backbone model
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    #[arg(long, default_value = "512", value_name = "PIXELS")]
    pub width: u32,

    #[arg(long, default_value = "512", value_name = "PIXELS")]
    pub height: u32,

    /// onnxruntime intra-op threads
    #[arg(long, default_value = "4", value_name = "COUNT")]
    pub threads: usize,
}

impl HeatmapArgs {
    pub fn backbone_config(&self) -> BackboneConfig {
        BackboneConfig {
            input_width: self.width,
            input_height: self.height,
        }
    }
}

#[derive(Args, Debug)]
pub struct TextOverlayArgs {
    /// ONNX text-detection model
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Written only when at least one pixel is above the threshold
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Square size the image is stretched to for inference
    #[arg(long, default_value = "640", value_name = "PIXELS")]
    pub size: u32,

    /// Text probability threshold [0.0 - 1.0)
    #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
    pub threshold: f32,

    /// onnxruntime intra-op threads
    #[arg(long, default_value = "4", value_name = "COUNT")]
    pub threads: usize,
}

impl TextOverlayArgs {
    pub fn overlay_config(&self) -> TextOverlayConfig {
        TextOverlayConfig {
            input_size: self.size,
            threshold: self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "detection-pipeline",
            "detect",
            "--model",
            "m.onnx",
            "--input",
            "a.jpg",
            "--output",
            "b.jpg",
            "--conf",
            "0.5",
            "--auto",
            "--per-class",
        ]);
        let Command::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        let config = args.apply_to(PipelineConfig::default());
        assert_eq!(config.conf_threshold, 0.5);
        assert_eq!(config.iou_threshold, 0.45);
        assert!(config.auto);
        assert!(!config.class_agnostic);
        assert!(config.allow_upscale);
    }

    #[test]
    fn heatmap_defaults_to_512() {
        let cli = Cli::parse_from([
            "detection-pipeline",
            "heatmap",
            "--model",
            "u.onnx",
            "--input",
            "a.jpg",
            "--output",
            "h.jpg",
        ]);
        let Command::Heatmap(args) = cli.command else {
            panic!("expected heatmap");
        };
        assert_eq!(args.backbone_config(), BackboneConfig::default());
    }

    #[test]
    fn text_overlay_subcommand() {
        let cli = Cli::parse_from([
            "detection-pipeline",
            "text-overlay",
            "--model",
            "det.onnx",
            "--input",
            "page.png",
            "--output",
            "overlay.png",
            "--threshold",
            "0.3",
        ]);
        let Command::TextOverlay(args) = cli.command else {
            panic!("expected text-overlay");
        };
        let config = args.overlay_config();
        assert_eq!(config.input_size, 640);
        assert_eq!(config.threshold, 0.3);
    }
}
