mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command, DetectArgs, HeatmapArgs, TextOverlayArgs};
use detection_pipeline::annotations::detection::Detection;
use detection_pipeline::backbone::feature_heatmap::run_backbone_heatmap;
use detection_pipeline::backbone::text_probability_overlay::run_text_overlay;
use detection_pipeline::config::PipelineConfig;
use detection_pipeline::image_utils::image_io::{load_image, save_image};
use detection_pipeline::image_utils::visualization::{draw_detections, load_font};
use detection_pipeline::logging::setup_logging;
use detection_pipeline::object_detection::object_detection_utils::{
    class_label, read_classes_txt_file,
};
use detection_pipeline::object_detection::ort_inference_session::OrtInferenceSession;
use detection_pipeline::object_detection::pipeline::run_detection_pipeline;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Detect(args) => detect(args),
        Command::Heatmap(args) => heatmap(args),
        Command::TextOverlay(args) => text_overlay(args),
    }
}

fn detect(args: DetectArgs) -> Result<()> {
    if !args.model.exists() {
        bail!(
            "Model path does not exist, or cannot be read: {}",
            args.model.display()
        );
    }

    let base = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut config = args.apply_to(base);

    let class_names = match &args.classes {
        Some(path) => {
            let names = read_classes_txt_file(path)
                .with_context(|| format!("reading classes {}", path.display()))?;
            config.num_classes = Some(names.len());
            names
        }
        None => Vec::new(),
    };
    config.validate()?;
    tracing::info!(?config, "pipeline configuration");

    let font = args
        .font
        .as_deref()
        .map(load_font)
        .transpose()
        .context("loading caption font")?;

    let mut model = OrtInferenceSession::with_intra_threads(&args.model, args.threads)
        .with_context(|| format!("loading model {}", args.model.display()))?;

    let jobs = collect_jobs(&args)?;
    let mut total_detections = 0usize;
    for (input, output, json) in &jobs {
        let mut image = load_image(input)?;
        let detections = run_detection_pipeline(&mut model, &image, &config)
            .with_context(|| format!("running detector on {}", input.display()))?;
        total_detections += detections.len();

        tracing::info!(
            image = %input.display(),
            detections = detections.len(),
            "detected objects"
        );
        for det in &detections {
            tracing::debug!(
                label = %class_label(&class_names, det.class_id),
                confidence = det.confidence,
                bbox = %det.annotation,
                "detection"
            );
        }

        draw_detections(&mut image, &detections, &class_names, font.as_ref());
        save_image(output, &image)
            .with_context(|| format!("saving result to {}", output.display()))?;
        if let Some(json) = json {
            write_json(json, &detections)?;
        }
    }

    tracing::info!(
        images = jobs.len(),
        detections = total_detections,
        "finished"
    );
    Ok(())
}

/// Pairs every input image with its annotated-image path and optional JSON path.
fn collect_jobs(args: &DetectArgs) -> Result<Vec<(PathBuf, PathBuf, Option<PathBuf>)>> {
    if !args.input.is_dir() {
        return Ok(vec![(
            args.input.clone(),
            args.output.clone(),
            args.json.clone(),
        )]);
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut jobs = Vec::new();
    for entry in WalkDir::new(&args.input).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(&args.input)?;
        let flat_name = relative.to_string_lossy().replace(['/', '\\'], "_");
        let output = args.output.join(&flat_name);
        let json = output.with_extension("json");
        jobs.push((entry.path().to_path_buf(), output, Some(json)));
    }
    if jobs.is_empty() {
        bail!("no images found under {}", args.input.display());
    }
    Ok(jobs)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn write_json(path: &Path, detections: &[Detection]) -> Result<()> {
    let contents = serde_json::to_string_pretty(detections)?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn heatmap(args: HeatmapArgs) -> Result<()> {
    let config = args.backbone_config();
    let image = load_image(&args.input)?;
    let mut model = OrtInferenceSession::with_intra_threads(&args.model, args.threads)
        .with_context(|| format!("loading model {}", args.model.display()))?;

    let heatmap = run_backbone_heatmap(&mut model, &image, &config)
        .with_context(|| format!("running backbone on {}", args.input.display()))?;
    save_image(&args.output, &heatmap)?;
    tracing::info!(output = %args.output.display(), "saved feature heatmap");
    Ok(())
}

fn text_overlay(args: TextOverlayArgs) -> Result<()> {
    let config = args.overlay_config();
    let image = load_image(&args.input)?;
    let mut model = OrtInferenceSession::with_intra_threads(&args.model, args.threads)
        .with_context(|| format!("loading model {}", args.model.display()))?;

    let result = run_text_overlay(&mut model, &image, &config)
        .with_context(|| format!("running text detector on {}", args.input.display()))?;
    match result.image {
        Some(overlay) => {
            save_image(&args.output, &overlay)?;
            tracing::info!(
                text_pixels = result.text_pixels,
                output = %args.output.display(),
                "saved text overlay"
            );
        }
        None => tracing::warn!(
            threshold = config.threshold,
            "no pixel above the text threshold, nothing written"
        ),
    }
    Ok(())
}
