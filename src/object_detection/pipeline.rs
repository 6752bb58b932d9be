use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::image_utils::image_conversion::convert_rgb_image_to_nchw;
use crate::image_utils::padding::{LetterboxOptions, TransformParams, letterbox};
use crate::object_detection::confidence_filter::filter_by_confidence;
use crate::object_detection::coordinate_unmapper::unmap;
use crate::object_detection::non_maximum_suppression::{
    non_maximum_suppression, non_maximum_suppression_per_class,
};
use crate::object_detection::object_detection_model::ForwardPass;
use crate::object_detection::tensor_decoder::decode;
use image::RgbImage;
use ndarray::ArrayViewD;

/// Runs the whole detector on one image and returns detections in original-image pixels.
///
/// Letterbox, forward pass, decode, confidence filter, NMS, unmap. The transform parameters
/// from the letterbox step are the ones used to unmap, so the output lines up with
/// `image`. An empty result is a normal outcome; errors are only raised for a bad image,
/// bad configuration, a failed forward pass or an output tensor of the wrong shape.
pub fn run_detection_pipeline<M: ForwardPass + ?Sized>(
    model: &mut M,
    image: &RgbImage,
    config: &PipelineConfig,
) -> Result<Vec<Detection>> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let (padded, params) = letterbox(image, &LetterboxOptions::from(config))?;
    let input = convert_rgb_image_to_nchw(&padded);
    let raw = model.forward_pass(input.view())?;
    tracing::debug!(shape = ?raw.shape(), "forward pass finished");

    postprocess(raw.view(), &params, config)
}

/// Everything after the forward pass: decode, filter, NMS and unmap.
///
/// Exposed separately so a recorded or synthetic tensor can be pushed through the same
/// steps without a model.
pub fn postprocess(
    raw: ArrayViewD<f32>,
    params: &TransformParams,
    config: &PipelineConfig,
) -> Result<Vec<Detection>> {
    let candidates = decode(raw, config.num_classes)?;
    let proposals = candidates.len();

    let candidates = filter_by_confidence(candidates, config.conf_threshold);
    let above_threshold = candidates.len();

    let boxes: Vec<BoundingBox> = candidates.iter().map(|det| det.annotation).collect();
    let scores: Vec<f32> = candidates.iter().map(|det| det.confidence).collect();
    let keep = if config.class_agnostic {
        non_maximum_suppression(&boxes, &scores, config.conf_threshold, config.iou_threshold)
    } else {
        let class_ids: Vec<usize> = candidates.iter().map(|det| det.class_id).collect();
        non_maximum_suppression_per_class(
            &boxes,
            &scores,
            &class_ids,
            config.conf_threshold,
            config.iou_threshold,
        )
    };
    let survivors: Vec<Detection> = keep.into_iter().map(|i| candidates[i]).collect();

    tracing::debug!(
        proposals,
        above_threshold,
        kept = survivors.len(),
        "postprocessed detections"
    );

    Ok(unmap(survivors, params))
}
