use crate::error::{PipelineError, Result};
use crate::object_detection::object_detection_model::ForwardPass;
use ndarray::{ArrayD, ArrayView4};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use std::path::Path;

/// An onnxruntime inference session.
///
/// Both exported backbones run through this wrapper: the detector and the segmentation
/// backbone differ only in what the caller does with the outputs.
pub struct OrtInferenceSession {
    session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> Result<Self> {
        Self::with_intra_threads(model_path, 4)
    }

    pub fn with_intra_threads(model_path: &Path, intra_threads: usize) -> Result<Self> {
        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.with_intra_threads(intra_threads))
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(PipelineError::ModelLoad)?;
        tracing::info!(
            model = %model_path.display(),
            inputs = session.inputs.len(),
            outputs = session.outputs.len(),
            "loaded onnx model"
        );
        Ok(Self { session })
    }
}

impl ForwardPass for OrtInferenceSession {
    fn forward_pass_all(&mut self, input: ArrayView4<f32>) -> Result<Vec<ArrayD<f32>>> {
        let input = input.as_standard_layout();
        let tensor =
            TensorRef::from_array_view(input.view()).map_err(PipelineError::forward_pass)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(PipelineError::forward_pass)?;

        let mut tensors = Vec::with_capacity(outputs.len());
        for index in 0..outputs.len() {
            let array = outputs[index]
                .try_extract_array::<f32>()
                .map_err(PipelineError::forward_pass)?;
            tensors.push(array.into_owned());
        }
        Ok(tensors)
    }
}
