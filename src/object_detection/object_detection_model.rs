use crate::error::{PipelineError, Result};
use ndarray::{ArrayD, ArrayView4};

/// A compiled inference graph that can run one forward pass.
///
/// This is the only seam between the pipeline and whatever executes the model. The
/// pipeline hands over a `(1, 3, height, width)` tensor and gets the raw output tensors
/// back in the order the graph declares them.
pub trait ForwardPass {
    /// Runs the graph and returns every output.
    fn forward_pass_all(&mut self, input: ArrayView4<f32>) -> Result<Vec<ArrayD<f32>>>;

    /// Runs the graph and returns its first output, which is where single-head detectors
    /// put their predictions.
    fn forward_pass(&mut self, input: ArrayView4<f32>) -> Result<ArrayD<f32>> {
        self.forward_pass_all(input)?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::ShapeMismatch("model produced no outputs".to_string()))
    }
}

impl<T: ForwardPass + ?Sized> ForwardPass for &mut T {
    fn forward_pass_all(&mut self, input: ArrayView4<f32>) -> Result<Vec<ArrayD<f32>>> {
        (**self).forward_pass_all(input)
    }
}

impl<T: ForwardPass + ?Sized> ForwardPass for Box<T> {
    fn forward_pass_all(&mut self, input: ArrayView4<f32>) -> Result<Vec<ArrayD<f32>>> {
        (**self).forward_pass_all(input)
    }
}
