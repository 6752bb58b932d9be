use thiserror::Error;

/// Every way a single pipeline call can fail.
///
/// All variants are fatal to the call that produced them. Nothing in this crate retries;
/// callers decide what to do with the error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("raw tensor shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("forward pass failed")]
    ForwardPassFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load model")]
    ModelLoad(#[source] ort::Error),

    #[error("image codec error")]
    ImageIo(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to load font: {0}")]
    Font(String),
}

impl PipelineError {
    pub fn forward_pass<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipelineError::ForwardPassFailure(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
