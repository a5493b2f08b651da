use ndarray::{Array, Ix4};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid model configuration: {0}")]
    Config(String),
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A loaded classifier: one forward pass per call, returning the raw output
/// vector of the single batch element.
pub trait ModelService: Send + Sync + Clone + 'static {
    fn infer(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, ModelError>;
}
