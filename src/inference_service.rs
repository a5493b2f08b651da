use crate::{
    config::{InputLayout, ModelConfig, OutputActivation},
    labels::CategoryLabels,
    model_service::{ModelError, ModelService},
    prediction::{top_prediction, Prediction, PredictionError},
    preprocess::{transform_image, PreprocessError},
};
use ndarray::Array;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("{0}")]
    Preprocess(#[from] PreprocessError),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("{0}")]
    Prediction(#[from] PredictionError),
    #[error("model output has {got} values but there are {expected} weather categories")]
    OutputWidth { expected: usize, got: usize },
}

/// Image bytes in, top weather category out.
#[derive(Debug, Clone)]
pub struct InferenceService<M: ModelService> {
    model_service: M,
    labels: CategoryLabels,
    image_size: u32,
    input_layout: InputLayout,
    output_activation: OutputActivation,
}

impl<M: ModelService> InferenceService<M> {
    /// Wraps `model_service` after checking, with one forward pass on a blank
    /// image, that its output lines up with `labels`.
    pub fn new(
        model_service: M,
        labels: CategoryLabels,
        model_config: &ModelConfig,
    ) -> Result<Self, InferenceError> {
        let service = Self {
            model_service,
            labels,
            image_size: model_config.image_size,
            input_layout: model_config.input_layout,
            output_activation: model_config.output_activation,
        };
        service.check_output_width()?;

        Ok(service)
    }

    fn check_output_width(&self) -> Result<(), InferenceError> {
        let side = self.image_size as usize;
        let blank = match self.input_layout {
            InputLayout::Nhwc => Array::zeros((1, side, side, 3)),
            InputLayout::Nchw => Array::zeros((1, 3, side, side)),
        };

        let scores = self.model_service.infer(&blank)?;
        if scores.len() != self.labels.len() {
            tracing::error!(
                "Model emits {} scores for {} categories",
                scores.len(),
                self.labels.len()
            );
            return Err(InferenceError::OutputWidth {
                expected: self.labels.len(),
                got: scores.len(),
            });
        }

        tracing::info!("Model output matches {} weather categories", scores.len());
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        self.labels.get_labels()
    }

    pub fn classify(&self, image_data: &[u8]) -> Result<Prediction, InferenceError> {
        let input = transform_image(image_data, self.image_size, self.input_layout)?;
        let scores = self.model_service.infer(&input)?;
        let prediction = top_prediction(&scores, self.labels.get_labels(), self.output_activation)?;

        tracing::debug!(
            "Predicted {} with confidence {:.3}",
            prediction.prediction,
            prediction.confidence
        );

        Ok(prediction)
    }
}
