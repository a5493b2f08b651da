use crate::{
    inference_service::InferenceError, model_service::ModelService, prediction::Prediction,
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No image was sent")]
    MissingFile,
    #[error("No file was selected")]
    EmptyFilename,
    #[error("Invalid multipart request: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Error processing image: {0}")]
    Inference(#[from] InferenceError),
    #[error("Error processing image: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::MissingFile | PredictError::EmptyFilename => StatusCode::BAD_REQUEST,
            PredictError::MultipartRejection(e) => e.status(),
            PredictError::Multipart(e) => e.status(),
            PredictError::Inference(_) | PredictError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn outcome(&self) -> &'static str {
        if self.status().is_client_error() {
            "client_error"
        } else {
            "server_error"
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip_all)]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, PredictError> {
    let result = run_prediction(&state, multipart).await;

    match &result {
        Ok(prediction) => {
            state.metrics.record_request("success");
            tracing::info!(
                "Prediction {} ({:.3})",
                prediction.prediction,
                prediction.confidence
            );
        }
        Err(err) => {
            state.metrics.record_request(err.outcome());
            if err.status().is_server_error() {
                tracing::error!("Prediction failed: {}", err);
            } else {
                tracing::warn!("Rejected prediction request: {}", err);
            }
        }
    }

    result.map(Json)
}

async fn run_prediction<M: ModelService>(
    state: &SharedState<M>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Prediction, PredictError> {
    let image_data = read_upload(multipart?).await?;
    tracing::debug!("Received {} bytes", image_data.len());

    let inference_service = state.inference_service.clone();
    let started = Instant::now();
    let result =
        tokio::task::spawn_blocking(move || inference_service.classify(&image_data)).await?;
    state.metrics.record_prediction_duration(started.elapsed());

    Ok(result?)
}

/// Returns the bytes of the first `file` part that carries a filename.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // a plain form value under the same name is not an upload
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(PredictError::EmptyFilename);
        }

        return Ok(field.bytes().await?);
    }

    Err(PredictError::MissingFile)
}
