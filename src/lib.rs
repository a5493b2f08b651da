mod ort_service;
mod preprocess;
mod routes;

pub mod app;
pub mod config;
pub mod inference_service;
pub mod labels;
pub mod model_service;
pub mod prediction;
pub mod server;
pub mod telemetry;

pub use app::start_app;
pub use preprocess::{transform_image, PreprocessError};
pub use routes::PredictError;
