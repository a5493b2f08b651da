use crate::{
    config::Config, inference_service::InferenceService, labels::CategoryLabels,
    ort_service::OrtModelService, server::HttpServer, telemetry::Metrics,
};

pub async fn start_app(config: Config) -> anyhow::Result<()> {
    let ort_model_service = match OrtModelService::new(&config.model) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to load model: {}", e);
            return Err(e.into());
        }
    };

    let inference_service =
        match InferenceService::new(ort_model_service, CategoryLabels::new(), &config.model) {
            Ok(service) => service,
            Err(e) => {
                tracing::error!("Model does not match the weather categories: {}", e);
                return Err(e.into());
            }
        };

    let metrics = Metrics::new()?;
    let server = HttpServer::new(inference_service, metrics, &config.server).await?;

    server.run().await
}
