use prometheus::{exponential_buckets, Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use std::time::Duration;

pub struct Metrics {
    request_counter: IntCounterVec,
    prediction_duration: Histogram,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_counter = IntCounterVec::new(
            Opts::new("predict_requests_total", "Total number of prediction requests"),
            &["outcome"],
        )?;

        // 5ms up to ~2.5s
        let prediction_duration = Histogram::with_opts(
            HistogramOpts::new(
                "prediction_duration_seconds",
                "Duration of image decoding and inference in seconds",
            )
            .buckets(exponential_buckets(0.005, 2.0, 10)?),
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(prediction_duration.clone()))?;

        Ok(Metrics {
            request_counter,
            prediction_duration,
            registry,
        })
    }

    pub fn record_request(&self, outcome: &str) {
        self.request_counter.with_label_values(&[outcome]).inc();
    }

    pub fn record_prediction_duration(&self, duration: Duration) {
        self.prediction_duration.observe(duration.as_secs_f64());
    }
}
