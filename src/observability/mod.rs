// Observability: Prometheus metrics for each pipeline stage

pub mod metrics;

pub use metrics::init;
