// Application layer - Streaming statistics, ingestion and session orchestration
pub mod chart_renderer;
pub mod connection_controller;
pub mod ingestion_pipeline;
pub mod latency_estimator;
pub mod streaming_stats;
pub mod subscription_transport;
pub mod viewer_session;
