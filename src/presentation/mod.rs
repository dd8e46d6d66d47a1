// Presentation layer - HTTP binding for the viewer page
pub mod app_state;
pub mod handlers;
pub mod routes;
