// Domain layer - Plain data types with no I/O
pub mod bounded_series;
pub mod chart;
pub mod connection;
pub mod reading;
pub mod snapshot;
