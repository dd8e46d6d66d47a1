// Transport trait for the full-duplex subscription channel
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open channel to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("channel error: {0}")]
    Channel(String),
}

/// Text frames as they arrive; the stream ends when the channel closes.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

#[async_trait]
pub trait SubscriptionTransport: Send + Sync {
    /// Open a channel to `url` and return its inbound frames.
    async fn subscribe(&self, url: &str) -> Result<FrameStream, TransportError>;
}
