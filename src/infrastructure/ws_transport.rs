// WebSocket implementation of the subscription transport
use crate::application::subscription_transport::{FrameStream, SubscriptionTransport, TransportError};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubscriptionTransport for WebSocketTransport {
    async fn subscribe(&self, url: &str) -> Result<FrameStream, TransportError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("WebSocket handshake with {} returned {}", url, response.status());

        let frames = socket.filter_map(|message| async move { text_frame(message) });
        Ok(frames.boxed())
    }
}

/// Text and binary messages become frames; control messages are skipped.
fn text_frame(message: Result<Message, tungstenite::Error>) -> Option<Result<String, TransportError>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text.to_string())),
        Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
        Ok(_) => None,
        Err(e) => Some(Err(TransportError::Channel(e.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_control_messages_are_skipped() {
        assert!(text_frame(Ok(Message::Ping(vec![1]))).is_none());
        assert!(text_frame(Ok(Message::Pong(vec![]))).is_none());
        assert_eq!(
            text_frame(Ok(Message::Text("{}".to_string()))).unwrap().unwrap(),
            "{}"
        );
        assert_eq!(
            text_frame(Ok(Message::Binary(b"{\"a\":1}".to_vec()))).unwrap().unwrap(),
            "{\"a\":1}"
        );
        assert!(matches!(
            text_frame(Err(tungstenite::Error::ConnectionClosed)),
            Some(Err(TransportError::Channel(_)))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_receives_text_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            socket.send(Message::Text("one".to_string())).await.unwrap();
            socket.send(Message::Text("two".to_string())).await.unwrap();
            let _ = socket.close(None).await;
        });

        let url = format!("ws://{}/ws/subscribe?sensor_id=%2A", addr);
        let frames: Vec<String> = WebSocketTransport::new()
            .subscribe(&url)
            .await
            .unwrap()
            .take(2)
            .map(|frame| frame.unwrap())
            .collect()
            .await;

        assert_eq!(frames, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_subscribe_reports_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = WebSocketTransport::new()
            .subscribe(&format!("ws://{}/ws/subscribe", addr))
            .await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
