// Connection controller - Channel lifecycle, pause gate and stale-channel guard
use crate::application::subscription_transport::SubscriptionTransport;
use crate::domain::connection::{ConnectionState, ConnectionStatus, SubscriptionTarget};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A text frame stamped with the local wall clock at the moment the reader took it off the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFrame {
    pub payload: String,
    pub received_unix_nano: i64,
}

impl ReceivedFrame {
    pub fn new(payload: String, received_unix_nano: i64) -> Self {
        Self {
            payload,
            received_unix_nano,
        }
    }

    pub fn stamped_now(payload: String) -> Self {
        Self::new(payload, Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Opened,
    Frame(ReceivedFrame),
    Closed(Option<String>),
}

/// A signal from one channel, tagged with the id it was opened under.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel_id: u64,
    pub signal: ChannelSignal,
}

impl ChannelEvent {
    pub fn new(channel_id: u64, signal: ChannelSignal) -> Self {
        Self { channel_id, signal }
    }
}

struct ActiveChannel {
    id: u64,
    reader: JoinHandle<()>,
}

pub struct ConnectionController {
    transport: Arc<dyn SubscriptionTransport>,
    events: mpsc::Sender<ChannelEvent>,
    state: ConnectionState,
    paused: bool,
    active: Option<ActiveChannel>,
    target: Option<SubscriptionTarget>,
    next_channel_id: u64,
    last_error: Option<String>,
    discarded_while_paused: u64,
    stale_frames: u64,
}

impl ConnectionController {
    pub fn new(transport: Arc<dyn SubscriptionTransport>, events: mpsc::Sender<ChannelEvent>) -> Self {
        Self {
            transport,
            events,
            state: ConnectionState::Disconnected,
            paused: false,
            active: None,
            target: None,
            next_channel_id: 0,
            last_error: None,
            discarded_while_paused: 0,
            stale_frames: 0,
        }
    }

    /// Tear down any current channel and open a new one. Returns the new channel id.
    ///
    /// The state stays `Disconnected` until the channel reports it is open.
    pub fn connect(&mut self, target: SubscriptionTarget) -> u64 {
        self.close_active();
        self.state = ConnectionState::Disconnected;
        self.last_error = None;

        self.next_channel_id += 1;
        let channel_id = self.next_channel_id;
        let url = target.subscribe_url();
        tracing::info!(channel_id, url = %url, "Opening channel");

        let reader = tokio::spawn(read_channel(
            self.transport.clone(),
            url,
            channel_id,
            self.events.clone(),
        ));
        self.active = Some(ActiveChannel {
            id: channel_id,
            reader,
        });
        self.target = Some(target);
        channel_id
    }

    /// Close the channel if there is one. Always ends `Disconnected`.
    pub fn disconnect(&mut self) {
        if self.close_active() {
            tracing::info!("Channel closed by user");
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Apply a channel signal. Returns the frame when it should be processed:
    /// a frame from the current channel while not paused.
    pub fn accept(&mut self, event: ChannelEvent) -> Option<ReceivedFrame> {
        if self.active_channel() != Some(event.channel_id) {
            if matches!(event.signal, ChannelSignal::Frame(_)) {
                self.stale_frames += 1;
            }
            tracing::debug!(channel_id = event.channel_id, "Ignoring signal from superseded channel");
            return None;
        }

        match event.signal {
            ChannelSignal::Opened => {
                self.state = ConnectionState::Connected;
                tracing::info!(channel_id = event.channel_id, "Channel open");
                None
            }
            ChannelSignal::Frame(frame) => {
                if self.paused {
                    self.discarded_while_paused += 1;
                    None
                } else {
                    Some(frame)
                }
            }
            ChannelSignal::Closed(reason) => {
                self.state = ConnectionState::Disconnected;
                self.active = None;
                match &reason {
                    Some(reason) => {
                        tracing::warn!(channel_id = event.channel_id, "Channel closed: {}", reason)
                    }
                    None => tracing::info!(channel_id = event.channel_id, "Channel closed by peer"),
                }
                self.last_error = reason;
                None
            }
        }
    }

    fn close_active(&mut self) -> bool {
        match self.active.take() {
            Some(channel) => {
                channel.reader.abort();
                true
            }
            None => false,
        }
    }

    pub fn active_channel(&self) -> Option<u64> {
        self.active.as_ref().map(|c| c.id)
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            paused: self.paused,
            target: self.target.clone(),
            channel_id: self.active_channel(),
            last_error: self.last_error.clone(),
            discarded_while_paused: self.discarded_while_paused,
            stale_frames: self.stale_frames,
        }
    }
}

impl Drop for ConnectionController {
    fn drop(&mut self) {
        self.close_active();
    }
}

/// Forward one channel's lifecycle into the session queue.
async fn read_channel(
    transport: Arc<dyn SubscriptionTransport>,
    url: String,
    channel_id: u64,
    events: mpsc::Sender<ChannelEvent>,
) {
    let mut frames = match transport.subscribe(&url).await {
        Ok(frames) => frames,
        Err(e) => {
            let closed = ChannelSignal::Closed(Some(e.to_string()));
            let _ = events.send(ChannelEvent::new(channel_id, closed)).await;
            return;
        }
    };

    if events
        .send(ChannelEvent::new(channel_id, ChannelSignal::Opened))
        .await
        .is_err()
    {
        return;
    }

    let reason = loop {
        match frames.next().await {
            Some(Ok(payload)) => {
                let frame = ReceivedFrame::stamped_now(payload);
                let frame = ChannelEvent::new(channel_id, ChannelSignal::Frame(frame));
                if events.send(frame).await.is_err() {
                    return;
                }
            }
            Some(Err(e)) => break Some(e.to_string()),
            None => break None,
        }
    };

    let _ = events
        .send(ChannelEvent::new(channel_id, ChannelSignal::Closed(reason)))
        .await;
}
