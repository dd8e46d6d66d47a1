// Viewer session - The single task that owns the controller and the pipeline
use crate::application::connection_controller::{ChannelEvent, ConnectionController};
use crate::application::ingestion_pipeline::IngestionPipeline;
use crate::application::subscription_transport::SubscriptionTransport;
use crate::domain::connection::{ConnectionStatus, SubscriptionTarget};
use crate::domain::snapshot::{KpiDisplay, LogEntry, TickSnapshot};
use crate::infrastructure::config::ViewerConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

const COMMAND_QUEUE: usize = 64;
const CHANNEL_QUEUE: usize = 1024;
const TICK_FANOUT: usize = 64;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("viewer session has stopped")]
    SessionStopped,
}

/// Connect parameters from the UI; absent fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub base_url: Option<String>,
    pub sensor_id: Option<String>,
}

#[derive(Debug)]
pub enum ViewerCommand {
    Connect(ConnectRequest),
    Disconnect,
    Pause,
    Resume,
    Reset,
    State(oneshot::Sender<ViewState>),
}

/// Owned copy of everything the page displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub status: ConnectionStatus,
    pub kpis: KpiDisplay,
    pub latest: Option<TickSnapshot>,
    pub throughput_series: Vec<u64>,
    pub latency_series: Vec<f64>,
    pub log: Vec<LogEntry>,
    pub latency_samples: usize,
    pub dropped_frames: u64,
}

/// Cloneable front door to a running [`ViewerSession`].
#[derive(Clone)]
pub struct ViewerHandle {
    commands: mpsc::Sender<ViewerCommand>,
    ticks: broadcast::Sender<TickSnapshot>,
}

impl ViewerHandle {
    pub async fn send(&self, command: ViewerCommand) -> Result<(), ViewerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ViewerError::SessionStopped)
    }

    pub async fn connect(&self, request: ConnectRequest) -> Result<(), ViewerError> {
        self.send(ViewerCommand::Connect(request)).await
    }

    pub async fn state(&self) -> Result<ViewState, ViewerError> {
        let (reply, response) = oneshot::channel();
        self.send(ViewerCommand::State(reply)).await?;
        response.await.map_err(|_| ViewerError::SessionStopped)
    }

    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickSnapshot> {
        self.ticks.subscribe()
    }
}

pub struct ViewerSession {
    controller: ConnectionController,
    pipeline: IngestionPipeline,
    defaults: SubscriptionTarget,
    commands: mpsc::Receiver<ViewerCommand>,
    events: mpsc::Receiver<ChannelEvent>,
    ticks: broadcast::Sender<TickSnapshot>,
}

impl ViewerSession {
    pub fn new(config: &ViewerConfig, transport: Arc<dyn SubscriptionTransport>) -> (Self, ViewerHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (event_tx, events) = mpsc::channel(CHANNEL_QUEUE);
        let (ticks, _) = broadcast::channel(TICK_FANOUT);

        let session = Self {
            controller: ConnectionController::new(transport, event_tx),
            pipeline: IngestionPipeline::new(
                config.window.clone(),
                config.fields.clone(),
                Instant::now(),
            ),
            defaults: config.stream.default_target(),
            commands,
            events,
            ticks: ticks.clone(),
        };
        let handle = ViewerHandle {
            commands: command_tx,
            ticks,
        };
        (session, handle)
    }

    /// Process inputs until every handle has been dropped.
    pub async fn run(mut self) {
        while self.step().await {}
        self.controller.disconnect();
        tracing::info!("Viewer session stopped");
    }

    /// Wait for and handle one input. Returns false once no more commands can arrive.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            command = self.commands.recv() => match command {
                Some(command) => {
                    self.handle_command(command, Instant::now());
                    true
                }
                None => false,
            },
            Some(event) = self.events.recv() => {
                self.handle_channel_event(event, Instant::now());
                true
            }
        }
    }

    pub fn handle_command(&mut self, command: ViewerCommand, now: Instant) {
        match command {
            ViewerCommand::Connect(request) => {
                let target = self.resolve_target(request);
                self.controller.connect(target);
            }
            ViewerCommand::Disconnect => self.controller.disconnect(),
            ViewerCommand::Pause => {
                self.controller.pause();
                tracing::info!("Ingestion paused");
            }
            ViewerCommand::Resume => {
                self.controller.resume();
                tracing::info!("Ingestion resumed");
            }
            ViewerCommand::Reset => {
                self.pipeline.reset(now);
                tracing::info!("Windows and KPIs reset");
            }
            ViewerCommand::State(reply) => {
                let _ = reply.send(self.view());
            }
        }
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent, now: Instant) -> Option<TickSnapshot> {
        let frame = self.controller.accept(event)?;
        let snapshot = self
            .pipeline
            .ingest_frame(&frame.payload, frame.received_unix_nano, now)?;
        // no subscribers is fine
        let _ = self.ticks.send(snapshot);
        Some(snapshot)
    }

    fn resolve_target(&self, request: ConnectRequest) -> SubscriptionTarget {
        let current = self.controller.status().target.unwrap_or_else(|| self.defaults.clone());
        SubscriptionTarget::new(
            request.base_url.as_deref().unwrap_or(&current.base_url),
            request.sensor_id.as_deref().unwrap_or(&current.sensor_id),
        )
    }

    pub fn view(&self) -> ViewState {
        let latest = self.pipeline.last_snapshot().copied();
        ViewState {
            status: self.controller.status(),
            kpis: KpiDisplay::from_snapshot(latest.as_ref()),
            latest,
            throughput_series: self.pipeline.throughput_series().to_vec(),
            latency_series: self.pipeline.latency_series().to_vec(),
            log: self.pipeline.log_newest_first(),
            latency_samples: self.pipeline.latency_window().len(),
            dropped_frames: self.pipeline.dropped_frames(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::connection_controller::{ChannelSignal, ReceivedFrame};
    use crate::application::subscription_transport::testing::ScriptedTransport;
    use crate::domain::connection::ConnectionState;
    use std::time::Duration;

    fn frame(seq: u64) -> String {
        format!(
            r#"{{"reading":{{"sensorId":"sensor-1","seq":{seq},"value":21.5}},"meta":{{"sentUnixNano":1000000}},"client_recv_unix_nano":3000000}}"#
        )
    }

    fn session(transport: Arc<ScriptedTransport>) -> (ViewerSession, ViewerHandle) {
        ViewerSession::new(&ViewerConfig::default(), transport)
    }

    /// Connect and mark the channel open without waiting on the reader task.
    fn open(session: &mut ViewerSession, now: Instant) -> u64 {
        session.handle_command(ViewerCommand::Connect(ConnectRequest::default()), now);
        let id = session.controller.active_channel().unwrap();
        session.handle_channel_event(ChannelEvent::new(id, ChannelSignal::Opened), now);
        id
    }

    fn deliver(session: &mut ViewerSession, id: u64, seq: u64, now: Instant) -> Option<TickSnapshot> {
        session.handle_channel_event(ChannelEvent::new(id, ChannelSignal::Frame(ReceivedFrame::new(frame(seq), 0))), now)
    }

    #[tokio::test]
    async fn test_pause_stops_growth_and_resume_restarts_it() {
        let transport = ScriptedTransport::new();
        let _frames = transport.add_channel();
        let (mut session, _handle) = session(transport);
        let now = Instant::now();
        let id = open(&mut session, now);

        deliver(&mut session, id, 1, now);
        session.handle_command(ViewerCommand::Pause, now);
        deliver(&mut session, id, 2, now);
        deliver(&mut session, id, 3, now);

        let view = session.view();
        assert_eq!(view.latency_samples, 1);
        assert_eq!(view.log.len(), 1);
        assert_eq!(view.status.state, ConnectionState::Connected);
        assert!(view.status.paused);

        session.handle_command(ViewerCommand::Resume, now);
        deliver(&mut session, id, 4, now);

        let view = session.view();
        assert_eq!(view.latency_samples, 2);
        assert_eq!(view.log[0].seq, 4);
        assert_eq!(view.log[1].seq, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_view_but_not_connection() {
        let transport = ScriptedTransport::new();
        let _frames = transport.add_channel();
        let (mut session, _handle) = session(transport);
        let start = Instant::now();
        let id = open(&mut session, start);

        for seq in 0..4u64 {
            deliver(&mut session, id, seq, start + Duration::from_secs(seq));
        }
        assert!(session.view().latest.is_some());

        session.handle_command(ViewerCommand::Reset, start + Duration::from_secs(5));
        let view = session.view();

        assert!(view.throughput_series.is_empty());
        assert!(view.latency_series.is_empty());
        assert_eq!(view.latency_samples, 0);
        assert!(view.log.is_empty());
        assert!(view.latest.is_none());
        assert_eq!(view.kpis, KpiDisplay::placeholder());
        assert_eq!(session.pipeline.tps_max(), 0);
        assert_eq!(view.status.state, ConnectionState::Connected);
        assert_eq!(view.status.channel_id, Some(id));
    }

    #[tokio::test]
    async fn test_superseded_channel_frames_are_ignored() {
        let transport = ScriptedTransport::new();
        let _first = transport.add_channel();
        let _second = transport.add_channel();
        let (mut session, _handle) = session(transport);
        let now = Instant::now();

        let first = open(&mut session, now);
        let second = open(&mut session, now);
        assert_ne!(first, second);

        deliver(&mut session, first, 1, now);
        assert_eq!(session.view().latency_samples, 0);
        assert_eq!(session.view().status.stale_frames, 1);

        deliver(&mut session, second, 2, now);
        let view = session.view();
        assert_eq!(view.latency_samples, 1);
        assert_eq!(view.log[0].seq, 2);
        assert_eq!(view.status.channel_id, Some(second));
    }

    #[tokio::test]
    async fn test_connect_request_overrides_target() {
        let transport = ScriptedTransport::new();
        let _frames = transport.add_channel();
        let (mut session, _handle) = session(transport);

        let request = ConnectRequest {
            base_url: Some("ws://localhost:8081".to_string()),
            sensor_id: Some("sensor-7".to_string()),
        };
        session.handle_command(ViewerCommand::Connect(request), Instant::now());

        let target = session.view().status.target.unwrap();
        assert_eq!(target.base_url, "ws://localhost:8081");
        assert_eq!(target.sensor_id, "sensor-7");
    }

    #[tokio::test]
    async fn test_frames_flow_from_transport_to_ticks() {
        let transport = ScriptedTransport::new();
        let frames = transport.add_channel();
        let config = ViewerConfig {
            window: crate::infrastructure::config::WindowSettings {
                tick_interval_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let (mut session, handle) = ViewerSession::new(&config, transport);
        let mut ticks = handle.subscribe_ticks();

        handle.connect(ConnectRequest::default()).await.unwrap();
        assert!(session.step().await); // connect
        assert!(session.step().await); // opened

        frames.send(Ok(frame(1))).await.unwrap();
        assert!(session.step().await);

        let tick = ticks.recv().await.unwrap();
        assert_eq!(tick.tps, 1);
        assert_eq!(tick.p50, 2.0);

        let (state, _) = tokio::join!(handle.state(), session.step());
        let state = state.unwrap();
        assert_eq!(state.status.state, ConnectionState::Connected);
        assert_eq!(state.kpis.p95, "2.00");
        assert_eq!(state.throughput_series, vec![1]);
    }

    #[tokio::test]
    async fn test_run_stops_when_handles_dropped() {
        let (session, handle) = session(ScriptedTransport::new());
        let task = tokio::spawn(session.run());

        handle.send(ViewerCommand::Pause).await.unwrap();
        assert!(handle.state().await.unwrap().status.paused);
        drop(handle);

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
