//! Async client for the bingo room protocol.
//!
//! [`RoomSessionClient`] is a thin handle that talks to a background transport
//! loop task over an unbounded MPSC channel. Inbound events arrive on a bounded
//! channel ([`tokio::sync::mpsc::Receiver<SessionEvent>`]) returned from
//! [`RoomSessionClient::start`].
//!
//! Every send is fire-and-forget: the handle queues the message and returns.
//! Nothing is retried; replies arrive later as events, with no latency
//! guarantee and no ordering guarantee across event kinds.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = WebSocketTransport::connect("ws://localhost:5000/ws").await?;
//! let (client, mut events) = RoomSessionClient::start(transport, ClientConfig::default());
//!
//! client.join_room("Alice", "3f9c2a1b")?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::RoomJoined { board, .. } => { /* render */ }
//!         SessionEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::error::{BingoError, Result};
use crate::event::SessionEvent;
use crate::protocol::{CellPosition, ClientMessage, RoomId, ServerMessage};
use crate::transport::Transport;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`RoomSessionClient`].
///
/// ```
/// use bingo_client::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer falls behind, events are dropped (with a warning
    /// logged) rather than blocking the transport loop. `Disconnected` is
    /// always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// How long [`RoomSessionClient::shutdown`] waits for the transport loop
    /// to close the transport before aborting it.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the capacity of the bounded event channel (clamped to at least 1).
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// State shared between the client handle and the transport loop.
struct ClientState {
    connected: AtomicBool,
    room_id: Mutex<Option<RoomId>>,
}

impl ClientState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            room_id: Mutex::new(None),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Handle to the page's single realtime channel.
///
/// Created via [`RoomSessionClient::start`], which spawns the transport loop
/// and returns this handle together with the event receiver.
pub struct RoomSessionClient {
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
    state: Arc<ClientState>,
    task: Option<tokio::task::JoinHandle<()>>,
    /// Signals the transport loop to close the transport and exit.
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl RoomSessionClient {
    /// Start the transport loop and return a handle plus event receiver.
    ///
    /// The receiver yields [`SessionEvent::Connected`] first and
    /// [`SessionEvent::Disconnected`] last, then `None`.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: ClientConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
        // tokio panics on a zero-capacity channel.
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let state = Arc::new(ClientState::new());

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            Arc::clone(&state),
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            state,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Queue any outbound message. No acknowledgment is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn send(&self, msg: ClientMessage) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(BingoError::NotConnected);
        }
        self.cmd_tx
            .send(msg)
            .map_err(|_| BingoError::NotConnected)
    }

    /// Queue every message in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn send_all(&self, messages: impl IntoIterator<Item = ClientMessage>) -> Result<()> {
        messages.into_iter().try_for_each(|msg| self.send(msg))
    }

    /// Ask for the phrase catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn get_saved_phrases(&self) -> Result<()> {
        self.send(ClientMessage::GetSavedPhrases)
    }

    /// Append phrases to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn save_phrases(&self, phrases: Vec<String>) -> Result<()> {
        self.send(ClientMessage::SavePhrases { phrases })
    }

    /// Request a new room.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn create_room(&self, username: impl Into<String>, phrases: Vec<String>) -> Result<()> {
        self.send(ClientMessage::CreateRoom {
            username: username.into(),
            phrases,
        })
    }

    /// Request to join a room.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotConnected`] if the transport has closed.
    pub fn join_room(&self, username: impl Into<String>, room_id: impl Into<RoomId>) -> Result<()> {
        self.send(ClientMessage::JoinRoom {
            username: username.into(),
            room_id: room_id.into(),
        })
    }

    /// Ask the server to toggle a cell on the sender's own board in the
    /// current room.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::NotInRoom`] before any room was created or
    /// joined on this channel, and [`BingoError::NotConnected`] if the
    /// transport has closed.
    pub async fn mark_cell(&self, pos: CellPosition) -> Result<()> {
        let room_id = self
            .current_room_id()
            .await
            .ok_or(BingoError::NotInRoom)?;
        self.send(ClientMessage::MarkCell {
            room_id,
            row: pos.row,
            col: pos.col,
        })
    }

    /// Shut down the client, closing the transport and stopping the background task.
    ///
    /// The event receiver yields `None` once the transport loop exits.
    pub async fn shutdown(&mut self) {
        debug!("RoomSessionClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// The room most recently created or joined on this channel.
    pub async fn current_room_id(&self) -> Option<RoomId> {
        self.state.room_id.lock().await.clone()
    }
}

impl std::fmt::Debug for RoomSessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSessionClient")
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for RoomSessionClient {
    fn drop(&mut self) {
        // No executor is available here to drive an async close, so the
        // loop is aborted rather than signalled.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background loop multiplexing outbound commands, the shutdown signal and
/// inbound messages.
///
/// Exits when the command channel closes, the shutdown signal fires, the
/// transport returns `None`, or a transport error occurs.
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    event_tx: mpsc::Sender<SessionEvent>,
    state: Arc<ClientState>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    emit_event(&event_tx, SessionEvent::Connected);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(msg) => {
                        debug!(?msg, "sending client message");
                        match serde_json::to_string(&msg) {
                            Ok(json) => {
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &state,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            Err(e) => error!("failed to serialize ClientMessage: {e}"),
                        }
                    }
                    // Client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                break;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let event = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(server_msg) => {
                                update_state(&state, &server_msg).await;
                                SessionEvent::from(server_msg)
                            }
                            Err(e) => {
                                warn!("failed to deserialize server message: {e}; raw: {text}");
                                SessionEvent::Error {
                                    message: format!("Received a malformed message from the server: {e}"),
                                }
                            }
                        };
                        emit_event(&event_tx, event);
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &state,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &state, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Track the current room from the server's room lifecycle messages.
async fn update_state(state: &ClientState, msg: &ServerMessage) {
    match msg {
        ServerMessage::RoomCreated { room_id } => {
            *state.room_id.lock().await = Some(room_id.clone());
            debug!("state: created room {room_id}");
        }
        ServerMessage::RoomJoined(payload) => {
            if let Some(room_id) = &payload.room_id {
                *state.room_id.lock().await = Some(room_id.clone());
                debug!("state: joined room {room_id}");
            }
        }
        _ => {}
    }
}

/// Emit an event without blocking; a full channel drops the event with a warning.
fn emit_event(event_tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(?dropped, "event channel full, dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit the final [`Disconnected`](SessionEvent::Disconnected) event.
///
/// Awaits channel capacity instead of dropping: this event is always the
/// last one and must reach the consumer.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<SessionEvent>,
    state: &ClientState,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    let event = SessionEvent::Disconnected { reason };
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Records sent messages and replays scripted server frames.
    struct ScriptedTransport {
        incoming: VecDeque<Option<std::result::Result<String, BingoError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, BingoError>>>,
        ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let transport = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (transport, sent, closed)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), BingoError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, BingoError>> {
            match self.incoming.pop_front() {
                Some(item) => item,
                // Script exhausted: stay open until shutdown.
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), BingoError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn room_created_json(room_id: &str) -> String {
        serde_json::to_string(&ServerMessage::RoomCreated {
            room_id: room_id.into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn connected_is_the_first_event() {
        let (transport, _sent, _closed) = ScriptedTransport::new(vec![]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Connected);
        assert!(client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn room_created_updates_current_room() {
        let (transport, _sent, _closed) =
            ScriptedTransport::new(vec![Some(Ok(room_created_json("abcd1234")))]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            SessionEvent::RoomCreated {
                room_id: "abcd1234".into()
            }
        );
        assert_eq!(client.current_room_id().await.as_deref(), Some("abcd1234"));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_frame_surfaces_error_and_loop_continues() {
        let (transport, _sent, _closed) = ScriptedTransport::new(vec![
            Some(Ok("{not json".into())),
            Some(Ok(room_created_json("r1"))),
        ]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::Error { ref message } if message.contains("malformed")));

        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::RoomCreated { .. }));
        assert!(client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn mark_cell_outside_a_room_is_rejected() {
        let (transport, sent, _closed) = ScriptedTransport::new(vec![]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());
        let _ = events.recv().await; // Connected

        assert!(matches!(
            client.mark_cell(CellPosition::new(0, 0)).await,
            Err(BingoError::NotInRoom)
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sent.lock().unwrap().is_empty());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn mark_cell_targets_the_current_room() {
        let (transport, sent, _closed) =
            ScriptedTransport::new(vec![Some(Ok(room_created_json("abcd1234")))]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());
        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // RoomCreated

        client.mark_cell(CellPosition::new(3, 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let msg: ClientMessage = serde_json::from_str(&messages[0]).unwrap();
            assert_eq!(
                msg,
                ClientMessage::MarkCell {
                    room_id: "abcd1234".into(),
                    row: 3,
                    col: 1
                }
            );
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn receive_error_disconnects() {
        let (transport, _sent, _closed) = ScriptedTransport::new(vec![Some(Err(
            BingoError::TransportReceive("reset by peer".into()),
        ))]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        if let SessionEvent::Disconnected { reason } = event {
            assert!(reason.unwrap().contains("reset by peer"));
        } else {
            panic!("expected Disconnected, got {event:?}");
        }
        assert!(!client.is_connected());
        assert!(matches!(
            client.get_saved_phrases(),
            Err(BingoError::NotConnected)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport() {
        let (transport, _sent, closed) = ScriptedTransport::new(vec![]);
        let (mut client, mut events) = RoomSessionClient::start(transport, ClientConfig::new());
        let _ = events.recv().await; // Connected

        client.shutdown().await;

        assert!(closed.load(Ordering::Relaxed));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Disconnected { .. })
        ));
        assert!(events.recv().await.is_none());
    }

    #[test]
    fn config_defaults_and_clamping() {
        let config = ClientConfig::default();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));

        let config = ClientConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }
}
