//! WebSocket transport built on `tokio-tungstenite`.
//!
//! Both `ws://` and `wss://` URLs work; TLS is handled by
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream). Each protocol
//! message travels as one text frame. Binary frames are not part of the
//! bingo protocol and are skipped. A close frame with a normal or going-away
//! code ends the stream; any other close code is reported as a receive error
//! so the disconnect carries the server's reason.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), bingo_client::BingoError> {
//! use bingo_client::{Transport, WebSocketTransport};
//!
//! let mut transport = WebSocketTransport::connect("ws://localhost:5000/ws").await?;
//! transport.send(r#"{"event":"get_saved_phrases"}"#.to_string()).await?;
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};

use crate::error::BingoError;
use crate::transport::Transport;

/// The underlying WebSocket stream.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] backed by a WebSocket connection.
///
/// [`recv`](Transport::recv) is cancel-safe: dropping its future before it
/// completes does not lose a message.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Connect to the room server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::Io`] if the URL is invalid or the connection
    /// cannot be established. I/O error kinds are preserved; other handshake
    /// failures map to [`ErrorKind::Other`](std::io::ErrorKind::Other).
    pub async fn connect(url: &str) -> Result<Self, BingoError> {
        tracing::debug!(url = %url, "connecting to room server");

        let (stream, _response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
            let kind = match &e {
                tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
                _ => std::io::ErrorKind::Other,
            };
            BingoError::Io(std::io::Error::new(kind, e))
        })?;

        tracing::info!(url = %url, "room server connection established");

        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-established stream (custom TLS, proxies, headers).
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// Like [`connect`](Self::connect), but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`BingoError::Timeout`] if the deadline elapses, or any error
    /// [`connect`](Self::connect) may return.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, BingoError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| BingoError::Timeout)?
    }
}

/// The `event` tag of a protocol frame, for tracing only.
#[derive(Deserialize)]
struct FrameTag {
    event: String,
}

fn event_name(frame: &str) -> Option<String> {
    serde_json::from_str::<FrameTag>(frame).ok().map(|tag| tag.event)
}

/// Map a server close frame onto the end of the stream or a receive error.
fn close_outcome(frame: Option<CloseFrame>) -> Option<Result<String, BingoError>> {
    match frame {
        None => None,
        Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => None,
        Some(frame) => Some(Err(BingoError::TransportReceive(format!(
            "room server closed the channel ({}): {}",
            u16::from(frame.code),
            frame.reason.as_str()
        )))),
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), BingoError> {
        if self.closed {
            return Err(BingoError::TransportClosed);
        }
        tracing::trace!(event = ?event_name(&message), "sending frame");
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| BingoError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, BingoError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Some(Err(BingoError::TransportReceive(e.to_string()))),
                None => return None,
            };

            match msg {
                Message::Text(text) => {
                    let text = text.to_string();
                    tracing::trace!(event = ?event_name(&text), "received frame");
                    return Some(Ok(text));
                }
                Message::Close(frame) => {
                    tracing::debug!(?frame, "room server sent close frame");
                    return close_outcome(frame);
                }
                // tungstenite queues the pong itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                Message::Binary(bytes) => {
                    tracing::warn!(len = bytes.len(), "skipping binary frame");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), BingoError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| BingoError::TransportSend(e.to_string()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accept one WebSocket connection on a local port, hand it to `handler`,
    /// and return the URL to dial.
    async fn start_room_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-url").await.unwrap_err();
        assert!(matches!(err, BingoError::Io(_)));
    }

    #[tokio::test]
    async fn receives_server_events_then_close() {
        let url = start_room_server(|mut ws| async move {
            ws.send(Message::Text(
                r#"{"event":"player_joined","data":{"username":"Bob"}}"#.into(),
            ))
            .await
            .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let text = transport.recv().await.unwrap().unwrap();
        assert!(text.contains("player_joined"));
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn abnormal_close_reports_the_reason() {
        let url = start_room_server(|mut ws| async move {
            ws.close(Some(CloseFrame {
                code: CloseCode::Error,
                reason: "room expired".into(),
            }))
            .await
            .unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let err = transport.recv().await.unwrap().unwrap_err();
        assert!(
            matches!(&err, BingoError::TransportReceive(msg) if msg.contains("1011") && msg.contains("room expired")),
            "{err:?}"
        );
    }

    #[test]
    fn going_away_close_ends_the_stream() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        };
        assert!(close_outcome(Some(frame)).is_none());
        assert!(close_outcome(None).is_none());
    }

    #[test]
    fn event_name_reads_the_tag() {
        assert_eq!(
            event_name(r#"{"event":"cell_marked","data":{"username":"Bob"}}"#).as_deref(),
            Some("cell_marked")
        );
        assert_eq!(event_name("not json"), None);
    }

    #[tokio::test]
    async fn binary_frames_are_skipped() {
        let url = start_room_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xBE, 0xEF].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "after");
    }

    #[tokio::test]
    async fn send_after_close_is_rejected_and_close_is_idempotent() {
        let url =
            start_room_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("late".to_string()).await.unwrap_err();
        assert!(matches!(err, BingoError::TransportClosed));
    }

    #[tokio::test]
    async fn connect_with_timeout_times_out() {
        // TEST-NET-1 is non-routable.
        let err = WebSocketTransport::connect_with_timeout(
            "ws://192.0.2.1:1",
            std::time::Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BingoError::Timeout));
    }
}
