//! # Loopback Game Example
//!
//! Shows how to implement the [`Transport`] trait with an in-process
//! loopback channel, and plays a short game against a scripted fake server
//! on the other end:
//!
//! - the viewer joins and marks cells;
//! - a second player wins first and the viewer spectates their board;
//! - the viewer completes a row, returns to their own board and sees the line.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback_game
//! ```

use async_trait::async_trait;
use bingo_client::protocol::{
    Board, Cell, CellPosition, ClientMessage, LineKind, PlayerBingoPayload, RoomJoinedPayload,
    ServerMessage, FREE_SPACE,
};
use bingo_client::{
    BingoError, ClientConfig, Command, Effect, RoomSessionClient, SessionEvent, SessionState,
    Transport,
};
use tokio::sync::mpsc;

const ROOM_ID: &str = "3f9c2a1b";

// ─────────────────────────────────────────────────────────────────────
// Loopback transport
// ─────────────────────────────────────────────────────────────────────

/// The client half of the loopback.
pub struct LoopbackTransport {
    /// Messages the client sends go here (server reads from the other end).
    tx: mpsc::UnboundedSender<String>,
    /// Messages the server sends arrive here (client reads them).
    rx: mpsc::UnboundedReceiver<String>,
}

/// The "server side" of the loopback.
pub struct LoopbackServer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, server)` pair.
fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), BingoError> {
        self.tx
            .send(message)
            .map_err(|e| BingoError::TransportSend(e.to_string()))
    }

    /// Cancel-safe because `mpsc::UnboundedReceiver::recv` is.
    async fn recv(&mut self) -> Option<Result<String, BingoError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), BingoError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Fake server
// ─────────────────────────────────────────────────────────────────────

fn fresh_board(tag: &str) -> Result<Board, BingoError> {
    let rows = (0..5)
        .map(|r| {
            (0..5)
                .map(|c| {
                    if (r, c) == (2, 2) {
                        Cell {
                            text: FREE_SPACE.into(),
                            marked: true,
                        }
                    } else {
                        Cell::new(format!("{tag} phrase {}", r * 5 + c))
                    }
                })
                .collect()
        })
        .collect();
    Board::new(rows).map_err(|e| BingoError::TransportSend(e.to_string()))
}

fn push(server: &LoopbackServer, msg: &ServerMessage) -> Result<(), BingoError> {
    let json = serde_json::to_string(msg)?;
    server.tx.send(json).map_err(|_| BingoError::TransportClosed)
}

/// Answer `join_room` and `mark_cell` until the viewer completes a row.
async fn run_server(mut server: LoopbackServer) -> Result<(), BingoError> {
    let mut board = fresh_board("Alice")?;
    let mut rival_announced = false;

    while let Some(text) = server.rx.recv().await {
        match serde_json::from_str::<ClientMessage>(&text)? {
            ClientMessage::JoinRoom { username, room_id } => {
                tracing::info!("server: {username} joins {room_id}");
                push(
                    &server,
                    &ServerMessage::RoomJoined(Box::new(RoomJoinedPayload {
                        room_id: Some(room_id),
                        creator: Some("Bob".into()),
                        board: board.clone(),
                        has_bingo: false,
                        players: vec!["Bob".into(), username.clone()],
                    })),
                )?;
                push(&server, &ServerMessage::PlayerJoined { username })?;
            }
            ClientMessage::MarkCell { row, col, .. } => {
                let pos = CellPosition::new(row, col);
                let marked = !board.cell(pos).is_some_and(|c| c.marked);
                board.set_marked(pos, marked);
                push(
                    &server,
                    &ServerMessage::CellMarked {
                        username: "Alice".into(),
                        row,
                        col,
                        marked,
                    },
                )?;

                if !rival_announced {
                    rival_announced = true;
                    let mut rival = fresh_board("Bob")?;
                    let line: Vec<_> = (0..5).map(|r| CellPosition::new(r, 0)).collect();
                    for &p in &line {
                        rival.set_marked(p, true);
                    }
                    push(
                        &server,
                        &ServerMessage::PlayerBingo(Box::new(PlayerBingoPayload {
                            username: "Bob".into(),
                            board: rival,
                            winning_cells: line,
                            winning_type: Some(LineKind::Column),
                            winning_index: Some(0),
                        })),
                    )?;
                }

                let line: Vec<_> = (0..5).map(|c| CellPosition::new(row, c)).collect();
                if line.iter().all(|&p| board.cell(p).is_some_and(|c| c.marked)) {
                    push(
                        &server,
                        &ServerMessage::PlayerBingo(Box::new(PlayerBingoPayload {
                            username: "Alice".into(),
                            board: board.clone(),
                            winning_cells: line,
                            winning_type: Some(LineKind::Row),
                            winning_index: Some(row),
                        })),
                    )?;
                    // Closing the channel ends the client's event stream.
                    return Ok(());
                }
            }
            other => tracing::warn!("server: unexpected {other:?}"),
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, server) = loopback_pair();
    let server_task = tokio::spawn(run_server(server));

    let (mut client, mut event_rx) = RoomSessionClient::start(transport, ClientConfig::default());
    let mut session = SessionState::new(ROOM_ID, "Alice");
    client.send(session.join_request())?;

    // Row 2 already holds the free space; four clicks complete it.
    let mut clicks = [(2, 0), (2, 1), (2, 3), (2, 4)].into_iter();
    let mut spectated = false;

    while let Some(event) = event_rx.recv().await {
        tracing::info!("Event: {event:?}");
        let mut pending: Vec<Effect> = session.update(event);

        while let Some(effect) = pending.pop() {
            match effect {
                Effect::Send(msg) => client.send(msg)?,
                Effect::RenderWinners if !spectated => {
                    spectated = true;
                    let effects = session.update(Command::ViewWinner("Bob".into()));
                    tracing::info!("Spectating: {}", session.title());
                    pending.extend(effects);
                    pending.extend(session.update(Command::ReturnToOwn));
                    tracing::info!("Back to: {}", session.title());
                }
                Effect::Render | Effect::RenderRoster => {
                    if let Some((row, col)) = clicks.next() {
                        pending.extend(session.update(Command::ClickCell(CellPosition::new(row, col))));
                    }
                }
                Effect::ShowBingo => tracing::info!("BINGO!"),
                Effect::Alert(message) => tracing::warn!("{message}"),
                Effect::RenderWinners => {}
            }
        }
    }

    if let Some(shown) = session.displayed() {
        let line: Vec<_> = shown.cells().filter(|c| c.winning).map(|c| c.position).collect();
        tracing::info!("{}: winning cells {line:?}", shown.title());
    }

    client.shutdown().await;
    server_task.await??;
    tracing::info!("Done. Custom transport works!");
    Ok(())
}
