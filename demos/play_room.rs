//! # Play Room Example
//!
//! Plays one bingo room against a live server:
//!
//! 1. Connect via WebSocket
//! 2. Create a room from the sample phrases, or join `BINGO_ROOM_ID`
//! 3. Mark cells one per tick until the server announces a bingo
//! 4. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Start a bingo server on localhost:5000, then:
//! cargo run --example play_room
//!
//! # Join an existing room under a given name:
//! BINGO_ROOM_ID=3f9c2a1b BINGO_USERNAME="Rust Player" cargo run --example play_room
//! ```
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BINGO_SERVER_URL` | `ws://localhost:5000/ws` |
//! | `BINGO_ORIGIN` | `http://localhost:5000` |
//! | `BINGO_PREFS_DIR` | `.bingo` |
//! | `BINGO_ROOM_ID` | unset: create a room |
//! | `BINGO_USERNAME` | the persisted name, else `RustHost` |

use std::time::Duration;

use bingo_client::composer::RoomComposer;
use bingo_client::identity::{FilePreferences, PreferenceStore};
use bingo_client::navigation::{FlowOutcome, Navigation};
use bingo_client::protocol::CellPosition;
use bingo_client::session::{enter_room, RoomEntry};
use bingo_client::{
    ClientConfig, Command, Effect, RoomSessionClient, SessionEvent, SessionState,
    WebSocketTransport,
};
use url::Url;

const DEFAULT_URL: &str = "ws://localhost:5000/ws";
const DEFAULT_ORIGIN: &str = "http://localhost:5000";
const DEFAULT_PREFS_DIR: &str = ".bingo";
const DEFAULT_HOST_NAME: &str = "RustHost";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("BINGO_SERVER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let origin = Url::parse(
        &std::env::var("BINGO_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
    )?;
    let prefs_dir =
        std::env::var("BINGO_PREFS_DIR").unwrap_or_else(|_| DEFAULT_PREFS_DIR.to_string());
    let mut prefs = FilePreferences::in_dir(prefs_dir);
    let username = std::env::var("BINGO_USERNAME").ok();

    // ── Connect ─────────────────────────────────────────────────────
    tracing::info!("Connecting to {url}");
    let transport = WebSocketTransport::connect(&url).await?;
    let (mut client, mut event_rx) = RoomSessionClient::start(transport, ClientConfig::default());

    // ── Room ────────────────────────────────────────────────────────
    let room_id = match std::env::var("BINGO_ROOM_ID") {
        Ok(room_id) => room_id,
        Err(_) => {
            let host = username
                .clone()
                .or_else(|| prefs.load_username())
                .unwrap_or_else(|| DEFAULT_HOST_NAME.to_string());
            let Some(room_id) = create_room(&client, &mut event_rx, &mut prefs, host).await? else {
                client.shutdown().await;
                return Ok(());
            };
            room_id
        }
    };
    let join_link = Navigation::join_link(room_id.as_str()).to_url(&origin)?;
    tracing::info!("Share this link to invite players: {join_link}");

    let mut session = match enter_room(room_id, username.as_deref(), &prefs) {
        RoomEntry::Ready { session, join, .. } => {
            client.send(join)?;
            *session
        }
        RoomEntry::NeedsName(pending) => {
            // No terminal prompt here: fall back to the default name.
            let (session, join) = pending.submit(DEFAULT_HOST_NAME, &mut prefs)?;
            client.send(join)?;
            session
        }
    };

    // ── Event loop ──────────────────────────────────────────────────
    let mut ticker = tokio::time::interval(Duration::from_millis(750));
    let mut next_cell = 0usize;
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };
                let done = matches!(event, SessionEvent::Disconnected { .. });
                for effect in session.update(event) {
                    apply(&client, &session, effect)?;
                }
                if done {
                    break;
                }
            }

            // Click the next cell, row by row, until the board runs out.
            _ = ticker.tick() => {
                if session.store().has_bingo() || next_cell >= 25 {
                    continue;
                }
                let pos = CellPosition::new(next_cell / 5, next_cell % 5);
                next_cell += 1;
                for effect in session.update(Command::ClickCell(pos)) {
                    apply(&client, &session, effect)?;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down. Goodbye!");
    Ok(())
}

/// Run the composer until the server creates the room.
async fn create_room(
    client: &RoomSessionClient,
    event_rx: &mut tokio::sync::mpsc::Receiver<SessionEvent>,
    prefs: &mut FilePreferences,
    host: String,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut composer = RoomComposer::new();
    composer.set_username(host);
    composer.load_samples();
    client.send(composer.catalog_request())?;

    let mut submitted = false;
    while let Some(event) = event_rx.recv().await {
        // Submit once the catalog is in, so known phrases are not saved twice.
        let catalog_reply = matches!(event, SessionEvent::SavedPhrases { .. });
        match composer.handle_event(event, prefs) {
            FlowOutcome::Navigate(Navigation::Game { room_id, .. }) => {
                tracing::info!("Room {room_id} created");
                return Ok(Some(room_id));
            }
            FlowOutcome::Alert(message) => {
                tracing::error!("{message}");
                return Ok(None);
            }
            outcome => {
                tracing::debug!("Composer: {outcome:?}");
                if catalog_reply && !submitted {
                    client.send_all(composer.submit()?)?;
                    submitted = true;
                }
            }
        }
    }
    Ok(None)
}

fn apply(
    client: &RoomSessionClient,
    session: &SessionState,
    effect: Effect,
) -> Result<(), Box<dyn std::error::Error>> {
    match effect {
        Effect::Send(msg) => client.send(msg)?,
        Effect::Render => render(session),
        Effect::RenderRoster => {
            tracing::info!("Players: {}", session.store().players().join(", "));
        }
        Effect::RenderWinners => {
            let winners: Vec<&str> = session
                .store()
                .winners()
                .iter()
                .map(|w| w.username.as_str())
                .collect();
            tracing::info!("Winners: {}", winners.join(", "));
        }
        Effect::ShowBingo => tracing::info!("BINGO!"),
        Effect::Alert(message) => tracing::warn!("{message}"),
    }
    Ok(())
}

fn render(session: &SessionState) {
    let Some(shown) = session.displayed() else {
        return;
    };
    println!("── {} ──", session.title());
    for row in shown.board.rows() {
        let line: Vec<String> = row
            .iter()
            .map(|cell| {
                let mark = if cell.marked { 'x' } else { ' ' };
                format!("[{mark}] {:<18.18}", cell.text)
            })
            .collect();
        println!("{}", line.join(" "));
    }
}
