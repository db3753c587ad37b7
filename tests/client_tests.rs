#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Integration-style client tests for the bingo client.
//!
//! Uses the shared `MockTransport` from `tests/common` to script server
//! responses and drives them through `RoomSessionClient` into the input
//! flows and `SessionState`, checking outbound JSON along the way.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bingo_client::composer::{RoomComposer, SAMPLE_PHRASES};
use bingo_client::identity::{MemoryPreferences, PreferenceStore};
use bingo_client::join::JoinFlow;
use bingo_client::navigation::{FlowOutcome, Navigation};
use bingo_client::protocol::{CellPosition, ClientMessage};
use bingo_client::session::{enter_room, RoomEntry};
use bingo_client::{
    BingoError, ClientConfig, Command, Effect, ErrorCode, RoomSessionClient, SessionEvent,
    SessionState,
};
use tokio::sync::mpsc::Receiver;

use common::{
    cell_marked_json, error_json, player_bingo_json, player_joined_json, room_created_json,
    room_joined_json, saved_phrases_json, MockTransport,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

/// Start a client with the given scripted server responses.
#[allow(clippy::type_complexity)]
fn start_client(
    incoming: Vec<Option<Result<String, BingoError>>>,
) -> (
    RoomSessionClient,
    Receiver<SessionEvent>,
    Arc<Mutex<Vec<String>>>,
    Arc<std::sync::atomic::AtomicBool>,
) {
    let (transport, sent, closed) = MockTransport::new(incoming);
    let (client, events) = RoomSessionClient::start(transport, ClientConfig::default());
    (client, events, sent, closed)
}

/// Scripted frames wrapped the way `MockTransport` expects.
fn script(frames: Vec<String>) -> Vec<Option<Result<String, BingoError>>> {
    frames.into_iter().map(|f| Some(Ok(f))).collect()
}

async fn expect_connected(rx: &mut Receiver<SessionEvent>) {
    let ev = rx.recv().await.expect("expected Connected event");
    assert_eq!(ev, SessionEvent::Connected, "first event should be Connected");
}

/// Wait for the transport loop to flush queued sends.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn sent_messages(sent: &Arc<Mutex<Vec<String>>>) -> Vec<ClientMessage> {
    sent.lock()
        .unwrap()
        .iter()
        .map(|json| serde_json::from_str(json).expect("parse sent message"))
        .collect()
}

/// Feed the next `n` events into `session`, collecting every effect.
async fn pump(
    session: &mut SessionState,
    rx: &mut Receiver<SessionEvent>,
    n: usize,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for _ in 0..n {
        let ev = rx.recv().await.expect("event");
        effects.extend(session.update(ev));
    }
    effects
}

// ════════════════════════════════════════════════════════════════════
// Room creation
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn composer_flow_creates_room_and_navigates() {
    let (mut client, mut events, sent, _closed) = start_client(script(vec![
        saved_phrases_json(&["Awkward silence", "Coffee break is mentioned"]),
        room_created_json("abcd1234"),
    ]));
    expect_connected(&mut events).await;

    let mut prefs = MemoryPreferences::new();
    let mut composer = RoomComposer::new();
    client.send(composer.catalog_request()).unwrap();

    let ev = events.recv().await.unwrap();
    assert_eq!(composer.handle_event(ev, &mut prefs), FlowOutcome::CatalogUpdated);
    assert_eq!(composer.catalog().len(), 2);

    composer.set_username("Hosty");
    composer.load_samples();
    client.send_all(composer.submit().unwrap()).unwrap();

    let ev = events.recv().await.unwrap();
    let outcome = composer.handle_event(ev, &mut prefs);
    assert_eq!(
        outcome,
        FlowOutcome::Navigate(Navigation::game("abcd1234", "Hosty"))
    );
    assert_eq!(prefs.load_username().as_deref(), Some("Hosty"));
    assert_eq!(client.current_room_id().await.as_deref(), Some("abcd1234"));

    settle().await;
    let messages = sent_messages(&sent);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], ClientMessage::GetSavedPhrases);
    if let ClientMessage::SavePhrases { phrases } = &messages[1] {
        // Catalog phrases are not saved again.
        assert_eq!(phrases.len(), SAMPLE_PHRASES.len() - 2);
        assert!(!phrases.iter().any(|p| p == "Awkward silence"));
    } else {
        panic!("expected SavePhrases, got {:?}", messages[1]);
    }
    if let ClientMessage::CreateRoom { username, phrases } = &messages[2] {
        assert_eq!(username, "Hosty");
        assert_eq!(phrases.len(), SAMPLE_PHRASES.len());
    } else {
        panic!("expected CreateRoom, got {:?}", messages[2]);
    }

    client.shutdown().await;
}

#[tokio::test]
async fn rejected_composer_sends_nothing() {
    let (mut client, mut events, sent, _closed) = start_client(vec![]);
    expect_connected(&mut events).await;

    let mut composer = RoomComposer::new();
    composer.set_username("Hosty");
    composer.fill(SAMPLE_PHRASES.iter().take(23).copied());
    let err = composer.submit().unwrap_err();
    assert!(matches!(err, BingoError::TooFewPhrases { found: 23, .. }));

    settle().await;
    assert!(sent.lock().unwrap().is_empty());

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Joining
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn join_flow_unknown_room_alerts() {
    let (mut client, mut events, sent, _closed) =
        start_client(script(vec![error_json("Room not found")]));
    expect_connected(&mut events).await;

    let mut prefs = MemoryPreferences::with_username("Bobby");
    let mut join = JoinFlow::new(Some("deadbeef".into()), &prefs);
    client.send(join.submit().unwrap()).unwrap();

    let ev = events.recv().await.unwrap();
    if let SessionEvent::Error { message } = &ev {
        assert_eq!(ErrorCode::from_message(message), ErrorCode::RoomNotFound);
    }
    assert_eq!(
        join.handle_event(ev, &mut prefs),
        FlowOutcome::Alert("Room not found".into())
    );

    settle().await;
    assert_eq!(
        sent_messages(&sent),
        vec![ClientMessage::JoinRoom {
            username: "Bobby".into(),
            room_id: "deadbeef".into()
        }]
    );

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// In-room session
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn game_page_joins_marks_and_converges() {
    let (mut client, mut events, sent, _closed) = start_client(script(vec![
        room_joined_json("room1", &["Host", "Alice"]),
        player_joined_json("Bob"),
        player_joined_json("Bob"),
        cell_marked_json("Alice", 0, 0, true),
        cell_marked_json("Alice", 0, 0, false),
        cell_marked_json("Alice", 0, 0, true),
        cell_marked_json("Bob", 1, 1, true),
    ]));
    expect_connected(&mut events).await;

    let RoomEntry::Ready {
        mut session, join, ..
    } = enter_room("room1", Some("Alice"), &MemoryPreferences::new())
    else {
        panic!("expected a resolved name");
    };
    client.send(join).unwrap();

    let effects = pump(&mut session, &mut events, 7).await;
    assert!(effects.contains(&Effect::RenderRoster));
    assert_eq!(session.store().players(), ["Host", "Alice", "Bob"]);

    let own = session.store().own_board().unwrap();
    assert!(own.cell(CellPosition::new(0, 0)).unwrap().marked);
    assert!(!own.cell(CellPosition::new(1, 1)).unwrap().marked);
    assert!(own.cell(CellPosition::new(2, 2)).unwrap().marked);

    for effect in session.update(Command::ClickCell(CellPosition::new(4, 4))) {
        if let Effect::Send(msg) = effect {
            client.send(msg).unwrap();
        }
    }

    settle().await;
    let messages = sent_messages(&sent);
    assert_eq!(
        messages,
        vec![
            ClientMessage::JoinRoom {
                username: "Alice".into(),
                room_id: "room1".into()
            },
            ClientMessage::MarkCell {
                room_id: "room1".into(),
                row: 4,
                col: 4
            },
        ]
    );

    client.shutdown().await;
}

#[tokio::test]
async fn spectating_winners_over_the_wire() {
    let (mut client, mut events, _sent, _closed) = start_client(script(vec![
        room_joined_json("room1", &["Alice", "Bob", "Cara"]),
        player_bingo_json("Bob", 0),
        player_bingo_json("Cara", 3),
        player_bingo_json("Bob", 0),
    ]));
    expect_connected(&mut events).await;

    let mut session = SessionState::new("room1", "Alice");
    pump(&mut session, &mut events, 4).await;
    assert_eq!(session.store().winners().len(), 2);
    let own_before = session.store().own_board().cloned().unwrap();

    session.update(Command::ViewWinner("Bob".into()));
    assert_eq!(session.title(), "Bob's Winning Board");
    assert!(session
        .displayed()
        .unwrap()
        .cells()
        .filter(|c| c.winning)
        .all(|c| c.position.row == 0));

    session.update(Command::ViewWinner("Cara".into()));
    let shown = session.displayed().unwrap();
    assert_eq!(shown.cells().filter(|c| c.winning).count(), 5);
    assert!(shown.cells().filter(|c| c.winning).all(|c| c.position.row == 3));

    session.update(Command::ReturnToOwn);
    let shown = session.displayed().unwrap();
    assert!(shown.is_own());
    assert_eq!(shown.board, &own_before);
    assert_eq!(shown.cells().filter(|c| c.winning).count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn own_bingo_shows_banner_and_stops_clicks() {
    let (mut client, mut events, _sent, _closed) = start_client(script(vec![
        room_joined_json("room1", &["Alice"]),
        player_bingo_json("Alice", 2),
    ]));
    expect_connected(&mut events).await;

    let mut session = SessionState::new("room1", "Alice");
    let effects = pump(&mut session, &mut events, 2).await;
    assert!(effects.contains(&Effect::ShowBingo));
    assert!(session.store().has_bingo());
    assert!(session
        .update(Command::ClickCell(CellPosition::new(0, 0)))
        .is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn transport_failure_alerts_and_keeps_state() {
    let (mut client, mut events, _sent, _closed) = start_client(vec![
        Some(Ok(room_joined_json("room1", &["Alice"]))),
        Some(Err(BingoError::TransportReceive("connection reset".into()))),
    ]);
    expect_connected(&mut events).await;

    let mut session = SessionState::new("room1", "Alice");
    let effects = pump(&mut session, &mut events, 2).await;
    assert!(matches!(effects.last(), Some(Effect::Alert(msg)) if msg.contains("connection reset")));
    assert!(session.store().own_board().is_some());
    assert!(!client.is_connected());
    assert!(matches!(
        client.mark_cell(CellPosition::new(0, 0)).await,
        Err(BingoError::NotConnected)
    ));

    client.shutdown().await;
}

#[tokio::test]
async fn clean_server_close_ends_event_stream() {
    let (mut client, mut events, _sent, _closed) = start_client(vec![None]);
    expect_connected(&mut events).await;

    assert_eq!(
        events.recv().await,
        Some(SessionEvent::Disconnected { reason: None })
    );
    assert!(events.recv().await.is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn malformed_board_is_reported_not_applied() {
    let bad = r#"{"event":"room_joined","data":{"board":[[{"text":"a","marked":false}]],"has_bingo":false,"players":[]}}"#;
    let (mut client, mut events, _sent, _closed) = start_client(script(vec![bad.into()]));
    expect_connected(&mut events).await;

    let mut session = SessionState::new("room1", "Alice");
    let effects = pump(&mut session, &mut events, 1).await;
    assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("5x5")));
    assert!(session.store().own_board().is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn small_event_channel_still_delivers_disconnect() {
    let frames = (0..8)
        .map(|i| Some(Ok(player_joined_json(&format!("player{i}")))))
        .chain(std::iter::once(None))
        .collect();
    let (transport, _sent, _closed) = MockTransport::new(frames);
    let (mut client, mut events) = RoomSessionClient::start(
        transport,
        ClientConfig::new().with_event_channel_capacity(2),
    );

    // Let the loop overrun the channel before draining it.
    settle().await;
    let mut last = None;
    while let Some(ev) = events.recv().await {
        last = Some(ev);
    }
    assert_eq!(last, Some(SessionEvent::Disconnected { reason: None }));

    client.shutdown().await;
}
