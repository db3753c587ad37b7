#![no_main]

use bingo_client::protocol::{ServerMessage, BOARD_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw bytes first: covers serde_json's own UTF-8 handling.
    let _ = serde_json::from_slice::<ServerMessage>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(msg) = serde_json::from_str::<ServerMessage>(s) {
            // Anything that decodes carries a well-formed board.
            let board = match &msg {
                ServerMessage::RoomJoined(payload) => Some(&payload.board),
                ServerMessage::PlayerBingo(payload) => Some(&payload.board),
                _ => None,
            };
            if let Some(board) = board {
                assert_eq!(board.cells().count(), BOARD_SIZE * BOARD_SIZE);
            }
        }
    }
});
