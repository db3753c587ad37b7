#![no_main]

use bingo_client::protocol::{CellPosition, ServerMessage};
use bingo_client::{Command, SessionEvent, SessionState};
use libfuzzer_sys::fuzz_target;

// Each line is one inbound frame; bytes of lines that fail to decode drive
// local clicks and winner selection instead.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut session = SessionState::new("fuzz", "viewer");
    for line in text.lines() {
        let command = match serde_json::from_str::<ServerMessage>(line) {
            Ok(msg) => Command::Event(SessionEvent::from(msg)),
            Err(_) => match line.as_bytes().first() {
                Some(b'<') => Command::ReturnToOwn,
                Some(&b) if b % 2 == 0 => Command::ViewWinner(line.trim().to_owned()),
                Some(&b) => Command::ClickCell(CellPosition::new(usize::from(b % 7), usize::from(b / 37))),
                None => continue,
            },
        };
        let _ = session.update(command);

        // Returning always lands on the viewer's own board.
        if session.overlay().viewing().is_none() {
            if let Some(shown) = session.displayed() {
                assert!(shown.is_own());
            }
        }
    }
});
