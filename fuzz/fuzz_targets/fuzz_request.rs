//! Fuzz target: envelope parsing and command routing
//!
//! Feeds arbitrary lines through `parse_request`, then resolves and
//! parses any resulting command. Neither stage may panic, and every
//! accepted envelope must carry bounded fields.
//!
//! cargo fuzz run fuzz_request

#![no_main]

use libfuzzer_sys::fuzz_target;
use luxguard::rpc::command::{Command, Route};
use luxguard::rpc::wire::{MAX_FIELD_LEN, MAX_ID_LEN, parse_request};

fuzz_target!(|data: &[u8]| {
    let Some(req) = parse_request(data) else {
        return;
    };
    assert!(req.id.len() <= MAX_ID_LEN);
    assert!(req.topic.len() <= MAX_FIELD_LEN);
    assert!(req.action.len() <= MAX_FIELD_LEN);

    if let Ok(route) = Route::resolve(&req.topic, &req.action) {
        let _ = Command::parse(route, &req.data, 8);
    }
});
