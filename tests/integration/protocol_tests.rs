//! Envelope handling, system commands and reply framing.

use std::sync::Arc;
use std::thread;

use serde_json::{Value, json};

use luxguard::adapters::rpc_adapter::SerialEventSink;
use luxguard::adapters::uart::UartSerial;
use luxguard::app::refresh::RefreshLoop;
use luxguard::channel::SensorReading;
use luxguard::error::HalError;
use luxguard::rpc::channels::{FrameChannel, FrameProducer};
use luxguard::rpc::engine::Handled;

use crate::mock_hw::{NOMINAL, NoDelay, Rig, Trace, ch};

#[test]
fn ping_echoes_envelope() {
    let mut rig = Rig::new();
    let resp = rig.call("system", "ping", json!({}));
    assert_eq!(resp["type"], "resp");
    assert_eq!(resp["topic"], "system");
    assert_eq!(resp["action"], "ping");
    assert_eq!(resp["data"]["status"], "ok");
    assert_eq!(resp["data"]["message"], "pong");
}

#[test]
fn id_is_echoed_or_defaulted() {
    let mut rig = Rig::new();

    rig.line(r#"{"type":"cmd","id":42,"topic":"system","action":"ping"}"#);
    rig.line(r#"{"type":"cmd","topic":"system","action":"ping"}"#);
    rig.line(r#"{"type":"cmd","id":"abc-1","topic":"system","action":"ping"}"#);
    rig.line(r#"{"type":"cmd","id":"123e4567-e89b-12d3-a456-426614174000","topic":"system","action":"ping"}"#);

    let frames = rig.journal.frames();
    assert_eq!(frames[0]["id"], "42");
    assert_eq!(frames[1]["id"], "unknown");
    assert_eq!(frames[2]["id"], "abc-1");
    assert_eq!(frames[3]["id"], "123e4567-e89b-12d3-a456-426614174000");
}

#[test]
fn non_command_input_gets_no_reply() {
    let mut rig = Rig::new();
    for line in [
        "not json at all",
        "[1,2,3]",
        r#"{"type":"resp","id":"1","topic":"system","action":"ping"}"#,
        r#"{"id":"1","topic":"system","action":"ping"}"#,
        r#"{"type":"cmd","id":"1","topic":"system""#,
    ] {
        assert_eq!(rig.line(line), Handled::Discarded, "{line}");
    }
    assert!(rig.journal.frames().is_empty());
    assert_eq!(rig.engine.discarded(), 5);
}

#[test]
fn unknown_routes_are_invalid_command() {
    let mut rig = Rig::new();
    assert_eq!(rig.status("lamp", "set", json!({})), "invalid_command");
    assert_eq!(rig.status("light", "blink", json!({})), "invalid_command");

    rig.line(r#"{"type":"cmd","id":"x"}"#);
    let frames = rig.journal.frames();
    let last = frames.last().unwrap();
    assert_eq!(last["id"], "x");
    assert_eq!(last["data"]["status"], "invalid_command");
}

#[test]
fn info_reports_device_and_uptime() {
    let mut rig = Rig::new();
    rig.clock.set(90_000);
    let resp = rig.call("system", "info", json!({}));
    let data = &resp["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["device"], "luxguard");
    assert_eq!(data["channels"], 3);
    assert_eq!(data["uptime_ms"], 90_000);
    assert!(data["version"].is_string());
}

#[test]
fn reset_replies_before_restarting() {
    let mut rig = Rig::new();
    rig.journal.take();

    let handled = rig.line(r#"{"type":"cmd","id":"r1","topic":"system","action":"reset"}"#);
    assert_eq!(handled, Handled::Restarted);

    let trace = rig.journal.take();
    assert_eq!(trace.len(), 2);
    match &trace[0] {
        Trace::Tx(resp) => {
            assert_eq!(resp["id"], "r1");
            assert_eq!(resp["data"]["status"], "ok");
        }
        other => panic!("expected reply first, got {other:?}"),
    }
    assert_eq!(trace[1], Trace::Restart);
    assert_eq!(rig.delay.total_ms, 100, "grace delay between reply and restart");
}

#[test]
fn reset_still_restarts_when_reply_cannot_be_sent() {
    let mut rig = Rig::new();
    rig.serial.fail_with(Some(HalError::Timeout));

    let handled = rig.line(r#"{"type":"cmd","id":"r2","topic":"system","action":"reset"}"#);
    assert_eq!(handled, Handled::Restarted);
    assert_eq!(rig.journal.take(), vec![Trace::Restart]);
    assert_eq!(rig.engine.tx_failures(), 1);
}

#[test]
fn transmit_timeout_does_not_undo_the_command() {
    let mut rig = Rig::new();
    rig.serial.fail_with(Some(HalError::Timeout));
    rig.line(r#"{"type":"cmd","id":"1","topic":"light","action":"set","data":{"id":1,"intensity":55}}"#);
    assert_eq!(rig.shared.with(|s| s.get_intensity(ch(1))), 55);
    assert_eq!(rig.engine.tx_failures(), 1);
    assert_eq!(rig.engine.replies(), 1);
}

#[test]
fn reply_waits_for_event_in_flight() {
    let rig = Rig::new();
    let uart = Arc::new(UartSerial::new());
    let mut engine = rig.engine_on(Arc::clone(&uart));

    uart.sim_hold_tx(true);
    let event_tx = {
        let uart = Arc::clone(&uart);
        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(5));
            uart.sim_hold_tx(false);
        })
    };

    let handled = engine.handle_line(
        br#"{"type":"cmd","id":"w","topic":"system","action":"ping"}"#,
        &mut NoDelay::default(),
    );
    event_tx.join().unwrap();

    assert_eq!(handled, Handled::Replied);
    assert_eq!(engine.tx_failures(), 0);
    let resp: Value = serde_json::from_slice(&uart.sim_take_tx()).unwrap();
    assert_eq!(resp["id"], "w");
}

#[test]
fn replies_and_events_share_the_uart_without_loss() {
    const ROUNDS: u32 = 20;
    const OVER_CURRENT: SensorReading = SensorReading::new(72.5, 40.0);

    let rig = Rig::new();
    let uart = Arc::new(UartSerial::new());
    let mut engine = rig.engine_on(Arc::clone(&uart));

    // Refresh side: one trip and one clear per round.
    let refresh = {
        let shared = rig.shared.clone();
        let mut sink = SerialEventSink::new(Arc::clone(&uart), 1000);
        thread::spawn(move || {
            let mut refresh = RefreshLoop::new(100);
            for _ in 0..ROUNDS {
                shared.with(|s| s.hardware_mut().sim_set_reading(ch(1), OVER_CURRENT));
                assert_eq!(refresh.tick(&shared, &mut sink), 1);
                shared.with(|s| {
                    s.hardware_mut().sim_set_reading(ch(1), NOMINAL);
                    s.clear_alarm(ch(1))
                })
                .unwrap();
            }
            sink
        })
    };

    for i in 0..ROUNDS {
        let line = format!(r#"{{"type":"cmd","id":"c{i}","topic":"system","action":"ping"}}"#);
        assert_eq!(
            engine.handle_line(line.as_bytes(), &mut NoDelay::default()),
            Handled::Replied
        );
    }
    let sink = refresh.join().unwrap();

    assert_eq!(sink.sent(), ROUNDS);
    assert_eq!(sink.dropped(), 0);
    assert_eq!(engine.tx_failures(), 0);

    let tx = uart.sim_take_tx();
    let frames: Vec<Value> = tx
        .split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_slice(l).unwrap())
        .collect();
    let replies: Vec<&Value> = frames.iter().filter(|f| f["type"] == "resp").collect();
    let events = frames.iter().filter(|f| f["type"] == "event").count();

    assert_eq!(replies.len(), ROUNDS as usize);
    assert_eq!(events, ROUNDS as usize);
    for (i, resp) in replies.iter().enumerate() {
        assert_eq!(resp["id"], format!("c{i}"));
    }
}

#[test]
fn bytes_split_across_reads_frame_into_lines() {
    let mut rig = Rig::new();
    let channel = FrameChannel::new();
    let mut producer = FrameProducer::new(&channel);

    producer.on_bytes(b"{\"type\":\"cmd\",\"id\":\"a\",\"topic\":\"sys");
    assert!(channel.try_receive().is_err());
    producer.on_bytes(b"tem\",\"action\":\"ping\"}\r\n\n{\"type\":\"cmd\",\"id\":\"b\",");
    producer.on_bytes(b"\"topic\":\"system\",\"action\":\"ping\"}\n");

    while let Ok(frame) = channel.try_receive() {
        rig.engine.handle_line(&frame, &mut rig.delay);
    }
    let frames = rig.journal.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["id"], "a");
    assert_eq!(frames[1]["id"], "b");
}
