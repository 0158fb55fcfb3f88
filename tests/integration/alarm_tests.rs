//! Alarm latching, event emission and clearing, end to end.

use serde_json::json;

use luxguard::adapters::rpc_adapter::SerialEventSink;
use luxguard::channel::{AlarmKind, SensorReading};

use crate::mock_hw::{EventRecorder, NOMINAL, Rig, ch};

const OVER_CURRENT: SensorReading = SensorReading::new(72.5, 40.0);

#[test]
fn over_current_trips_once_and_emits_one_event() {
    let mut rig = Rig::new();
    assert_eq!(rig.status("light", "set", json!({"id": 1, "intensity": 80})), "ok");

    rig.clock.set(3_723_004);
    rig.set_reading(ch(1), OVER_CURRENT);

    let mut sink = EventRecorder::default();
    assert_eq!(rig.tick(&mut sink), 1);
    assert_eq!(rig.tick(&mut sink), 0, "still tripped, no second event");
    assert_eq!(rig.tick(&mut sink), 0);

    assert_eq!(sink.events.len(), 1);
    let ev = sink.events[0];
    assert_eq!(ev.channel, ch(1));
    assert_eq!(ev.kind, AlarmKind::OverCurrent);
    assert_eq!(ev.value, 72.5);
    assert_eq!(ev.timestamp_ms, 3_723_004);

    assert_eq!(rig.duty(ch(1)), 0);
    assert_eq!(rig.shared.with(|s| s.get_intensity(ch(1))), 0);
    assert_eq!(rig.duty(ch(2)), 0);
}

#[test]
fn event_frame_goes_out_on_the_serial_link() {
    let mut rig = Rig::new();
    rig.clock.set(3_723_004);
    rig.set_reading(ch(1), OVER_CURRENT);

    let mut sink = SerialEventSink::new(rig.serial.clone(), 100);
    rig.tick(&mut sink);

    let frames = rig.journal.frames();
    assert_eq!(frames.len(), 1);
    let ev = &frames[0];
    assert_eq!(ev["type"], "event");
    assert_eq!(ev["topic"], "alarm");
    assert_eq!(ev["action"], "triggered");
    assert_eq!(ev["data"]["source"], "light_1");
    assert_eq!(ev["data"]["code"], "over_current");
    assert_eq!(ev["data"]["value"], 72.5);
    assert_eq!(ev["data"]["timestamp"], "01:02:03.004");
    assert_eq!(ev["data"]["status"], "disabled");
}

#[test]
fn latched_channel_refuses_intensity() {
    let mut rig = Rig::new();
    rig.set_reading(ch(2), SensorReading::new(20.0, 95.0));
    rig.tick(&mut EventRecorder::default());

    // Reading back in range does not unlatch by itself.
    rig.set_reading(ch(2), NOMINAL);
    rig.tick(&mut EventRecorder::default());

    assert_eq!(
        rig.status("light", "set", json!({"id": 2, "intensity": 10})),
        "alarm_active"
    );
    assert_eq!(rig.duty(ch(2)), 0);

    // set_all skips the latched channel and drives the rest.
    assert_eq!(
        rig.status("light", "set_all", json!({"intensities": [30, 30, 30]})),
        "ok"
    );
    assert_eq!([rig.duty(ch(1)), rig.duty(ch(2)), rig.duty(ch(3))], [30, 0, 30]);

    let resp = rig.call("alarm", "status", json!({}));
    let alarms = resp["data"]["alarms"].as_array().unwrap();
    assert_eq!(alarms[1]["source"], "light_2");
    assert_eq!(alarms[1]["code"], "over_temperature");
    assert_eq!(alarms[0]["code"], "none");
}

#[test]
fn clear_is_denied_while_condition_persists() {
    let mut rig = Rig::new();
    rig.set_reading(ch(1), OVER_CURRENT);
    rig.tick(&mut EventRecorder::default());

    let resp = rig.call("alarm", "clear", json!({"id": 1}));
    assert_eq!(resp["data"]["status"], "error");
    assert!(resp["data"]["message"].is_string());
    assert_eq!(
        rig.shared.with(|s| s.get_alarm_status()[0]),
        AlarmKind::OverCurrent
    );
}

#[test]
fn clear_after_recovery_then_relight() {
    let mut rig = Rig::new();
    rig.set_reading(ch(1), OVER_CURRENT);
    let mut sink = EventRecorder::default();
    rig.tick(&mut sink);

    rig.set_reading(ch(1), NOMINAL);
    let resp = rig.call("alarm", "clear", json!({"id": 1}));
    assert_eq!(resp["data"]["status"], "ok");
    assert_eq!(resp["data"]["cleared"], json!([1]));

    // Cleared channels stay dark until commanded.
    assert_eq!(rig.duty(ch(1)), 0);
    assert_eq!(rig.status("light", "set", json!({"id": 1, "intensity": 40})), "ok");
    assert_eq!(rig.duty(ch(1)), 40);

    // A second fault is a new transition and a new event.
    rig.set_reading(ch(1), OVER_CURRENT);
    rig.tick(&mut sink);
    assert_eq!(sink.events.len(), 2);
}

#[test]
fn multi_clear_reports_partial_success() {
    let mut rig = Rig::new();
    rig.set_reading(ch(1), OVER_CURRENT);
    rig.set_reading(ch(3), OVER_CURRENT);
    rig.tick(&mut EventRecorder::default());

    rig.set_reading(ch(3), NOMINAL);
    let resp = rig.call("alarm", "clear", json!({"lights": [1, 3]}));
    assert_eq!(resp["data"]["status"], "error");
    assert_eq!(resp["data"]["cleared"], json!([3]));
    assert_eq!(
        rig.shared.with(|s| s.get_alarm_status()),
        [AlarmKind::OverCurrent, AlarmKind::None, AlarmKind::None]
    );
}

#[test]
fn trips_are_persisted_in_the_error_log() {
    let mut rig = Rig::new();
    rig.clock.set(1_234);
    rig.set_reading(ch(2), OVER_CURRENT);
    rig.tick(&mut EventRecorder::default());

    let resp = rig.call("system", "get_error_count", json!({}));
    assert_eq!(resp["data"]["count"], 1);

    let resp = rig.call("system", "get_error_log", json!({}));
    let entries = resp["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["source"], "light_2");
    assert_eq!(entries[0]["code"], "over_current");
    assert_eq!(entries[0]["timestamp"], "00:00:01.234");
    assert_eq!(entries[0]["action"], "disabled");

    assert_eq!(rig.status("system", "clear_error_log", json!({})), "ok");
    let resp = rig.call("system", "get_error_count", json!({}));
    assert_eq!(resp["data"]["count"], 0);
}

#[test]
fn oversized_error_log_reply_is_truncated() {
    let mut rig = Rig::new();
    for i in 0..8u64 {
        rig.clock.set(1_000 * (i + 1));
        rig.set_reading(ch(1), OVER_CURRENT);
        rig.tick(&mut EventRecorder::default());
        rig.set_reading(ch(1), NOMINAL);
        assert_eq!(rig.status("alarm", "clear", json!({"id": 1})), "ok");
    }
    assert_eq!(rig.shared.with(|s| s.error_count()), 8);

    let resp = rig.call("system", "get_error_log", json!({"count": 8}));
    let data = &resp["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["truncated"], true);
    let entries = data["entries"].as_array().unwrap();
    assert!(!entries.is_empty() && entries.len() < 8);
    assert_eq!(data["count"], entries.len());
    // Newest first survives truncation.
    assert_eq!(entries[0]["timestamp"], "00:00:08.000");
}
