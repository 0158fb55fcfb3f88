//! Intensity control through the full serial pipeline.

use serde_json::json;

use luxguard::channel::SensorReading;

use crate::mock_hw::{Rig, ch};

#[test]
fn boot_drives_all_channels_dark() {
    let rig = Rig::new();
    for n in 1..=3 {
        assert_eq!(rig.duty(ch(n)), 0);
    }
    assert_eq!(rig.shared.with(|s| s.hardware().sim_writes()), 3);
}

#[test]
fn set_then_get_round_trips_through_wire() {
    let mut rig = Rig::new();

    let resp = rig.call("light", "set", json!({"id": 2, "intensity": 75}));
    assert_eq!(resp["type"], "resp");
    assert_eq!(resp["id"], "t");
    assert_eq!(resp["topic"], "light");
    assert_eq!(resp["action"], "set");
    assert_eq!(resp["data"]["status"], "ok");
    assert_eq!(rig.duty(ch(2)), 75);

    let resp = rig.call("light", "get", json!({"id": 2}));
    assert_eq!(resp["data"]["status"], "ok");
    assert_eq!(resp["data"]["id"], 2);
    assert_eq!(resp["data"]["intensity"], 75);

    let resp = rig.call("light", "get_all", json!({}));
    assert_eq!(resp["data"]["intensities"], json!([0, 75, 0]));
}

#[test]
fn intensity_above_100_is_rejected_without_actuation() {
    let mut rig = Rig::new();
    let writes = rig.shared.with(|s| s.hardware().sim_writes());

    let status = rig.status("light", "set", json!({"id": 1, "intensity": 101}));
    assert_eq!(status, "invalid_parameter");
    assert_eq!(rig.shared.with(|s| s.hardware().sim_writes()), writes);
    assert_eq!(rig.shared.with(|s| s.get_intensity(ch(1))), 0);
}

#[test]
fn channel_out_of_range_is_invalid_parameter() {
    let mut rig = Rig::new();
    for id in [0, 4, -1, 300] {
        let status = rig.status("light", "set", json!({"id": id, "intensity": 10}));
        assert_eq!(status, "invalid_parameter", "id {id}");
    }
    assert_eq!(rig.status("light", "get", json!({})), "invalid_parameter");
}

#[test]
fn set_all_validates_every_value_first() {
    let mut rig = Rig::new();

    let status = rig.status("light", "set_all", json!({"intensities": [10, 200, 30]}));
    assert_eq!(status, "invalid_parameter");
    assert_eq!(rig.shared.with(|s| s.get_all_intensities()), [0, 0, 0]);

    assert_eq!(
        rig.status("light", "set_all", json!({"intensities": [10, 20]})),
        "invalid_parameter"
    );

    assert_eq!(
        rig.status("light", "set_all", json!({"intensities": [10, 20, 30]})),
        "ok"
    );
    assert_eq!(rig.shared.with(|s| s.get_all_intensities()), [10, 20, 30]);
    assert_eq!([rig.duty(ch(1)), rig.duty(ch(2)), rig.duty(ch(3))], [10, 20, 30]);
}

#[test]
fn set_on_overheated_channel_trips_instead_of_actuating() {
    let mut rig = Rig::new();
    rig.set_reading(ch(3), SensorReading::new(20.0, 120.0));

    let status = rig.status("light", "set", json!({"id": 3, "intensity": 50}));
    assert_eq!(status, "alarm_active");
    assert_eq!(rig.duty(ch(3)), 0);
    assert_eq!(rig.shared.with(|s| s.error_count()), 1);
}

#[test]
fn sensors_report_fresh_readings() {
    let mut rig = Rig::new();
    rig.set_reading(ch(1), SensorReading::new(12.5, 33.0));

    let resp = rig.call("status", "get_sensors", json!({"id": 1}));
    assert_eq!(resp["data"]["status"], "ok");
    assert_eq!(resp["data"]["id"], 1);
    assert_eq!(resp["data"]["current"], 12.5);
    assert_eq!(resp["data"]["temperature"], 33.0);

    let resp = rig.call("status", "get_all_sensors", json!({}));
    let sensors = resp["data"]["sensors"].as_array().unwrap();
    assert_eq!(sensors.len(), 3);
    assert_eq!(sensors[0]["id"], 1);
    assert_eq!(sensors[2]["id"], 3);
}
