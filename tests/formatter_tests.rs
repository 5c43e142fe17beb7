// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde_json::{json, Map, Value};
use wx_uploader::formatter::{format_dateutc, Observation};
use wx_uploader::{Formatter, NowDawnFormatter, Record, ScenicFormatter, UnitSystem, UploadConfig};

const T: i64 = 1_700_000_000;

fn observation_object(formatter: &dyn Formatter, record: &Record) -> Map<String, Value> {
    let config = UploadConfig::new(formatter.name(), "ABC123");
    let payload = formatter.build_body(&record.normalize(), &config).unwrap();
    assert_eq!(payload.content_type, "application/json");

    let body: Value = serde_json::from_slice(&payload.body).unwrap();
    let observations = body["observations"].as_array().unwrap();
    assert_eq!(observations.len(), 1);
    observations[0].as_object().unwrap().clone()
}

fn scenario_record() -> Record {
    Record::new(T, UnitSystem::Us)
        .with("outTemp", 32.5)
        .with("windSpeed", 10.0)
        .with("windDir", 32.0)
}

/// Metric record with every reported field set
fn full_record() -> Record {
    Record::new(T, UnitSystem::MetricWx)
        .with("outTemp", 21.5)
        .with("windSpeed", 3.2)
        .with("windDir", 270.0)
        .with("windGust", 6.1)
        .with("outHumidity", 64.0)
        .with("dewpoint", 14.2)
        .with("barometer", 1013.25)
        .with("hourRain", 0.4)
        .with("UV", 5.0)
}

#[test]
fn test_nowdawn_us_scenario() {
    let obs = observation_object(&NowDawnFormatter, &scenario_record());

    let keys: Vec<&str> = obs.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 5);
    for key in ["station", "dateutc", "temp", "wind", "winddir"] {
        assert!(keys.contains(&key), "missing {}", key);
    }

    assert_eq!(obs["station"], json!(0));
    assert_eq!(obs["dateutc"], json!(format_dateutc(T).unwrap()));
    assert!((obs["temp"].as_f64().unwrap() - 0.2777).abs() < 1e-3);
    assert!((obs["wind"].as_f64().unwrap() - 4.4704).abs() < 1e-6);
    assert_eq!(obs["winddir"].as_f64(), Some(32.0));
}

#[test]
fn test_scenic_us_scenario() {
    let obs = observation_object(&ScenicFormatter, &scenario_record());

    assert_eq!(obs.len(), 11);
    assert!((obs["temperature"].as_f64().unwrap() - 0.2777).abs() < 1e-3);
    assert!((obs["wind_speed"].as_f64().unwrap() - 4.4704).abs() < 1e-6);
    assert_eq!(obs["wind_direction"].as_f64(), Some(32.0));

    for key in ["humidity", "gust", "dewpoint", "pressure", "hour_rain", "ultraviolet"] {
        assert!(obs[key].is_null(), "{} should be null", key);
    }
}

#[test]
fn test_timestamp_only_record_is_formattable() {
    let record = Record::new(T, UnitSystem::Us);

    let nowdawn = observation_object(&NowDawnFormatter, &record);
    assert_eq!(nowdawn.len(), 2);

    let scenic = observation_object(&ScenicFormatter, &record);
    assert_eq!(scenic.len(), 11);
}

#[test]
fn test_variant_keys_and_null_policy_for_every_field_subset() {
    let full = full_record();
    let fields: Vec<&str> = Observation::ALL.iter().map(|o| o.source()).collect();

    for mask in 0u32..(1 << fields.len()) {
        let mut record = Record::new(T, UnitSystem::MetricWx);
        for (bit, field) in fields.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                record.set(field, full.get(field));
            } else if bit % 2 == 0 {
                // Alternate between a missing key and an explicit absence marker
                record.set(field, None);
            }
        }

        let a = observation_object(&NowDawnFormatter, &record);
        let b = observation_object(&ScenicFormatter, &record);

        assert!(a.values().all(|v| !v.is_null()), "null in nowdawn body, mask {}", mask);
        assert_eq!(a.len(), 2 + mask.count_ones() as usize);
        assert_eq!(b.len(), 11);

        // Same observations present in both, under each protocol's names
        let present_a = a.len() - 2;
        let present_b = b.values().filter(|v| !v.is_null()).count() - 2;
        assert_eq!(present_a, present_b);
    }
}

#[test]
fn test_pressure_sent_in_pascals() {
    let record = Record::new(T, UnitSystem::MetricWx).with("barometer", 1002.5);

    let a = observation_object(&NowDawnFormatter, &record);
    let b = observation_object(&ScenicFormatter, &record);

    assert_eq!(a["pressure"].as_f64(), Some(100.0 * 1002.5));
    assert_eq!(b["pressure"].as_f64(), Some(100.0 * 1002.5));
}

#[test]
fn test_absent_pressure_propagates() {
    let mut record = Record::new(T, UnitSystem::Us);
    record.set("barometer", None);

    let a = observation_object(&NowDawnFormatter, &record);
    let b = observation_object(&ScenicFormatter, &record);

    assert!(!a.contains_key("pressure"));
    assert!(b["pressure"].is_null());
}

#[test]
fn test_us_pressure_normalized_before_pascals() {
    let record = Record::new(T, UnitSystem::Us).with("barometer", 30.0);
    let a = observation_object(&NowDawnFormatter, &record);

    let pascals = a["pressure"].as_f64().unwrap();
    assert!((pascals - 101_591.66).abs() < 0.1);
}

#[test]
fn test_station_identifier_in_body() {
    let mut config = UploadConfig::new("scenic", "ABC123");
    config.station = 4;

    let payload = ScenicFormatter
        .build_body(&Record::new(T, UnitSystem::MetricWx), &config)
        .unwrap();
    let body: Value = serde_json::from_slice(&payload.body).unwrap();
    assert_eq!(body["observations"][0]["station"], json!(4));
}

#[test]
fn test_formatters_are_deterministic() {
    let config = UploadConfig::new("nowdawn", "ABC123");
    let record = full_record();

    let first = NowDawnFormatter.build_body(&record, &config).unwrap();
    let second = NowDawnFormatter.build_body(&record, &config).unwrap();
    assert_eq!(first, second);
}
