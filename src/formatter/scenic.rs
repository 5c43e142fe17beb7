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

// Scenic Weather protocol
//
// POST {base}/station/{station}/key/{api_key} with long field names.
// Every field is always sent; unobserved ones are explicit nulls.

use super::{json_payload, observation_header, observations, Formatter, Observation, Payload};
use crate::config::UploadConfig;
use crate::error::FormatError;
use crate::record::Record;
use serde_json::{json, Value};

pub const DEFAULT_URL: &str = "https://api.scenicdata.com";

#[derive(Debug, Default, Clone, Copy)]
pub struct ScenicFormatter;

impl ScenicFormatter {
    fn key(observation: Observation) -> &'static str {
        match observation {
            Observation::Temperature => "temperature",
            Observation::WindSpeed => "wind_speed",
            Observation::WindDirection => "wind_direction",
            Observation::WindGust => "gust",
            Observation::Humidity => "humidity",
            Observation::Dewpoint => "dewpoint",
            Observation::Pressure => "pressure",
            Observation::HourRain => "hour_rain",
            Observation::Uv => "ultraviolet",
        }
    }
}

impl Formatter for ScenicFormatter {
    fn name(&self) -> &'static str {
        "scenic"
    }

    fn default_server_url(&self) -> &'static str {
        DEFAULT_URL
    }

    fn build_url(&self, config: &UploadConfig) -> String {
        format!(
            "{}/station/{}/key/{}",
            self.server_url(config),
            config.station,
            config.api_key
        )
    }

    fn build_body(&self, record: &Record, config: &UploadConfig) -> Result<Payload, FormatError> {
        let mut data = observation_header(record, config)?;
        for (observation, value) in observations(record)? {
            let value = value.map_or(Value::Null, |v| json!(v));
            data.insert(Self::key(observation).to_string(), value);
        }
        json_payload(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitSystem;

    #[test]
    fn test_url_embeds_station_and_key() {
        let mut config = UploadConfig::new("scenic", "ABC123");
        config.station = 7;
        assert_eq!(
            ScenicFormatter.build_url(&config),
            "https://api.scenicdata.com/station/7/key/ABC123"
        );
    }

    #[test]
    fn test_absent_fields_are_null() {
        let record = Record::new(0, UnitSystem::MetricWx);
        let config = UploadConfig::new("scenic", "ABC123");

        let payload = ScenicFormatter.build_body(&record, &config).unwrap();
        let body: Value = serde_json::from_slice(&payload.body).unwrap();
        let obs = body["observations"][0].as_object().unwrap();

        assert_eq!(obs.len(), 11);
        for observation in Observation::ALL {
            assert!(obs[ScenicFormatter::key(observation)].is_null());
        }
        assert_eq!(obs["dateutc"], json!("1970-01-01 00:00:00"));
    }
}
