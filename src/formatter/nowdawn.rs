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

// NowDawn protocol
//
// POST {base}/{api_key} with short field names. Fields the station did not
// observe are left out of the observation object.

use super::{json_payload, observation_header, observations, Formatter, Observation, Payload};
use crate::config::UploadConfig;
use crate::error::FormatError;
use crate::record::Record;
use serde_json::json;

pub const DEFAULT_URL: &str = "https://stations.nowdawn.com";

#[derive(Debug, Default, Clone, Copy)]
pub struct NowDawnFormatter;

impl NowDawnFormatter {
    fn key(observation: Observation) -> &'static str {
        match observation {
            Observation::Temperature => "temp",
            Observation::WindSpeed => "wind",
            Observation::WindDirection => "winddir",
            Observation::WindGust => "gust",
            Observation::Humidity => "rh",
            Observation::Dewpoint => "dewpoint",
            Observation::Pressure => "pressure",
            Observation::HourRain => "precip",
            Observation::Uv => "uv",
        }
    }
}

impl Formatter for NowDawnFormatter {
    fn name(&self) -> &'static str {
        "nowdawn"
    }

    fn default_server_url(&self) -> &'static str {
        DEFAULT_URL
    }

    fn build_url(&self, config: &UploadConfig) -> String {
        format!("{}/{}", self.server_url(config), config.api_key)
    }

    fn build_body(&self, record: &Record, config: &UploadConfig) -> Result<Payload, FormatError> {
        let mut data = observation_header(record, config)?;
        for (observation, value) in observations(record)? {
            if let Some(value) = value {
                data.insert(Self::key(observation).to_string(), json!(value));
            }
        }
        json_payload(data)
    }
}
