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

// Request formatters
//
// One formatter per remote protocol. A formatter is a pure mapping from a
// normalized record to the URL and body of a POST; the worker owns all I/O.
// Protocols differ in URL shape, field names and whether absent fields are
// omitted or sent as null.

pub mod factory;
pub mod nowdawn;
pub mod scenic;

pub use factory::FormatterFactory;
pub use nowdawn::NowDawnFormatter;
pub use scenic::ScenicFormatter;

use crate::config::UploadConfig;
use crate::error::FormatError;
use crate::record::Record;
use serde_json::{json, Map, Value};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Formatted request body
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Protocol-specific request shape
pub trait Formatter: Send + Sync {
    /// Protocol identifier used in configuration and logs
    fn name(&self) -> &'static str;

    /// Base URL used when the configuration does not override it
    fn default_server_url(&self) -> &'static str;

    /// URL to POST a record to
    fn build_url(&self, config: &UploadConfig) -> String;

    /// Request body for an already normalized record
    fn build_body(&self, record: &Record, config: &UploadConfig) -> Result<Payload, FormatError>;

    fn server_url<'a>(&'a self, config: &'a UploadConfig) -> &'a str {
        config
            .server_url
            .as_deref()
            .unwrap_or(self.default_server_url())
            .trim_end_matches('/')
    }
}

/// Quantities every protocol reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Temperature,
    WindSpeed,
    WindDirection,
    WindGust,
    Humidity,
    Dewpoint,
    Pressure,
    HourRain,
    Uv,
}

impl Observation {
    pub const ALL: [Observation; 9] = [
        Observation::Temperature,
        Observation::WindSpeed,
        Observation::WindDirection,
        Observation::WindGust,
        Observation::Humidity,
        Observation::Dewpoint,
        Observation::Pressure,
        Observation::HourRain,
        Observation::Uv,
    ];

    /// Record field the observation is read from
    pub fn source(self) -> &'static str {
        match self {
            Observation::Temperature => "outTemp",
            Observation::WindSpeed => "windSpeed",
            Observation::WindDirection => "windDir",
            Observation::WindGust => "windGust",
            Observation::Humidity => "outHumidity",
            Observation::Dewpoint => "dewpoint",
            Observation::Pressure => "barometer",
            Observation::HourRain => "hourRain",
            Observation::Uv => "UV",
        }
    }

    /// Value in wire units; pressure goes out in Pascals
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            Observation::Pressure => pressure_pa(record),
            other => record.get(other.source()),
        }
    }
}

/// Barometric pressure in Pascals, `None` when the record has none
pub fn pressure_pa(record: &Record) -> Option<f64> {
    record.get(Observation::Pressure.source()).map(|mbar| 100.0 * mbar)
}

/// UTC timestamp as `YYYY-MM-DD HH:MM:SS`
pub fn format_dateutc(timestamp: i64) -> Result<String, FormatError> {
    let datetime = chrono::DateTime::from_timestamp(timestamp, 0)
        .ok_or(FormatError::InvalidTimestamp(timestamp))?;
    Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Every observation with its wire value, rejecting values JSON cannot carry
pub fn observations(record: &Record) -> Result<Vec<(Observation, Option<f64>)>, FormatError> {
    Observation::ALL
        .iter()
        .map(|&observation| match observation.value(record) {
            Some(value) if !value.is_finite() => Err(FormatError::NonFinite {
                field: observation.source(),
                value,
            }),
            value => Ok((observation, value)),
        })
        .collect()
}

/// Observation object preloaded with the fields every protocol sends
pub(crate) fn observation_header(
    record: &Record,
    config: &UploadConfig,
) -> Result<Map<String, Value>, FormatError> {
    let mut data = Map::new();
    data.insert("station".to_string(), json!(config.station));
    data.insert("dateutc".to_string(), json!(format_dateutc(record.date_time)?));
    Ok(data)
}

/// Wrap one observation object into the `observations` envelope
pub(crate) fn json_payload(data: Map<String, Value>) -> Result<Payload, FormatError> {
    let body = serde_json::to_vec(&json!({ "observations": [data] }))?;
    Ok(Payload {
        body,
        content_type: CONTENT_TYPE_JSON,
    })
}
