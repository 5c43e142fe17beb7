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

// Error types for the upload pipeline
//
// Only configuration errors ever leave the crate's construction paths.
// Format and send errors are handled inside the worker.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Invalid uploader configuration, raised before any worker starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{protocol}: missing option api_key")]
    MissingApiKey { protocol: String },

    #[error("unknown protocol '{0}'. Supported: nowdawn, scenic")]
    UnknownProtocol(String),

    #[error("{field} is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A record that cannot be turned into a request body
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("field '{field}' has non-finite value {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("failed to serialize body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single failed POST attempt
#[derive(Debug, Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("no response within {0:?}")]
    Timeout(Duration),
}
