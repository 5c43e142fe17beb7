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

// Configuration types for wx-uploader

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder written by installers before the user supplies a real key
pub const API_KEY_PLACEHOLDER: &str = "replace_me";

/// Upper bound for a backed-off retry wait
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(300);

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub uploaders: Vec<UploadConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings of one uploader instance
///
/// Immutable once a worker has been built from it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Remote protocol: "nowdawn" or "scenic"
    pub protocol: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: String,

    /// Station identifier, distinguishes several stations on one account
    #[serde(default)]
    pub station: i64,

    /// Overrides the protocol's default base URL
    #[serde(default)]
    pub server_url: Option<String>,

    /// Dry run: format records but never POST them
    #[serde(default)]
    pub skip_upload: bool,

    /// Minimum seconds between two posted records
    #[serde(default)]
    pub post_interval: Option<u64>,

    /// Queue capacity, unbounded when unset
    #[serde(default)]
    pub max_backlog: Option<usize>,

    /// Records older than this many seconds are skipped
    #[serde(default)]
    pub stale: Option<u64>,

    #[serde(default = "default_true")]
    pub log_success: bool,

    #[serde(default = "default_true")]
    pub log_failure: bool,

    /// Per-attempt HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    /// Seconds to wait between attempts
    #[serde(default = "default_retry_wait")]
    pub retry_wait: u64,

    /// Multiplier applied to the wait after each failed attempt
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            protocol: "nowdawn".to_string(),
            enabled: true,
            api_key: String::new(),
            station: 0,
            server_url: None,
            skip_upload: false,
            post_interval: None,
            max_backlog: None,
            stale: None,
            log_success: true,
            log_failure: true,
            timeout: default_timeout(),
            max_tries: default_max_tries(),
            retry_wait: default_retry_wait(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

impl UploadConfig {
    pub fn new(protocol: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait)
    }

    /// Wait before the attempt following `failed_attempts` failures
    pub fn retry_delay(&self, failed_attempts: u32) -> Duration {
        let factor = self.retry_backoff.powi(failed_attempts.saturating_sub(1) as i32);
        let secs = self.retry_wait as f64 * factor;
        if !secs.is_finite() || secs >= MAX_RETRY_WAIT.as_secs_f64() {
            return MAX_RETRY_WAIT.max(self.retry_wait());
        }
        Duration::from_secs_f64(secs)
    }

    /// Check the options a worker cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            return Err(ConfigError::MissingApiKey {
                protocol: self.protocol.clone(),
            });
        }

        if self.max_tries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tries",
                reason: "must be > 0".to_string(),
            });
        }

        if self.max_backlog == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_backlog",
                reason: "must be > 0".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be > 0".to_string(),
            });
        }

        if !self.retry_backoff.is_finite() || self.retry_backoff < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_backoff",
                reason: format!("must be a finite value >= 1.0, got {}", self.retry_backoff),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_timeout() -> u64 { 60 }
fn default_max_tries() -> u32 { 3 }
fn default_retry_wait() -> u64 { 5 }
fn default_retry_backoff() -> f64 { 1.0 }
fn default_log_level() -> String { "info".to_string() }
