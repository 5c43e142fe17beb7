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

// HTTP transport used by upload workers

use crate::error::{ConfigError, SendError};
use crate::formatter::Payload;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// User agent sent with every upload
pub const USER_AGENT: &str = concat!("wx-uploader/", env!("CARGO_PKG_VERSION"));

/// Delivers one formatted request
///
/// A single call is a single attempt; retries are the worker's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, payload: &Payload) -> Result<(), SendError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, payload: &Payload) -> Result<(), SendError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, payload.content_type)
            .body(payload.body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Status { status, body });
        }

        Ok(())
    }
}
