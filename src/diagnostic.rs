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

// Manual protocol check: push one synthetic record through a real worker

use crate::config::UploadConfig;
use crate::error::ConfigError;
use crate::record::Record;
use crate::units::UnitSystem;
use crate::worker::{UploadWorker, WorkerStatsSnapshot};
use std::time::Duration;
use tracing::warn;

pub const DIAGNOSTIC_API_KEY: &str = "ABC123";
pub const DIAGNOSTIC_STATION: i64 = 0;
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DiagnosticOptions {
    pub protocol: String,
    pub server_url: Option<String>,
    pub skip_upload: bool,
    pub timeout: Duration,
}

impl DiagnosticOptions {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            server_url: None,
            skip_upload: false,
            timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

/// Reading in US units resembling a mild day
pub fn synthetic_record(date_time: i64) -> Record {
    Record::new(date_time, UnitSystem::Us)
        .with("outTemp", 32.5)
        .with("inTemp", 75.8)
        .with("outHumidity", 24.0)
        .with("windSpeed", 10.0)
        .with("windDir", 32.0)
}

/// Print the upload URL, send one synthetic record and wait for the worker
pub async fn run(options: DiagnosticOptions) -> Result<WorkerStatsSnapshot, ConfigError> {
    let mut config = UploadConfig::new(options.protocol, DIAGNOSTIC_API_KEY);
    config.station = DIAGNOSTIC_STATION;
    config.server_url = options.server_url;
    config.skip_upload = options.skip_upload;

    let worker = UploadWorker::new(config)?;
    println!("{}", worker.url());

    let queue = worker.queue();
    let mut handle = worker.spawn();
    queue.enqueue(synthetic_record(chrono::Utc::now().timestamp()));

    if !handle.shutdown(options.timeout).await {
        warn!("Diagnostic upload did not finish within {:?}", options.timeout);
    }

    Ok(handle.stats())
}
