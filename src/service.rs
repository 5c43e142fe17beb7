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

use crate::config::UploadConfig;
use crate::error::ConfigError;
use crate::record::Record;
use crate::worker::{UploadWorker, WorkerHandle, WorkerStatsSnapshot};
use std::time::Duration;
use tracing::{info, warn};

/// Receives new records from the producer and hands them to every uploader
pub struct UploadService {
    workers: Vec<WorkerHandle>,
}

impl UploadService {
    /// Build and start one worker per enabled uploader
    ///
    /// Every uploader is validated before the first worker is spawned, so a
    /// configuration error leaves nothing running.
    pub fn from_config(uploaders: &[UploadConfig]) -> Result<Self, ConfigError> {
        info!("wx-uploader version {}", crate::VERSION);

        let workers = uploaders
            .iter()
            .filter(|config| {
                if !config.enabled {
                    info!("{}: uploader disabled", config.protocol);
                }
                config.enabled
            })
            .map(|config| UploadWorker::new(config.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_workers(workers))
    }

    /// Start already constructed workers
    pub fn from_workers(workers: Vec<UploadWorker>) -> Self {
        Self {
            workers: workers.into_iter().map(UploadWorker::spawn).collect(),
        }
    }

    /// New archive record from the producer; never blocks
    pub fn new_archive_record(&self, record: Record) {
        if let Some((last, rest)) = self.workers.split_last() {
            for worker in rest {
                worker.enqueue(record.clone());
            }
            last.enqueue(record);
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Per-uploader counters, in configuration order
    pub fn stats(&self) -> Vec<(&'static str, WorkerStatsSnapshot)> {
        self.workers
            .iter()
            .map(|worker| (worker.protocol(), worker.stats()))
            .collect()
    }

    /// Close every queue and wait for the workers, sharing one deadline
    ///
    /// Returns `true` when every worker drained its queue in time.
    pub async fn shutdown(&mut self, timeout: Duration) -> bool {
        for worker in &self.workers {
            worker.queue().close();
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut all_finished = true;
        for worker in &mut self.workers {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if !worker.shutdown(remaining).await {
                all_finished = false;
            }
        }

        if !all_finished {
            warn!("Some uploaders were still busy at shutdown");
        }
        all_finished
    }
}
