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

// Upload worker
//
// One long-lived task per uploader instance. It drains its own queue and
// takes each record through staleness and throttle checks, normalization,
// formatting and the POST with retries before looking at the next one.
// Nothing that goes wrong here reaches the producer.

use crate::config::UploadConfig;
use crate::error::{ConfigError, SendError};
use crate::formatter::{format_dateutc, Formatter, FormatterFactory, Payload};
use crate::queue::{Dequeued, UploadQueue};
use crate::record::Record;
use crate::transport::{HttpTransport, Transport};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// How often an idle worker wakes up to re-check cancellation
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What happened to one dequeued record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Uploaded,
    /// Every attempt failed
    Failed,
    Stale,
    Throttled,
    FormatError,
    /// Formatted but not sent because `skip_upload` is set
    DryRun,
    /// Cancellation interrupted the upload
    Cancelled,
}

/// Per-worker counters, shared with the handle
#[derive(Debug, Default)]
pub struct WorkerStats {
    uploaded: AtomicU64,
    failed: AtomicU64,
    stale: AtomicU64,
    throttled: AtomicU64,
    format_errors: AtomicU64,
    dry_run: AtomicU64,
    attempts: AtomicU64,
    last_success: AtomicI64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    pub uploaded: u64,
    pub failed: u64,
    pub stale: u64,
    pub throttled: u64,
    pub format_errors: u64,
    pub dry_run: u64,
    /// POST attempts including retries
    pub attempts: u64,
    /// Unix time of the last successful POST
    pub last_success: Option<i64>,
}

impl WorkerStats {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Uploaded => &self.uploaded,
            Outcome::Failed => &self.failed,
            Outcome::Stale => &self.stale,
            Outcome::Throttled => &self.throttled,
            Outcome::FormatError => &self.format_errors,
            Outcome::DryRun => &self.dry_run,
            Outcome::Cancelled => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        let last_success = self.last_success.load(Ordering::Relaxed);
        WorkerStatsSnapshot {
            uploaded: self.uploaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            format_errors: self.format_errors.load(Ordering::Relaxed),
            dry_run: self.dry_run.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            last_success: (last_success != 0).then_some(last_success),
        }
    }
}

pub struct UploadWorker {
    config: Arc<UploadConfig>,
    formatter: Arc<dyn Formatter>,
    transport: Arc<dyn Transport>,
    queue: Arc<UploadQueue>,
    cancel: CancellationToken,
    stats: Arc<WorkerStats>,
    poll_interval: Duration,
    /// Timestamp of the last record that made it past the throttle
    last_post: Option<i64>,
}

impl UploadWorker {
    /// Worker posting over HTTP with the formatter named in `config.protocol`
    pub fn new(config: UploadConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let formatter = FormatterFactory::create(&config.protocol)?;
        let transport = Arc::new(HttpTransport::new(config.timeout())?);
        Self::with_parts(config, formatter, transport)
    }

    /// Worker with an explicit formatter and transport
    pub fn with_parts(
        config: UploadConfig,
        formatter: Arc<dyn Formatter>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "{}: data will be uploaded to {}",
            formatter.name(),
            formatter.server_url(&config)
        );

        Ok(Self {
            queue: Arc::new(UploadQueue::new(config.max_backlog)),
            config: Arc::new(config),
            formatter,
            transport,
            cancel: CancellationToken::new(),
            stats: Arc::new(WorkerStats::default()),
            poll_interval: POLL_INTERVAL,
            last_post: None,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn queue(&self) -> Arc<UploadQueue> {
        self.queue.clone()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// URL records are posted to
    pub fn url(&self) -> String {
        self.formatter.build_url(&self.config)
    }

    /// Run the worker on the current tokio runtime
    pub fn spawn(self) -> WorkerHandle {
        let span = info_span!(
            "uploader",
            protocol = self.formatter.name(),
            station = self.config.station
        );

        let protocol = self.formatter.name();
        let queue = self.queue.clone();
        let cancel = self.cancel.clone();
        let stats = self.stats.clone();

        let join = tokio::spawn(self.run().instrument(span));
        WorkerHandle {
            protocol,
            queue,
            cancel,
            stats,
            join: Some(join),
        }
    }

    /// Drain the queue until it is closed or the worker is cancelled
    pub async fn run(mut self) {
        debug!("Upload worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Upload worker cancelled");
                    break;
                }
                next = self.queue.dequeue_blocking(self.poll_interval) => next,
            };

            match next {
                Dequeued::Record(record) => {
                    if self.process(record).await == Outcome::Cancelled {
                        break;
                    }
                }
                Dequeued::TimedOut => continue,
                Dequeued::Closed => {
                    debug!("Upload queue closed and drained");
                    break;
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "Upload worker stopped: {} uploaded, {} failed, {} skipped",
            stats.uploaded,
            stats.failed,
            stats.stale + stats.throttled + stats.format_errors
        );
    }

    /// Take one record through the whole pipeline
    pub async fn process(&mut self, record: Record) -> Outcome {
        let outcome = self.process_inner(record).await;
        self.stats.record(outcome);
        outcome
    }

    async fn process_inner(&mut self, record: Record) -> Outcome {
        let timestamp = record.date_time;

        if let Some(age) = self.stale_age(chrono::Utc::now().timestamp(), timestamp) {
            info!(
                "Record {} skipped: too old ({}s > {}s)",
                describe(timestamp),
                age,
                self.config.stale.unwrap_or_default()
            );
            return Outcome::Stale;
        }

        if let (Some(interval), Some(last_post)) = (self.config.post_interval, self.last_post) {
            let elapsed = timestamp.saturating_sub(last_post);
            if elapsed < limit_secs(interval) {
                debug!(
                    "Record {} skipped: wait interval ({}s < {}s) has not passed",
                    describe(timestamp),
                    elapsed,
                    interval
                );
                return Outcome::Throttled;
            }
        }
        self.last_post = Some(timestamp);

        let normalized = record.normalize();
        let url = self.formatter.build_url(&self.config);
        let payload = match self.formatter.build_body(&normalized, &self.config) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Record {} dropped: {}", describe(timestamp), e);
                return Outcome::FormatError;
            }
        };

        if self.config.skip_upload {
            info!(
                "Skipping upload of record {} (dry run): {}",
                describe(timestamp),
                String::from_utf8_lossy(&payload.body)
            );
            return Outcome::DryRun;
        }

        self.post_with_retries(&url, &payload, timestamp).await
    }

    /// Age of the record at `now` if it is older than `stale` allows
    fn stale_age(&self, now: i64, timestamp: i64) -> Option<i64> {
        let stale = self.config.stale?;
        let age = now.saturating_sub(timestamp);
        (age > limit_secs(stale)).then_some(age)
    }

    async fn post_with_retries(&self, url: &str, payload: &Payload, timestamp: i64) -> Outcome {
        let max_tries = self.config.max_tries;

        for attempt in 1..=max_tries {
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Outcome::Cancelled,
                result = self.post_once(url, payload) => result,
            };

            match result {
                Ok(()) => {
                    self.stats
                        .last_success
                        .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
                    if self.config.log_success {
                        info!("Published record {}", describe(timestamp));
                    }
                    return Outcome::Uploaded;
                }
                Err(e) if attempt < max_tries => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(
                        "Failed upload attempt {}/{}: {}. Retrying in {:?}",
                        attempt, max_tries, e, delay
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Outcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    if self.config.log_failure {
                        error!(
                            "Failed to publish record {} after {} tries: {}",
                            describe(timestamp),
                            max_tries,
                            e
                        );
                    }
                }
            }
        }

        Outcome::Failed
    }

    async fn post_once(&self, url: &str, payload: &Payload) -> Result<(), SendError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.transport.post(url, payload)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(timeout)),
        }
    }
}

/// Config seconds as a signed limit; anything past `i64::MAX` never triggers
fn limit_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

fn describe(timestamp: i64) -> String {
    match format_dateutc(timestamp) {
        Ok(utc) => format!("{} ({})", utc, timestamp),
        Err(_) => timestamp.to_string(),
    }
}

/// Owner's side of a spawned worker
pub struct WorkerHandle {
    protocol: &'static str,
    queue: Arc<UploadQueue>,
    cancel: CancellationToken,
    stats: Arc<WorkerStats>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn protocol(&self) -> &'static str {
        self.protocol
    }

    /// Hand a new record to the worker; never blocks
    pub fn enqueue(&self, record: Record) {
        self.queue.enqueue(record);
    }

    pub fn queue(&self) -> &Arc<UploadQueue> {
        &self.queue
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop the worker as soon as possible, abandoning queued records
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |join| join.is_finished())
    }

    /// Close the queue and wait up to `timeout` for the worker to drain it
    ///
    /// Returns `false` if the worker was still busy at the deadline; it is
    /// then cancelled and left to wind down on its own.
    pub async fn shutdown(&mut self, timeout: Duration) -> bool {
        self.queue.close();

        let Some(join) = self.join.as_mut() else {
            return true;
        };

        let finished = tokio::time::timeout(timeout, join).await;
        match finished {
            Ok(result) => {
                if let Err(e) = result {
                    error!("{} upload worker panicked: {}", self.protocol, e);
                }
                self.join = None;
                true
            }
            Err(_) => {
                warn!(
                    "{} upload worker did not finish within {:?}, cancelling",
                    self.protocol, timeout
                );
                self.cancel.cancel();
                false
            }
        }
    }
}
