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

// Weather station uploader
//
// Relays station records to remote HTTP endpoints in the background:
// - Bounded drop-oldest queue per uploader, the producer never blocks
// - One worker task per uploader with staleness and throttle policies
// - Retries with fixed or exponential delay on failed POSTs
// - Pluggable request formatters (NowDawn, Scenic Weather)

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod formatter;
pub mod queue;
pub mod record;
pub mod service;
pub mod transport;
pub mod units;
pub mod worker;

/// Crate version, reported at startup and in the User-Agent header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types
pub use config::{load_config, load_config_with_env, AppConfig, UploadConfig};
pub use error::{ConfigError, FormatError, SendError};
pub use formatter::{Formatter, FormatterFactory, NowDawnFormatter, Payload, ScenicFormatter};
pub use queue::{Dequeued, QueueStats, UploadQueue};
pub use record::{to_metric, Record};
pub use service::UploadService;
pub use transport::{HttpTransport, Transport};
pub use units::UnitSystem;
pub use worker::{Outcome, UploadWorker, WorkerHandle, WorkerStatsSnapshot};
