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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wx_uploader::config::load_config_with_env;
use wx_uploader::diagnostic::{self, DiagnosticOptions};
use wx_uploader::{Record, UploadService};

/// wx-uploader - Relay weather station records to remote services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload newline-delimited JSON records read from stdin
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Seconds to wait for queued uploads on shutdown
        #[arg(long, default_value_t = 30)]
        shutdown_timeout: u64,
    },

    /// Send one synthetic record to verify a protocol by hand
    Diagnose {
        /// Protocol to exercise: nowdawn or scenic
        #[arg(short, long, default_value = "nowdawn")]
        protocol: String,

        /// Base URL overriding the protocol default
        #[arg(long)]
        server_url: Option<String>,

        /// Format the record but do not POST it
        #[arg(long)]
        dry_run: bool,

        /// Seconds to wait for the worker to finish
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        #[arg(long, default_value = "info")]
        log_level: String,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run {
            config,
            shutdown_timeout,
        } => run(config, Duration::from_secs(shutdown_timeout)).await,
        Command::Diagnose {
            protocol,
            server_url,
            dry_run,
            timeout,
            log_level,
        } => {
            init_tracing(&log_level)?;

            let options = DiagnosticOptions {
                protocol,
                server_url,
                skip_upload: dry_run,
                timeout: Duration::from_secs(timeout),
            };
            let stats = diagnostic::run(options).await?;
            info!(
                "Diagnostic finished: {} uploaded, {} failed after {} attempts",
                stats.uploaded, stats.failed, stats.attempts
            );
            Ok(())
        }
    }
}

async fn run(config_path: PathBuf, shutdown_timeout: Duration) -> Result<()> {
    let app_config = load_config_with_env(&config_path)?;
    init_tracing(&app_config.logging.level)?;

    info!("Loaded configuration from: {:?}", config_path);

    let mut service = UploadService::from_config(&app_config.uploaders)
        .context("Failed to start uploaders")?;
    info!("Started {} uploader(s)", service.len());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match serde_json::from_str::<Record>(&line) {
                        Ok(record) => service.new_archive_record(record),
                        Err(e) => warn!("Ignoring malformed record: {}", e),
                    },
                    None => {
                        info!("Input closed, shutting down");
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    if service.shutdown(shutdown_timeout).await {
        info!("wx-uploader shut down successfully");
    }

    for (protocol, stats) in service.stats() {
        info!(
            "{}: {} uploaded, {} failed, {} stale, {} throttled",
            protocol, stats.uploaded, stats.failed, stats.stale, stats.throttled
        );
    }

    Ok(())
}
