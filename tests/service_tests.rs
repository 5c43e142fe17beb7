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

use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use wx_uploader::diagnostic::{self, DiagnosticOptions};
use wx_uploader::{Record, UnitSystem, UploadConfig, UploadService};

fn uploader(protocol: &str, server_url: String) -> UploadConfig {
    let mut config = UploadConfig::new(protocol, "ABC123");
    config.server_url = Some(server_url);
    config.retry_wait = 0;
    config.timeout = 5;
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_record_reaches_every_uploader() {
    let mut nowdawn = Server::new_async().await;
    let mut scenic = Server::new_async().await;

    let nowdawn_mock = nowdawn
        .mock("POST", "/ABC123")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;
    let scenic_mock = scenic
        .mock("POST", "/station/0/key/ABC123")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let mut service = UploadService::from_config(&[
        uploader("nowdawn", nowdawn.url()),
        uploader("scenic", scenic.url()),
    ])
    .unwrap();
    assert_eq!(service.len(), 2);

    let now = chrono::Utc::now().timestamp();
    for offset in 0..2 {
        let record = Record::new(now + offset, UnitSystem::MetricWx).with("outTemp", 20.0);
        service.new_archive_record(record);
    }

    assert!(service.shutdown(Duration::from_secs(10)).await);
    nowdawn_mock.assert_async().await;
    scenic_mock.assert_async().await;

    for (_, stats) in service.stats() {
        assert_eq!(stats.uploaded, 2);
    }
}

#[tokio::test]
async fn test_failing_uploader_does_not_block_others() {
    let mut healthy = Server::new_async().await;
    let mut broken = Server::new_async().await;

    let healthy_mock = healthy
        .mock("POST", "/ABC123")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let _broken_mock = broken
        .mock("POST", Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let mut slow = uploader("scenic", broken.url());
    slow.retry_wait = 3600;

    let mut service =
        UploadService::from_config(&[uploader("nowdawn", healthy.url()), slow]).unwrap();
    service.new_archive_record(Record::new(chrono::Utc::now().timestamp(), UnitSystem::Us));

    assert!(!service.shutdown(Duration::from_secs(2)).await);
    healthy_mock.assert_async().await;

    let stats = service.stats();
    assert_eq!(stats[0].0, "nowdawn");
    assert_eq!(stats[0].1.uploaded, 1);
    assert_eq!(stats[1].1.uploaded, 0);
}

#[tokio::test]
async fn test_diagnostic_posts_synthetic_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ABC123")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "observations": [{ "station": 0, "winddir": 32.0, "rh": 24.0 }]
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let mut options = DiagnosticOptions::new("nowdawn");
    options.server_url = Some(server.url());
    options.timeout = Duration::from_secs(10);

    let stats = diagnostic::run(options).await.unwrap();
    mock.assert_async().await;
    assert_eq!(stats.uploaded, 1);
}

#[tokio::test]
async fn test_diagnostic_dry_run() {
    let mut options = DiagnosticOptions::new("scenic");
    options.skip_upload = true;

    let stats = diagnostic::run(options).await.unwrap();
    assert_eq!(stats.dry_run, 1);
    assert_eq!(stats.attempts, 0);
}

#[tokio::test]
async fn test_diagnostic_unknown_protocol() {
    let result = diagnostic::run(DiagnosticOptions::new("windy")).await;
    assert!(result.is_err());
}
