//! Common test utilities for pipeline integration tests

#![allow(dead_code)]

use disposable_domains::{
    Config, FetchConfig, HttpFetcher, OutputPaths, Pipeline, RetryConfig, StaticSuffixList,
    TokioSleeper,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Pipeline with the real HTTP fetcher, millisecond backoff, and a small suffix table
pub fn test_pipeline(concurrency: usize) -> Pipeline {
    let fetcher = HttpFetcher::new(&FetchConfig {
        request_timeout: Duration::from_secs(5),
        ..FetchConfig::default()
    })
    .unwrap();
    Pipeline::with_components(
        Arc::new(fetcher),
        Arc::new(TokioSleeper),
        Arc::new(StaticSuffixList::new(["com", "net", "org", "io", "co.uk"])),
        RetryConfig {
            backoff_step: Duration::from_millis(5),
            ..RetryConfig::default()
        },
        concurrency,
    )
}

/// Config whose outputs land in `dir` and whose retries are fast
pub fn test_config(dir: &Path) -> Config {
    Config {
        outputs: OutputPaths::in_dir(dir),
        retry: RetryConfig {
            backoff_step: Duration::from_millis(5),
            ..RetryConfig::default()
        },
        timeout: Duration::from_secs(10),
        ..Config::default()
    }
}

/// Serve `body` at `route` with status 200
pub async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve `status` at `route`, expecting exactly `attempts` requests
pub async fn serve_status(server: &MockServer, route: &str, status: u16, attempts: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .expect(attempts)
        .mount(server)
        .await;
}

/// Read an artifact as a string
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
