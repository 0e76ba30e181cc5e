//! # disposable-domains
//!
//! Aggregates disposable-email-domain lists from remote sources, reconciles them
//! against a trusted allow list, and publishes sorted, deduplicated deny and allow
//! sets as text and JSON artifacts.
//!
//! ## Design Philosophy
//!
//! - **Partial data over no data** - A failing upstream never aborts a run; it is
//!   reported as a diagnostic alongside the counts
//! - **Deterministic output** - Same inputs give byte-identical artifacts
//! - **Injectable edges** - Network, timers, and the public suffix list sit behind
//!   traits so the pipeline runs in tests without any of them
//!
//! ## Quick Start
//!
//! ```no_run
//! use disposable_domains::{Config, SourceDeclaration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let sources = SourceDeclaration::load(&config.sources)?;
//!
//!     let report = disposable_domains::run(&config, &sources).await?;
//!     println!("deny={} allow={}", report.deny_count, report.allow_count);
//!     if let Some(diagnostics) = report.diagnostics {
//!         eprintln!("some sources failed: {diagnostics}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Value-plus-diagnostics results
pub mod diagnostics;
/// Error types
pub mod error;
/// Body decoding into candidate domains
pub mod extract;
/// HTTP fetching with a bounded body
pub mod fetch;
/// Domain normalization
pub mod normalize;
/// Run orchestration
pub mod pipeline;
/// Set reconciliation and eTLD+1 comparison
pub mod reconcile;
/// Retry logic with cancellable backoff
pub mod retry;
/// Source declaration loading
pub mod sources;
/// Tracing subscriber setup
pub mod telemetry;
/// Core types
pub mod types;
/// Artifact writing
pub mod writer;

// Re-export commonly used types
pub use config::{Config, FetchConfig, OutputPaths, RetryConfig, SourcePaths};
pub use diagnostics::Partial;
pub use error::{
    DecodeError, Error, FetchError, Result, SourceDiagnostic, SourceError, SourceErrors,
    WriteError,
};
pub use fetch::{Fetcher, HttpFetcher};
pub use pipeline::Pipeline;
pub use reconcile::{DomainSets, PublicSuffixList, StaticSuffixList, SuffixLookup};
pub use retry::{Sleeper, TokioSleeper};
pub use sources::SourceDeclaration;
pub use types::{Direction, RunReport, Stage};

use tokio_util::sync::CancellationToken;

/// Run the pipeline once with production capabilities and the configured deadline
///
/// # Errors
/// Returns error if the configuration is invalid, the HTTP client cannot be built,
/// or an output artifact cannot be written
pub async fn run(config: &Config, sources: &SourceDeclaration) -> Result<RunReport> {
    Pipeline::new(config)?
        .run(sources, &config.outputs, config.timeout)
        .await
}

/// Like [`run`], but a termination signal also cancels outstanding fetches.
///
/// On SIGTERM/SIGINT (Ctrl+C elsewhere) the run stops fetching and still writes
/// whatever was collected, exactly as when the deadline expires.
///
/// # Example
///
/// ```no_run
/// use disposable_domains::{Config, SourceDeclaration, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let sources = SourceDeclaration::load(&config.sources)?;
///     let report = run_with_shutdown(&config, &sources).await?;
///     println!("deny={} allow={}", report.deny_count, report.allow_count);
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(config: &Config, sources: &SourceDeclaration) -> Result<RunReport> {
    let pipeline = Pipeline::new(config)?;
    let cancel = CancellationToken::new();

    let deadline_task = pipeline::arm_deadline(config.timeout, &cancel);
    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            wait_for_signal().await;
            cancel.cancel();
        }
    });

    let result = pipeline
        .run_until_cancelled(sources, &config.outputs, cancel)
        .await;
    deadline_task.abort();
    signal_task.abort();
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, cancelling outstanding fetches");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, cancelling outstanding fetches");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, cancelling outstanding fetches");
            } else {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, cancelling outstanding fetches");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
