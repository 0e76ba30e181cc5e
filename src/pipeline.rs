//! Pipeline orchestration
//!
//! A run walks [`Stage::FetchingDeny`] → [`Stage::FetchingAllow`] → [`Stage::Normalizing`]
//! → [`Stage::Reconciling`] → [`Stage::Writing`] → [`Stage::Done`] without branching.
//! Sources that fail (after retries) or cannot be decoded contribute nothing and are
//! reported in [`RunReport::diagnostics`]; only a write failure aborts the run.
//!
//! All fetches share one [`CancellationToken`]. When it fires, in-flight attempts and
//! backoff waits end immediately, remaining sources are recorded as cancelled, and
//! the run continues with whatever was already collected.

use crate::config::{Config, OutputPaths, RetryConfig};
use crate::diagnostics::Partial;
use crate::error::{Error, FetchError, Result, SourceDiagnostic, SourceError, SourceErrors};
use crate::fetch::{Fetcher, HttpFetcher, fetch_with_retry};
use crate::normalize::normalize_domains;
use crate::reconcile::{PublicSuffixList, SuffixLookup, reconcile};
use crate::retry::{Sleeper, TokioSleeper};
use crate::sources::{Source, SourceDeclaration};
use crate::types::{Direction, RunReport, Stage};
use crate::writer::write_outputs;
use futures::{StreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Aggregation pipeline with injectable fetch, wait, and suffix-lookup capabilities
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    sleeper: Arc<dyn Sleeper>,
    suffixes: Arc<dyn SuffixLookup>,
    retry: RetryConfig,
    concurrency: usize,
}

impl Pipeline {
    /// Build a pipeline with the production HTTP fetcher, tokio timer, and public suffix list
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_components(
            Arc::new(HttpFetcher::new(&config.fetch)?),
            Arc::new(TokioSleeper),
            Arc::new(PublicSuffixList),
            config.retry.clone(),
            config.fetch.concurrency,
        ))
    }

    /// Build a pipeline from explicit capabilities
    ///
    /// `concurrency` bounds how many sources of one direction are fetched at once;
    /// values below 1 are treated as 1.
    pub fn with_components(
        fetcher: Arc<dyn Fetcher>,
        sleeper: Arc<dyn Sleeper>,
        suffixes: Arc<dyn SuffixLookup>,
        retry: RetryConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            suffixes,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    /// Run once, cancelling outstanding fetches when `deadline` elapses
    pub async fn run(
        &self,
        sources: &SourceDeclaration,
        outputs: &OutputPaths,
        deadline: Duration,
    ) -> Result<RunReport> {
        let cancel = CancellationToken::new();
        let timer = arm_deadline(deadline, &cancel);
        let result = self.run_until_cancelled(sources, outputs, cancel).await;
        timer.abort();
        result
    }

    /// Run once under a caller-owned cancellation token
    pub async fn run_until_cancelled(
        &self,
        sources: &SourceDeclaration,
        outputs: &OutputPaths,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let mut stage = Stage::FetchingDeny;
        info!(stage = %stage, "Fetching deny sources");
        let deny = self.collect(sources, Direction::Deny, &cancel).await;

        stage = stage.next();
        info!(stage = %stage, raw_deny = deny.value.len(), "Fetching allow sources");
        let allow = self.collect(sources, Direction::Allow, &cancel).await;

        stage = stage.next();
        info!(stage = %stage, raw_allow = allow.value.len(), "Normalizing domains");
        let ((deny, allow), diagnostics) = deny.zip(allow).into_parts();

        let deny = normalize_domains(deny);
        let allow = normalize_domains(allow);
        let secure = normalize_domains(&sources.secure);

        stage = stage.next();
        info!(
            stage = %stage,
            deny = deny.len(),
            allow = allow.len(),
            secure = secure.len(),
            "Reconciling domain sets"
        );
        let sets = reconcile(deny, allow, secure, self.suffixes.as_ref());

        stage = stage.next();
        info!(stage = %stage, deny = sets.deny.len(), allow = sets.allow.len(), "Writing outputs");
        if let Err(e) = write_outputs(&sets, outputs).await {
            return Err(Error::from_write(e, diagnostics));
        }

        stage = stage.next();
        info!(
            stage = %stage,
            deny = sets.deny.len(),
            allow = sets.allow.len(),
            failed_sources = diagnostics.as_ref().map_or(0, SourceErrors::len),
            "Run complete"
        );

        Ok(RunReport {
            deny_count: sets.deny.len(),
            allow_count: sets.allow.len(),
            diagnostics,
        })
    }

    /// Fetch every source of `direction`, merging results in declaration order
    async fn collect(
        &self,
        declaration: &SourceDeclaration,
        direction: Direction,
        cancel: &CancellationToken,
    ) -> Partial<Vec<String>> {
        let sources = declaration.sources(direction);
        debug!(direction = %direction, sources = sources.len(), "Collecting sources");

        // buffered (not buffer_unordered) keeps results in source order
        let results: Vec<Partial<Vec<String>>> = stream::iter(sources.iter())
            .map(|source| self.fetch_source(source, cancel))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut collected = Partial::ok(Vec::new());
        for result in results {
            collected.absorb(result);
        }
        collected
    }

    async fn fetch_source(&self, source: &Source, cancel: &CancellationToken) -> Partial<Vec<String>> {
        let outcome = if cancel.is_cancelled() {
            Err(SourceError::Fetch(FetchError::Cancelled))
        } else {
            self.fetch_and_extract(source, cancel).await
        };

        match outcome {
            Ok(domains) => {
                info!(
                    url = %source.url,
                    format = %source.format,
                    entries = domains.len(),
                    "Fetched source"
                );
                Partial::ok(domains)
            }
            Err(error) => {
                warn!(
                    url = %source.url,
                    format = %source.format,
                    error = %error,
                    "Source failed, continuing without it"
                );
                let mut partial = Partial::ok(Vec::new());
                partial.push_diagnostic(SourceDiagnostic::new(&source.url, error));
                partial
            }
        }
    }

    async fn fetch_and_extract(
        &self,
        source: &Source,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<String>, SourceError> {
        let body = fetch_with_retry(
            self.fetcher.as_ref(),
            &self.retry,
            self.sleeper.as_ref(),
            &source.url,
            cancel,
        )
        .await?;
        Ok(source.format.extract(&body)?)
    }
}

/// Cancel `cancel` once `deadline` elapses; abort the handle to disarm
pub(crate) fn arm_deadline(
    deadline: Duration,
    cancel: &CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!(
            deadline_ms = deadline.as_millis(),
            "Run deadline expired, cancelling outstanding fetches"
        );
        cancel.cancel();
    })
}
