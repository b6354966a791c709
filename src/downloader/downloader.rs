//! Core downloader implementation: one batch from URLs to outcomes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgfetch::downloader::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrent_downloads(5)
//!     .credentials("credentials.json")
//!     .build();
//!
//! let result = downloader
//!     .run(["https://example.com/a.png", "https://example.com/b.jpg"])
//!     .await?;
//! for path in result.paths() {
//!     println!("{:?}", path);
//! }
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::fetch::FetchWorker;
use super::limiter::ConcurrencyLimiter;
use super::scheduler::{Engine, JobHandle};
use crate::download::{
    BatchResult, DownloadOutcome, DownloadRequest, ExtensionResolver, FailureReason,
};
use crate::error::{Error, Result};
use crate::http::{create_http_client, Credentials, HttpClientConfig};
use crate::progress::ProgressCounter;

use futures::future::{self, FutureExt};
use std::fmt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle of the most recent run of a [`Downloader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Completed,
            _ => RunState::NotStarted,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RunState::NotStarted => 0,
            RunState::Running => 1,
            RunState::Completed => 2,
        }
    }
}

/// Represents the download controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// # fn main()  {
/// use imgfetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build();
/// # }
/// ```
///
/// A clone shares the configuration but starts with its own copy of the run
/// state and peak gauge, so runs on different clones do not overwrite each
/// other's [`state`](Self::state) or [`peak_concurrency`](Self::peak_concurrency).
/// Concurrent runs on the *same* instance report whichever finished last.
pub struct Downloader {
    config: DownloaderConfig,
    state: Arc<AtomicU8>,
    peak: Arc<AtomicUsize>,
}

impl Clone for Downloader {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::new(AtomicU8::new(self.state().as_u8())),
            peak: Arc::new(AtomicUsize::new(self.peak_concurrency())),
        }
    }
}

impl Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("peak_concurrency", &self.peak_concurrency())
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicU8::new(RunState::NotStarted.as_u8())),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Gets the directory where files will be downloaded.
    pub fn directory(&self) -> &PathBuf {
        &self.config.directory
    }

    /// Gets the number of concurrent downloads.
    pub fn concurrent_downloads(&self) -> usize {
        self.config.concurrent_downloads
    }

    /// Gets the scheduler batches run on.
    pub fn engine(&self) -> Engine {
        self.config.engine
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&reqwest::header::HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Gets the credentials file, if any.
    pub fn credentials(&self) -> Option<&PathBuf> {
        self.config.credentials.as_ref()
    }

    /// Gets whether content types are normalized before lookup.
    pub fn normalize_content_type(&self) -> bool {
        self.config.normalize_content_type
    }

    /// Gets the initial value of the progress counter.
    pub fn progress_start(&self) -> u64 {
        self.config.progress_start
    }

    /// State of the most recent run.
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Highest number of fetches that held a slot at the same time during the
    /// most recent completed run.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: RunState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Fetches every URL and returns one outcome per URL, in input order.
    ///
    /// Only setup problems are returned as errors: a zero concurrency cap, an
    /// output directory that cannot be created, unreadable credentials, or an
    /// HTTP client that cannot be built. All of them happen before the first
    /// request. Problems with individual URLs are reported in the result.
    pub async fn run<I, S>(&self, urls: I) -> Result<BatchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<DownloadRequest>,
    {
        let requests = urls.into_iter().map(Into::into).collect();
        self.run_requests(requests, None).await
    }

    /// Like [`run`](Self::run), but stops admitting new items once `cancel`
    /// fires.
    ///
    /// Items already in flight finish normally. Items still waiting for a slot
    /// resolve to [`FailureReason::Cancelled`]; the result still holds one
    /// entry per URL.
    pub async fn run_with_cancel<I, S>(
        &self,
        urls: I,
        cancel: CancellationToken,
    ) -> Result<BatchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<DownloadRequest>,
    {
        let requests = urls.into_iter().map(Into::into).collect();
        self.run_requests(requests, Some(cancel)).await
    }

    async fn run_requests(
        &self,
        requests: Vec<DownloadRequest>,
        cancel: Option<CancellationToken>,
    ) -> Result<BatchResult> {
        let engine = self.config.engine;
        info!("{:#^80}", format!(" {} Downloading ", engine.label()));

        let limiter = ConcurrencyLimiter::new(self.config.concurrent_downloads)?;

        let directory = self.config.directory.clone();
        debug!("Creating destination directory {:?}", directory);
        fs::create_dir_all(&directory)
            .await
            .map_err(|source| Error::OutputDirectory {
                path: directory.clone(),
                source,
            })?;

        let mut headers = self.config.headers.clone().unwrap_or_default();
        if let Some(ref path) = self.config.credentials {
            headers.extend(Credentials::load_header_map(path).await?);
        }

        let client = create_http_client(HttpClientConfig {
            proxy: self.config.proxy.clone(),
            headers: Some(headers),
            timeout: self.config.timeout,
        })?;

        let total = requests.len();
        let counter = if self.config.progress_bar {
            ProgressCounter::with_bar(self.config.progress_start, total as u64)
        } else {
            ProgressCounter::new(self.config.progress_start)
        };

        let worker = FetchWorker::new(
            client,
            directory,
            ExtensionResolver::new(self.config.normalize_content_type),
            Arc::clone(&self.config.namer),
            counter.clone(),
            total,
        );

        // At most one worker per item.
        let workers = limiter.capacity().min(total).max(1);
        let scheduler = engine.scheduler(workers)?;
        self.set_state(RunState::Running);

        let handles: Vec<JobHandle> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let worker = worker.clone();
                let limiter = limiter.clone();
                let cancel = cancel.clone();
                let on_complete = self.config.on_complete.clone();
                scheduler.submit(
                    async move {
                        let outcome =
                            admit_and_fetch(&worker, &limiter, &request, cancel.as_ref()).await;
                        if let Some(callback) = on_complete {
                            callback(index, &request, &outcome);
                        }
                        outcome
                    }
                    .boxed(),
                )
            })
            .collect();

        // Handles are awaited in submission order, so outcome `i` belongs to
        // request `i` whatever the completion order was.
        let outcomes = future::join_all(handles).await;

        // Joining pool threads blocks, keep it off the async workers.
        if let Err(e) = tokio::task::spawn_blocking(move || drop(scheduler)).await {
            debug!("Scheduler shutdown did not complete cleanly: {}", e);
        }

        counter.finish();
        self.peak.store(limiter.peak(), Ordering::SeqCst);
        self.set_state(RunState::Completed);

        let result = BatchResult::new(outcomes);
        debug!(
            "Peak concurrency {} of {} allowed",
            limiter.peak(),
            limiter.capacity()
        );
        info!(
            "Saved {}, skipped {}, failed {} of {}",
            result.saved(),
            result.skipped(),
            result.failed(),
            result.len()
        );
        info!("{:-^80}", " The batch has finished its work ");
        Ok(result)
    }
}

/// Waits for a slot, unless cancelled first, then fetches.
async fn admit_and_fetch(
    worker: &FetchWorker,
    limiter: &ConcurrencyLimiter,
    request: &DownloadRequest,
    cancel: Option<&CancellationToken>,
) -> DownloadOutcome {
    let admitted = match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                slot = limiter.acquire() => Some(slot),
            }
        }
        None => Some(limiter.acquire().await),
    };

    let _slot = match admitted {
        None => {
            return worker.conclude(request, DownloadOutcome::failed(FailureReason::Cancelled))
        }
        Some(Err(e)) => {
            return worker.conclude(
                request,
                DownloadOutcome::failed(FailureReason::Unknown(e.to_string())),
            )
        }
        Some(Ok(slot)) => slot,
    };

    worker.fetch(request).await
}

/// Runs a batch with default settings: fetch `urls` into `directory` with
/// at most `max_concurrency` requests in flight.
///
/// ```rust,no_run
/// # async fn example() -> imgfetch::Result<()> {
/// let result = imgfetch::downloader::run(&["https://example.com/a.gif"], 5, "downloads/").await?;
/// assert_eq!(result.len(), 1);
/// # Ok(())
/// # }
/// ```
pub async fn run<S: AsRef<str>>(
    urls: &[S],
    max_concurrency: usize,
    directory: impl Into<PathBuf>,
) -> Result<BatchResult> {
    super::DownloaderBuilder::new()
        .concurrent_downloads(max_concurrency)
        .directory(directory.into())
        .build()
        .run(urls.iter().map(|url| DownloadRequest::new(url.as_ref())))
        .await
}
