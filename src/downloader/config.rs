//! Configuration structures and defaults for the downloader.
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use imgfetch::downloader::DownloadCallback;
//! use imgfetch::download::{DownloadOutcome, DownloadRequest};
//!
//! let callback: DownloadCallback = Box::new(
//!     |index: usize, request: &DownloadRequest, outcome: &DownloadOutcome| match outcome {
//!         DownloadOutcome::Saved { path } => {
//!             println!("#{index} {request} -> {}", path.display())
//!         }
//!         DownloadOutcome::Skipped(reason) => println!("#{index} {request} skipped: {reason}"),
//!         DownloadOutcome::Failed(reason) => println!("#{index} {request} failed: {reason}"),
//!     },
//! );
//! ```

use super::scheduler::Engine;
use crate::download::{DownloadOutcome, DownloadRequest, TimestampNamer, UniqueNamer};

use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default output directory.
pub const DEFAULT_DIRECTORY: &str = "downloads/";
/// Default number of fetches allowed in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Initial value of the progress counter.
pub const DEFAULT_PROGRESS_START: u64 = 1;

/// Callback invoked with the input index, the request and its outcome as
/// soon as each item finishes.
pub type DownloadCallback = Box<dyn Fn(usize, &DownloadRequest, &DownloadOutcome) + Send + Sync>;

/// Configuration structure for the downloader
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Directory where to store the downloaded files.
    pub directory: PathBuf,
    /// Number of maximum concurrent downloads.
    pub concurrent_downloads: usize,
    /// Scheduler the batch runs on.
    pub engine: Engine,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    /// JSON credentials file whose headers are added to every request.
    pub credentials: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Optional proxy.
    pub proxy: Option<Proxy>,
    /// Strip parameters and ignore case when mapping content types.
    pub normalize_content_type: bool,
    /// Source of unique file names.
    pub namer: Arc<dyn UniqueNamer>,
    /// Initial value of the progress counter.
    pub progress_start: u64,
    /// Draw an indicatif bar while the batch runs.
    pub progress_bar: bool,
    /// Callback for when each download completes.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("directory", &self.directory)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("engine", &self.engine)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("proxy", &self.proxy.is_some())
            .field("normalize_content_type", &self.normalize_content_type)
            .field("progress_start", &self.progress_start)
            .field("progress_bar", &self.progress_bar)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            concurrent_downloads: DEFAULT_CONCURRENCY,
            engine: Engine::default(),
            headers: None,
            credentials: None,
            timeout: None,
            proxy: None,
            normalize_content_type: false,
            namer: Arc::new(TimestampNamer),
            progress_start: DEFAULT_PROGRESS_START,
            progress_bar: false,
            on_complete: None,
        }
    }
}
