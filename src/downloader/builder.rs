//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use imgfetch::downloader::{DownloaderBuilder, Engine};
//! use std::path::PathBuf;
//!
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrent_downloads(5)
//!     .engine(Engine::Threads)
//!     .build();
//! ```
//!
//! ## Headers and Callbacks
//!
//! ```rust
//! use imgfetch::downloader::DownloaderBuilder;
//! use imgfetch::download::DownloadOutcome;
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "MyApp/1.0".parse()?);
//!
//! let downloader = DownloaderBuilder::new()
//!     .headers(headers)
//!     .on_complete(|_, request, outcome| {
//!         if let DownloadOutcome::Saved { path } = outcome {
//!             println!("{} saved to {}", request, path.display());
//!         }
//!     })
//!     .build();
//! # Ok(())
//! # }
//! ```

use super::{config::DownloaderConfig, downloader::Downloader, scheduler::Engine};
use crate::download::{DownloadOutcome, DownloadRequest, UniqueNamer};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Proxy;
use std::{path::PathBuf, sync::Arc, time::Duration};

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main()  {
/// use imgfetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().concurrent_downloads(3).directory("images".into()).build();
/// # }
/// ```
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Sets the directory where to store the downloads.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the number of concurrent downloads.
    pub fn concurrent_downloads(mut self, concurrent_downloads: usize) -> Self {
        self.config.concurrent_downloads = concurrent_downloads;
        self
    }

    /// Choose between cooperative tasks and a thread pool.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.config.engine = engine;
        self
    }

    /// Read extra headers from a JSON credentials file when a run starts.
    ///
    /// A missing or malformed file makes the run fail before any request.
    pub fn credentials(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credentials = Some(path.into());
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Route requests through a proxy.
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Strip content type parameters and ignore case before the extension
    /// lookup. Off by default: `image/png; charset=binary` is then skipped.
    pub fn normalize_content_type(mut self, normalize: bool) -> Self {
        self.config.normalize_content_type = normalize;
        self
    }

    /// Replace the source of unique file names.
    pub fn namer<N>(mut self, namer: N) -> Self
    where
        N: UniqueNamer + 'static,
    {
        self.config.namer = Arc::new(namer);
        self
    }

    /// Initial value of the progress counter.
    pub fn progress_start(mut self, start: u64) -> Self {
        self.config.progress_start = start;
        self
    }

    /// Draw a progress bar while the batch runs.
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.progress_bar = enabled;
        self
    }

    /// Set callback for when each download completes.
    ///
    /// The callback runs on whichever task or thread finished the item, as
    /// soon as it finishes.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, &DownloadRequest, &DownloadOutcome) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one. Headers from a credentials file are merged
    /// on top of these when a run starts.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use imgfetch::downloader::DownloaderBuilder;
    ///
    /// let auth = HeaderValue::from_str("Basic aGk6MTIzNDU2Cg==").expect("Invalid auth");
    ///
    /// let downloader = DownloaderBuilder::new()
    ///     .header(header::USER_AGENT, HeaderValue::from_static("curl/7.87"))
    ///     .header(header::AUTHORIZATION, auth)
    ///     .build();
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Downloader {
        Downloader::new(self.config)
    }
}
