//! imgfetch fetches a batch of images over HTTP and saves each one under a
//! unique name, with a fixed cap on how many requests are in flight.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use imgfetch::{DownloaderBuilder, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("downloads"))
//!     .concurrent_downloads(5)
//!     .build();
//! let result = downloader
//!     .run(["https://cdn.pixabay.com/photo/2017/06/04/23/57/stem-2372543_640.png"])
//!     .await?;
//! println!("{:?}", result.paths());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - Requests, outcomes, content type mapping and file naming
//! - [`downloader`] - The `Downloader`, its builder, the fetch worker, the
//!   concurrency limiter and the schedulers
//! - [`error`] - Errors that abort a batch
//! - [`http`] - HTTP client and credentials loading
//! - [`progress`] - Shared progress counter

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;

pub use download::{
    BatchResult, DownloadOutcome, DownloadRequest, ExtensionResolver, FailureReason, SkipReason,
    TimestampNamer, UniqueNamer,
};
pub use downloader::{ConcurrencyLimiter, Downloader, DownloaderBuilder, Engine, RunState};
pub use error::{Error, Result};
pub use http::{create_http_client, Credentials, HttpClientConfig};
pub use progress::ProgressCounter;
