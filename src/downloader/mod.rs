//! Downloader module: batch orchestration and its moving parts.
//!
//! - `downloader` - [`Downloader`], which runs one batch from URLs to a [`BatchResult`](crate::download::BatchResult)
//! - `builder` - [`DownloaderBuilder`] for configuring it
//! - `config` - Configuration structure, defaults and the callback type
//! - `fetch` - [`FetchWorker`], one request and its outcome
//! - `limiter` - [`ConcurrencyLimiter`], the admission gate
//! - `scheduler` - [`Scheduler`] implementations backed by tasks or threads
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgfetch::downloader::{DownloaderBuilder, Engine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = ["https://example.com/1.png", "https://example.com/2.gif"];
//!
//! for engine in [Engine::Tasks, Engine::Threads] {
//!     let result = DownloaderBuilder::new()
//!         .engine(engine)
//!         .concurrent_downloads(5)
//!         .build()
//!         .run(urls)
//!         .await?;
//!     println!("{engine}: {} saved", result.saved());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub mod fetch;
pub mod limiter;
pub mod scheduler;

pub use builder::DownloaderBuilder;
pub use config::{DownloadCallback, DownloaderConfig};
pub use downloader::{run, Downloader, RunState};
pub use fetch::FetchWorker;
pub use limiter::{ConcurrencyLimiter, Slot};
pub use scheduler::{Engine, Job, JobHandle, Scheduler, TaskScheduler, ThreadScheduler};
