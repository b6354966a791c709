//! Download module containing the data that flows through a batch.
//!
//! - [`request`] - A single URL to fetch
//! - [`outcome`] - Per-item outcomes and the aggregated [`BatchResult`]
//! - [`extension`] - Content type to file extension mapping
//! - [`naming`] - Unique file names for saved payloads
//!
//! # Examples
//!
//! ```rust
//! use imgfetch::download::{DownloadRequest, ExtensionResolver};
//!
//! let request = DownloadRequest::from("https://example.com/cat.gif");
//! let resolver = ExtensionResolver::default();
//! assert_eq!(resolver.resolve(Some("image/gif")), Some("gif"));
//! # let _ = request;
//! ```

pub mod extension;
pub mod naming;
pub mod outcome;
pub mod request;

pub use extension::{ExtensionResolver, EXTENSION_TABLE};
pub use naming::{TimestampNamer, UniqueNamer};
pub use outcome::{BatchResult, DownloadOutcome, FailureReason, SkipReason};
pub use request::DownloadRequest;
