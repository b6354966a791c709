//! Error handling for the imgfetch library.
//!
//! Only failures that abort a whole batch live here. Problems with a single
//! URL never surface as an [`Error`]; they are reported through
//! [`DownloadOutcome`](crate::download::DownloadOutcome) instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a batch before any fetch is scheduled.
#[derive(Error, Debug)]
pub enum Error {
    /// The credentials file could not be read or understood.
    ///
    /// Covers a missing file, malformed JSON, and header names or values that
    /// cannot be sent over HTTP.
    #[error("Failed to load credentials from {path}: {reason}")]
    Credentials {
        /// Path of the credentials file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The output directory did not exist and could not be created.
    #[error("Failed to create output directory {path}")]
    OutputDirectory {
        /// Directory that was requested.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The concurrency cap is zero or larger than the limiter can count.
    #[error("Invalid concurrency cap {0}: expected a value between 1 and the limiter maximum")]
    InvalidConcurrency(usize),

    /// The thread engine needs an ambient tokio runtime to drive requests.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O Error.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library while building the HTTP client.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

/// Result type alias for operations that can fail with an imgfetch error.
pub type Result<T> = std::result::Result<T, Error>;
