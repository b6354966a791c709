//! Per-item outcomes and the aggregated batch result.
//!
//! Every [`DownloadRequest`](super::DownloadRequest) ends in exactly one
//! [`DownloadOutcome`]. A batch collects them into a [`BatchResult`] whose
//! entries follow the order of the input URLs.
//!
//! # Examples
//!
//! ```rust
//! use imgfetch::download::{BatchResult, DownloadOutcome, FailureReason};
//! use reqwest::StatusCode;
//!
//! let result = BatchResult::new(vec![
//!     DownloadOutcome::saved("downloads/1_a.png"),
//!     DownloadOutcome::failed(FailureReason::HttpStatus(StatusCode::NOT_FOUND)),
//! ]);
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.saved(), 1);
//! assert!(result.paths()[1].is_none());
//! ```

use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a successful response was not written to disk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The declared content type maps to no known extension.
    #[error("Unsupported Content-Type: {}", .0.as_deref().unwrap_or("<none>"))]
    UnsupportedContentType(Option<String>),
}

/// Why a fetch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with something other than 200.
    #[error("{} ERROR", .0.as_u16())]
    HttpStatus(StatusCode),
    /// The request never produced a usable response (connect, DNS, TLS,
    /// timeout or a broken body stream).
    #[error("Transport error: {0}")]
    Transport(String),
    /// Anything else, including filesystem errors while saving.
    #[error("Unknown error: {0}")]
    Unknown(String),
    /// The batch was cancelled before this item was admitted.
    #[error("Cancelled before start")]
    Cancelled,
}

/// Terminal classification of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The body was written to `path`.
    Saved {
        /// Location of the saved file.
        path: PathBuf,
    },
    /// The response was fine but nothing was written.
    Skipped(SkipReason),
    /// The fetch did not succeed.
    Failed(FailureReason),
}

impl DownloadOutcome {
    /// Builds a [`DownloadOutcome::Saved`].
    pub fn saved(path: impl Into<PathBuf>) -> Self {
        Self::Saved { path: path.into() }
    }

    /// Builds a [`DownloadOutcome::Skipped`].
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped(reason)
    }

    /// Builds a [`DownloadOutcome::Failed`].
    pub fn failed(reason: FailureReason) -> Self {
        Self::Failed(reason)
    }

    /// Path of the saved file, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Saved { path } => Some(path),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcomes of a whole batch, one per input URL, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    outcomes: Vec<DownloadOutcome>,
}

impl BatchResult {
    /// Wraps already ordered outcomes.
    pub fn new(outcomes: Vec<DownloadOutcome>) -> Self {
        Self { outcomes }
    }

    /// All outcomes, in input order.
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    /// Consumes the result and returns the outcomes.
    pub fn into_outcomes(self) -> Vec<DownloadOutcome> {
        self.outcomes
    }

    /// Saved path per input, `None` for anything that was not saved.
    pub fn paths(&self) -> Vec<Option<&Path>> {
        self.outcomes.iter().map(DownloadOutcome::path).collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of saved items.
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    /// Number of skipped items.
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

impl IntoIterator for BatchResult {
    type Item = DownloadOutcome;
    type IntoIter = std::vec::IntoIter<DownloadOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
