//! Represents a resource to be fetched.

use std::fmt;

/// Represents a resource to be fetched.
///
/// The URL is kept as the caller provided it. It is only parsed when the
/// request is sent, so a malformed entry turns into a failed outcome for that
/// item instead of rejecting the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadRequest {
    /// URL of the resource to fetch.
    pub url: String,
}

impl DownloadRequest {
    /// Creates a new [`DownloadRequest`].
    ///
    /// ```rust
    /// use imgfetch::download::DownloadRequest;
    ///
    /// let request = DownloadRequest::new("https://example.com/cat.png");
    /// assert_eq!(request.url, "https://example.com/cat.png");
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Shortened form of the URL for log lines.
    ///
    /// Long URLs keep their first 30 and last 10 characters.
    pub fn short_url(&self) -> String {
        let chars: Vec<char> = self.url.chars().collect();
        if chars.len() <= 43 {
            return self.url.clone();
        }
        let head: String = chars[..30].iter().collect();
        let tail: String = chars[chars.len() - 10..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl From<&str> for DownloadRequest {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DownloadRequest {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
