//! Single-item fetch: request, classify, persist.
//!
//! A [`FetchWorker`] turns one [`DownloadRequest`] into one
//! [`DownloadOutcome`]. Every failure it can observe is folded into the
//! outcome, so a bad item never disturbs the rest of the batch.

use crate::download::{
    DownloadOutcome, DownloadRequest, ExtensionResolver, FailureReason, SkipReason, UniqueNamer,
};
use crate::progress::ProgressCounter;

use futures::StreamExt;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, fs::File, io::AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Everything a fetch needs, shared by all items of one run.
#[derive(Clone)]
pub struct FetchWorker {
    client: ClientWithMiddleware,
    directory: PathBuf,
    resolver: ExtensionResolver,
    namer: Arc<dyn UniqueNamer>,
    counter: ProgressCounter,
    total: usize,
}

impl fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchWorker")
            .field("directory", &self.directory)
            .field("resolver", &self.resolver)
            .field("counter", &self.counter)
            .field("total", &self.total)
            .finish()
    }
}

impl FetchWorker {
    /// Creates a worker saving into `directory`.
    ///
    /// `total` is only used for the `n / total` part of log lines.
    pub fn new(
        client: ClientWithMiddleware,
        directory: impl Into<PathBuf>,
        resolver: ExtensionResolver,
        namer: Arc<dyn UniqueNamer>,
        counter: ProgressCounter,
        total: usize,
    ) -> Self {
        Self {
            client,
            directory: directory.into(),
            resolver,
            namer,
            counter,
            total,
        }
    }

    /// Directory files are saved into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The counter advanced on every save.
    pub fn counter(&self) -> &ProgressCounter {
        &self.counter
    }

    /// Fetches `request` and logs its outcome.
    ///
    /// The caller is expected to hold a concurrency slot for the duration of
    /// the call.
    pub async fn fetch(&self, request: &DownloadRequest) -> DownloadOutcome {
        let outcome = self.fetch_inner(request).await;
        self.report(request, &outcome);
        outcome
    }

    /// Logs an outcome decided without fetching, such as a cancelled item,
    /// and returns it.
    pub fn conclude(&self, request: &DownloadRequest, outcome: DownloadOutcome) -> DownloadOutcome {
        self.report(request, &outcome);
        outcome
    }

    async fn fetch_inner(&self, request: &DownloadRequest) -> DownloadOutcome {
        debug!("Fetching {}", request.url);
        let res = match self.client.get(&request.url).send().await {
            Ok(res) => res,
            Err(e) => return DownloadOutcome::failed(classify_send_error(e)),
        };

        let status = res.status();
        if status != StatusCode::OK {
            return DownloadOutcome::failed(FailureReason::HttpStatus(status));
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        let Some(extension) = self.resolver.resolve(content_type.as_deref()) else {
            return DownloadOutcome::skipped(SkipReason::UnsupportedContentType(content_type));
        };

        let output = self
            .directory
            .join(format!("{}.{}", self.namer.next_name(), extension));

        debug!("Creating destination file {:?}", &output);
        let mut file = match File::create(&output).await {
            Ok(file) => file,
            Err(e) => return DownloadOutcome::failed(FailureReason::Unknown(describe(&e))),
        };

        let mut written: u64 = 0;
        let mut stream = res.bytes_stream();
        while let Some(item) = stream.next().await {
            let mut chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    discard(&output).await;
                    return DownloadOutcome::failed(FailureReason::Transport(describe(&e)));
                }
            };
            written += chunk.len() as u64;
            if let Err(e) = file.write_all_buf(&mut chunk).await {
                drop(file);
                discard(&output).await;
                return DownloadOutcome::failed(FailureReason::Unknown(describe(&e)));
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            discard(&output).await;
            return DownloadOutcome::failed(FailureReason::Unknown(describe(&e)));
        }
        debug!("Wrote {} bytes to {:?}", written, &output);

        DownloadOutcome::saved(output)
    }

    fn report(&self, request: &DownloadRequest, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Saved { path } => {
                let n = self.counter.increment();
                info!(
                    "200 OK | {} => {} | {} / {}",
                    request.short_url(),
                    path.display(),
                    n,
                    self.total
                );
            }
            DownloadOutcome::Skipped(reason) => {
                self.counter.tick_unsaved();
                warn!("{} | URL => {}", reason, request.url);
            }
            DownloadOutcome::Failed(reason) => {
                self.counter.tick_unsaved();
                match reason {
                    FailureReason::HttpStatus(_) | FailureReason::Cancelled => {
                        warn!("{} | URL => {}", reason, request.url)
                    }
                    FailureReason::Transport(e) => {
                        error!("HTTP client error occurred for URL: {}. Error: {}", request.url, e)
                    }
                    FailureReason::Unknown(e) => {
                        error!("An unknown error occurred for URL: {}. Error: {}", request.url, e)
                    }
                }
            }
        }
    }
}

/// Errors raised before any status is known.
///
/// A request that could not even be built (malformed URL) is not a transport
/// problem and lands in [`FailureReason::Unknown`].
fn classify_send_error(e: reqwest_middleware::Error) -> FailureReason {
    match e {
        reqwest_middleware::Error::Reqwest(e) if e.is_builder() => {
            FailureReason::Unknown(describe(&e))
        }
        reqwest_middleware::Error::Reqwest(e) => FailureReason::Transport(describe(&e)),
        reqwest_middleware::Error::Middleware(e) => FailureReason::Unknown(format!("{:#}", e)),
    }
}

/// Error message including its chain of sources.
fn describe(e: &(dyn StdError + 'static)) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Removes a partially written file.
async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        debug!("Could not remove partial file {:?}: {}", path, e);
    }
}
