//! Where fetch jobs run.
//!
//! A batch hands each item to a [`Scheduler`] as a boxed future and awaits
//! the returned [`JobHandle`]s. Two schedulers exist and behave the same from
//! the outside:
//!
//! - [`TaskScheduler`] spawns one tokio task per job.
//! - [`ThreadScheduler`] feeds a fixed pool of OS threads from a shared queue.
//!   Each thread drives its current job to completion on the ambient tokio
//!   runtime, so the pool size bounds how many jobs run at once.
//!
//! A job that panics, or whose worker disappears, resolves to
//! [`FailureReason::Unknown`] instead of tearing down the batch.

use crate::download::{DownloadOutcome, FailureReason};
use crate::error::{Error, Result};

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{mpsc, Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Unit of work handed to a scheduler.
pub type Job = BoxFuture<'static, DownloadOutcome>;

/// Runs jobs and hands back something to await their outcome.
pub trait Scheduler: Send + Sync {
    /// Queues `job` for execution.
    fn submit(&self, job: Job) -> JobHandle;
}

/// Pending outcome of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    rx: oneshot::Receiver<DownloadOutcome>,
}

impl JobHandle {
    fn channel() -> (oneshot::Sender<DownloadOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for JobHandle {
    type Output = DownloadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                DownloadOutcome::failed(FailureReason::Unknown(
                    "worker stopped before producing an outcome".into(),
                ))
            })
        })
    }
}

/// Which scheduler a batch runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Cooperative tokio tasks.
    #[default]
    Tasks,
    /// Fixed pool of OS threads.
    Threads,
}

impl Engine {
    /// Label used in the start banner.
    pub fn label(&self) -> &'static str {
        match self {
            Engine::Tasks => "Async",
            Engine::Threads => "Multithreaded",
        }
    }

    /// Builds the scheduler for a run with `concurrency` slots.
    pub fn scheduler(&self, concurrency: usize) -> Result<Box<dyn Scheduler>> {
        Ok(match self {
            Engine::Tasks => Box::new(TaskScheduler),
            Engine::Threads => Box::new(ThreadScheduler::new(concurrency)?),
        })
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Tasks => f.write_str("tasks"),
            Engine::Threads => f.write_str("threads"),
        }
    }
}

/// One tokio task per job. Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskScheduler;

impl Scheduler for TaskScheduler {
    fn submit(&self, job: Job) -> JobHandle {
        let (tx, handle) = JobHandle::channel();
        tokio::spawn(async move {
            let _ = tx.send(job.await);
        });
        handle
    }
}

type Queued = (Job, oneshot::Sender<DownloadOutcome>);

/// Fixed-size pool of OS threads pulling jobs from a shared queue.
///
/// Dropping the pool closes the queue and joins every thread once it has
/// finished its current job.
pub struct ThreadScheduler {
    queue: Option<mpsc::Sender<Queued>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadScheduler {
    /// Starts `size` worker threads bound to the current tokio runtime.
    ///
    /// Fails with [`Error::Runtime`] outside a runtime and with
    /// [`Error::InvalidConcurrency`] for an empty pool.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConcurrency(size));
        }
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<Queued>();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..size)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let runtime = runtime.clone();
                thread::Builder::new()
                    .name(format!("imgfetch-worker-{}", id))
                    .spawn(move || worker_loop(id, rx, runtime))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        debug!("Started {} worker threads", size);
        Ok(Self {
            queue: Some(tx),
            workers,
        })
    }

    /// Number of threads in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Scheduler for ThreadScheduler {
    fn submit(&self, job: Job) -> JobHandle {
        let (tx, handle) = JobHandle::channel();
        if let Some(queue) = &self.queue {
            // A closed queue drops the reply sender, which the handle reports.
            let _ = queue.send((job, tx));
        }
        handle
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("size", &self.size())
            .finish()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.queue.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("A worker thread exited abnormally");
            }
        }
    }
}

fn worker_loop(id: usize, rx: Arc<Mutex<mpsc::Receiver<Queued>>>, runtime: Handle) {
    loop {
        let next = match rx.lock() {
            Ok(queue) => queue.recv(),
            Err(_) => return,
        };
        let Ok((job, reply)) = next else {
            debug!("Worker {} shutting down", id);
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(job))) {
            Ok(outcome) => {
                let _ = reply.send(outcome);
            }
            Err(_) => error!("Worker {} caught a panic while fetching", id),
        }
    }
}
