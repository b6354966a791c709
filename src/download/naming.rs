//! Unique file names for saved payloads.

use chrono::Utc;
use uuid::Uuid;

/// Produces a collision-free base name (no extension) on every call.
///
/// Implementations are shared by every worker of a batch, so they must be
/// safe to call concurrently.
pub trait UniqueNamer: Send + Sync {
    fn next_name(&self) -> String;
}

/// Default namer: `<unix timestamp in ms>_<random v4 uuid>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNamer;

impl UniqueNamer for TimestampNamer {
    fn next_name(&self) -> String {
        format!("{}_{}", Utc::now().timestamp_millis(), Uuid::new_v4())
    }
}

impl<F> UniqueNamer for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_name(&self) -> String {
        self()
    }
}
