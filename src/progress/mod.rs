//! Progress tracking for a batch.
//!
//! The [`ProgressCounter`] is the only mutable state shared by all workers of
//! a run. It feeds the `n / total` part of the per-item log lines and can
//! drive an `indicatif` bar for interactive use.
//!
//! ```rust
//! use imgfetch::progress::ProgressCounter;
//!
//! // Hidden bar, counting from 1.
//! let counter = ProgressCounter::new(1);
//! counter.increment();
//! counter.finish();
//! ```

pub(crate) mod counter;

pub use counter::{ProgressCounter, CHARS_FINE, TEMPLATE_BAR_WITH_POSITION};
