//! Shared count of saved items.
//!
//! ```rust
//! use imgfetch::progress::ProgressCounter;
//!
//! let counter = ProgressCounter::new(1);
//! let worker = counter.clone();
//! assert_eq!(worker.increment(), 1);
//! assert_eq!(counter.value(), 2);
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Template for the optional batch progress bar.
///
/// `████████████████████▍                    6/12 (50%) eta 00:00:02`
pub const TEMPLATE_BAR_WITH_POSITION: &str =
    "{bar:40.blue} {pos:>}/{len} ({percent}%) eta {eta_precise:.blue}";
/// Fine blocks as progress characters: `"█▉▊▋▌▍▎▏  "`.
pub const CHARS_FINE: &str = "█▉▊▋▌▍▎▏  ";

/// Counter of completed-and-saved items, shared by every worker of a run.
///
/// Cloning is cheap and every clone observes the same value. Increments are
/// atomic so concurrent saves never lose an update. An optional
/// [`ProgressBar`] advances alongside the counter.
#[derive(Clone)]
pub struct ProgressCounter {
    value: Arc<AtomicU64>,
    bar: ProgressBar,
}

impl ProgressCounter {
    /// Creates a counter starting at `start` with no visible bar.
    pub fn new(start: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(start)),
            bar: ProgressBar::hidden(),
        }
    }

    /// Creates a counter that also draws a bar of length `total`.
    pub fn with_bar(start: u64, total: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE_BAR_WITH_POSITION)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(CHARS_FINE);
        Self {
            value: Arc::new(AtomicU64::new(start)),
            bar: ProgressBar::new(total).with_style(style),
        }
    }

    /// Records one saved item and returns the value held before the update.
    pub fn increment(&self) -> u64 {
        self.bar.inc(1);
        self.value.fetch_add(1, Ordering::SeqCst)
    }

    /// Current value.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Whether a bar is being drawn.
    pub fn has_bar(&self) -> bool {
        !self.bar.is_hidden()
    }

    /// Advances the bar for an item that finished without being saved.
    ///
    /// The counter itself is left untouched.
    pub fn tick_unsaved(&self) {
        self.bar.inc(1);
    }

    /// Leaves the bar on screen in its final state.
    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ProgressCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Display for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl fmt::Debug for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCounter")
            .field("value", &self.value())
            .field("bar", &self.has_bar())
            .finish()
    }
}
