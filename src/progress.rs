//! Progress reporting utilities using indicatif.
//!
//! Detection reports a single completion fraction in `[0.0, 1.0]`. The
//! [`ProgressCallback`] trait receives it; [`ProgressTracker`] is what the
//! finder uses to keep the reported values in range and non-decreasing;
//! [`Progress`] renders them as a terminal bar.
//!
//! Plain closures work as callbacks:
//!
//! ```
//! use arcdupe::progress::ProgressCallback;
//!
//! let print = |fraction: f64| println!("{:.0}%", fraction * 100.0);
//! print.on_progress(0.5);
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver for completion updates.
///
/// Callbacks are observational. Nothing they do can affect the scan.
pub trait ProgressCallback: Send + Sync {
    /// Called with the overall completion fraction.
    fn on_progress(&self, fraction: f64);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

impl<F> ProgressCallback for F
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        self(fraction);
    }
}

/// Clamps and de-duplicates progress before it reaches a callback.
///
/// Values outside `[0, 1]` are clamped and anything below the last reported
/// value is raised to it, so callbacks only ever see a non-decreasing
/// sequence.
pub struct ProgressTracker {
    callback: Option<Arc<dyn ProgressCallback>>,
    last: Mutex<f64>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .field("last", &self.last())
            .finish()
    }
}

impl ProgressTracker {
    /// Wrap an optional callback.
    #[must_use]
    pub fn new(callback: Option<Arc<dyn ProgressCallback>>) -> Self {
        Self {
            callback,
            last: Mutex::new(0.0),
        }
    }

    /// Report a fraction.
    pub fn report(&self, fraction: f64) {
        let value = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let emitted = match self.last.lock() {
            Ok(mut last) => {
                if value > *last {
                    *last = value;
                }
                *last
            }
            Err(_) => value,
        };
        if let Some(cb) = &self.callback {
            cb.on_progress(emitted);
        }
    }

    /// Report a position inside the sub-range `[start, end]`.
    pub fn report_within(&self, start: f64, end: f64, done: usize, total: usize) {
        let ratio = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        self.report(start + (end - start) * ratio);
    }

    /// Forward a message to the callback.
    pub fn message(&self, message: &str) {
        if let Some(cb) = &self.callback {
            cb.on_message(message);
        }
    }

    /// Report exactly `1.0`.
    pub fn finish(&self) {
        self.report(1.0);
    }

    /// The highest fraction reported so far.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.last.lock().map_or(0.0, |v| *v)
    }
}

/// Resolution of the terminal bar.
const BAR_STEPS: u64 = 1000;

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use arcdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// progress.finish();
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(BAR_STEPS);
        bar.set_style(bar_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Complete and clear the bar.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█>-")
}

impl ProgressCallback for Progress {
    fn on_progress(&self, fraction: f64) {
        if let Some(bar) = &self.bar {
            bar.set_position((fraction * BAR_STEPS as f64).round() as u64);
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }
}
