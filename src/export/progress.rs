//! Progress tracking for export operations
//!
//! Optional spinner giving feedback on long-running exports. Row totals are
//! usually unknown up front (the source is consumed incrementally), so the
//! tracker defaults to a spinner with a rows-per-second message.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Row-count progress feedback for an export run.
pub struct ProgressTracker {
    start_time: Instant,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a tracker; `enable_bar` controls whether anything is drawn.
    pub fn new(enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} {pos} rows {msg}")
            {
                bar.set_style(style);
            }
            bar
        });

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Update with the total number of rows exported so far.
    pub fn update(&self, count: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(count);
            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                bar.set_message(format!("({:.0} rows/sec)", count as f64 / elapsed));
            }
        }
    }

    /// Finish and clear the progress display.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
