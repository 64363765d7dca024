//! Progress display for tile loading and block matching

use std::sync::{Arc, LazyLock, Mutex};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::io::configuration::{PROGRESS_BAR_WIDTH, PROGRESS_UPDATE_INTERVAL};

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "{{prefix:>10}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Owns the terminal area shared by all stage bars
pub struct ProgressManager {
    multi_progress: MultiProgress,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Progress manager drawing to stderr
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
        }
    }

    /// Progress manager that never draws
    pub fn hidden() -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Start a bar for one pipeline stage
    pub fn stage(&self, label: &str, total: usize) -> StageProgress {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(label.to_string());
        StageProgress {
            bar: self.multi_progress.add(bar),
            total,
            reported: Arc::default(),
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        let _ = self.multi_progress.clear();
    }
}

/// A single stage bar, safe to update from worker threads
#[derive(Clone)]
pub struct StageProgress {
    bar: ProgressBar,
    total: usize,
    // Highest count drawn so far, shared between clones
    reported: Arc<Mutex<usize>>,
}

impl StageProgress {
    /// Stage that tracks counts without drawing
    pub fn hidden(total: usize) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            total,
            reported: Arc::default(),
        }
    }

    /// Record the number of completed items
    ///
    /// Redraws are throttled to every few items and the final one. Counts
    /// may arrive out of order from worker threads; the bar never moves
    /// backwards.
    pub fn update(&self, completed: usize) {
        if completed % PROGRESS_UPDATE_INTERVAL != 0 && completed < self.total {
            return;
        }
        if let Ok(mut reported) = self.reported.lock() {
            if completed > *reported {
                *reported = completed;
                self.bar.set_position(completed as u64);
            }
        }
    }

    /// Advance the bar by one item
    pub fn tick(&self) {
        self.bar.inc(1);
    }

    /// Current bar position
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Mark the stage as done with a closing message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
