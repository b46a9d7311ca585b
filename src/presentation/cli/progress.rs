//! A scan-progress bar over the device's LBA range, driven by the same
//! `FileEvent` stream the status-line observer consumes.

use crate::application::dto::FileEvent;
use indicatif::{ProgressBar, ProgressStyle};

/// Wraps an `indicatif` bar keyed on sector offset rather than byte offset,
/// since that is what every `FileEvent` carries. Cheaply `Clone`: the
/// underlying `ProgressBar` is itself a handle to shared state.
#[derive(Clone)]
pub struct ScanProgressBar {
    bar: ProgressBar,
}

impl ScanProgressBar {
    pub fn new(total_sectors: u64) -> Self {
        let bar = ProgressBar::new(total_sectors);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] sector {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    pub fn update(&self, event: &FileEvent) {
        self.bar.set_position(event.lba);
    }

    /// Prints `line` above the bar without corrupting its redraw, per
    /// `indicatif`'s suspend-and-print convention.
    pub fn println(&self, line: &str) {
        self.bar.println(line);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
