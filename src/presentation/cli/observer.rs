//! Status-line observer for `FileEvent`s.
//!
//! Kept distinct from the `log` diagnostics channel (spec §7): this prints
//! one line per descriptor the core considers interesting, while `log`
//! carries parser/worker diagnostics that the user can redirect or silence
//! independently via `RUST_LOG`/`-v`.

use crate::application::dto::{FileEvent, FileState};

/// Prints one status line per `FileEvent`, honoring `show_all` (skip lines
/// would otherwise print for filtered/deleted/recycle-bin records unless
/// the caller opted in).
pub struct StatusLineObserver {
    show_all: bool,
}

impl StatusLineObserver {
    pub fn new(show_all: bool) -> Self {
        Self { show_all }
    }

    pub fn report(&self, event: &FileEvent) {
        if let Some(line) = self.line_for(event) {
            println!("{line}");
        }
    }

    /// Same filtering as [`Self::report`], but returns the formatted line
    /// instead of printing directly — for callers (the progress bar) that
    /// need to suspend their own redraw around the print.
    pub fn line_for(&self, event: &FileEvent) -> Option<String> {
        if !self.show_all && Self::is_routine_skip(event.state) {
            return None;
        }
        Some(Self::format_line(event))
    }

    fn is_routine_skip(state: FileState) -> bool {
        matches!(
            state,
            FileState::SkippedDeleted | FileState::SkippedFiltered | FileState::SkippedRecycleBin
        )
    }

    /// Whether `state` represents the kind of anomaly `-c`/`confirm_anomalies`
    /// pauses on: corruption, a resolution failure, or a signature mismatch.
    /// Routine skips and successful outcomes never count.
    pub fn is_anomaly(state: FileState) -> bool {
        matches!(
            state,
            FileState::Corrupt | FileState::PathResolutionFailed | FileState::MagicMismatch
        )
    }

    fn format_line(event: &FileEvent) -> String {
        let marker = match event.state {
            FileState::BootSector => "BOOT",
            FileState::SkippedDeleted => "skip(deleted)",
            FileState::SkippedRecycleBin => "skip(recycle-bin)",
            FileState::SkippedFiltered => "skip(filtered)",
            FileState::DryRun => "dry-run",
            FileState::Directory => "dir",
            FileState::MagicMismatch => "skip(magic)",
            FileState::AlreadyExists => "exists",
            FileState::Recovered => "recovered",
            FileState::Corrupt => "corrupt",
            FileState::PathResolutionFailed => "unresolved",
        };
        format!(
            "[{marker:>18}] lba={:<10} ref={} {}",
            event.lba, event.reference, event.path
        )
    }
}
