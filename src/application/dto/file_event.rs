//! `FileEvent` — the value the core emits on its observer channel instead of
//! formatting terminal output itself (spec §4.5 step 1, §9 "Friend-style
//! observer coupling").

use crate::domain::entities::{Lba, Reference};

/// What happened to a descriptor by the time its status line is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// A boot sector was read and adopted.
    BootSector,
    /// Not in-use and the undelete option is off.
    SkippedDeleted,
    /// Under `$RECYCLE.BIN` and the recycle-bin option is off.
    SkippedRecycleBin,
    /// Rejected by the extension/MIME filter.
    SkippedFiltered,
    /// Dry run: `recover` is off.
    DryRun,
    /// A directory: content walked, no output file written.
    Directory,
    /// Content-signature mismatch; no output file written.
    MagicMismatch,
    /// Target already satisfies the recovery; left untouched.
    AlreadyExists,
    /// Extracted and written successfully.
    Recovered,
    /// Record-local corruption; skipped.
    Corrupt,
    /// Path resolution could not reach the root; synthetic path used.
    PathResolutionFailed,
}

/// One structured status line, kept distinct from the `log` diagnostics
/// channel so the two can be directed independently (spec §7).
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub lba: Lba,
    pub state: FileState,
    pub is_directory: bool,
    pub reference: Reference,
    pub path: String,
    pub modification_unix_time: i64,
    pub access_unix_time: i64,
}

impl FileEvent {
    pub fn new(
        lba: Lba,
        state: FileState,
        is_directory: bool,
        reference: Reference,
        path: impl Into<String>,
        modification_unix_time: i64,
        access_unix_time: i64,
    ) -> Self {
        Self {
            lba,
            state,
            is_directory,
            reference,
            path: path.into(),
            modification_unix_time,
            access_unix_time,
        }
    }
}
