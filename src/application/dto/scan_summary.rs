//! Aggregate result of one scan/recovery run.

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub records_scanned: u64,
    pub files_recovered: u64,
    pub directories_seen: u64,
    pub files_skipped_deleted: u64,
    pub files_skipped_filtered: u64,
    pub files_skipped_recycle_bin: u64,
    pub files_already_existing: u64,
    pub files_corrupt: u64,
    pub bytes_written: u64,
    pub duration: Duration,
}

impl ScanSummary {
    pub fn new() -> Self {
        Self::default()
    }
}
