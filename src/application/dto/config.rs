//! Configuration DTO
//!
//! The external-collaborator boundary the core consumes instead of parsing
//! CLI flags itself. Built from CLI flags by `presentation::cli`.

use crate::domain::repositories::MangleFormat;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Configuration for one scan/recovery run.
#[derive(Debug, Clone)]
pub struct Config {
    /// First device LBA to scan from.
    pub first_lba: u64,
    /// Last device LBA to scan to (exclusive); `None` scans to EOF.
    pub last_lba: Option<u64>,
    /// Directory recovered files are written under.
    pub target_dir: PathBuf,
    /// Perform recovery; otherwise dry-run.
    pub recover: bool,
    /// Include not-in-use (deleted) records.
    pub include_deleted: bool,
    /// Overwrite existing target files regardless of the overwrite policy.
    pub force_overwrite: bool,
    /// Limit on the number of MFT records scanned.
    pub max_records: Option<u64>,
    /// Limit on the number of status lines shown.
    pub max_shown: Option<u64>,
    /// Content-signature magic word, little-endian.
    pub magic: Option<u64>,
    /// Extension/MIME-super-type include tokens.
    pub include_exts: HashSet<String>,
    /// Extension/MIME-super-type exclude tokens.
    pub exclude_exts: HashSet<String>,
    /// Include records under `$RECYCLE.BIN`.
    pub include_recycle_bin: bool,
    /// Output path mangling by modification-time segment.
    pub path_mangle: MangleFormat,
    /// Report INDX blocks as they are scanned.
    pub report_indx: bool,
    /// Show all records, including those skipped by filters.
    pub show_all: bool,
    /// List directory contents as they are resolved.
    pub list_dirs: bool,
    /// Maximum concurrently live extraction workers.
    pub max_workers: usize,
    /// Declared size above which extraction is delegated to a worker.
    pub big_file_threshold_bytes: u64,
    /// Pause for interactive confirmation on anomalies.
    pub confirm_anomalies: bool,
    /// Host MIME type → extension-set map, used by the filter engine's
    /// super-type matching.
    pub mime_types: HashMap<String, HashSet<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_lba: 0,
            last_lba: None,
            target_dir: PathBuf::from("."),
            recover: false,
            include_deleted: false,
            force_overwrite: false,
            max_records: None,
            max_shown: None,
            magic: None,
            include_exts: HashSet::new(),
            exclude_exts: HashSet::new(),
            include_recycle_bin: false,
            path_mangle: MangleFormat::None,
            report_indx: false,
            show_all: false,
            list_dirs: false,
            max_workers: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
            big_file_threshold_bytes: 16 * 1024 * 1024,
            confirm_anomalies: false,
            mime_types: HashMap::new(),
        }
    }
}

impl Config {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_lba_bounds_and_sane_threshold() {
        let config = Config::default();
        assert_eq!(config.first_lba, 0);
        assert_eq!(config.last_lba, None);
        assert_eq!(config.big_file_threshold_bytes, 16 * 1024 * 1024);
        assert!(config.max_workers >= 1);
    }
}
