//! CLI commands using clap

use crate::application::dto::Config;
use crate::domain::repositories::MangleFormat;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;

/// ntfsalvage - NTFS Deleted File Recovery Tool
///
/// Recovers files from an NTFS volume, raw device, partition image, or
/// isolated `$MFT` file via linear block-level scanning, MFT record
/// interpretation, directory-path reconstruction, and data-run based
/// content extraction.
#[derive(Parser)]
#[command(name = "ntfsalvage")]
#[command(author)]
#[command(version)]
#[command(about = "Recover deleted files from NTFS volumes and images", long_about = None)]
pub struct Cli {
    /// Path to device, partition image, or extracted $MFT file
    pub device: String,

    /// First device LBA to scan from (hex with 0x, or decimal)
    #[arg(short = 'l', long = "first-lba", value_parser = parse_lba)]
    pub first_lba: Option<u64>,

    /// Last device LBA to scan to, exclusive (hex with 0x, or decimal)
    #[arg(short = 'L', long = "last-lba", value_parser = parse_lba)]
    pub last_lba: Option<u64>,

    /// Directory recovered files are written under
    #[arg(short = 't', long = "target-dir", default_value = ".")]
    pub target_dir: PathBuf,

    /// Perform recovery; otherwise dry-run
    #[arg(short = 'R', long = "recover")]
    pub recover: bool,

    /// Include not-in-use (deleted) records
    #[arg(short = 'u', long = "undelete")]
    pub include_deleted: bool,

    /// Overwrite existing target files regardless of the overwrite policy
    #[arg(short = 'f', long = "force")]
    pub force_overwrite: bool,

    /// Limit on the number of MFT records scanned
    #[arg(short = 'n', long = "max-records")]
    pub max_records: Option<u64>,

    /// Limit on the number of status lines shown
    #[arg(short = 's', long = "max-shown")]
    pub max_shown: Option<u64>,

    /// Content-signature magic: numeric (with 0x) or ASCII
    #[arg(short = 'm', long = "magic")]
    pub magic: Option<String>,

    /// Include extensions or MIME super-types, comma-separated
    #[arg(short = 'i', long = "include", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Exclude extensions or MIME super-types, comma-separated
    #[arg(short = 'x', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Include records under $RECYCLE.BIN
    #[arg(short = 'r', long = "recycle-bin")]
    pub include_recycle_bin: bool,

    /// Mangle output paths by modification year
    #[arg(short = 'Y', long = "mangle-year")]
    pub mangle_year: bool,

    /// Mangle output paths by modification month
    #[arg(short = 'M', long = "mangle-month")]
    pub mangle_month: bool,

    /// Mangle output paths by modification day
    #[arg(short = 'D', long = "mangle-day")]
    pub mangle_day: bool,

    /// Report INDX blocks as they are scanned
    #[arg(short = 'X', long = "report-indx")]
    pub report_indx: bool,

    /// Show all records, including those skipped by filters
    #[arg(short = 'a', long = "show-all")]
    pub show_all: bool,

    /// List directory contents as they are resolved
    #[arg(short = 'd', long = "list-dirs")]
    pub list_dirs: bool,

    /// Maximum concurrently live extraction workers
    #[arg(short = 'p', long = "workers")]
    pub max_workers: Option<usize>,

    /// Declared size above which extraction is delegated to a worker, in MiB
    #[arg(short = 'S', long = "big-file-threshold")]
    pub big_file_threshold_mib: Option<u64>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Pause for interactive confirmation on anomalies
    #[arg(short = 'c', long = "confirm")]
    pub confirm_anomalies: bool,

    /// Path to a `mime.types`-style database used by extension/MIME filters
    #[arg(long = "mime-types")]
    pub mime_types_path: Option<PathBuf>,

    /// Map the source into memory instead of using seek/read. Faster for
    /// sources that fit comfortably in RAM; not recommended for devices
    /// much larger than available memory.
    #[arg(long = "mmap")]
    pub mmap: bool,
}

impl Cli {
    /// Builds the core's `Config` collaborator from parsed flags. The device
    /// path stays separate: it is consumed by the block-device adapter, not
    /// the core.
    pub fn to_config(&self) -> Config {
        let mut config = Config::new(self.target_dir.clone());
        config.first_lba = self.first_lba.unwrap_or(0);
        config.last_lba = self.last_lba;
        config.recover = self.recover;
        config.include_deleted = self.include_deleted;
        config.force_overwrite = self.force_overwrite;
        config.max_records = self.max_records;
        config.max_shown = self.max_shown;
        config.magic = self.magic.as_deref().and_then(parse_magic);
        config.include_exts = self.include.iter().map(|s| s.to_lowercase()).collect::<HashSet<_>>();
        config.exclude_exts = self.exclude.iter().map(|s| s.to_lowercase()).collect::<HashSet<_>>();
        config.include_recycle_bin = self.include_recycle_bin;
        config.path_mangle = self.mangle_format();
        config.report_indx = self.report_indx;
        config.show_all = self.show_all;
        config.list_dirs = self.list_dirs;
        if let Some(workers) = self.max_workers {
            config.max_workers = workers.max(1);
        }
        if let Some(mib) = self.big_file_threshold_mib {
            config.big_file_threshold_bytes = mib * 1024 * 1024;
        }
        config.confirm_anomalies = self.confirm_anomalies;
        config
    }

    /// Day takes precedence over month, which takes precedence over year,
    /// when more than one mangling flag is given.
    fn mangle_format(&self) -> MangleFormat {
        if self.mangle_day {
            MangleFormat::Day
        } else if self.mangle_month {
            MangleFormat::Month
        } else if self.mangle_year {
            MangleFormat::Year
        } else {
            MangleFormat::None
        }
    }

    /// `warn` by default, `info` for one `-v`, `debug` for two or more.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn parse_lba(raw: &str) -> Result<u64, String> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        raw.parse::<u64>().map_err(|e| e.to_string())
    }
}

/// Parses a `-m` magic literal: hex with a `0x` prefix, or an ASCII string
/// packed little-endian into the low bytes of a `u64` (e.g. `"PK"` for a
/// zip local-file-header prefix).
fn parse_magic(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    let bytes = raw.as_bytes();
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_lba() {
        assert_eq!(parse_lba("0x1A").unwrap(), 0x1A);
        assert_eq!(parse_lba("42").unwrap(), 42);
        assert!(parse_lba("not-a-number").is_err());
    }

    #[test]
    fn parses_ascii_and_hex_magic() {
        assert_eq!(parse_magic("0x04034B50"), Some(0x04034B50));
        let pk = parse_magic("PK").unwrap();
        assert_eq!(pk.to_le_bytes()[0], b'P');
        assert_eq!(pk.to_le_bytes()[1], b'K');
    }

    #[test]
    fn day_mangle_wins_over_month_and_year() {
        let cli = Cli::parse_from([
            "ntfsalvage",
            "image.dd",
            "-Y",
            "-M",
            "-D",
        ]);
        assert_eq!(cli.mangle_format(), MangleFormat::Day);
    }
}
