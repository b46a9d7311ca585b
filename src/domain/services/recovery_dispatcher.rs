//! Recovery Dispatcher decision logic (spec §4.5): whether a descriptor is
//! recovered at all, whether it is big enough to hand to a worker, output
//! path mangling, and the overwrite short-circuit. Pure logic only — actual
//! device reads and file writes are driven by the application layer through
//! the `BlockDeviceReader`/`RecoveredFileWriter` ports.

use crate::domain::entities::FileDescriptor;
use crate::domain::repositories::MangleFormat;
use crate::domain::services::content_signature::ContentSignature;
use crate::domain::services::filter_engine::FilterEngine;
use chrono::{Local, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not in-use and `-u`/include_deleted is off.
    SkipDeleted,
    /// In the recycle bin and the recycle-bin flag is off.
    SkipRecycleBin,
    /// Extension filter rejected the descriptor.
    SkipFiltered,
    /// `-R`/recover is off: dry run, nothing written.
    DryRun,
    /// Directory: its content (INDX blocks) is walked but no output file is
    /// written for it.
    Directory,
    /// Declared size exceeds the big-file threshold: hand off to a worker.
    ExtractInWorker,
    /// Extract inline on the scanning thread.
    ExtractInline,
}

/// The policy inputs the dispatcher consults, assembled by the application
/// layer from `Config`.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    pub recover: bool,
    pub include_deleted: bool,
    pub include_recycle_bin: bool,
    pub big_file_threshold_bytes: u64,
    pub force_overwrite: bool,
    pub magic: Option<ContentSignature>,
}

/// Decides what should happen to `descriptor` under `policy`/`filter`.
/// Filter and deletion checks precede the dry-run check per spec §4.5's
/// numbered algorithm (status is still emitted for every descriptor by the
/// caller regardless of the decision).
pub fn decide(descriptor: &FileDescriptor, policy: &RecoveryPolicy, filter: &FilterEngine) -> Decision {
    if !descriptor.in_use && !policy.include_deleted {
        return Decision::SkipDeleted;
    }
    if descriptor.in_recycle_bin && !policy.include_recycle_bin {
        return Decision::SkipRecycleBin;
    }
    if !descriptor.is_directory && !filter.accepts(&descriptor.extension) {
        return Decision::SkipFiltered;
    }
    if !policy.recover {
        return Decision::DryRun;
    }
    if descriptor.is_directory {
        return Decision::Directory;
    }
    if descriptor.declared_size > policy.big_file_threshold_bytes {
        Decision::ExtractInWorker
    } else {
        Decision::ExtractInline
    }
}

/// Builds the mangled path prefix, `<path>` in
/// `<target_dir>/<mangled>/<path>/<name>`, from the modification time
/// rendered in the *local* timezone (spec §4.5 "Path mangling detail").
pub fn mangled_prefix(mangle: MangleFormat, modification_unix_time: i64) -> String {
    if mangle == MangleFormat::None {
        return String::new();
    }
    let local = Local
        .timestamp_opt(modification_unix_time, 0)
        .single()
        .unwrap_or_else(|| Local.timestamp_opt(0, 0).unwrap());

    match mangle {
        MangleFormat::None => unreachable!(),
        MangleFormat::Year => format!("{:04}", local.format("%Y")),
        MangleFormat::Month => format!("{:04}/{:02}", local.format("%Y"), local.format("%m")),
        MangleFormat::Day => format!(
            "{:04}/{:02}/{:02}",
            local.format("%Y"),
            local.format("%m"),
            local.format("%d")
        ),
    }
}

/// Whether an existing target file at `existing_size`/`existing_mtime`
/// already satisfies the recovery, per spec §8's overwrite-policy testable
/// property (`size >= declared && mtime >= change_time`, plus a matching
/// magic when one is configured). See DESIGN.md for the documented
/// deviation from the original source's inverted comparison.
pub fn already_satisfied(
    existing_size: u64,
    existing_mtime_unix: i64,
    existing_first_bytes: Option<&[u8]>,
    declared_size: u64,
    change_time_unix: i64,
    magic: Option<&ContentSignature>,
    force: bool,
) -> bool {
    if force {
        return false;
    }
    if existing_size < declared_size {
        return false;
    }
    if existing_mtime_unix < change_time_unix {
        return false;
    }
    if let Some(sig) = magic {
        match existing_first_bytes {
            Some(bytes) if sig.matches(bytes) => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Reference;
    use std::collections::{HashMap, HashSet};

    fn sample_descriptor() -> FileDescriptor {
        let mut d = FileDescriptor::new(0, Reference::from(42));
        d.in_use = true;
        d.extension = "jpg".to_string();
        d.declared_size = 1024;
        d
    }

    fn permissive_policy() -> RecoveryPolicy {
        RecoveryPolicy {
            recover: true,
            include_deleted: true,
            include_recycle_bin: true,
            big_file_threshold_bytes: 16 * 1024 * 1024,
            force_overwrite: false,
            magic: None,
        }
    }

    #[test]
    fn deleted_record_skipped_without_undelete_flag() {
        let mut d = sample_descriptor();
        d.in_use = false;
        let mut policy = permissive_policy();
        policy.include_deleted = false;
        let filter = FilterEngine::default();
        assert_eq!(decide(&d, &policy, &filter), Decision::SkipDeleted);
    }

    #[test]
    fn dry_run_when_recover_disabled() {
        let d = sample_descriptor();
        let mut policy = permissive_policy();
        policy.recover = false;
        let filter = FilterEngine::default();
        assert_eq!(decide(&d, &policy, &filter), Decision::DryRun);
    }

    #[test]
    fn big_file_routed_to_worker() {
        let mut d = sample_descriptor();
        d.declared_size = 64 * 1024 * 1024;
        let policy = permissive_policy();
        let filter = FilterEngine::default();
        assert_eq!(decide(&d, &policy, &filter), Decision::ExtractInWorker);
    }

    #[test]
    fn filtered_extension_is_skipped() {
        let d = sample_descriptor();
        let policy = permissive_policy();
        let filter = FilterEngine::new(
            HashSet::from(["png".to_string()]),
            HashSet::new(),
            HashMap::new(),
        );
        assert_eq!(decide(&d, &policy, &filter), Decision::SkipFiltered);
    }

    #[test]
    fn mangle_none_yields_empty_prefix() {
        assert_eq!(mangled_prefix(MangleFormat::None, 0), "");
    }

    #[test]
    fn overwrite_short_circuits_when_satisfied() {
        assert!(already_satisfied(2000, 100, None, 1000, 50, None, false));
    }

    #[test]
    fn force_overwrite_never_short_circuits() {
        assert!(!already_satisfied(2000, 100, None, 1000, 50, None, true));
    }

    #[test]
    fn smaller_existing_file_is_not_satisfied() {
        assert!(!already_satisfied(500, 100, None, 1000, 50, None, false));
    }
}
