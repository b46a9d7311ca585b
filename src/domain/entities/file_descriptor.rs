//! The core's in-memory representation of one parsed MFT record.

use super::data_run::RunList;
use super::reference::{Lba, Reference};

/// One child entry discovered in a directory's `$INDEX_ROOT` or an `$INDEX_ALLOCATION` INDX block.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub child: Reference,
    pub name: String,
    pub allocated_size: u64,
    pub real_size: u64,
}

/// Why a descriptor ended up invalid, carried for diagnostics and for the
/// observer's status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    CorruptRecord,
    RunListFieldTooWide,
    PathResolutionExhausted,
    MagicMismatch,
    FilteredOut,
}

#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub lba: Lba,
    pub reference: Reference,
    pub parent: Reference,
    pub name: String,
    pub extension: String,
    pub path: String,

    pub creation_time: u64,
    pub modification_time: u64,
    pub access_time: u64,

    pub declared_size: u64,
    pub allocated_size: u64,
    pub run_list: RunList,
    pub index_allocation_runs: RunList,
    pub inline_content: Option<Vec<u8>>,
    pub children: Vec<DirectoryEntry>,

    /// Leading 8 bytes of the file's content as a little-endian word, known
    /// at parse time for resident `$DATA` only; `None` for non-resident
    /// files until their content is read back during extraction.
    pub content_signature: Option<u64>,

    pub valid: bool,
    pub in_use: bool,
    pub is_directory: bool,
    pub exists_on_target: bool,
    pub done: bool,
    pub error: bool,
    pub in_recycle_bin: bool,
    pub invalid_reason: Option<InvalidReason>,
}

impl FileDescriptor {
    pub fn new(lba: Lba, reference: Reference) -> FileDescriptor {
        FileDescriptor {
            lba,
            reference,
            parent: Reference::ROOT,
            name: String::new(),
            extension: String::new(),
            path: String::new(),
            creation_time: 0,
            modification_time: 0,
            access_time: 0,
            declared_size: 0,
            allocated_size: 0,
            run_list: Vec::new(),
            index_allocation_runs: Vec::new(),
            inline_content: None,
            children: Vec::new(),
            content_signature: None,
            valid: true,
            in_use: false,
            is_directory: false,
            exists_on_target: false,
            done: false,
            error: false,
            in_recycle_bin: false,
            invalid_reason: None,
        }
    }

    pub fn mark_invalid(&mut self, reason: InvalidReason) {
        self.valid = false;
        self.invalid_reason = Some(reason);
    }

    pub fn mark_error(&mut self, reason: InvalidReason) {
        self.error = true;
        self.mark_invalid(reason);
    }

    pub fn suggested_name(&self) -> &str {
        if self.name.is_empty() {
            "unnamed"
        } else {
            &self.name
        }
    }
}
