//! The recovered-file write boundary: output path formation, overwrite
//! policy and timestamp restoration live behind this trait.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileWriterError {
    #[error("output path already exists and overwrite is disabled")]
    AlreadyExists,
    #[error("failed to create output directory: {0}")]
    DirectoryCreation(std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mangling mode applied to the output path, derived from the modification
/// time in the local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MangleFormat {
    #[default]
    None,
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone)]
pub struct WriteRequest<'a> {
    pub relative_path: &'a str,
    pub name: &'a str,
    pub content: &'a [u8],
    pub modification_unix_time: i64,
    pub access_unix_time: i64,
    pub declared_size: u64,
    pub change_unix_time: i64,
    pub magic: Option<u64>,
    pub force_overwrite: bool,
    pub mangle: MangleFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, bytes: u64 },
    AlreadyExists { path: PathBuf },
}

/// Writes recovered file content under a target directory, restoring
/// original timestamps and honoring the overwrite policy.
pub trait RecoveredFileWriter: Send + Sync {
    fn new(output_dir: impl Into<PathBuf>) -> Result<Self, FileWriterError>
    where
        Self: Sized;

    fn write(&self, request: &WriteRequest) -> Result<WriteOutcome, FileWriterError>;

    fn output_dir(&self) -> &std::path::Path;

    fn files_written(&self) -> usize;

    fn bytes_written(&self) -> u64;
}
