//! Local filesystem writer: output path formation, the overwrite
//! short-circuit, and original-timestamp restoration (spec §4.5, §6).

use crate::domain::repositories::{FileWriterError, RecoveredFileWriter, WriteOutcome, WriteRequest};
use crate::domain::services::content_signature::ContentSignature;
use crate::domain::services::recovery_dispatcher::{already_satisfied, mangled_prefix};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Writes recovered files under a target directory on the local filesystem.
///
/// Output path shape: `<target_dir>/<mangled>/<path>/<name>`. Parent
/// directories are created as needed (`EEXIST` is ignored, matching the
/// idempotent-directory-creation invariant in spec §5).
pub struct LocalFileWriter {
    output_dir: PathBuf,
    files_written: AtomicUsize,
    bytes_written: AtomicU64,
}

impl LocalFileWriter {
    fn output_path(&self, request: &WriteRequest) -> PathBuf {
        let mut path = self.output_dir.clone();
        let prefix = mangled_prefix(request.mangle, request.modification_unix_time);
        if !prefix.is_empty() {
            path.push(prefix);
        }
        let relative = request.relative_path.trim_start_matches('/');
        if !relative.is_empty() {
            path.push(relative);
        }
        path.push(request.name);
        path
    }

    fn read_existing_prefix(path: &Path, len: usize) -> Option<Vec<u8>> {
        let mut file = File::open(path).ok()?;
        let mut buf = vec![0u8; len];
        let read = file.read(&mut buf).ok()?;
        buf.truncate(read);
        Some(buf)
    }
}

impl RecoveredFileWriter for LocalFileWriter {
    fn new(output_dir: impl Into<PathBuf>) -> Result<Self, FileWriterError> {
        let output_dir = output_dir.into();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).map_err(FileWriterError::DirectoryCreation)?;
        }
        Ok(LocalFileWriter {
            output_dir,
            files_written: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
        })
    }

    fn write(&self, request: &WriteRequest) -> Result<WriteOutcome, FileWriterError> {
        let path = self.output_path(request);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(FileWriterError::DirectoryCreation)?;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            let existing_mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            let magic = request.magic.map(ContentSignature::from_magic);
            let existing_prefix = Self::read_existing_prefix(&path, 8);

            if already_satisfied(
                metadata.len(),
                existing_mtime,
                existing_prefix.as_deref(),
                request.declared_size,
                request.change_unix_time,
                magic.as_ref(),
                request.force_overwrite,
            ) {
                return Ok(WriteOutcome::AlreadyExists { path });
            }
        }

        if let Err(err) = write_and_sync(&path, request.content) {
            unlink_partial(&path);
            return Err(err.into());
        }

        set_file_times(&path, request.access_unix_time, request.modification_unix_time);

        let bytes = request.content.len() as u64;
        self.files_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);

        Ok(WriteOutcome::Written { path, bytes })
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn files_written(&self) -> usize {
        self.files_written.load(Ordering::Relaxed)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

fn write_and_sync(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Restores atime/mtime on the just-written file from the record's
/// `$STANDARD_INFORMATION` values. Best-effort: a failure here is logged,
/// not propagated, since the file content itself was already written
/// successfully.
fn set_file_times(path: &Path, access_unix: i64, modification_unix: i64) {
    let Ok(file) = File::options().write(true).open(path) else {
        return;
    };
    let times = std::fs::FileTimes::new()
        .set_accessed(unix_to_system_time(access_unix))
        .set_modified(unix_to_system_time(modification_unix));
    if let Err(err) = file.set_times(times) {
        log::warn!("failed to restore timestamps on {}: {err}", path.display());
    }
}

fn unix_to_system_time(unix_seconds: i64) -> std::time::SystemTime {
    if unix_seconds >= 0 {
        std::time::UNIX_EPOCH + std::time::Duration::from_secs(unix_seconds as u64)
    } else {
        std::time::UNIX_EPOCH - std::time::Duration::from_secs((-unix_seconds) as u64)
    }
}

/// Removes a partially-written output file (spec §4.5 step 8: on error or
/// magic mismatch, unlink any partial output unless undelete mode requests
/// retention).
pub fn unlink_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to unlink partial output {}: {err}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MangleFormat;
    use tempfile::tempdir;

    fn request<'a>(relative_path: &'a str, name: &'a str, content: &'a [u8]) -> WriteRequest<'a> {
        WriteRequest {
            relative_path,
            name,
            content,
            modification_unix_time: 1_000,
            access_unix_time: 1_000,
            declared_size: content.len() as u64,
            change_unix_time: 1_000,
            magic: None,
            force_overwrite: false,
            mangle: MangleFormat::None,
        }
    }

    #[test]
    fn writes_content_under_relative_path() {
        let dir = tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path()).unwrap();
        let outcome = writer.write(&request("/pictures/", "a.jpg", b"hello")).unwrap();
        match outcome {
            WriteOutcome::Written { path, bytes } => {
                assert_eq!(bytes, 5);
                assert!(path.ends_with("pictures/a.jpg"));
                assert_eq!(fs::read(path).unwrap(), b"hello");
            }
            other => panic!("expected Written, got {other:?}"),
        }
    }

    #[test]
    fn existing_satisfying_file_is_a_no_op() {
        let dir = tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path()).unwrap();
        writer.write(&request("/", "a.jpg", b"hello")).unwrap();
        let outcome = writer.write(&request("/", "a.jpg", b"hi")).unwrap();
        assert!(matches!(outcome, WriteOutcome::AlreadyExists { .. }));
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"hello");
    }

    #[test]
    fn force_overwrite_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path()).unwrap();
        writer.write(&request("/", "a.jpg", b"hello")).unwrap();
        let mut forced = request("/", "a.jpg", b"hi");
        forced.force_overwrite = true;
        let outcome = writer.write(&forced).unwrap();
        assert!(matches!(outcome, WriteOutcome::Written { .. }));
        assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"hi");
    }
}
