//! Scan use case
//!
//! Orchestrates the linear device scan, record parsing, path resolution,
//! and recovery dispatch described in spec §2/§4/§5: the scanning thread
//! runs synchronously in ascending LBA order; large-file extractions are
//! handed off to a bounded `tokio` worker pool so scanning continues while
//! they complete.

use crate::application::dto::{Config, FileEvent, FileState, ScanSummary};
use crate::domain::entities::filetime::filetime_to_unix_seconds;
use crate::domain::entities::{
    BootSector, DataRun, DirectoryCache, DirectoryEntry, FileDescriptor, IndexHeader, Reference,
};
use crate::domain::repositories::{BlockDeviceReader, RecoveredFileWriter, WriteOutcome, WriteRequest};
use crate::domain::services::{
    self, chunk_classifier::ChunkKind, content_signature::ContentSignature, decide,
    directory_resolver::{FetchedRecord, RECYCLE_BIN_SEGMENT},
    filter_engine::FilterEngine,
    recovery_dispatcher::{Decision, RecoveryPolicy},
    record_parser::RecordParser,
    synthetic_path,
};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

const INDX_BLOCK_HEADER_SIZE: usize = 24;
const DEFAULT_SECTOR_SIZE: u64 = 512;
const DEFAULT_RECORD_SIZE: u64 = 1024;

/// Callback invoked once per status line. Shared across the scanning thread
/// and worker tasks, matching the teacher's boxed-closure progress-callback
/// idiom but `Arc`-wrapped so both sides can hold it.
pub type FileEventCallback = Arc<dyn Fn(&FileEvent) + Send + Sync>;

#[derive(Default)]
struct Counters {
    records_scanned: AtomicU64,
    files_recovered: AtomicU64,
    directories_seen: AtomicU64,
    files_skipped_deleted: AtomicU64,
    files_skipped_filtered: AtomicU64,
    files_skipped_recycle_bin: AtomicU64,
    files_already_existing: AtomicU64,
    files_corrupt: AtomicU64,
    bytes_written: AtomicU64,
}

/// Mutable scan parameters recomputed as the boot sector and `$MFT` record
/// are observed. Starts with conservative defaults so a bare `$MFT`-only
/// image (no boot sector in the scanned range) still parses records.
struct ScanState {
    sector_size: u64,
    sectors_per_cluster: u64,
    mft_record_size: u64,
    bias: i64,
    directory_cache: DirectoryCache,
}

impl ScanState {
    fn new() -> Self {
        Self {
            sector_size: DEFAULT_SECTOR_SIZE,
            sectors_per_cluster: 1,
            mft_record_size: DEFAULT_RECORD_SIZE,
            bias: 0,
            directory_cache: DirectoryCache::new(),
        }
    }

    fn adopt_boot_sector(&mut self, boot: &BootSector) {
        self.sector_size = boot.bytes_per_sector as u64;
        self.sectors_per_cluster = boot.sectors_per_cluster as u64;
        self.mft_record_size = boot.mft_record_size() as u64;
    }

    fn geometry(&self) -> Geometry {
        Geometry {
            sectors_per_cluster: self.sectors_per_cluster,
            sector_size: self.sector_size,
            bias: self.bias,
        }
    }
}

/// Cluster/sector geometry and LBA bias as currently adopted by the scan
/// loop. `Copy` so it can be handed to a worker closure by value instead of
/// borrowing `ScanState` past the scanning thread's lifetime.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    sectors_per_cluster: u64,
    sector_size: u64,
    bias: i64,
}

pub struct ScanUseCase;

impl ScanUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Runs one scan/recovery pass over `device`, writing accepted files via
    /// `writer`. `device`/`writer` are `Arc`-held so large-file extractions
    /// can be moved onto `tokio::task::spawn_blocking` without borrowing
    /// past the function's return.
    pub fn execute<R, W>(
        &self,
        device: Arc<R>,
        writer: Arc<W>,
        config: &Config,
        observer: Option<FileEventCallback>,
    ) -> Result<ScanSummary>
    where
        R: BlockDeviceReader + 'static,
        W: RecoveredFileWriter + 'static,
    {
        let device_size = device.size();
        log::info!("starting scan of {} ({} bytes)", device.path(), device_size);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.max_workers.max(1))
            .enable_all()
            .build()
            .context("failed to start worker runtime")?;
        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

        let filter = FilterEngine::new(
            config.include_exts.clone(),
            config.exclude_exts.clone(),
            config.mime_types.clone(),
        );
        let policy = RecoveryPolicy {
            recover: config.recover,
            include_deleted: config.include_deleted,
            include_recycle_bin: config.include_recycle_bin,
            big_file_threshold_bytes: config.big_file_threshold_bytes,
            force_overwrite: config.force_overwrite,
            magic: config.magic.map(ContentSignature::from_magic),
        };

        let counters = Arc::new(Counters::default());
        let mut parser = RecordParser::new();
        let mut state = ScanState::new();
        let mut handles = Vec::new();

        let mut lba = config.first_lba;
        let mut records_budget = config.max_records;
        let mut shown_budget = config.max_shown;
        let start = Instant::now();

        loop {
            if let Some(last) = config.last_lba {
                if lba >= last {
                    break;
                }
            }
            if matches!(records_budget, Some(0)) {
                break;
            }
            let offset = lba.saturating_mul(state.sector_size);
            if offset >= device_size {
                break;
            }

            let chunk = match device.read_at(offset, state.sector_size as usize) {
                Ok(data) => data,
                Err(err) => {
                    return Err(err).context("fatal device read error during scan");
                }
            };

            match services::chunk_classifier::classify(&chunk) {
                ChunkKind::BootSector => {
                    if let Some(boot) = BootSector::parse(&chunk) {
                        log::debug!("adopted boot sector at lba {lba}");
                        state.adopt_boot_sector(&boot);
                        emit_capped(
                            &observer,
                            &mut shown_budget,
                            FileEvent::new(lba, FileState::BootSector, false, Reference::ROOT, "/", 0, 0),
                        );
                    }
                    lba += 1;
                }
                ChunkKind::IndexBlock => {
                    if config.report_indx {
                        log::info!("INDX block encountered directly at lba {lba}");
                    }
                    lba += 1;
                }
                ChunkKind::Other => {
                    lba += 1;
                }
                ChunkKind::FileRecord => {
                    let record_buf = match read_full_record(device.as_ref(), offset, &chunk, state.mft_record_size) {
                        Some(buf) => buf,
                        None => {
                            lba += (state.mft_record_size / state.sector_size).max(1);
                            continue;
                        }
                    };

                    counters.records_scanned.fetch_add(1, Ordering::Relaxed);
                    if let Some(budget) = records_budget.as_mut() {
                        *budget = budget.saturating_sub(1);
                    }

                    match parser.parse(lba, &record_buf) {
                        None => {
                            counters.files_corrupt.fetch_add(1, Ordering::Relaxed);
                            log::warn!("corrupt or unusable record at lba {lba}, skipped");
                        }
                        Some(mut descriptor) => {
                            if descriptor.reference.record_index() == 0 {
                                recompute_bias(&mut state, &descriptor, lba);
                                state.directory_cache.clear();
                            }

                            resolve_descriptor_path(device.as_ref(), &mut state, &mut descriptor);

                            if descriptor.is_directory {
                                state
                                    .directory_cache
                                    .insert(descriptor.reference, descriptor.name.clone(), descriptor.parent);
                                if config.list_dirs {
                                    extract_directory_children(device.as_ref(), &mut descriptor, &state);
                                }
                            }

                            let decision = decide(&descriptor, &policy, &filter);
                            dispatch(
                                decision,
                                descriptor,
                                &device,
                                &writer,
                                &runtime,
                                &semaphore,
                                &counters,
                                &policy,
                                config,
                                state.geometry(),
                                &observer,
                                &mut shown_budget,
                                &mut handles,
                            );
                        }
                    }

                    lba += (state.mft_record_size / state.sector_size).max(1);
                }
            }
        }

        for handle in handles {
            if let Err(err) = runtime.block_on(handle) {
                log::error!("worker task panicked: {err}");
            }
        }

        Ok(ScanSummary {
            records_scanned: counters.records_scanned.load(Ordering::Relaxed),
            files_recovered: counters.files_recovered.load(Ordering::Relaxed),
            directories_seen: counters.directories_seen.load(Ordering::Relaxed),
            files_skipped_deleted: counters.files_skipped_deleted.load(Ordering::Relaxed),
            files_skipped_filtered: counters.files_skipped_filtered.load(Ordering::Relaxed),
            files_skipped_recycle_bin: counters.files_skipped_recycle_bin.load(Ordering::Relaxed),
            files_already_existing: counters.files_already_existing.load(Ordering::Relaxed),
            files_corrupt: counters.files_corrupt.load(Ordering::Relaxed),
            bytes_written: counters.bytes_written.load(Ordering::Relaxed),
            duration: start.elapsed(),
        })
    }
}

impl Default for ScanUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch<R, W>(
    decision: Decision,
    mut descriptor: FileDescriptor,
    device: &Arc<R>,
    writer: &Arc<W>,
    runtime: &tokio::runtime::Runtime,
    semaphore: &Arc<Semaphore>,
    counters: &Arc<Counters>,
    policy: &RecoveryPolicy,
    config: &Config,
    geometry: Geometry,
    observer: &Option<FileEventCallback>,
    shown_budget: &mut Option<u64>,
    handles: &mut Vec<tokio::task::JoinHandle<()>>,
) where
    R: BlockDeviceReader + 'static,
    W: RecoveredFileWriter + 'static,
{
    let mtime = filetime_to_unix_seconds(descriptor.modification_time);
    let atime = filetime_to_unix_seconds(descriptor.access_time);
    // Path resolution exhaustion never blocks the underlying decision (the
    // descriptor still recovers under its synthetic `/@<ref>/` path, per
    // spec §4.3) but the status line should still flag it so `-c` can pause
    // on it, distinct from the `log` diagnostics channel (spec §7).
    let path_resolution_failed = matches!(
        descriptor.invalid_reason,
        Some(crate::domain::entities::InvalidReason::PathResolutionExhausted)
    );

    let state_for_event = match decision {
        Decision::SkipDeleted => {
            counters.files_skipped_deleted.fetch_add(1, Ordering::Relaxed);
            FileState::SkippedDeleted
        }
        Decision::SkipRecycleBin => {
            counters.files_skipped_recycle_bin.fetch_add(1, Ordering::Relaxed);
            FileState::SkippedRecycleBin
        }
        Decision::SkipFiltered => {
            counters.files_skipped_filtered.fetch_add(1, Ordering::Relaxed);
            FileState::SkippedFiltered
        }
        Decision::DryRun => FileState::DryRun,
        Decision::Directory => {
            counters.directories_seen.fetch_add(1, Ordering::Relaxed);
            FileState::Directory
        }
        Decision::ExtractInline => {
            let outcome = recover_descriptor(device.as_ref(), writer.as_ref(), &descriptor, policy, config, geometry);
            record_outcome(&outcome, counters);
            outcome
        }
        Decision::ExtractInWorker => {
            let device = Arc::clone(device);
            let writer = Arc::clone(writer);
            let semaphore = Arc::clone(semaphore);
            let counters = Arc::clone(counters);
            let policy = policy.clone();
            let config_for_worker = WorkerConfig {
                force_overwrite: config.force_overwrite,
                mangle: config.path_mangle,
            };
            let observer = observer.clone();
            handles.push(runtime.spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let resolution_failed = matches!(
                    descriptor.invalid_reason,
                    Some(crate::domain::entities::InvalidReason::PathResolutionExhausted)
                );
                let result = tokio::task::spawn_blocking(move || {
                    let mut outcome = recover_worker(device.as_ref(), writer.as_ref(), &descriptor, &policy, &config_for_worker, geometry);
                    record_outcome(&outcome, &counters);
                    if resolution_failed {
                        if !matches!(outcome, FileState::Corrupt) {
                            counters.files_corrupt.fetch_add(1, Ordering::Relaxed);
                        }
                        outcome = FileState::PathResolutionFailed;
                    }
                    if let Some(cb) = &observer {
                        cb(&FileEvent::new(
                            descriptor.lba,
                            outcome,
                            false,
                            descriptor.reference,
                            descriptor.path.clone(),
                            filetime_to_unix_seconds(descriptor.modification_time),
                            filetime_to_unix_seconds(descriptor.access_time),
                        ));
                    }
                })
                .await;
                drop(permit);
                if let Err(err) = result {
                    log::error!("extraction worker panicked: {err}");
                }
            }));
            return;
        }
    };
    let state_for_event = if path_resolution_failed {
        if !matches!(state_for_event, FileState::Corrupt) {
            counters.files_corrupt.fetch_add(1, Ordering::Relaxed);
        }
        FileState::PathResolutionFailed
    } else {
        state_for_event
    };

    emit_capped(
        observer,
        shown_budget,
        FileEvent::new(
            descriptor.lba,
            state_for_event,
            descriptor.is_directory,
            descriptor.reference,
            descriptor.path.clone(),
            mtime,
            atime,
        ),
    );
}

/// Plain data carried into a worker closure instead of the full `Config`,
/// which is borrowed and not `'static`.
#[derive(Clone, Copy)]
struct WorkerConfig {
    force_overwrite: bool,
    mangle: crate::domain::repositories::MangleFormat,
}

fn record_outcome(state: &FileState, counters: &Counters) {
    match state {
        FileState::Recovered => {
            counters.files_recovered.fetch_add(1, Ordering::Relaxed);
        }
        FileState::AlreadyExists => {
            counters.files_already_existing.fetch_add(1, Ordering::Relaxed);
        }
        FileState::Corrupt => {
            counters.files_corrupt.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

fn recover_descriptor<R: BlockDeviceReader, W: RecoveredFileWriter>(
    device: &R,
    writer: &W,
    descriptor: &FileDescriptor,
    policy: &RecoveryPolicy,
    config: &Config,
    geometry: Geometry,
) -> FileState {
    let worker_config = WorkerConfig {
        force_overwrite: config.force_overwrite,
        mangle: config.path_mangle,
    };
    recover_worker(device, writer, descriptor, policy, &worker_config, geometry)
}

fn recover_worker<R: BlockDeviceReader, W: RecoveredFileWriter>(
    device: &R,
    writer: &W,
    descriptor: &FileDescriptor,
    policy: &RecoveryPolicy,
    config: &WorkerConfig,
    geometry: Geometry,
) -> FileState {
    let content = match extract_content(
        device,
        descriptor,
        geometry.sectors_per_cluster,
        geometry.sector_size,
        geometry.bias,
    ) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::error!("extraction failed for {}: {err}", descriptor.reference);
            return FileState::Corrupt;
        }
    };

    if let Some(sig) = &policy.magic {
        if !sig.matches(&content) {
            return FileState::MagicMismatch;
        }
    }

    let name = descriptor.suggested_name();
    let request = WriteRequest {
        relative_path: &descriptor.path,
        name,
        content: &content,
        modification_unix_time: filetime_to_unix_seconds(descriptor.modification_time),
        access_unix_time: filetime_to_unix_seconds(descriptor.access_time),
        declared_size: descriptor.declared_size,
        change_unix_time: filetime_to_unix_seconds(descriptor.modification_time),
        magic: policy.magic.as_ref().map(|s| s.magic()),
        force_overwrite: config.force_overwrite,
        mangle: config.mangle,
    };

    match writer.write(&request) {
        Ok(WriteOutcome::Written { bytes, .. }) => {
            log::info!(
                "recovered {} ({bytes} bytes, sha256={})",
                descriptor.path,
                crate::domain::services::content_digest(&content)
            );
            FileState::Recovered
        }
        Ok(WriteOutcome::AlreadyExists { .. }) => FileState::AlreadyExists,
        Err(err) => {
            log::error!("write failed for {}: {err}", descriptor.path);
            FileState::Corrupt
        }
    }
}

/// Streams a descriptor's content from `device` following its decoded run
/// list (spec §4.5 step 6). Sparse runs contribute no bytes. Resident
/// content is returned directly.
fn extract_content<R: BlockDeviceReader>(
    device: &R,
    descriptor: &FileDescriptor,
    sectors_per_cluster: u64,
    sector_size: u64,
    bias: i64,
) -> Result<Vec<u8>, crate::domain::repositories::BlockDeviceError> {
    if let Some(inline) = &descriptor.inline_content {
        return Ok(inline.clone());
    }

    let mut out = Vec::new();
    let mut remaining = descriptor.declared_size;
    let cluster_bytes = sectors_per_cluster * sector_size;

    for run in &descriptor.run_list {
        if remaining == 0 {
            break;
        }
        let DataRun::Allocated { first_lcn, last_lcn } = run else {
            continue;
        };
        for cluster in *first_lcn..*last_lcn {
            if remaining == 0 {
                break;
            }
            let device_offset = ((cluster * sectors_per_cluster) as i64 + bias).max(0) as u64 * sector_size;
            let data = device.read_at(device_offset, cluster_bytes as usize)?;
            let take = (cluster_bytes.min(remaining) as usize).min(data.len());
            out.extend_from_slice(&data[..take]);
            remaining -= take as u64;
        }
    }

    Ok(out)
}

/// Reads the remainder of a variable-length MFT record once its allocated
/// size is known, respecting the configured maximum record size (spec
/// §4.1 step d).
fn read_full_record<R: BlockDeviceReader>(
    device: &R,
    offset: u64,
    first_sector: &[u8],
    max_record_size: u64,
) -> Option<Vec<u8>> {
    use crate::domain::entities::RecordHeader;

    let header = RecordHeader::parse(first_sector)?;
    let allocated = header.allocated_size as u64;
    if allocated == 0 || allocated > max_record_size {
        return None;
    }

    let mut buf = first_sector.to_vec();
    if (allocated as usize) > buf.len() {
        let extra_len = allocated as usize - buf.len();
        let extra = device.read_at(offset + buf.len() as u64, extra_len).ok()?;
        buf.extend_from_slice(&extra);
    } else {
        buf.truncate(allocated as usize);
    }
    Some(buf)
}

fn recompute_bias(state: &mut ScanState, descriptor: &FileDescriptor, lba: u64) {
    if let Some(DataRun::Allocated { first_lcn, .. }) = descriptor.run_list.first() {
        let lcn_sectors = first_lcn * state.sectors_per_cluster;
        state.bias = lba as i64 - lcn_sectors as i64;
        log::debug!("recomputed LBA bias: {}", state.bias);
    }
}

fn resolve_descriptor_path<R: BlockDeviceReader>(device: &R, state: &mut ScanState, descriptor: &mut FileDescriptor) {
    let mft_record_size = state.mft_record_size;
    let sector_size = state.sector_size;
    let current_lba = descriptor.lba;
    let current_index = descriptor.reference.record_index();

    let resolved = services::resolve_path(descriptor.parent, &mut state.directory_cache, |reference| {
        fetch_record(device, reference, current_lba, current_index, mft_record_size, sector_size)
    });

    if resolved.resolution_failed {
        descriptor.mark_invalid(crate::domain::entities::InvalidReason::PathResolutionExhausted);
        descriptor.path = synthetic_path(descriptor.reference);
    } else {
        descriptor.path = resolved.path;
    }
    descriptor.in_recycle_bin = resolved.in_recycle_bin || descriptor.path.contains(RECYCLE_BIN_SEGMENT);
}

/// On-demand MFT seek for a directory-resolver cache miss (spec §4.3): the
/// candidate sector is derived from the current record's own LBA and index,
/// scaled by the record size, rather than opening a second file handle —
/// `BlockDeviceReader` implementations already support concurrent reads.
fn fetch_record<R: BlockDeviceReader>(
    device: &R,
    reference: Reference,
    current_lba: u64,
    current_index: u64,
    record_size: u64,
    sector_size: u64,
) -> Option<FetchedRecord> {
    let delta = reference.record_index() as i64 - current_index as i64;
    let sector_delta = (delta * record_size as i64) / sector_size as i64;
    let candidate_lba = (current_lba as i64 + sector_delta).max(0) as u64;
    let offset = candidate_lba * sector_size;

    let buf = device.read_at(offset, record_size as usize).ok()?;
    let mut parser = RecordParser::new();
    let descriptor = parser.parse(candidate_lba, &buf)?;
    if descriptor.reference.record_index() != reference.record_index() {
        return None;
    }

    Some(FetchedRecord {
        name: descriptor.name,
        parent: descriptor.parent,
        is_directory: descriptor.is_directory,
    })
}

fn extract_directory_children<R: BlockDeviceReader>(device: &R, descriptor: &mut FileDescriptor, state: &ScanState) {
    let cluster_bytes = (state.sectors_per_cluster * state.sector_size) as usize;
    let runs = descriptor.index_allocation_runs.clone();

    for run in runs {
        let DataRun::Allocated { first_lcn, last_lcn } = run else {
            continue;
        };
        for cluster in first_lcn..last_lcn {
            let device_offset = ((cluster * state.sectors_per_cluster) as i64 + state.bias).max(0) as u64 * state.sector_size;
            let Ok(block) = device.read_at(device_offset, cluster_bytes.max(INDX_BLOCK_HEADER_SIZE)) else {
                continue;
            };
            if block.len() < INDX_BLOCK_HEADER_SIZE || &block[0..4] != crate::domain::entities::index::INDX_SIGNATURE {
                continue;
            }
            let header_buf = &block[INDX_BLOCK_HEADER_SIZE..];
            let Some(header) = IndexHeader::parse(header_buf) else {
                continue;
            };
            for entry in crate::domain::entities::index::parse_entries(header_buf, &header) {
                if let Some(name) = entry.file_name {
                    descriptor.children.push(DirectoryEntry {
                        child: entry.child,
                        name: name.name,
                        allocated_size: name.allocated_size,
                        real_size: name.real_size,
                    });
                }
            }
        }
    }
}

fn emit_capped(observer: &Option<FileEventCallback>, shown_budget: &mut Option<u64>, event: FileEvent) {
    if matches!(shown_budget, Some(0)) {
        return;
    }
    if let Some(cb) = observer {
        cb(&event);
    }
    if let Some(budget) = shown_budget.as_mut() {
        *budget = budget.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_state_defaults_to_conservative_parameters() {
        let state = ScanState::new();
        assert_eq!(state.sector_size, DEFAULT_SECTOR_SIZE);
        assert_eq!(state.mft_record_size, DEFAULT_RECORD_SIZE);
        assert_eq!(state.bias, 0);
    }
}
