//! Classifies a freshly-read sector by its leading magic bytes (spec §4.1
//! step b): boot sector, INDX block, FILE record, or opaque.

use crate::domain::entities::index::INDX_SIGNATURE;
use crate::domain::entities::mft_record::RECORD_SIGNATURE;

const NTFS_OEM_ID: &[u8; 8] = b"NTFS    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    BootSector,
    IndexBlock,
    FileRecord,
    Other,
}

/// Classifies one sector-sized (or larger) buffer. Boot-sector recognition
/// checks the OEM id at its fixed offset rather than the jump bytes alone,
/// since jump bytes are a weaker signal shared with other boot code.
pub fn classify(data: &[u8]) -> ChunkKind {
    if data.len() >= 11 && &data[3..11] == NTFS_OEM_ID {
        return ChunkKind::BootSector;
    }
    if data.len() >= 4 && &data[0..4] == RECORD_SIGNATURE {
        return ChunkKind::FileRecord;
    }
    if data.len() >= 4 && &data[0..4] == INDX_SIGNATURE {
        return ChunkKind::IndexBlock;
    }
    ChunkKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_boot_sector() {
        let mut buf = vec![0u8; 512];
        buf[0..3].copy_from_slice(&[0xEB, 0x52, 0x90]);
        buf[3..11].copy_from_slice(NTFS_OEM_ID);
        assert_eq!(classify(&buf), ChunkKind::BootSector);
    }

    #[test]
    fn recognizes_file_record() {
        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(RECORD_SIGNATURE);
        assert_eq!(classify(&buf), ChunkKind::FileRecord);
    }

    #[test]
    fn recognizes_indx_block() {
        let mut buf = vec![0u8; 64];
        buf[0..4].copy_from_slice(INDX_SIGNATURE);
        assert_eq!(classify(&buf), ChunkKind::IndexBlock);
    }

    #[test]
    fn falls_back_to_other() {
        let buf = vec![0u8; 64];
        assert_eq!(classify(&buf), ChunkKind::Other);
    }
}
