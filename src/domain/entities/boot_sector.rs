//! NTFS boot sector parsing.
//!
//! Fixed 512-byte structure recognized by jump bytes, OEM id and end tag.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

pub const BOOT_SECTOR_SIZE: usize = 512;
const JUMP_BYTES: [u8; 3] = [0xEB, 0x52, 0x90];
const OEM_ID: &[u8; 8] = b"NTFS    ";
const END_TAG: u16 = 0xAA55;

/// Fixed-size view of an NTFS boot sector, parsed into owned fields.
#[derive(Debug, Clone)]
pub struct BootSector {
    pub jump_code: [u8; 3],
    pub oem_id: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub media_id: u8,
    pub sectors_per_track: u16,
    pub heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors: u64,
    pub mft_lcn: u64,
    pub mft_mirror_lcn: u64,
    /// Raw signed encoding: positive = clusters per record, negative = -log2(bytes per record).
    pub clusters_per_mft_record_raw: i32,
    pub volume_serial: u16,
    pub end_tag: u16,
}

impl BootSector {
    pub fn parse(data: &[u8]) -> Option<BootSector> {
        if data.len() < BOOT_SECTOR_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);

        let mut jump_code = [0u8; 3];
        cursor.read_exact(&mut jump_code).ok()?;

        let mut oem_id = [0u8; 8];
        cursor.read_exact(&mut oem_id).ok()?;

        let bytes_per_sector = cursor.read_u16::<LittleEndian>().ok()?;
        let sectors_per_cluster = cursor.read_u8().ok()?;

        cursor.set_position(0x15);
        let media_id = cursor.read_u8().ok()?;

        cursor.set_position(0x18);
        let sectors_per_track = cursor.read_u16::<LittleEndian>().ok()?;
        let heads = cursor.read_u16::<LittleEndian>().ok()?;
        let hidden_sectors = cursor.read_u32::<LittleEndian>().ok()?;

        cursor.set_position(0x28);
        let total_sectors = cursor.read_u64::<LittleEndian>().ok()?;
        let mft_lcn = cursor.read_u64::<LittleEndian>().ok()?;
        let mft_mirror_lcn = cursor.read_u64::<LittleEndian>().ok()?;

        cursor.set_position(0x40);
        let clusters_per_mft_record_raw = cursor.read_i32::<LittleEndian>().ok()?;

        cursor.set_position(0x46);
        let volume_serial = cursor.read_u16::<LittleEndian>().ok()?;

        cursor.set_position(0x1FE);
        let end_tag = cursor.read_u16::<LittleEndian>().ok()?;

        let boot = BootSector {
            jump_code,
            oem_id,
            bytes_per_sector,
            sectors_per_cluster,
            media_id,
            sectors_per_track,
            heads,
            hidden_sectors,
            total_sectors,
            mft_lcn,
            mft_mirror_lcn,
            clusters_per_mft_record_raw,
            volume_serial,
            end_tag,
        };

        if boot.is_valid() { Some(boot) } else { None }
    }

    pub fn is_valid(&self) -> bool {
        self.jump_code == JUMP_BYTES
            && &self.oem_id == OEM_ID
            && self.end_tag == END_TAG
            && matches!(self.bytes_per_sector, 512 | 1024 | 2048 | 4096)
    }

    /// Size in bytes of one MFT record, handling both encodings.
    pub fn mft_record_size(&self) -> u32 {
        let raw = self.clusters_per_mft_record_raw;
        if raw >= 0 {
            raw as u32 * self.cluster_size()
        } else {
            1u32 << (-raw)
        }
    }

    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    pub fn mft_offset_bytes(&self) -> u64 {
        self.mft_lcn * self.cluster_size() as u64
    }

    pub fn volume_size_bytes(&self) -> u64 {
        self.total_sectors * self.bytes_per_sector as u64
    }
}
