//! MFT record header parsing: the fixed part of a "FILE" record.

use super::reference::Reference;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const RECORD_SIGNATURE: &[u8; 4] = b"FILE";
pub const END_OF_ATTRIBUTES: u32 = 0xFFFF_FFFF;

pub const FLAG_IN_USE: u16 = 1 << 0;
pub const FLAG_DIRECTORY: u16 = 1 << 1;

/// The fixed 48-byte MFT record header, common to every record regardless of
/// how many attributes follow.
#[derive(Debug, Clone)]
pub struct RecordHeader {
    pub update_seq_offset: u16,
    pub update_seq_size: u16,
    pub log_sequence_number: u64,
    pub sequence_number: u16,
    pub hard_link_count: u16,
    pub first_attr_offset: u16,
    pub flags: u16,
    pub used_size: u32,
    pub allocated_size: u32,
    pub base_record: Reference,
    pub next_attr_id: u16,
    pub record_index: u32,
}

impl RecordHeader {
    pub const SIZE: usize = 0x30;

    pub fn parse(data: &[u8]) -> Option<RecordHeader> {
        if data.len() < Self::SIZE || &data[0..4] != RECORD_SIGNATURE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        cursor.set_position(4);
        let update_seq_offset = cursor.read_u16::<LittleEndian>().ok()?;
        let update_seq_size = cursor.read_u16::<LittleEndian>().ok()?;
        let log_sequence_number = cursor.read_u64::<LittleEndian>().ok()?;
        let sequence_number = cursor.read_u16::<LittleEndian>().ok()?;
        let hard_link_count = cursor.read_u16::<LittleEndian>().ok()?;
        let first_attr_offset = cursor.read_u16::<LittleEndian>().ok()?;
        let flags = cursor.read_u16::<LittleEndian>().ok()?;
        let used_size = cursor.read_u32::<LittleEndian>().ok()?;
        let allocated_size = cursor.read_u32::<LittleEndian>().ok()?;
        let base_record = Reference::new(cursor.read_u64::<LittleEndian>().ok()?);
        let next_attr_id = cursor.read_u16::<LittleEndian>().ok()?;
        cursor.set_position(0x2C);
        let record_index = cursor.read_u32::<LittleEndian>().ok()?;

        Some(RecordHeader {
            update_seq_offset,
            update_seq_size,
            log_sequence_number,
            sequence_number,
            hard_link_count,
            first_attr_offset,
            flags,
            used_size,
            allocated_size,
            base_record,
            next_attr_id,
            record_index,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.flags & FLAG_IN_USE != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    pub fn reference(&self) -> Reference {
        Reference::from_parts(self.record_index as u64, self.sequence_number)
    }

    /// Validates the size invariants and the trailing end-of-attributes
    /// sentinel against the enclosing record buffer (spec §3 "Invariants":
    /// `used_size <= allocated_size <= record size`, sentinel `0xFFFFFFFF`
    /// immediately before the pad region).
    pub fn is_structurally_valid(&self, record_buf: &[u8]) -> bool {
        if self.used_size as usize > self.allocated_size as usize {
            return false;
        }
        if self.allocated_size as usize > record_buf.len() {
            return false;
        }
        self.has_end_sentinel(record_buf)
    }

    fn has_end_sentinel(&self, record_buf: &[u8]) -> bool {
        let used = self.used_size as usize;
        if used < 4 || used > record_buf.len() {
            return false;
        }
        record_buf[used - 4..used] == END_OF_ATTRIBUTES.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record_bytes(used: u32, alloc: u32) -> Vec<u8> {
        let mut buf = vec![0u8; alloc as usize];
        buf[0..4].copy_from_slice(RECORD_SIGNATURE);
        buf[0x14..0x16].copy_from_slice(&0x38u16.to_le_bytes());
        buf[0x16..0x18].copy_from_slice(&FLAG_IN_USE.to_le_bytes());
        buf[0x18..0x1C].copy_from_slice(&used.to_le_bytes());
        buf[0x1C..0x20].copy_from_slice(&alloc.to_le_bytes());
        buf[0x2C..0x30].copy_from_slice(&5u32.to_le_bytes());
        if used as usize >= 4 {
            let end = used as usize;
            buf[end - 4..end].copy_from_slice(&END_OF_ATTRIBUTES.to_le_bytes());
        }
        buf
    }

    #[test]
    fn rejects_missing_signature() {
        let buf = vec![0u8; 64];
        assert!(RecordHeader::parse(&buf).is_none());
    }

    #[test]
    fn parses_well_formed_header() {
        let buf = sample_record_bytes(200, 1024);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(header.is_in_use());
        assert!(!header.is_directory());
        assert_eq!(header.record_index, 5);
        assert!(header.is_structurally_valid(&buf));
    }

    #[test]
    fn rejects_used_greater_than_allocated() {
        let buf = sample_record_bytes(2000, 1024);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(!header.is_structurally_valid(&buf));
    }

    #[test]
    fn rejects_missing_end_sentinel() {
        let mut buf = sample_record_bytes(200, 1024);
        buf[196..200].copy_from_slice(&[0, 0, 0, 0]);
        let header = RecordHeader::parse(&buf).unwrap();
        assert!(!header.is_structurally_valid(&buf));
    }
}
