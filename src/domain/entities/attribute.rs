//! Attribute common header and resident/non-resident discriminator views.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const ATTR_HEADER_SIZE: usize = 16;
pub const RESIDENT_HEADER_SIZE: usize = 8;
pub const NON_RESIDENT_HEADER_SIZE: usize = 48;
pub const END_OF_ATTRIBUTES_TYPE: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    StandardInformation,
    AttributeList,
    FileName,
    Data,
    IndexRoot,
    IndexAllocation,
    Other(u32),
}

impl From<u32> for AttrType {
    fn from(raw: u32) -> Self {
        match raw {
            0x10 => AttrType::StandardInformation,
            0x20 => AttrType::AttributeList,
            0x30 => AttrType::FileName,
            0x80 => AttrType::Data,
            0x90 => AttrType::IndexRoot,
            0xA0 => AttrType::IndexAllocation,
            other => AttrType::Other(other),
        }
    }
}

/// The 16-byte common header present at the start of every attribute.
#[derive(Debug, Clone)]
pub struct AttrHeader {
    pub attr_type: AttrType,
    pub size_to_next: u16,
    pub non_resident: bool,
    pub name_length: u8,
    pub name_offset: u16,
    pub flags: u16,
    pub instance_id: u16,
}

impl AttrHeader {
    pub fn parse(data: &[u8]) -> Option<AttrHeader> {
        if data.len() < ATTR_HEADER_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        let raw_type = cursor.read_u32::<LittleEndian>().ok()?;
        let size_to_next = cursor.read_u16::<LittleEndian>().ok()?;
        let _unknown = cursor.read_u16::<LittleEndian>().ok()?;
        let non_resident = cursor.read_u8().ok()? != 0;
        let name_length = cursor.read_u8().ok()?;
        let name_offset = cursor.read_u16::<LittleEndian>().ok()?;
        let flags = cursor.read_u16::<LittleEndian>().ok()?;
        let instance_id = cursor.read_u16::<LittleEndian>().ok()?;

        Some(AttrHeader {
            attr_type: AttrType::from(raw_type),
            size_to_next,
            non_resident,
            name_length,
            name_offset,
            flags,
            instance_id,
        })
    }

    pub fn is_end_of_attributes(data: &[u8]) -> bool {
        data.len() >= 4
            && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == END_OF_ATTRIBUTES_TYPE
    }

    /// Whether this attribute carries a stream name (an alternate data
    /// stream, when the attribute type is `$DATA`).
    pub fn has_name(&self) -> bool {
        self.name_length > 0
    }
}

/// Resident payload header: an in-record byte range.
#[derive(Debug, Clone)]
pub struct ResidentHeader {
    pub value_length: u32,
    pub value_offset: u16,
    pub indexed: bool,
}

impl ResidentHeader {
    pub fn parse(data: &[u8]) -> Option<ResidentHeader> {
        if data.len() < RESIDENT_HEADER_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        let value_length = cursor.read_u32::<LittleEndian>().ok()?;
        let value_offset = cursor.read_u16::<LittleEndian>().ok()?;
        let indexed = cursor.read_u8().ok()? != 0;
        Some(ResidentHeader {
            value_length,
            value_offset,
            indexed,
        })
    }
}

/// Non-resident payload header: declared sizes and the run-list location.
#[derive(Debug, Clone)]
pub struct NonResidentHeader {
    pub first_vcn: u64,
    pub last_vcn: u64,
    pub run_list_offset: u16,
    pub compression_unit: u16,
    pub allocated_size: u64,
    pub real_size: u64,
    pub initialized_size: u64,
}

const LOW_48_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

impl NonResidentHeader {
    pub fn parse(data: &[u8]) -> Option<NonResidentHeader> {
        if data.len() < NON_RESIDENT_HEADER_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        let first_vcn = cursor.read_u64::<LittleEndian>().ok()?;
        let last_vcn = cursor.read_u64::<LittleEndian>().ok()?;
        let run_list_offset = cursor.read_u16::<LittleEndian>().ok()?;
        let compression_unit = cursor.read_u16::<LittleEndian>().ok()?;
        cursor.set_position(cursor.position() + 4); // padding
        let allocated_size = cursor.read_u64::<LittleEndian>().ok()? & LOW_48_MASK;
        let real_size = cursor.read_u64::<LittleEndian>().ok()? & LOW_48_MASK;
        let initialized_size = cursor.read_u64::<LittleEndian>().ok()? & LOW_48_MASK;

        Some(NonResidentHeader {
            first_vcn,
            last_vcn,
            run_list_offset,
            compression_unit,
            allocated_size,
            real_size,
            initialized_size,
        })
    }

    pub fn cluster_count(&self) -> u64 {
        self.last_vcn.saturating_sub(self.first_vcn) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_attribute_types() {
        assert_eq!(AttrType::from(0x10), AttrType::StandardInformation);
        assert_eq!(AttrType::from(0x30), AttrType::FileName);
        assert_eq!(AttrType::from(0x80), AttrType::Data);
        assert_eq!(AttrType::from(0x90), AttrType::IndexRoot);
        assert_eq!(AttrType::from(0xA0), AttrType::IndexAllocation);
        assert_eq!(AttrType::from(0x77), AttrType::Other(0x77));
    }

    #[test]
    fn detects_end_sentinel() {
        let sentinel = END_OF_ATTRIBUTES_TYPE.to_le_bytes();
        assert!(AttrHeader::is_end_of_attributes(&sentinel));
        assert!(!AttrHeader::is_end_of_attributes(&[0x10, 0, 0, 0]));
    }

    #[test]
    fn non_resident_sizes_are_masked_to_48_bits() {
        let mut buf = vec![0u8; NON_RESIDENT_HEADER_SIZE];
        buf[24..32].copy_from_slice(&0xFFFF_0000_0000_1000u64.to_le_bytes());
        let header = NonResidentHeader::parse(&buf).unwrap();
        assert_eq!(header.allocated_size, 0x1000);
    }
}
