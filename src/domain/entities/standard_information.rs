//! `$STANDARD_INFORMATION` attribute value.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const STANDARD_INFORMATION_SIZE: usize = 36;

#[derive(Debug, Clone)]
pub struct StandardInformation {
    pub creation_time: u64,
    pub change_time: u64,
    pub write_time: u64,
    pub access_time: u64,
    pub dos_attributes: u32,
}

impl StandardInformation {
    pub fn parse(data: &[u8]) -> Option<StandardInformation> {
        if data.len() < STANDARD_INFORMATION_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        Some(StandardInformation {
            creation_time: cursor.read_u64::<LittleEndian>().ok()?,
            change_time: cursor.read_u64::<LittleEndian>().ok()?,
            write_time: cursor.read_u64::<LittleEndian>().ok()?,
            access_time: cursor.read_u64::<LittleEndian>().ok()?,
            dos_attributes: cursor.read_u32::<LittleEndian>().ok()?,
        })
    }
}
