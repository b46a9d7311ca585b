//! Index root / index allocation B-tree views: the directory entry list
//! format shared by `$INDEX_ROOT` and INDX blocks.

use super::file_name::FileName;
use super::reference::Reference;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const INDEX_HEADER_SIZE: usize = 16;
pub const INDX_BLOCK_SIZE: usize = 4096;
pub const INDX_SIGNATURE: &[u8; 4] = b"INDX";

const NODE_FIXED_SIZE: usize = 16;
const FLAG_SUB_NODE: u16 = 1 << 0;
const FLAG_LAST_ENTRY: u16 = 1 << 1;

/// The 16-byte header preceding a node's sequence of index entries, shared
/// by `$INDEX_ROOT`'s resident form and each INDX block.
#[derive(Debug, Clone)]
pub struct IndexHeader {
    pub entries_offset: u32,
    pub entries_size: u32,
    pub allocated_size: u32,
    pub flags: u32,
}

impl IndexHeader {
    pub fn parse(data: &[u8]) -> Option<IndexHeader> {
        if data.len() < INDEX_HEADER_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        Some(IndexHeader {
            entries_offset: cursor.read_u32::<LittleEndian>().ok()?,
            entries_size: cursor.read_u32::<LittleEndian>().ok()?,
            allocated_size: cursor.read_u32::<LittleEndian>().ok()?,
            flags: cursor.read_u32::<LittleEndian>().ok()?,
        })
    }

    pub fn is_large(&self) -> bool {
        self.flags & 1 != 0
    }
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub child: Reference,
    pub file_name: Option<FileName>,
    pub has_sub_node: bool,
    pub is_last: bool,
}

/// Walks the node entries in `data` (starting at the header's declared
/// entries offset) bounded by `entries_size`. Corrupted or truncated entries
/// stop the walk early rather than panicking.
pub fn parse_entries(data: &[u8], header: &IndexHeader) -> Vec<IndexEntry> {
    let mut entries = Vec::new();
    let start = header.entries_offset as usize;
    let bound = header.entries_size as usize;
    if start > bound || bound > data.len() {
        return entries;
    }

    let mut pos = start;
    while pos + NODE_FIXED_SIZE <= start + bound && pos + NODE_FIXED_SIZE <= data.len() {
        let slice = &data[pos..];
        let child_raw = u64::from_le_bytes(slice[0..8].try_into().unwrap());
        let entry_length = u16::from_le_bytes([slice[8], slice[9]]) as usize;
        let key_length = u16::from_le_bytes([slice[10], slice[11]]) as usize;
        let flags = u16::from_le_bytes([slice[12], slice[13]]);

        if entry_length < NODE_FIXED_SIZE || pos + entry_length > data.len() {
            break;
        }

        let is_last = flags & FLAG_LAST_ENTRY != 0;
        let has_sub_node = flags & FLAG_SUB_NODE != 0;

        let file_name = if !is_last && key_length > 0 {
            let key_start = pos + NODE_FIXED_SIZE;
            let key_end = key_start + key_length;
            if key_end <= data.len() {
                FileName::parse(&data[key_start..key_end])
            } else {
                None
            }
        } else {
            None
        };

        entries.push(IndexEntry {
            child: Reference::new(child_raw),
            file_name,
            has_sub_node,
            is_last,
        });

        if is_last {
            break;
        }
        pos += entry_length;
    }

    entries
}
