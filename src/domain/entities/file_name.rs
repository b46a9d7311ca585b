//! `$FILE_NAME` attribute value: parent reference, timestamps and the name.

use super::reference::Reference;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const FILE_NAME_FIXED_SIZE: usize = 66;

/// NTFS file name namespace. Lower numeric value is preferred when a record
/// carries more than one `$FILE_NAME` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Namespace {
    Posix = 0,
    Win32 = 1,
    Dos = 2,
    Win32AndDos = 3,
}

impl Namespace {
    pub fn from_u8(raw: u8) -> Namespace {
        match raw {
            0 => Namespace::Posix,
            1 => Namespace::Win32,
            3 => Namespace::Win32AndDos,
            _ => Namespace::Dos,
        }
    }

    /// The preferred-name check from the attribute-effects table: prefer
    /// namespace < 2 (Win32 or POSIX) over the DOS short name.
    pub fn is_preferred_over(self, current: Namespace) -> bool {
        (self as u8) < 2 && (current as u8) >= 2
    }
}

#[derive(Debug, Clone)]
pub struct FileName {
    pub parent: Reference,
    pub creation_time: u64,
    pub modification_time: u64,
    pub mft_modification_time: u64,
    pub access_time: u64,
    pub allocated_size: u64,
    pub real_size: u64,
    pub flags: u32,
    pub reparse_tag: u32,
    pub namespace: Namespace,
    pub name: String,
}

impl FileName {
    pub fn parse(data: &[u8]) -> Option<FileName> {
        if data.len() < FILE_NAME_FIXED_SIZE {
            return None;
        }
        let mut cursor = Cursor::new(data);
        let parent = Reference::new(cursor.read_u64::<LittleEndian>().ok()?);
        let creation_time = cursor.read_u64::<LittleEndian>().ok()?;
        let modification_time = cursor.read_u64::<LittleEndian>().ok()?;
        let mft_modification_time = cursor.read_u64::<LittleEndian>().ok()?;
        let access_time = cursor.read_u64::<LittleEndian>().ok()?;
        let allocated_size = cursor.read_u64::<LittleEndian>().ok()?;
        let real_size = cursor.read_u64::<LittleEndian>().ok()?;
        let flags = cursor.read_u32::<LittleEndian>().ok()?;
        let reparse_tag = cursor.read_u32::<LittleEndian>().ok()?;
        let name_length_units = cursor.read_u8().ok()? as usize;
        let namespace = Namespace::from_u8(cursor.read_u8().ok()?);

        let name_bytes_start = FILE_NAME_FIXED_SIZE;
        let name_bytes_end = name_bytes_start + name_length_units * 2;
        if data.len() < name_bytes_end {
            return None;
        }
        let name = decode_utf16_name(&data[name_bytes_start..name_bytes_end]);

        Some(FileName {
            parent,
            creation_time,
            modification_time,
            mft_modification_time,
            access_time,
            allocated_size,
            real_size,
            flags,
            reparse_tag,
            namespace,
            name,
        })
    }

    /// Lowercased token after the last `.`, or empty when the name has none.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        }
    }
}

/// Decodes a little-endian UTF-16 name, replacing unprintable or invalid
/// code units with `_` rather than failing (mirrors the original's
/// per-character printable-only name construction).
fn decode_utf16_name(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    char::decode_utf16(units)
        .map(|r| match r {
            Ok(c) if !c.is_control() => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_bytes(name: &str) -> Vec<u8> {
        let mut buf = vec![0u8; FILE_NAME_FIXED_SIZE];
        buf[0..8].copy_from_slice(&Reference::ROOT.raw().to_le_bytes());
        let units: Vec<u16> = name.encode_utf16().collect();
        buf[64] = units.len() as u8;
        buf[65] = Namespace::Win32 as u8;
        for u in units {
            buf.extend_from_slice(&u.to_le_bytes());
        }
        buf
    }

    #[test]
    fn parses_name_and_extension() {
        let buf = name_bytes("report.PDF");
        let fname = FileName::parse(&buf).unwrap();
        assert_eq!(fname.name, "report.PDF");
        assert_eq!(fname.extension(), "pdf");
        assert_eq!(fname.parent, Reference::ROOT);
    }

    #[test]
    fn name_without_dot_has_empty_extension() {
        let buf = name_bytes("README");
        let fname = FileName::parse(&buf).unwrap();
        assert_eq!(fname.extension(), "");
    }

    #[test]
    fn namespace_preference_prefers_win32_over_dos() {
        assert!(Namespace::Win32.is_preferred_over(Namespace::Dos));
        assert!(!Namespace::Dos.is_preferred_over(Namespace::Win32));
        assert!(!Namespace::Win32.is_preferred_over(Namespace::Posix));
    }
}
