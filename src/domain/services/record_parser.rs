//! Walks an MFT record's attribute list and materializes a
//! [`FileDescriptor`].

use crate::domain::entities::attribute::{
    AttrHeader, AttrType, NonResidentHeader, ResidentHeader, ATTR_HEADER_SIZE,
    NON_RESIDENT_HEADER_SIZE, RESIDENT_HEADER_SIZE,
};
use crate::domain::entities::index::{self, IndexHeader};
use crate::domain::entities::mft_record::RecordHeader;
use crate::domain::entities::{
    FileDescriptor, FileName, InvalidReason, Lba, Namespace, StandardInformation,
};
use crate::domain::services::data_run_decoder::{self, RunWatermarks};
use log::{debug, warn};

pub struct RecordParser {
    pub watermarks: RunWatermarks,
}

impl RecordParser {
    pub fn new() -> RecordParser {
        RecordParser {
            watermarks: RunWatermarks::default(),
        }
    }

    /// Parses one MFT record buffer into a descriptor. Returns `None` when
    /// the buffer is not a usable record (bad signature, or the invariant
    /// checks in [`RecordHeader::is_structurally_valid`] fail).
    pub fn parse(&mut self, lba: Lba, record_buf: &[u8]) -> Option<FileDescriptor> {
        let header = RecordHeader::parse(record_buf)?;
        if !header.is_structurally_valid(record_buf) {
            warn!(
                "record {} at lba {} failed structural invariants, skipping",
                header.record_index, lba
            );
            return None;
        }

        let mut descriptor = FileDescriptor::new(lba, header.reference());
        descriptor.in_use = header.is_in_use();
        descriptor.is_directory = header.is_directory();

        let mut current_namespace: Option<Namespace> = None;
        let max_steps = (header.used_size as usize / 24).max(1);
        let mut offset = header.first_attr_offset as usize;

        for _ in 0..max_steps {
            if offset + 4 > record_buf.len() {
                break;
            }
            if AttrHeader::is_end_of_attributes(&record_buf[offset..]) {
                break;
            }
            let Some(attr_header) = AttrHeader::parse(&record_buf[offset..]) else {
                break;
            };
            let attr_end = offset + attr_header.size_to_next as usize;
            if attr_header.size_to_next == 0 || attr_end > record_buf.len() {
                debug!(
                    "record {}: attribute walk diverged at offset {offset}, stopping",
                    header.record_index
                );
                break;
            }

            self.apply_attribute(&mut descriptor, &mut current_namespace, &attr_header, &record_buf[offset..attr_end]);
            offset = attr_end;
        }

        Some(descriptor)
    }

    fn apply_attribute(
        &mut self,
        descriptor: &mut FileDescriptor,
        current_namespace: &mut Option<Namespace>,
        attr_header: &AttrHeader,
        attr_buf: &[u8],
    ) {
        let payload = &attr_buf[ATTR_HEADER_SIZE.min(attr_buf.len())..];

        match attr_header.attr_type {
            AttrType::StandardInformation => Self::apply_standard_information(descriptor, payload),
            AttrType::FileName => Self::apply_file_name(descriptor, current_namespace, payload),
            AttrType::Data if attr_header.has_name() => {
                debug!("record {}: alternate data stream, not extracted", descriptor.reference);
            }
            AttrType::Data => self.apply_data(descriptor, attr_header, payload),
            AttrType::IndexRoot if descriptor.is_directory => {
                Self::apply_index_root(descriptor, payload)
            }
            AttrType::IndexAllocation if descriptor.is_directory => {
                Self::apply_index_allocation(descriptor, attr_header, payload)
            }
            _ => {}
        }
    }

    fn apply_standard_information(descriptor: &mut FileDescriptor, payload: &[u8]) {
        let Some(value) = resident_value(payload) else {
            return;
        };
        if let Some(info) = StandardInformation::parse(value) {
            // Grounded in the original's StandardInfo::parse: change_time
            // feeds the modification timestamp, access_time feeds atime.
            descriptor.modification_time = info.change_time;
            descriptor.access_time = info.access_time;
            descriptor.creation_time = info.creation_time;
        }
    }

    fn apply_file_name(
        descriptor: &mut FileDescriptor,
        current_namespace: &mut Option<Namespace>,
        payload: &[u8],
    ) {
        let Some(value) = resident_value(payload) else {
            return;
        };
        let Some(file_name) = FileName::parse(value) else {
            return;
        };
        let should_replace = match *current_namespace {
            None => true,
            Some(current) => file_name.namespace.is_preferred_over(current),
        };
        if should_replace {
            descriptor.parent = file_name.parent;
            descriptor.name = file_name.name.clone();
            descriptor.extension = file_name.extension();
            if descriptor.creation_time == 0 {
                descriptor.creation_time = file_name.creation_time;
            }
            *current_namespace = Some(file_name.namespace);
        }
    }

    fn apply_data(&mut self, descriptor: &mut FileDescriptor, attr_header: &AttrHeader, payload: &[u8]) {
        if attr_header.non_resident {
            let Some(non_resident) = NonResidentHeader::parse(payload) else {
                return;
            };
            descriptor.declared_size = non_resident.real_size;
            descriptor.allocated_size = non_resident.allocated_size;

            let run_list_start = non_resident.run_list_offset as usize;
            if run_list_start >= NON_RESIDENT_HEADER_SIZE && run_list_start < payload.len() {
                match data_run_decoder::decode(&payload[run_list_start..], &mut self.watermarks) {
                    Ok(runs) => descriptor.run_list = runs,
                    Err((partial, err)) => {
                        warn!("record {:?}: run list decode stopped early ({err:?})", descriptor.reference);
                        descriptor.run_list = partial;
                        descriptor.mark_error(InvalidReason::RunListFieldTooWide);
                    }
                }
            }
        } else if let Some(value) = resident_value(payload) {
            descriptor.content_signature = leading_word(value);
            descriptor.declared_size = value.len() as u64;
            descriptor.allocated_size = value.len() as u64;
            descriptor.inline_content = Some(value.to_vec());
        }
    }

    fn apply_index_root(descriptor: &mut FileDescriptor, payload: &[u8]) {
        const INDEX_ROOT_FIXED_SIZE: usize = 16;
        let Some(value) = resident_value(payload) else {
            return;
        };
        if value.len() < INDEX_ROOT_FIXED_SIZE {
            return;
        }
        let header_buf = &value[INDEX_ROOT_FIXED_SIZE..];
        let Some(header) = IndexHeader::parse(header_buf) else {
            return;
        };
        for entry in index::parse_entries(header_buf, &header) {
            if let Some(name) = entry.file_name {
                descriptor.children.push(crate::domain::entities::DirectoryEntry {
                    child: entry.child,
                    name: name.name,
                    allocated_size: name.allocated_size,
                    real_size: name.real_size,
                });
            }
        }
    }

    fn apply_index_allocation(
        descriptor: &mut FileDescriptor,
        attr_header: &AttrHeader,
        payload: &[u8],
    ) {
        if !attr_header.non_resident {
            return;
        }
        let Some(non_resident) = NonResidentHeader::parse(payload) else {
            return;
        };
        let run_list_start = non_resident.run_list_offset as usize;
        if run_list_start >= NON_RESIDENT_HEADER_SIZE && run_list_start < payload.len() {
            let mut watermarks = RunWatermarks::default();
            if let Ok(runs) = data_run_decoder::decode(&payload[run_list_start..], &mut watermarks) {
                descriptor.index_allocation_runs = runs;
            }
        }
    }
}

/// Resolves a resident attribute's value slice from its resident header's
/// `value_offset`/`value_length`. `payload` starts at the resident header,
/// i.e. immediately after the 16-byte common attribute header — the same
/// slice every resident value parser (`$STANDARD_INFORMATION`, `$FILE_NAME`,
/// `$DATA`, `$INDEX_ROOT`) is handed, so all of them must go through this
/// rather than treating `payload` itself as the value.
fn resident_value(payload: &[u8]) -> Option<&[u8]> {
    let resident = ResidentHeader::parse(payload)?;
    let start = resident.value_offset as usize;
    let end = start.checked_add(resident.value_length as usize)?;
    if start >= RESIDENT_HEADER_SIZE.min(payload.len()) && end <= payload.len() {
        Some(&payload[start..end])
    } else {
        None
    }
}

/// First 8 bytes of `data` read as a little-endian word, or `None` if
/// shorter — the same encoding `ContentSignature` compares against.
fn leading_word(data: &[u8]) -> Option<u64> {
    if data.len() < 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[..8]);
    Some(u64::from_le_bytes(buf))
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::mft_record::{FLAG_DIRECTORY, FLAG_IN_USE, RECORD_SIGNATURE};

    fn build_record_with_filename(name: &str) -> Vec<u8> {
        let mut buf = vec![0u8; 1024];
        buf[0..4].copy_from_slice(RECORD_SIGNATURE);
        buf[0x14..0x16].copy_from_slice(&0x38u16.to_le_bytes()); // first attr offset
        buf[0x16..0x18].copy_from_slice(&(FLAG_IN_USE | FLAG_DIRECTORY).to_le_bytes());
        buf[0x2C..0x30].copy_from_slice(&5u32.to_le_bytes());

        let mut offset = 0x38usize;

        // $FILE_NAME attribute, resident.
        let name_units: Vec<u16> = name.encode_utf16().collect();
        let fname_payload_len = 66 + name_units.len() * 2;
        let attr_total = 16 + 8 + fname_payload_len;
        buf[offset..offset + 4].copy_from_slice(&0x30u32.to_le_bytes());
        buf[offset + 4..offset + 6].copy_from_slice(&(attr_total as u16).to_le_bytes());
        // non_resident = 0 (resident)
        let resident_header_offset = offset + 16;
        buf[resident_header_offset..resident_header_offset + 4]
            .copy_from_slice(&(fname_payload_len as u32).to_le_bytes());
        buf[resident_header_offset + 4..resident_header_offset + 6].copy_from_slice(&8u16.to_le_bytes());

        let value_start = resident_header_offset + 8;
        buf[value_start..value_start + 8].copy_from_slice(&5u64.to_le_bytes()); // parent = root
        buf[value_start + 64] = name_units.len() as u8;
        buf[value_start + 65] = 1; // Win32 namespace
        let mut pos = value_start + 66;
        for u in &name_units {
            buf[pos..pos + 2].copy_from_slice(&u.to_le_bytes());
            pos += 2;
        }

        offset += attr_total;

        buf[offset..offset + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        let used_size = (offset + 4) as u32;
        buf[0x18..0x1C].copy_from_slice(&used_size.to_le_bytes());
        buf[0x1C..0x20].copy_from_slice(&1024u32.to_le_bytes());

        buf
    }

    #[test]
    fn parses_directory_with_filename() {
        let buf = build_record_with_filename("Pictures");
        let mut parser = RecordParser::new();
        let descriptor = parser.parse(0x1234, &buf).expect("valid record");
        assert_eq!(descriptor.name, "Pictures");
        assert!(descriptor.is_directory);
        assert!(descriptor.in_use);
        assert_eq!(descriptor.parent, crate::domain::entities::Reference::ROOT);
    }

    #[test]
    fn rejects_non_file_signature() {
        let buf = vec![0u8; 1024];
        let mut parser = RecordParser::new();
        assert!(parser.parse(0, &buf).is_none());
    }
}
