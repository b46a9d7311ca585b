//! Memory-mapped block device implementation.
//!
//! An alternative to [`LinuxBlockDevice`](super::LinuxBlockDevice) for
//! workloads where the whole image comfortably fits the address space: the
//! linear scan's sequential reads become page faults the kernel can
//! read-ahead on its own, and concurrent `read_at` calls from the directory
//! resolver's on-demand seeks need no lock.

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use memmap2::Mmap;
use std::fs::OpenOptions;
use std::path::Path;

pub struct MmapBlockDevice {
    mmap: Mmap,
    path: String,
    sector_size: u32,
}

impl MmapBlockDevice {
    fn detect_sector_size(path: &Path) -> u32 {
        if path.starts_with("/dev/") {
            4096
        } else {
            512
        }
    }
}

impl BlockDeviceReader for MmapBlockDevice {
    fn open(path: &str) -> Result<Self, BlockDeviceError> {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            return Err(BlockDeviceError::DeviceNotFound);
        }

        let file = OpenOptions::new().read(true).open(path_obj).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                BlockDeviceError::PermissionDenied
            } else {
                BlockDeviceError::IoError(e)
            }
        })?;

        // Safety is the caller's: the file must not be truncated or written
        // to concurrently with the mapping's lifetime. Recovery always opens
        // its source read-only, so this holds in every intended use.
        let mmap = unsafe { Mmap::map(&file) }.map_err(BlockDeviceError::IoError)?;

        Ok(Self {
            mmap,
            path: path.to_string(),
            sector_size: Self::detect_sector_size(path_obj),
        })
    }

    fn device_info(&self) -> Result<DeviceInfo, BlockDeviceError> {
        Ok(DeviceInfo {
            path: self.path.clone(),
            size: self.mmap.len() as u64,
            sector_size: self.sector_size,
            read_only: true,
        })
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, BlockDeviceError> {
        let size = self.mmap.len() as u64;
        if offset >= size {
            return Err(BlockDeviceError::InvalidOffset {
                offset,
                device_size: size,
            });
        }
        let start = offset as usize;
        let available = (size - offset) as usize;
        let end = start + len.min(available);
        Ok(self.mmap[start..end].to_vec())
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.mmap.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn opens_and_reads_image_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xAAu8; 1024]).unwrap();
        let device = MmapBlockDevice::open(file.path().to_str().unwrap()).unwrap();
        assert_eq!(device.size(), 1024);
        let data = device.read_at(0, 512).unwrap();
        assert_eq!(data.len(), 512);
        assert!(data.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn missing_path_is_device_not_found() {
        let err = MmapBlockDevice::open("/nonexistent/path/for/test").unwrap_err();
        assert!(matches!(err, BlockDeviceError::DeviceNotFound));
    }

    #[test]
    fn offset_past_end_is_invalid_offset() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        let device = MmapBlockDevice::open(file.path().to_str().unwrap()).unwrap();
        let err = device.read_at(1000, 16).unwrap_err();
        assert!(matches!(err, BlockDeviceError::InvalidOffset { .. }));
    }
}
