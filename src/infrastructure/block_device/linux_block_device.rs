//! Linux block device implementation.
//!
//! Provides raw read access to block devices and disk images on Linux. Uses
//! standard file I/O for broad compatibility; a real block device's sector
//! size would normally come from `BLKSSZGET`, but since we only open
//! read-only and never issue ioctls, we fall back to a fixed heuristic.

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

pub struct LinuxBlockDevice {
    file: Mutex<File>,
    path: String,
    size: u64,
    sector_size: u32,
}

impl LinuxBlockDevice {
    /// For regular image files, 512-byte logical sectors are the common
    /// case. For `/dev/` block devices, 4096 matches modern Advanced Format
    /// disks; a production build would confirm via `BLKSSZGET`.
    fn detect_sector_size(path: &Path) -> u32 {
        if path.starts_with("/dev/") {
            4096
        } else {
            512
        }
    }

    fn get_size(file: &File, path: &Path) -> Result<u64, BlockDeviceError> {
        let metadata = file.metadata()?;
        if metadata.is_file() {
            return Ok(metadata.len());
        }

        let mut f = file.try_clone()?;
        let size = f.seek(SeekFrom::End(0))?;
        f.seek(SeekFrom::Start(0))?;
        if size == 0 {
            Err(BlockDeviceError::Other(format!(
                "could not determine size of {}",
                path.display()
            )))
        } else {
            Ok(size)
        }
    }
}

impl BlockDeviceReader for LinuxBlockDevice {
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

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{fadvise, Advice};
            let _ = fadvise(&file, 0, None, Advice::Sequential);
        }

        let size = Self::get_size(&file, path_obj)?;
        let sector_size = Self::detect_sector_size(path_obj);

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_string(),
            size,
            sector_size,
        })
    }

    fn device_info(&self) -> Result<DeviceInfo, BlockDeviceError> {
        Ok(DeviceInfo {
            path: self.path.clone(),
            size: self.size,
            sector_size: self.sector_size,
            read_only: true,
        })
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, BlockDeviceError> {
        if offset >= self.size {
            return Err(BlockDeviceError::InvalidOffset {
                offset,
                device_size: self.size,
            });
        }

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        file.seek(SeekFrom::Start(offset))?;

        let available = (self.size - offset) as usize;
        let to_read = len.min(available);

        let mut buffer = vec![0u8; to_read];
        file.read_exact(&mut buffer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                BlockDeviceError::ReadError {
                    offset,
                    message: "unexpected end of device".to_string(),
                }
            } else {
                BlockDeviceError::IoError(e)
            }
        })?;

        Ok(buffer)
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn size(&self) -> u64 {
        self.size
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
        let device = LinuxBlockDevice::open(file.path().to_str().unwrap()).unwrap();
        assert_eq!(device.size(), 1024);
        let data = device.read_at(0, 512).unwrap();
        assert_eq!(data.len(), 512);
        assert!(data.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn missing_path_is_device_not_found() {
        let err = LinuxBlockDevice::open("/nonexistent/path/for/test").unwrap_err();
        assert!(matches!(err, BlockDeviceError::DeviceNotFound));
    }

    #[test]
    fn offset_past_end_is_invalid_offset() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        let device = LinuxBlockDevice::open(file.path().to_str().unwrap()).unwrap();
        let err = device.read_at(1000, 16).unwrap_err();
        assert!(matches!(err, BlockDeviceError::InvalidOffset { .. }));
    }
}
