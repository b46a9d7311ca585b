//! The block-device read boundary: the only way parsing code touches the
//! underlying storage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockDeviceError {
    #[error("permission denied opening device")]
    PermissionDenied,
    #[error("device not found")]
    DeviceNotFound,
    #[error("device is busy")]
    DeviceBusy,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid offset {offset} for device of size {device_size}")]
    InvalidOffset { offset: u64, device_size: u64 },
    #[error("read error at offset {offset}: {message}")]
    ReadError { offset: u64, message: String },
    #[error("other device error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub size: u64,
    pub sector_size: u32,
    pub read_only: bool,
}

impl DeviceInfo {
    pub fn sector_count(&self) -> u64 {
        self.size / self.sector_size as u64
    }
}

/// Abstraction over a raw, read-only block device, partition image, or
/// isolated `$MFT` file. Multiple handles may be open at once (the
/// directory resolver's on-demand lookups use a second handle independent
/// of the scanner's primary one).
pub trait BlockDeviceReader: Send + Sync {
    fn open(path: &str) -> Result<Self, BlockDeviceError>
    where
        Self: Sized;

    fn device_info(&self) -> Result<DeviceInfo, BlockDeviceError>;

    /// Reads exactly `len` bytes starting at byte `offset`.
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, BlockDeviceError>;

    fn path(&self) -> &str;

    fn size(&self) -> u64;
}
