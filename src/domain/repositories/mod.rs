//! Trait boundaries the domain depends on but does not implement.

pub mod block_device;
pub mod file_writer;

pub use block_device::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
pub use file_writer::{FileWriterError, MangleFormat, RecoveredFileWriter, WriteOutcome, WriteRequest};
