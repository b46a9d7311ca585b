//! Block device I/O port implementation.

pub mod linux_block_device;
pub mod mmap_block_device;

pub use linux_block_device::LinuxBlockDevice;
pub use mmap_block_device::MmapBlockDevice;
