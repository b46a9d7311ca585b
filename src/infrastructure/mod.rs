//! Adapters for the domain's repository ports: device I/O, file writing,
//! and the MIME reference-type loader.

pub mod block_device;
pub mod mime;
pub mod persistence;

pub use block_device::LinuxBlockDevice;
pub use mime::load_mime_types;
pub use persistence::LocalFileWriter;
