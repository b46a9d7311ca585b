//! Application layer: orchestrates the domain's scanning and recovery
//! services against the repository ports, without doing its own I/O.

pub mod dto;
pub mod scan_use_case;

pub use scan_use_case::{FileEventCallback, ScanUseCase};
