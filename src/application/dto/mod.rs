//! Application-layer DTOs: the `Config` collaborator the core consumes and
//! the `FileEvent`/`ScanSummary` values it emits.

pub mod config;
pub mod file_event;
pub mod scan_summary;

pub use config::Config;
pub use file_event::{FileEvent, FileState};
pub use scan_summary::ScanSummary;
