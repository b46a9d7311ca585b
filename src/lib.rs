//! ntfsalvage - NTFS deleted file recovery
//!
//! Recovers files from an NTFS volume, raw device, partition image, or
//! isolated `$MFT` file by linearly scanning the underlying storage,
//! interpreting every MFT record it encounters, reconstructing logical
//! paths from parent-reference chains, and extracting content via data
//! runs into a target directory.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::dto::{Config, FileEvent, FileState, ScanSummary};
pub use application::{FileEventCallback, ScanUseCase};
pub use domain::entities::*;
pub use domain::repositories::*;
