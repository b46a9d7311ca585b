//! Recovered-file write port implementation.

pub mod local_file_writer;

pub use local_file_writer::{unlink_partial, LocalFileWriter};
