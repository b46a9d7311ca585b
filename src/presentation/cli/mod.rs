//! `clap`-derived CLI surface and the status-line observer it wires up to
//! the core's `FileEvent` channel.

pub mod commands;
pub mod observer;
pub mod progress;

pub use commands::Cli;
pub use observer::StatusLineObserver;
pub use progress::ScanProgressBar;
