//! User-facing surface: CLI argument parsing and status-line rendering.
//!
//! Kept thin and dependent on the application/domain layers, never the
//! reverse — the core never imports anything from here (spec §9
//! "Friend-style observer coupling").

pub mod cli;
