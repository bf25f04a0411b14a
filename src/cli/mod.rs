//! CLI-specific utilities for routepick
//!
//! The terminal binding of the map surface: stdin commands in, notices out,
//! separate from the core library functionality.

pub mod console;
pub mod progress;

pub use console::{print_notices, read_commands};
pub use progress::ProgressManager;
