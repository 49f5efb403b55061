//! Cross-platform utilities and helpers.
//!
//! # Modules
//!
//! - [`fs`] - Atomic file writes, JSON helpers, and write-permission probing
//! - [`platform`] - Home/app-data resolution and `PATH` lookup

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, check_write_permission, ensure_dir, read_json_file, write_json_file};
pub use platform::{command_exists, get_home_dir, is_windows, normalize_path_for_storage};
