//! Platform-specific helpers and path resolution.
//!
//! Wraps the handful of OS-dependent lookups the stores need: home and
//! app-data directories, `PATH` resolution for template dependency checks,
//! and separator normalization for paths persisted to JSON.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(target_os = "windows")
}

/// Gets the user's home directory in a cross-platform way.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined, e.g. when
/// `HOME` (Unix) or `USERPROFILE` (Windows) is unset.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Returns the platform-specific application data directory for mcpman.
///
/// - **Linux**: `$XDG_DATA_HOME/mcpman` or `$HOME/.local/share/mcpman`
/// - **macOS**: `$HOME/Library/Application Support/mcpman`
/// - **Windows**: `%APPDATA%\mcpman`
///
/// Used as the preference-file fallback location when the primary location
/// (next to the executable) is read-only.
pub fn get_data_dir() -> Result<PathBuf> {
    dirs::data_dir().map(|p| p.join("mcpman")).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the APPDATA environment variable is set"
        } else {
            "On Unix/Linux: Check that the XDG_DATA_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine data directory.\n\n{platform_help}")
    })
}

/// Checks whether a command is available on the system `PATH`.
///
/// Used by the template installer to verify a template's launcher (`npx`,
/// `uvx`, ...) before writing the registry entry.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Normalizes a path for storage by converting all separators to forward
/// slashes.
///
/// Paths persisted in the preference document always use forward slashes so
/// the file is identical regardless of the platform that wrote it.
#[must_use]
pub fn normalize_path_for_storage<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_home_dir() {
        let home = get_home_dir().unwrap();
        assert!(home.is_absolute());
    }

    #[test]
    fn test_get_data_dir_ends_with_crate_name() {
        let data = get_data_dir().unwrap();
        assert!(data.ends_with("mcpman"));
    }

    #[test]
    fn test_command_exists_nonexistent() {
        assert!(!command_exists("definitely-not-a-real-command-xyz"));
    }

    #[test]
    fn test_normalize_path_for_storage() {
        assert_eq!(normalize_path_for_storage("C:\\Users\\TI00"), "C:/Users/TI00");
        assert_eq!(normalize_path_for_storage("/home/user"), "/home/user");
    }
}
