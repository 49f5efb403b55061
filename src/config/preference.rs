//! User preference persistence.
//!
//! This module owns the small preference document (`mcp_config.json`) that
//! records the operator's base filesystem path and the selected CLI flavor.
//! The [`McpStore`](crate::mcp::McpStore) asks this store for both values
//! when resolving the location of the CLI tool's `settings.json`.
//!
//! # File Location
//!
//! The default primary location is `mcp_config.json` next to the running
//! executable, which may be read-only (e.g. under a system package path).
//! A fallback location is therefore computed at construction:
//!
//! - **Windows**: `%APPDATA%\mcpman\mcp_config.json`
//! - **Unix/macOS**: `~/mcp_config.json`
//!
//! Loads try the primary first and fall back when it is unreadable or
//! absent; once the fallback is used it becomes the target for the rest of
//! this instance's lifetime (lock-in, not alternation). Saves retry against
//! the fallback only when the primary's parent directory fails a write
//! permission check. An explicit path given at construction disables the
//! fallback entirely.
//!
//! # Graceful Degradation
//!
//! The getters never raise: a stale stored path or an unrecognized CLI type
//! is treated as corruption and reported as "absent"/default rather than
//! blocking the application from starting. The setters validate strictly
//! and persist immediately with an atomic write.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mcpman::config::{CliType, PreferenceStore};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut prefs = PreferenceStore::new()?;
//! prefs.set_user_path("/home/user")?;
//! prefs.set_cli_type(CliType::Qwen)?;
//! assert_eq!(prefs.get_cli_type(), CliType::Qwen);
//! # Ok(())
//! # }
//! ```

use crate::core::McpmanError;
use crate::utils::fs::{check_write_permission, ensure_dir, read_json_file, write_json_file};
use crate::utils::platform::{get_data_dir, get_home_dir, is_windows, normalize_path_for_storage};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// File name of the preference document.
pub const PREFERENCE_FILE_NAME: &str = "mcp_config.json";

/// The CLI flavor whose settings directory the registry document lives
/// under.
///
/// Selects both the dot-directory (`.gemini` / `.qwen`) joined onto the base
/// path and the auth type written into a freshly synthesized settings
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliType {
    /// The Gemini CLI (`.gemini/settings.json`, `oauth-personal` auth).
    #[default]
    Gemini,
    /// The Qwen CLI (`.qwen/settings.json`, `qwen-oauth` auth).
    Qwen,
}

impl CliType {
    /// The canonical lowercase identifier stored in the preference file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Qwen => "qwen",
        }
    }

    /// The settings directory name joined onto the base path.
    #[must_use]
    pub fn dir_name(self) -> String {
        format!(".{}", self.as_str())
    }

    /// The `security.auth.selectedType` value for a default document.
    #[must_use]
    pub const fn default_auth_type(self) -> &'static str {
        match self {
            Self::Gemini => "oauth-personal",
            Self::Qwen => "qwen-oauth",
        }
    }

    /// Infers the CLI flavor from a settings path's parent directory name.
    ///
    /// A path ending in `.qwen/settings.json` implies [`CliType::Qwen`];
    /// anything else falls back to [`CliType::Gemini`]. Used only when the
    /// store was constructed with a fully explicit settings path.
    #[must_use]
    pub fn infer_from_settings_path(path: &Path) -> Self {
        path.parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix('.'))
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for CliType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CliType {
    type Err = McpmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Self::Gemini),
            "qwen" => Ok(Self::Qwen),
            other => Err(McpmanError::InvalidCliType { value: other.to_string() }),
        }
    }
}

/// The on-disk preference document.
///
/// Both keys are optional; absence is not an error. Unrecognized keys are
/// preserved across set operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreference {
    /// Base filesystem path, always stored in forward-slash form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_base_path: Option<String>,

    /// Selected CLI flavor identifier (raw string as stored).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_type: Option<String>,

    /// Keys this core does not understand, round-tripped unchanged.
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

/// Durable single-document store for [`UserPreference`].
///
/// Construction resolves the file location once; the resolved primary and
/// fallback are immutable configuration for this instance apart from the
/// fallback lock-in described in the module docs. The store is not
/// internally synchronized; callers are responsible for serializing
/// operations on a given instance.
#[derive(Debug)]
pub struct PreferenceStore {
    config_path: PathBuf,
    fallback_path: Option<PathBuf>,
}

impl PreferenceStore {
    /// Creates a store targeting the default platform-specific locations.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the executable directory nor the
    /// platform fallback directory can be determined.
    pub fn new() -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let fallback = if is_windows() {
            get_data_dir()?.join(PREFERENCE_FILE_NAME)
        } else {
            get_home_dir()?.join(PREFERENCE_FILE_NAME)
        };
        Ok(Self {
            config_path: exe_dir.join(PREFERENCE_FILE_NAME),
            fallback_path: Some(fallback),
        })
    }

    /// Creates a store targeting an explicit file, with no fallback.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { config_path: path.into(), fallback_path: None }
    }

    #[cfg(test)]
    pub(crate) fn with_paths(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self { config_path: primary.into(), fallback_path: Some(fallback.into()) }
    }

    /// The file this instance currently targets.
    ///
    /// Starts as the primary location and moves to the fallback permanently
    /// if a load or save locks the fallback in.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the stored base path if it currently resolves to an existing
    /// directory.
    ///
    /// Stale or missing paths are treated as absent rather than errors, so a
    /// broken preference file never blocks startup.
    pub fn get_user_path(&mut self) -> Option<String> {
        let prefs = self.load();
        let path = prefs.user_base_path?;
        if path.trim().is_empty() {
            warn!("Stored user path is empty");
            return None;
        }
        let path_obj = Path::new(&path);
        if path_obj.exists() && path_obj.is_dir() {
            Some(path)
        } else {
            warn!("Stored user path is not a valid directory: {path}");
            None
        }
    }

    /// Validates and stores the base path, normalized to forward slashes.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::InvalidPath`] if the path is empty, does not
    /// exist, or is not a directory; propagates persistence failures.
    pub fn set_user_path(&mut self, user_path: &str) -> Result<()> {
        if user_path.trim().is_empty() {
            return Err(McpmanError::invalid_path(user_path, "path must not be empty").into());
        }
        let path_obj = Path::new(user_path);
        if !path_obj.exists() {
            return Err(McpmanError::invalid_path(user_path, "path does not exist").into());
        }
        if !path_obj.is_dir() {
            return Err(McpmanError::invalid_path(user_path, "path is not a directory").into());
        }

        let normalized = normalize_path_for_storage(path_obj);
        let mut prefs = self.load();
        prefs.user_base_path = Some(normalized.clone());
        self.save(&prefs)?;
        info!("User path set to: {normalized}");
        Ok(())
    }

    /// Returns the stored CLI flavor, falling back to [`CliType::Gemini`]
    /// when the stored value is absent or unrecognized.
    pub fn get_cli_type(&mut self) -> CliType {
        let prefs = self.load();
        match prefs.cli_type.as_deref() {
            None => CliType::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Unrecognized CLI type '{raw}' in preferences, defaulting to gemini");
                CliType::default()
            }),
        }
    }

    /// Stores the CLI flavor.
    ///
    /// # Errors
    ///
    /// Propagates persistence failures.
    pub fn set_cli_type(&mut self, cli_type: CliType) -> Result<()> {
        let mut prefs = self.load();
        prefs.cli_type = Some(cli_type.as_str().to_string());
        self.save(&prefs)?;
        info!("CLI type set to: {cli_type}");
        Ok(())
    }

    /// Parses and stores a CLI flavor literal.
    ///
    /// # Errors
    ///
    /// Returns [`McpmanError::InvalidCliType`] unless the value is exactly
    /// `"gemini"` or `"qwen"`; propagates persistence failures.
    pub fn set_cli_type_str(&mut self, value: &str) -> Result<()> {
        let cli_type: CliType = value.parse()?;
        self.set_cli_type(cli_type)
    }

    /// True only if a stored path exists and is currently a valid directory.
    pub fn has_config(&mut self) -> bool {
        self.get_user_path().is_some()
    }

    /// Loads the preference document, trying the fallback when the primary
    /// is absent or unreadable. Any failure degrades to an empty document.
    fn load(&mut self) -> UserPreference {
        if self.config_path.exists() {
            match read_json_file::<UserPreference>(&self.config_path) {
                Ok(prefs) => {
                    debug!("Loaded preferences from: {}", self.config_path.display());
                    return prefs;
                }
                Err(e) => {
                    warn!(
                        "Failed to read preference file {}: {e:#}",
                        self.config_path.display()
                    );
                }
            }
        } else {
            debug!("Preference file not found at: {}", self.config_path.display());
        }

        if let Some(fallback) = self.fallback_path.clone()
            && fallback.exists()
        {
            match read_json_file::<UserPreference>(&fallback) {
                Ok(prefs) => {
                    // Lock the fallback in for the rest of this instance.
                    info!("Using fallback preference file: {}", fallback.display());
                    self.config_path = fallback;
                    return prefs;
                }
                Err(e) => {
                    warn!("Failed to read fallback preference file {}: {e:#}", fallback.display());
                }
            }
        }

        UserPreference::default()
    }

    /// Persists the document, retrying against the fallback location when
    /// the primary's parent directory refuses writes.
    fn save(&mut self, prefs: &UserPreference) -> Result<()> {
        let primary = self.config_path.clone();
        match Self::save_at(&primary, prefs) {
            Ok(()) => {
                debug!("Preferences saved to: {}", primary.display());
                Ok(())
            }
            Err(e) if is_permission_denied(&e) => {
                let Some(fallback) = self.fallback_path.clone() else {
                    return Err(e);
                };
                warn!(
                    "No permission to write {}, retrying at fallback {}",
                    primary.display(),
                    fallback.display()
                );
                Self::save_at(&fallback, prefs)?;
                info!("Preferences saved to fallback: {}", fallback.display());
                self.config_path = fallback;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn save_at(path: &Path, prefs: &UserPreference) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !check_write_permission(parent, false) && !check_write_permission(parent, true) {
            return Err(
                McpmanError::PermissionDenied { path: parent.display().to_string() }.into()
            );
        }
        ensure_dir(parent)?;
        write_json_file(path, prefs)
    }
}

fn is_permission_denied(err: &anyhow::Error) -> bool {
    if matches!(err.downcast_ref::<McpmanError>(), Some(McpmanError::PermissionDenied { .. })) {
        return true;
    }
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied)
    })
}
