//! Error handling for mcpman.
//!
//! The error system is built around a single strongly-typed enum,
//! [`McpmanError`], covering every failure mode of the persistence core.
//! Callers receive errors through `anyhow::Result` and can downcast to
//! [`McpmanError`] when they need to branch on the specific kind.
//!
//! # Error Categories
//!
//! - **Preference validation**: [`McpmanError::InvalidPath`],
//!   [`McpmanError::InvalidCliType`]
//! - **Registry operations**: [`McpmanError::McpNotFound`],
//!   [`McpmanError::McpAlreadyExists`], [`McpmanError::InvalidSettings`]
//! - **Templates**: [`McpmanError::TemplateNotFound`],
//!   [`McpmanError::MissingDependency`]
//! - **File system**: [`McpmanError::PermissionDenied`],
//!   [`McpmanError::QuarantineFailed`], [`McpmanError::IoError`]
//!
//! Standard library and serde errors convert automatically:
//! [`std::io::Error`] → [`McpmanError::IoError`] and
//! [`serde_json::Error`] → [`McpmanError::JsonError`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use mcpman::core::McpmanError;
//!
//! fn report(err: &anyhow::Error) {
//!     match err.downcast_ref::<McpmanError>() {
//!         Some(McpmanError::McpNotFound { name }) => {
//!             eprintln!("no MCP server named '{name}'");
//!         }
//!         Some(McpmanError::PermissionDenied { path }) => {
//!             eprintln!("cannot write to {path}; pick another location");
//!         }
//!         _ => eprintln!("{err:#}"),
//!     }
//! }
//! ```

use thiserror::Error;

/// The main error type for mcpman operations.
///
/// Each variant carries enough context (path, name, reason) for a caller to
/// display an actionable message to an operator. Validation errors are raised
/// synchronously; the only failure the core deliberately swallows is a
/// corrupt or stale preference document, where the getters fall back to safe
/// defaults instead.
#[derive(Error, Debug)]
pub enum McpmanError {
    /// A supplied filesystem path failed validation.
    ///
    /// Raised by `set_user_path` and by base-path overrides when the path is
    /// empty, does not exist, or is not a directory.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path that failed validation
        path: String,
        /// Why the path was rejected (missing, not a directory, empty)
        reason: String,
    },

    /// A CLI flavor value other than `gemini` or `qwen` was supplied.
    #[error("Invalid CLI type '{value}': must be 'gemini' or 'qwen'")]
    InvalidCliType {
        /// The rejected value
        value: String,
    },

    /// An operation referenced an MCP server that is not in the registry.
    #[error("MCP '{name}' not found")]
    McpNotFound {
        /// Name of the missing MCP server
        name: String,
    },

    /// An add operation collided with an existing registry entry.
    #[error("MCP '{name}' already exists")]
    McpAlreadyExists {
        /// Name of the conflicting MCP server
        name: String,
    },

    /// A template install referenced an unknown catalog entry.
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// Name of the unknown template
        name: String,
    },

    /// A template's launcher command is not available on the system `PATH`.
    ///
    /// Raised by `install_from_template` unless the dependency check is
    /// explicitly skipped.
    #[error("Command '{command}' required by template '{template}' was not found on PATH")]
    MissingDependency {
        /// The template whose precondition failed
        template: String,
        /// The executable that could not be resolved
        command: String,
    },

    /// The filesystem refused a write.
    #[error("Permission denied writing to {path}")]
    PermissionDenied {
        /// Directory or file that could not be written
        path: String,
    },

    /// A settings document failed the structural checks required before a
    /// save. Nothing is written when this is raised.
    #[error("Invalid settings document: {reason}")]
    InvalidSettings {
        /// Which structural check failed
        reason: String,
    },

    /// A corrupt settings file could not be renamed aside after the bounded
    /// number of attempts.
    #[error("Failed to quarantine corrupt settings file {path} after {attempts} attempts")]
    QuarantineFailed {
        /// The corrupt file that could not be moved
        path: String,
        /// How many rename attempts were made
        attempts: u32,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl McpmanError {
    /// Convenience constructor for [`McpmanError::InvalidPath`].
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into(), reason: reason.into() }
    }

    /// Convenience constructor for [`McpmanError::InvalidSettings`].
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings { reason: reason.into() }
    }
}
