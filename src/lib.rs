//! mcpman - MCP registry management for Gemini and Qwen CLI settings
//!
//! A persistence core for managing Model Context Protocol (MCP) server
//! definitions inside the settings file of a Gemini- or Qwen-flavored CLI
//! tool, plus the small preference document that records where that file
//! lives.
//!
//! # Architecture Overview
//!
//! Two durable stores, each owning exactly one JSON document:
//!
//! - [`config::PreferenceStore`] owns `mcp_config.json`: the operator's base
//!   filesystem path and the selected CLI flavor. It is this crate's own
//!   file, with a platform-specific fallback location when the primary is
//!   not writable.
//! - [`mcp::McpStore`] owns the registry sections (`mcpServers` and
//!   `mcp.allowed`) of the CLI tool's `settings.json`. That file belongs to
//!   the CLI tool, so every section this crate does not understand is
//!   round-tripped byte-for-byte.
//!
//! ## Key Properties
//!
//! - **Durable writes**: every save goes through a temp file in the target
//!   directory followed by an atomic rename, so readers never observe a
//!   half-written document.
//! - **Lenient reads, strict writes**: a hand-edited or corrupt settings
//!   file degrades (malformed registry entries are dropped with a warning,
//!   unparseable files are quarantined aside) instead of blocking startup;
//!   saves validate structurally and refuse to persist a broken document.
//! - **Read-your-writes caching**: each store keeps a process-local cache
//!   that is replaced on save and dropped on explicit refresh.
//!
//! # Core Modules
//!
//! - [`config`] - User preference persistence (`mcp_config.json`)
//! - [`core`] - Error types shared across the crate
//! - [`mcp`] - MCP registry CRUD, allow-list, and template installation
//! - [`utils`] - Atomic file IO, permission probing, and platform paths
//!
//! # Example
//!
//! ```no_run
//! use mcpman::config::{CliType, PreferenceStore};
//! use mcpman::mcp::McpStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut prefs = PreferenceStore::new()?;
//! prefs.set_user_path("/home/user")?;
//! prefs.set_cli_type(CliType::Qwen)?;
//!
//! let mut store = McpStore::new(&mut prefs)?;
//! store.install_from_template("context7", true, false)?;
//!
//! for (name, status) in store.get_mcps()? {
//!     println!("{name}: {} (enabled: {})", status.command, status.enabled);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod mcp;
pub mod utils;

pub use core::McpmanError;
