//! MCP registry management inside the CLI tool's `settings.json`.
//!
//! The registry is two sections of a settings document the CLI tool itself
//! owns: `mcpServers` maps server names to launch specs, and `mcp.allowed`
//! is the allow-list of enabled names. [`McpStore`] locates that document,
//! repairs it leniently on load, validates it strictly on save, and
//! round-trips every section it does not understand byte-for-byte.
//!
//! # Example
//!
//! ```no_run
//! use mcpman::config::PreferenceStore;
//! use mcpman::mcp::McpStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut prefs = PreferenceStore::new()?;
//! let mut store = McpStore::new(&mut prefs)?;
//!
//! store.add_mcp("context7", "npx", vec!["-y".into(), "@upstash/context7-mcp".into()])?;
//! let enabled = store.toggle_allowed("context7", Some(true))?;
//! assert!(enabled);
//! # Ok(())
//! # }
//! ```

pub mod models;
mod operations;
pub mod store;
pub mod templates;

#[cfg(test)]
mod tests;

pub use models::{McpDetails, McpStatus, ServerSpec};
pub use store::{McpStore, SettingsDoc, SETTINGS_FILE_NAME};
pub use templates::{find_template, Template, TEMPLATES};
